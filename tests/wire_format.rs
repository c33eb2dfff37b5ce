//! Wire format compliance tests
//!
//! Verifies the JSON shapes of the protocol types: camelCase field names,
//! kebab-case task states, and the tagged part union.

use serde_json::json;

use a2a_flow::protocol::{
    message::{Message, Part, Role},
    task::{Task, TaskState},
    Artifact, TaskError,
};

#[test]
fn role_serializes_lowercase() {
    let user_msg = Message::user("Hello");
    let json = serde_json::to_value(&user_msg).unwrap();
    assert_eq!(json["role"], "user");

    let agent_msg = Message::agent("Hi there");
    let json = serde_json::to_value(&agent_msg).unwrap();
    assert_eq!(json["role"], "agent");
}

#[test]
fn text_part_carries_media_type() {
    let part = Part::text("Hello, world!");
    let json = serde_json::to_value(&part).unwrap();

    assert_eq!(json["text"], "Hello, world!");
    assert_eq!(json["mediaType"], "text/plain");
}

#[test]
fn file_part_uses_nested_structure() {
    let part = Part::file_with_type(
        "document.pdf",
        "https://example.com/doc.pdf",
        "application/pdf",
    );
    let json = serde_json::to_value(&part).unwrap();

    assert!(json.get("file").is_some());
    assert_eq!(json["file"]["name"], "document.pdf");
    assert_eq!(json["file"]["fileWithUri"], "https://example.com/doc.pdf");
    assert_eq!(json["file"]["mediaType"], "application/pdf");

    // No flat variant of the fields
    assert!(json.get("fileUri").is_none());
    assert!(json.get("name").is_none());
}

#[test]
fn data_part_carries_payload_and_media_type() {
    let data = json!({"key": "value", "count": 42});
    let part = Part::data(data.clone());
    let json = serde_json::to_value(&part).unwrap();

    assert_eq!(json["data"], data);
    assert_eq!(json["mediaType"], "application/json");
}

#[test]
fn part_union_round_trips() {
    let parts = vec![
        Part::text("plain"),
        Part::file("f.bin", "file:///tmp/f.bin"),
        Part::data(json!([1, 2, 3])),
    ];

    for part in parts {
        let json = serde_json::to_string(&part).unwrap();
        let back: Part = serde_json::from_str(&json).unwrap();
        assert_eq!(part, back);
    }
}

#[test]
fn message_fields_use_camel_case() {
    let msg = Message::builder()
        .role(Role::User)
        .part(Part::text("Test"))
        .message_id("msg-123")
        .task_id("task-456")
        .context_id("ctx-789")
        .build();

    let json = serde_json::to_value(&msg).unwrap();

    assert_eq!(json["messageId"], "msg-123");
    assert_eq!(json["taskId"], "task-456");
    assert_eq!(json["contextId"], "ctx-789");

    assert!(json.get("message_id").is_none());
    assert!(json.get("task_id").is_none());
    assert!(json.get("context_id").is_none());
}

#[test]
fn task_state_uses_kebab_case() {
    let mut task = Task::new("task-123", Message::user("Test"));
    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["state"], "created");

    task.start().unwrap();
    task.require_input().unwrap();
    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["state"], "input-required");

    let mut cancelled = Task::new("task-124", Message::user("Test"));
    cancelled.cancel().unwrap();
    let json = serde_json::to_value(&cancelled).unwrap();
    assert_eq!(json["state"], "canceled");
}

#[test]
fn task_fields_use_camel_case() {
    let task = Task::new("task-123", Message::user("Test")).with_context_id("ctx-456");
    let json = serde_json::to_value(&task).unwrap();

    assert!(json.get("createdAt").is_some());
    assert!(json.get("contextId").is_some());

    assert!(json.get("created_at").is_none());
    assert!(json.get("context_id").is_none());
}

#[test]
fn completed_task_carries_artifacts() {
    let mut task = Task::new("task-123", Message::user("Test"));
    task.start().unwrap();
    task.complete(vec![
        Artifact::from_text("artifact-1", "Output").with_name("result")
    ])
    .unwrap();

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["artifacts"][0]["artifactId"], "artifact-1");
    assert_eq!(json["artifacts"][0]["name"], "result");
    assert_eq!(json["artifacts"][0]["parts"][0]["text"], "Output");
    assert!(json.get("error").is_none());
}

#[test]
fn failed_task_carries_error_not_artifacts() {
    let mut task = Task::new("task-123", Message::user("Test"));
    task.start().unwrap();
    task.fail(TaskError::execution("boom")).unwrap();

    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["state"], "failed");
    assert_eq!(json["error"]["code"], "EXECUTION_FAILED");
    assert_eq!(json["error"]["message"], "boom");
    assert!(json.get("artifacts").is_none());
}

#[test]
fn task_round_trips() {
    let mut task = Task::new("task-42", Message::user("in"));
    task.start().unwrap();
    task.complete(vec![Artifact::from_data("d", json!({"ok": true}))])
        .unwrap();

    let json = serde_json::to_string(&task).unwrap();
    let back: Task = serde_json::from_str(&json).unwrap();
    assert_eq!(task, back);
    assert_eq!(back.state, TaskState::Completed);
}
