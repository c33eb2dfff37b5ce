//! Workflow message types

use std::collections::HashMap;

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message exchanged with a workflow node
///
/// Messages are the unit sent to a node for one invocation. Each message has
/// a role (user or agent) and one or more parts (text, file, or data).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Message content parts (at least one required)
    pub parts: Vec<Part>,

    /// Optional message identifier
    #[serde(rename = "messageId", skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Optional task identifier (for associating message with a task)
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    /// Optional context identifier (for grouping a run's exchanges)
    #[serde(rename = "contextId", skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,

    /// Optional metadata for the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Message {
    /// Create a new message with text content
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::text(text)],
            message_id: None,
            task_id: None,
            context_id: None,
            metadata: None,
        }
    }

    /// Create a user message with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an agent message with text content
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    /// Create a new message builder
    pub fn builder() -> MessageBuilder {
        MessageBuilder::new()
    }

    /// Add a metadata field to the message
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Add a message part
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// First text part content, if any
    pub fn first_text(&self) -> Option<&str> {
        self.parts.iter().find_map(Part::as_text)
    }
}

/// Builder for constructing Message instances
#[derive(Debug, Default)]
pub struct MessageBuilder {
    role: Option<Role>,
    parts: Vec<Part>,
    message_id: Option<String>,
    task_id: Option<String>,
    context_id: Option<String>,
    metadata: Option<HashMap<String, Value>>,
}

impl MessageBuilder {
    /// Create a new message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the role of the message
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the message parts
    pub fn parts(mut self, parts: Vec<Part>) -> Self {
        self.parts = parts;
        self
    }

    /// Add a single part to the message
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Set the message ID
    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Set the task ID
    pub fn task_id(mut self, id: impl Into<String>) -> Self {
        self.task_id = Some(id.into());
        self
    }

    /// Set the context ID
    pub fn context_id(mut self, id: impl Into<String>) -> Self {
        self.context_id = Some(id.into());
        self
    }

    /// Add a metadata field
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    /// Build the message
    ///
    /// # Panics
    ///
    /// Panics if role is not set or if parts are empty
    pub fn build(self) -> Message {
        let role = self.role.expect("Message role is required");
        assert!(
            !self.parts.is_empty(),
            "Message must have at least one part"
        );

        Message {
            role,
            parts: self.parts,
            message_id: self.message_id,
            task_id: self.task_id,
            context_id: self.context_id,
            metadata: self.metadata,
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from a user
    User,

    /// Message from an agent node
    Agent,
}

/// File content for file parts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileContent {
    /// MIME type of the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Name of the file
    pub name: String,

    /// URI reference to the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_with_uri: Option<String>,

    /// Base64-encoded file content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_with_bytes: Option<String>,
}

/// The smallest payload unit carried by messages and artifacts
///
/// A part MUST contain exactly one of: text, file, data. Every variant is
/// tagged with a MIME type; file parts carry theirs inside the file content.
/// Parts are immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    /// Text content
    Text {
        /// The text content
        text: String,

        /// MIME type of the text
        #[serde(rename = "mediaType", default = "default_text_media_type")]
        media_type: String,
    },

    /// File reference
    File {
        /// File content, by URI or inline bytes
        file: FileContent,
    },

    /// Structured data
    Data {
        /// The structured data
        data: Value,

        /// MIME type of the data
        #[serde(rename = "mediaType", default = "default_data_media_type")]
        media_type: String,
    },
}

fn default_text_media_type() -> String {
    "text/plain".to_string()
}

fn default_data_media_type() -> String {
    "application/json".to_string()
}

impl Part {
    /// Create a plain text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            media_type: default_text_media_type(),
        }
    }

    /// Create a text part with an explicit MIME type
    pub fn text_with_type(text: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            media_type: media_type.into(),
        }
    }

    /// Create a file part with URI reference
    pub fn file(name: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Self::File {
            file: FileContent {
                media_type: None,
                name: name.into(),
                file_with_uri: Some(file_uri.into()),
                file_with_bytes: None,
            },
        }
    }

    /// Create a file part with URI and media type
    pub fn file_with_type(
        name: impl Into<String>,
        file_uri: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self::File {
            file: FileContent {
                media_type: Some(media_type.into()),
                name: name.into(),
                file_with_uri: Some(file_uri.into()),
                file_with_bytes: None,
            },
        }
    }

    /// Create a file part from raw bytes, base64-encoded inline
    pub fn file_from_bytes(
        name: impl Into<String>,
        bytes: impl AsRef<[u8]>,
        media_type: Option<String>,
    ) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes.as_ref());
        Self::File {
            file: FileContent {
                media_type,
                name: name.into(),
                file_with_uri: None,
                file_with_bytes: Some(encoded),
            },
        }
    }

    /// Create a structured data part
    pub fn data(data: Value) -> Self {
        Self::Data {
            data,
            media_type: default_data_media_type(),
        }
    }

    /// Text content, if this is a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Structured data, if this is a data part
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Part::Data { data, .. } => Some(data),
            _ => None,
        }
    }

    /// MIME type tag of this part
    pub fn media_type(&self) -> Option<&str> {
        match self {
            Part::Text { media_type, .. } | Part::Data { media_type, .. } => Some(media_type),
            Part::File { file } => file.media_type.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.parts.len(), 1);
        assert_eq!(msg.first_text(), Some("Hello, agent!"));
    }

    #[test]
    fn test_message_with_metadata() {
        let msg = Message::user("Test").with_metadata("key", json!("value"));
        assert!(msg.metadata.is_some());
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("Test message");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"text\":\"Test message\""));

        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_part_media_types() {
        let text = Part::text("Hello");
        assert_eq!(text.media_type(), Some("text/plain"));

        let data = Part::data(json!({"key": "value"}));
        assert_eq!(data.media_type(), Some("application/json"));

        let file = Part::file_with_type("doc.pdf", "https://example.com/doc.pdf", "application/pdf");
        assert_eq!(file.media_type(), Some("application/pdf"));
    }

    #[test]
    fn test_part_defaults_on_deserialize() {
        // A bare text part without a mediaType tag still deserializes
        let part: Part = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(part.media_type(), Some("text/plain"));
        assert_eq!(part.as_text(), Some("hi"));
    }

    #[test]
    fn test_file_from_bytes_is_base64() {
        let part = Part::file_from_bytes("blob.bin", b"abc", Some("application/octet-stream".into()));
        match part {
            Part::File { file } => {
                assert_eq!(file.file_with_bytes.as_deref(), Some("YWJj"));
                assert!(file.file_with_uri.is_none());
            }
            _ => panic!("expected file part"),
        }
    }

    #[test]
    fn test_message_builder() {
        let msg = Message::builder()
            .role(Role::Agent)
            .parts(vec![Part::text("Hello")])
            .message_id("msg-123")
            .task_id("task-456")
            .context_id("ctx-789")
            .build();

        assert_eq!(msg.role, Role::Agent);
        assert_eq!(msg.parts.len(), 1);
        assert_eq!(msg.message_id, Some("msg-123".to_string()));
        assert_eq!(msg.task_id, Some("task-456".to_string()));
        assert_eq!(msg.context_id, Some("ctx-789".to_string()));
    }

    #[test]
    #[should_panic(expected = "Message role is required")]
    fn test_message_builder_missing_role() {
        Message::builder().parts(vec![Part::text("Hello")]).build();
    }

    #[test]
    #[should_panic(expected = "Message must have at least one part")]
    fn test_message_builder_no_parts() {
        Message::builder().role(Role::User).build();
    }
}
