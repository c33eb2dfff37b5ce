//! JSON codec for the HTTP+JSON binding

use bytes::Bytes;
use serde_json::json;

use crate::{
    codec::Codec,
    protocol::{agent::AgentCard, error::FlowError, operation::Operation, task::Task},
    service::response::FlowResponse,
};

/// JSON codec for the HTTP+JSON protocol binding
#[derive(Debug, Clone, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn encode_request(&self, operation: &Operation) -> Result<Bytes, FlowError> {
        let json = match operation {
            Operation::SendMessage {
                message,
                configuration,
            } => {
                let mut obj = json!({
                    "message": message,
                });

                if let Some(config) = configuration {
                    obj["configuration"] = json!(config);
                }

                obj
            }
            Operation::CancelTask { task_id } => {
                json!({
                    "taskId": task_id,
                })
            }
            // GET requests don't have bodies
            _ => json!({}),
        };

        let bytes = serde_json::to_vec(&json)?;
        Ok(Bytes::from(bytes))
    }

    fn decode_response(
        &self,
        body: &[u8],
        operation: &Operation,
    ) -> Result<FlowResponse, FlowError> {
        // Empty responses
        if body.is_empty() {
            return Ok(FlowResponse::Empty);
        }

        match operation {
            Operation::SendMessage { .. }
            | Operation::GetTask { .. }
            | Operation::CancelTask { .. } => {
                let task: Task = serde_json::from_slice(body)?;
                Ok(FlowResponse::Task(Box::new(task)))
            }
            Operation::DiscoverAgent => {
                let card: AgentCard = serde_json::from_slice(body)?;
                Ok(FlowResponse::AgentCard(Box::new(card)))
            }
        }
    }

    fn content_type(&self) -> &str {
        "application/json"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::protocol::{message::Message, operation::SendConfiguration};

    #[test]
    fn test_encode_send_message() {
        let codec = JsonCodec;
        let message = Message::user("Hello");

        let operation = Operation::SendMessage {
            message,
            configuration: Some(SendConfiguration::accepting(vec![
                "text/plain".to_string()
            ])),
        };

        let bytes = codec.encode_request(&operation).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["message"].is_object());
        assert_eq!(json["configuration"]["acceptedOutputModes"][0], "text/plain");
    }

    #[test]
    fn test_encode_cancel_task() {
        let codec = JsonCodec;
        let operation = Operation::CancelTask {
            task_id: "task-9".to_string(),
        };

        let bytes = codec.encode_request(&operation).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["taskId"], "task-9");
    }

    #[test]
    fn test_decode_task_response() {
        let codec = JsonCodec;
        let json = r#"{
            "id": "task-123",
            "state": "created",
            "history": [{"role": "user", "parts": [{"text": "Hello"}]}],
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;

        let operation = Operation::GetTask {
            task_id: "task-123".to_string(),
        };

        let response = codec.decode_response(json.as_bytes(), &operation).unwrap();
        match response {
            FlowResponse::Task(task) => assert_eq!(task.id, "task-123"),
            _ => panic!("expected task response"),
        }
    }

    #[test]
    fn test_decode_agent_card() {
        let codec = JsonCodec;
        let json = r#"{
            "name": "summarize",
            "description": "A node",
            "url": "local://summarize"
        }"#;

        let response = codec
            .decode_response(json.as_bytes(), &Operation::DiscoverAgent)
            .unwrap();
        match response {
            FlowResponse::AgentCard(card) => assert_eq!(card.name, "summarize"),
            _ => panic!("expected agent card response"),
        }
    }

    #[test]
    fn test_decode_empty_body() {
        let codec = JsonCodec;
        let response = codec
            .decode_response(b"", &Operation::DiscoverAgent)
            .unwrap();
        assert!(matches!(response, FlowResponse::Empty));
    }
}
