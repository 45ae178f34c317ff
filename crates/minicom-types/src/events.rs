use serde::{Deserialize, Serialize};

use crate::state::{Message, SenderId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub thread_id: String,
    pub sender_id: SenderId,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub thread_id: String,
    pub read_at: i64,
}

/// Payload exchanged between instances over the broadcast channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum BroadcastPayload {
    /// A confirmed chat message
    Message(Message),

    /// Typing indicator change
    Typing(TypingPayload),

    /// Visitor messages of a thread were seen
    ReadReceipt(ReadReceipt),
}

impl BroadcastPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            BroadcastPayload::Message(_) => "message",
            BroadcastPayload::Typing(_) => "typing",
            BroadcastPayload::ReadReceipt(_) => "read_receipt",
        }
    }

    pub fn thread_id(&self) -> &str {
        match self {
            BroadcastPayload::Message(msg) => &msg.thread_id,
            BroadcastPayload::Typing(typing) => &typing.thread_id,
            BroadcastPayload::ReadReceipt(receipt) => &receipt.thread_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typing_payload_uses_tagged_wire_format() {
        let payload = BroadcastPayload::Typing(TypingPayload {
            thread_id: "t1".to_string(),
            sender_id: SenderId::Agent,
            is_typing: true,
        });

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "typing",
                "data": { "threadId": "t1", "senderId": "agent", "isTyping": true }
            })
        );
    }

    #[test]
    fn test_read_receipt_parses_from_wire_format() {
        let raw = r#"{"type":"read_receipt","data":{"threadId":"t9","readAt":4200}}"#;
        let payload: BroadcastPayload = serde_json::from_str(raw).unwrap();

        match payload {
            BroadcastPayload::ReadReceipt(receipt) => {
                assert_eq!(receipt.thread_id, "t9");
                assert_eq!(receipt.read_at, 4200);
            }
            other => panic!("Expected ReadReceipt, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_matches_wire_tag() {
        let raw = r#"{"type":"message","data":{"id":"m","threadId":"t","senderId":"visitor","text":"Hello","timestamp":1,"status":"sent"}}"#;
        let payload: BroadcastPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.kind(), "message");
        assert_eq!(payload.thread_id(), "t");
    }
}
