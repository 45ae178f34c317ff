use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch, the unit used for every timestamp.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderId {
    Visitor,
    Agent,
}

impl SenderId {
    pub fn label(self) -> &'static str {
        match self {
            SenderId::Visitor => "Visitor",
            SenderId::Agent => "Agent",
        }
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderId::Visitor => f.write_str("visitor"),
            SenderId::Agent => f.write_str("agent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    Sent,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub sender_id: SenderId,
    pub text: String,
    pub timestamp: i64,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<i64>,
}

impl Message {
    /// A fresh outgoing message, not yet confirmed.
    pub fn outgoing(
        thread_id: impl Into<String>,
        sender_id: SenderId,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            sender_id,
            text: text.into(),
            timestamp: now_millis(),
            status: MessageStatus::Sending,
            read_at: None,
        }
    }

    /// Copy of a failed message for another delivery attempt.
    ///
    /// Thread, sender and text are kept; id and timestamp are minted anew.
    pub fn resend(&self) -> Self {
        Self::outgoing(self.thread_id.clone(), self.sender_id, self.text.clone())
    }

    pub fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_unread(&self) -> bool {
        self.sender_id == SenderId::Visitor && self.read_at.is_none()
    }
}

/// Canonical record of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    pub id: String,
    pub messages: Vec<Message>,
}

impl ThreadState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.iter().max_by_key(|m| m.timestamp)
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.messages.iter().any(|m| m.id == message_id)
    }

    pub fn sort_by_timestamp(&mut self) {
        // stable, so equal timestamps keep arrival order
        self.messages.sort_by_key(|m| m.timestamp);
    }
}

/// Projection of a [`ThreadState`] used for the inbox list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub last_message_preview: String,
    pub last_message_at: i64,
    pub unread_count: usize,
    pub last_message_sender_id: SenderId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_with_camel_case_fields() {
        let msg = Message {
            id: "m1".to_string(),
            thread_id: "t1".to_string(),
            sender_id: SenderId::Visitor,
            text: "Hi".to_string(),
            timestamp: 1000,
            status: MessageStatus::Sent,
            read_at: None,
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["threadId"], "t1");
        assert_eq!(value["senderId"], "visitor");
        assert_eq!(value["status"], "sent");
        assert!(value.get("readAt").is_none());
    }

    #[test]
    fn test_resend_keeps_content_with_new_identity() {
        let original = Message::outgoing("t1", SenderId::Agent, "retry me")
            .with_status(MessageStatus::Error);
        let copy = original.resend();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.thread_id, "t1");
        assert_eq!(copy.sender_id, SenderId::Agent);
        assert_eq!(copy.text, "retry me");
        assert_eq!(copy.status, MessageStatus::Sending);
    }

    #[test]
    fn test_only_visitor_messages_without_read_at_are_unread() {
        let visitor = Message::outgoing("t", SenderId::Visitor, "a");
        let agent = Message::outgoing("t", SenderId::Agent, "b");
        let mut read = Message::outgoing("t", SenderId::Visitor, "c");
        read.read_at = Some(5);

        assert!(visitor.is_unread());
        assert!(!agent.is_unread());
        assert!(!read.is_unread());
    }
}
