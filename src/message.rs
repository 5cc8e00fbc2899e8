use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Who authored a message in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

/// A single transcript entry. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ConversationRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, role: ConversationRole, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
        }
    }

    /// Message typed by the visitor
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(unique_id("user"), ConversationRole::User, content)
    }

    /// Reply produced by the backend
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(unique_id("ai"), ConversationRole::Assistant, content)
    }

    /// Assistant-authored apology shown when the backend could not be reached
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(unique_id("error"), ConversationRole::Assistant, content)
    }

    /// Restored turn; the id is scoped to its position in the restored list
    pub fn restored(index: usize, role: ConversationRole, content: impl Into<String>) -> Self {
        Self::new(format!("history-{}", index), role, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == ConversationRole::User
    }
}

fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Send lifecycle of the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendState {
    #[default]
    Idle,
    Sending,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn role_uses_lowercase_on_the_wire() {
        assert_eq!(serde_json::to_string(&ConversationRole::User).unwrap(), "\"user\"");
        let role: ConversationRole = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, ConversationRole::Assistant);
        assert_eq!(ConversationRole::Assistant.to_string(), "assistant");
        assert_eq!(ConversationRole::from_str("user").unwrap(), ConversationRole::User);
    }

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let a = ChatMessage::user("hi");
        let b = ChatMessage::user("hi");
        assert!(a.id.starts_with("user-"));
        assert_ne!(a.id, b.id);
        assert!(ChatMessage::assistant("x").id.starts_with("ai-"));
        assert!(ChatMessage::error("x").id.starts_with("error-"));
        assert_eq!(ChatMessage::restored(3, ConversationRole::User, "x").id, "history-3");
    }
}
