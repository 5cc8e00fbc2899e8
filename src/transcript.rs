//! Ordered conversation shown to the visitor

use crate::message::{ChatMessage, ConversationRole};
use crate::prompts::GREETING_ID;

/// Append-only list of messages. Insertion order is display order.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    /// Start a transcript with the fixed greeting
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::new(
                GREETING_ID,
                ConversationRole::Assistant,
                greeting,
            )],
        }
    }

    /// Add a message to the end
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Insert restored turns right after the greeting, keeping their order
    pub fn restore(&mut self, history: Vec<ChatMessage>) {
        if history.is_empty() {
            return;
        }
        self.messages.splice(1..1, history);
    }

    pub fn greeting(&self) -> &ChatMessage {
        &self.messages[0]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; the greeting is never removed
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True while nothing but the greeting has been shown
    pub fn only_greeting(&self) -> bool {
        self.messages.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_greeting() {
        let transcript = Transcript::new("hello");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.greeting().id, GREETING_ID);
        assert_eq!(transcript.greeting().role, ConversationRole::Assistant);
        assert!(transcript.only_greeting());
    }

    #[test]
    fn restore_goes_after_greeting() {
        let mut transcript = Transcript::new("hello");
        let late = ChatMessage::user("typed early");
        transcript.append(late.clone());
        transcript.restore(vec![
            ChatMessage::restored(0, ConversationRole::User, "A"),
            ChatMessage::restored(1, ConversationRole::Assistant, "B"),
        ]);

        let contents: Vec<_> = transcript.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hello", "A", "B", "typed early"]);
        assert_eq!(transcript.last(), Some(&late));
    }

    #[test]
    fn empty_restore_is_noop() {
        let mut transcript = Transcript::new("hello");
        transcript.restore(Vec::new());
        assert!(transcript.only_greeting());
    }
}
