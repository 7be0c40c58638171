use shared::agent_api::{ChatMessage, Role};

pub const GREETING: &str = "Hello! How can I help you today?";

/// Ordered chat history shown to the user.
///
/// `revision` bumps on every mutation so per-frame consumers (command
/// extraction, scroll-to-bottom) can skip unchanged frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    revision: u64,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A fresh conversation seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            revision: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append and return the new message's index.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.revision += 1;
        self.messages.len() - 1
    }

    /// Append the empty assistant message a stream will fill in.
    pub fn begin_reply(&mut self) -> usize {
        self.push(ChatMessage::new(Role::Assistant, String::new()))
    }

    /// Replace the content of message `index`. Returns false when out of range.
    pub fn set_content(&mut self, index: usize, content: impl Into<String>) -> bool {
        match self.messages.get_mut(index) {
            Some(message) => {
                message.content = content.into();
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    /// Start over from the greeting.
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::assistant(GREETING)];
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_with_greeting() {
        let conv = Conversation::new();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.messages()[0], ChatMessage::assistant(GREETING));
    }

    #[test]
    fn test_reply_placeholder_and_overwrite() {
        let mut conv = Conversation::new();
        conv.push(ChatMessage::user("hi"));
        let idx = conv.begin_reply();
        assert_eq!(idx, 2);
        assert_eq!(conv.last().unwrap().content, "");

        let before = conv.revision();
        assert!(conv.set_content(idx, "Hel"));
        assert!(conv.set_content(idx, "Hello"));
        assert_eq!(conv.last().unwrap().content, "Hello");
        assert_eq!(conv.revision(), before + 2);
        assert!(!conv.set_content(10, "x"));
    }

    #[test]
    fn test_reset_returns_to_greeting() {
        let mut conv = Conversation::new();
        conv.push(ChatMessage::user("hi"));
        conv.reset();
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.last().unwrap().role, Role::Assistant);
    }
}
