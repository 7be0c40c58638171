//! The command staging list and shell-fence extraction that feeds it.

use crate::conversation::Conversation;
use regex::Regex;
use shared::agent_api::Role;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

// Only closed fences match, so a fence still being streamed is ignored
// until its closing marker arrives.
static SHELL_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:sh|bash)[ \t]*\r?\n([\s\S]*?)```").expect("valid shell fence regex")
});

/// User-editable queue of commands waiting to be sent to the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandStaging {
    commands: Vec<String>,
}

impl CommandStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Append the trimmed command; blank input is ignored.
    pub fn add(&mut self, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty() {
            return false;
        }
        self.commands.push(command.to_string());
        true
    }

    /// Replace entry `index` in place.
    pub fn edit(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.commands.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, index: usize) -> Option<String> {
        (index < self.commands.len()).then(|| self.commands.remove(index))
    }

    /// Move entry `from` so it ends up at `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.commands.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            let command = self.commands.remove(from);
            self.commands.insert(to, command);
        }
        true
    }

    /// Drop one entry per dispatched command. Anything staged after the
    /// dispatch started stays queued.
    pub fn remove_dispatched(&mut self, dispatched: &[String]) {
        for command in dispatched {
            if let Some(pos) = self.commands.iter().position(|c| c == command) {
                self.commands.remove(pos);
            }
        }
    }
}

/// Trimmed, non-empty bodies of every closed `sh`/`bash` fence in `content`.
pub fn shell_fences(content: &str) -> Vec<String> {
    SHELL_FENCE_RE
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|body| !body.is_empty())
        .collect()
}

/// Stages each shell fence of a message once for the message's lifetime,
/// however often its content is re-scanned while streaming.
#[derive(Debug, Default)]
pub struct CommandExtractor {
    seen: HashMap<usize, HashSet<String>>,
    scanned_revision: Option<u64>,
}

impl CommandExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage unseen fences of the message at `message_index`. Returns how
    /// many commands were added.
    pub fn extract_from_message(
        &mut self,
        message_index: usize,
        content: &str,
        staging: &mut CommandStaging,
    ) -> usize {
        let seen = self.seen.entry(message_index).or_default();
        let mut added = 0;
        for body in shell_fences(content) {
            if seen.insert(body.clone()) && staging.add(&body) {
                added += 1;
            }
        }
        added
    }

    /// Scan every assistant message; a no-op when the conversation has not
    /// changed since the last scan.
    pub fn scan(&mut self, conversation: &Conversation, staging: &mut CommandStaging) -> usize {
        if self.scanned_revision == Some(conversation.revision()) {
            return 0;
        }
        self.scanned_revision = Some(conversation.revision());

        let mut added = 0;
        for (index, message) in conversation.messages().iter().enumerate() {
            if message.role == Role::Assistant {
                added += self.extract_from_message(index, &message.content, staging);
            }
        }
        if added > 0 {
            tracing::debug!(added, "staged commands from assistant reply");
        }
        added
    }

    /// Forget every message; used when the conversation is reset.
    pub fn reset(&mut self) {
        self.seen.clear();
        self.scanned_revision = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::agent_api::ChatMessage;

    fn staged(items: &[&str]) -> CommandStaging {
        let mut staging = CommandStaging::new();
        for item in items {
            staging.add(item);
        }
        staging
    }

    #[test]
    fn test_add_trims_and_ignores_blank() {
        let mut staging = CommandStaging::new();
        assert!(staging.add("  ls -la \n"));
        assert!(!staging.add("   "));
        assert!(!staging.add(""));
        assert_eq!(staging.as_slice(), ["ls -la"]);
    }

    #[test]
    fn test_edit_and_delete() {
        let mut staging = staged(&["a", "b", "c"]);
        assert!(staging.edit(1, "B"));
        assert!(!staging.edit(3, "x"));
        assert_eq!(staging.delete(0), Some("a".to_string()));
        assert_eq!(staging.delete(5), None);
        assert_eq!(staging.as_slice(), ["B", "c"]);
    }

    #[test]
    fn test_reorder_moves_entry() {
        let mut staging = staged(&["a", "b", "c", "d"]);
        assert!(staging.reorder(0, 2));
        assert_eq!(staging.as_slice(), ["b", "c", "a", "d"]);
        assert!(staging.reorder(3, 0));
        assert_eq!(staging.as_slice(), ["d", "b", "c", "a"]);
        assert!(!staging.reorder(0, 4));
        assert!(!staging.reorder(4, 0));
        assert_eq!(staging.len(), 4);
    }

    #[test]
    fn test_reorder_preserves_entries_for_every_pair() {
        let original = ["a", "b", "c", "d", "e"];
        for from in 0..original.len() {
            for to in 0..original.len() {
                let mut staging = staged(&original);
                assert!(staging.reorder(from, to));
                let mut got = staging.as_slice().to_vec();
                got.sort();
                assert_eq!(got, original);
                assert_eq!(staging.as_slice()[to], original[from]);
            }
        }
    }

    #[test]
    fn test_delete_keeps_relative_order() {
        for i in 0..4 {
            let mut staging = staged(&["a", "b", "c", "d"]);
            staging.delete(i);
            let mut expected = vec!["a", "b", "c", "d"];
            expected.remove(i);
            assert_eq!(staging.as_slice(), expected.as_slice());
        }
    }

    #[test]
    fn test_remove_dispatched_keeps_later_additions() {
        let mut staging = staged(&["ls", "df -h", "ls", "uptime"]);
        staging.remove_dispatched(&["ls".to_string(), "uptime".to_string()]);
        assert_eq!(staging.as_slice(), ["df -h", "ls"]);
        staging.remove_dispatched(&["whoami".to_string()]);
        assert_eq!(staging.as_slice(), ["df -h", "ls"]);
    }

    #[test]
    fn test_shell_fences() {
        let content = "Run these:\n```bash\nsudo apt update\n```\nthen\n```sh\n  df -h  \n```\n\
                       not this:\n```python\nprint(1)\n```\n```bash\n\n```";
        assert_eq!(shell_fences(content), vec!["sudo apt update", "df -h"]);
    }

    #[test]
    fn test_open_fence_does_not_match() {
        assert!(shell_fences("```bash\nsudo apt upd").is_empty());
        assert!(shell_fences("```bash\nsudo apt update\n``").is_empty());
    }

    #[test]
    fn test_extract_is_idempotent_per_message() {
        let mut extractor = CommandExtractor::new();
        let mut staging = CommandStaging::new();
        let content = "```bash\nls\n```\nand\n```bash\npwd\n```";

        assert_eq!(extractor.extract_from_message(1, content, &mut staging), 2);
        assert_eq!(extractor.extract_from_message(1, content, &mut staging), 0);
        assert_eq!(staging.as_slice(), ["ls", "pwd"]);

        // A deleted command is not re-staged from the same message.
        staging.delete(0);
        assert_eq!(extractor.extract_from_message(1, content, &mut staging), 0);
        assert_eq!(staging.as_slice(), ["pwd"]);
    }

    #[test]
    fn test_same_command_in_another_message_is_staged_again() {
        let mut extractor = CommandExtractor::new();
        let mut staging = CommandStaging::new();
        extractor.extract_from_message(1, "```bash\nls\n```", &mut staging);
        extractor.extract_from_message(3, "```bash\nls\n```", &mut staging);
        assert_eq!(staging.as_slice(), ["ls", "ls"]);
    }

    #[test]
    fn test_scan_follows_streaming_reply() {
        let mut conv = Conversation::new();
        let mut extractor = CommandExtractor::new();
        let mut staging = CommandStaging::new();

        conv.push(ChatMessage::user("```bash\nrm -rf /\n```"));
        let idx = conv.begin_reply();
        let reply = "Try:\n```bash\nfree -h\n```";
        for end in 1..=reply.len() {
            conv.set_content(idx, &reply[..end]);
            extractor.scan(&conv, &mut staging);
        }
        assert_eq!(extractor.scan(&conv, &mut staging), 0);
        assert_eq!(staging.as_slice(), ["free -h"]);
    }
}
