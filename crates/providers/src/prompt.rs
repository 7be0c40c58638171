//! System prompt for the Linux assistant persona.

use shared::agent_api::ChatMessage;
use shared::device::SystemDetails;

const PERSONA: &str = "You are Llinux, an expert Linux AI Assistant designed to help users with \
Linux-related questions, problems, and tasks. Your primary goal is to provide accurate, helpful \
information and clear terminal commands. Only give one solution, and provide the commands in order.";

const SHELL_HINT: &str = "Put every terminal command in a fenced ```bash code block.";

/// Build the system prompt, embedding telemetry when the device reported it.
pub fn build_system_prompt(details: Option<&SystemDetails>) -> String {
    let mut prompt = String::from(PERSONA);
    prompt.push(' ');
    prompt.push_str(SHELL_HINT);

    let Some(d) = details else {
        return prompt;
    };

    prompt.push_str("\nSome useful information about the system you are assisting:");
    let fields = [
        ("Hostname", &d.hostname),
        ("Linux Distribution", &d.linux_distribution),
        ("Package Manager", &d.package_manager),
        ("Bootloader", &d.bootloader),
        ("Init System", &d.init_system),
        ("Kernel Version", &d.kernel_version),
        ("CPU", &d.cpu),
        ("GPU", &d.gpu),
        ("Memory", &d.memory),
        ("Docker Installation", &d.is_docker_installed),
        ("Shell", &d.shell),
        ("Display Manager", &d.display_manager),
        ("Desktop Environment", &d.desktop_environment),
        ("Display Server", &d.display_server),
    ];
    for (label, value) in fields {
        let value = if value.trim().is_empty() { "unknown" } else { value.as_str() };
        prompt.push_str(&format!("\n{}: {}", label, value));
    }
    prompt
}

/// The outgoing message list: system prompt first, then the history.
pub fn with_system_prompt(details: Option<&SystemDetails>, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(build_system_prompt(details)));
    messages.extend_from_slice(history);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::agent_api::Role;

    #[test]
    fn test_generic_prompt_without_telemetry() {
        let prompt = build_system_prompt(None);
        assert!(prompt.starts_with("You are Llinux"));
        assert!(!prompt.contains("Hostname"));
    }

    #[test]
    fn test_prompt_embeds_telemetry() {
        let details = SystemDetails {
            hostname: "devbox".into(),
            linux_distribution: "Arch Linux".into(),
            package_manager: "pacman".into(),
            is_docker_installed: "true".into(),
            ..Default::default()
        };
        let prompt = build_system_prompt(Some(&details));
        assert!(prompt.contains("Hostname: devbox"));
        assert!(prompt.contains("Linux Distribution: Arch Linux"));
        assert!(prompt.contains("Package Manager: pacman"));
        assert!(prompt.contains("Docker Installation: true"));
        assert!(prompt.contains("Display Server: unknown"));
    }

    #[test]
    fn test_system_prompt_is_prepended() {
        let history = vec![ChatMessage::assistant("Hello!"), ChatMessage::user("ls?")];
        let messages = with_system_prompt(None, &history);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(&messages[1..], &history[..]);
    }
}
