pub mod device;
pub mod models;
pub mod settings;

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Assistant,
        System,
    }

    impl Role {
        pub fn as_str(&self) -> &'static str {
            match self {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            }
        }

        /// Label shown above a message in the chat area.
        pub fn display_name(&self) -> &'static str {
            match self {
                Role::User => "You",
                Role::Assistant => "LLinux",
                Role::System => "System",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: Role,
        pub content: String,
    }

    impl ChatMessage {
        pub fn new(role: Role, content: impl Into<String>) -> Self {
            Self {
                role,
                content: content.into(),
            }
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self::new(Role::User, content)
        }

        pub fn assistant(content: impl Into<String>) -> Self {
            Self::new(Role::Assistant, content)
        }

        pub fn system(content: impl Into<String>) -> Self {
            Self::new(Role::System, content)
        }
    }

}
