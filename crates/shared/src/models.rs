//! Model catalog and provider credentials.
//!
//! The client talks to two OpenAI-compatible vendors. Which one serves a
//! request is decided purely by the model identifier's prefix.

use serde::{Deserialize, Serialize};

/// A remote LLM vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    OpenAI,
    DeepSeek,
}

/// Model identifier prefixes and the provider that serves them.
const ROUTES: &[(&str, Provider)] = &[
    ("gpt-", Provider::OpenAI),
    ("o3", Provider::OpenAI),
    ("o4", Provider::OpenAI),
    ("deepseek-", Provider::DeepSeek),
];

impl Provider {
    /// Resolve the provider for a raw model identifier by prefix.
    pub fn for_model(model_id: &str) -> Option<Provider> {
        ROUTES
            .iter()
            .find(|(prefix, _)| model_id.starts_with(prefix))
            .map(|(_, provider)| *provider)
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::DeepSeek => "https://api.deepseek.com",
        }
    }

    /// Name used by the backend key store (`chatgpt_key`, `?chatgpt=true`).
    pub fn key_name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "chatgpt",
            Provider::DeepSeek => "deepseek",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "ChatGPT (OpenAI)",
            Provider::DeepSeek => "DeepSeek",
        }
    }

    pub fn all() -> &'static [Provider] {
        &[Provider::OpenAI, Provider::DeepSeek]
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The fixed set of selectable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "gpt-4.1")]
    Gpt41,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "o3")]
    O3,
    #[serde(rename = "o4-mini")]
    O4Mini,
    #[serde(rename = "deepseek-chat")]
    DeepSeekChat,
    #[serde(rename = "deepseek-reasoner")]
    DeepSeekReasoner,
}

impl Default for ModelId {
    fn default() -> Self {
        ModelId::Gpt41
    }
}

impl ModelId {
    pub fn all() -> &'static [ModelId] {
        &[
            ModelId::Gpt41,
            ModelId::Gpt4o,
            ModelId::O3,
            ModelId::O4Mini,
            ModelId::DeepSeekChat,
            ModelId::DeepSeekReasoner,
        ]
    }

    /// Identifier sent to the provider in the `model` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt41 => "gpt-4.1",
            ModelId::Gpt4o => "gpt-4o",
            ModelId::O3 => "o3",
            ModelId::O4Mini => "o4-mini",
            ModelId::DeepSeekChat => "deepseek-chat",
            ModelId::DeepSeekReasoner => "deepseek-reasoner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.as_str() == s.trim())
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelId::Gpt41 => "GPT-4.1",
            ModelId::Gpt4o => "GPT-4o",
            ModelId::O3 => "o3",
            ModelId::O4Mini => "o4-mini",
            ModelId::DeepSeekChat => "DeepSeek-V3",
            ModelId::DeepSeekReasoner => "DeepSeek-R1",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelId::Gpt41 => "Great for quick coding and analysis",
            ModelId::Gpt4o | ModelId::DeepSeekChat => "Great for most tasks",
            ModelId::O3 | ModelId::DeepSeekReasoner => "Powerful at advanced reasoning",
            ModelId::O4Mini => "Fast at advanced reasoning",
        }
    }

    /// Every catalog entry routes, so this never falls through.
    pub fn provider(&self) -> Provider {
        Provider::for_model(self.as_str()).unwrap_or(Provider::OpenAI)
    }
}

/// Per-user provider API keys as stored by the backend.
///
/// The backend reports a missing key as an empty string, so blank values
/// are treated as absent everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderKeys {
    #[serde(default, deserialize_with = "crate::device::loose_string")]
    pub chatgpt_key: String,
    #[serde(default, deserialize_with = "crate::device::loose_string")]
    pub deepseek_key: String,
}

impl ProviderKeys {
    pub fn key_for(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::OpenAI => self.chatgpt_key.as_str(),
            Provider::DeepSeek => self.deepseek_key.as_str(),
        };
        let key = key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    pub fn key_mut(&mut self, provider: Provider) -> &mut String {
        match provider {
            Provider::OpenAI => &mut self.chatgpt_key,
            Provider::DeepSeek => &mut self.deepseek_key,
        }
    }

    pub fn is_empty(&self) -> bool {
        Provider::all().iter().all(|p| self.key_for(*p).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_routing() {
        assert_eq!(Provider::for_model("gpt-4.1"), Some(Provider::OpenAI));
        assert_eq!(Provider::for_model("o4-mini"), Some(Provider::OpenAI));
        assert_eq!(Provider::for_model("deepseek-reasoner"), Some(Provider::DeepSeek));
        assert_eq!(Provider::for_model("llama3"), None);
    }

    #[test]
    fn test_catalog_roundtrips_through_identifier() {
        for model in ModelId::all() {
            assert_eq!(ModelId::parse(model.as_str()), Some(*model));
            let json = serde_json::to_string(model).unwrap();
            assert_eq!(json, format!("\"{}\"", model.as_str()));
        }
    }

    #[test]
    fn test_catalog_providers() {
        assert_eq!(ModelId::O3.provider(), Provider::OpenAI);
        assert_eq!(ModelId::DeepSeekChat.provider(), Provider::DeepSeek);
        assert_eq!(ModelId::DeepSeekChat.display_name(), "DeepSeek-V3");
    }

    #[test]
    fn test_blank_keys_are_absent() {
        let keys: ProviderKeys =
            serde_json::from_str(r#"{"chatgpt_key":"sk-1","deepseek_key":"  "}"#).unwrap();
        assert_eq!(keys.key_for(Provider::OpenAI), Some("sk-1"));
        assert_eq!(keys.key_for(Provider::DeepSeek), None);
        assert!(!keys.is_empty());
        assert!(ProviderKeys::default().is_empty());
    }

    #[test]
    fn test_null_keys_deserialize_as_blank() {
        let keys: ProviderKeys = serde_json::from_str(r#"{"chatgpt_key":null}"#).unwrap();
        assert!(keys.is_empty());
    }
}
