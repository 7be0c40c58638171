use crate::error::{ProviderError, Result};
use shared::models::{ModelId, Provider, ProviderKeys};

/// Everything needed to reach the provider serving one model.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub base_url: String,
    pub api_key: String,
    pub model: ModelId,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl ProviderConfig {
    /// Route `model` to its provider using the keys currently on file.
    ///
    /// A missing key is an error value, never a panic: the caller keeps the
    /// model selected and every completion attempt reports the missing key.
    pub fn resolve(model: ModelId, keys: &ProviderKeys) -> Result<Self> {
        let provider = model.provider();
        let api_key = keys
            .key_for(provider)
            .ok_or(ProviderError::MissingCredential(provider))?;
        Ok(Self {
            provider,
            base_url: provider.base_url().to_string(),
            api_key: api_key.to_string(),
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(chatgpt: &str, deepseek: &str) -> ProviderKeys {
        ProviderKeys {
            chatgpt_key: chatgpt.into(),
            deepseek_key: deepseek.into(),
        }
    }

    #[test]
    fn test_openai_models_use_chatgpt_key() {
        let config = ProviderConfig::resolve(ModelId::O4Mini, &keys("sk-open", "sk-deep")).unwrap();
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.api_key, "sk-open");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_deepseek_models_use_deepseek_key() {
        let config =
            ProviderConfig::resolve(ModelId::DeepSeekReasoner, &keys("sk-open", "sk-deep")).unwrap();
        assert_eq!(config.provider, Provider::DeepSeek);
        assert_eq!(config.api_key, "sk-deep");
        assert_eq!(config.base_url, "https://api.deepseek.com");
    }

    #[test]
    fn test_missing_key_is_reported() {
        let err = ProviderConfig::resolve(ModelId::DeepSeekChat, &keys("sk-open", "")).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(Provider::DeepSeek)));
        assert!(err.to_string().contains("deepseek"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ProviderConfig::resolve(ModelId::Gpt41, &keys("sk-secret", "")).unwrap();
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
