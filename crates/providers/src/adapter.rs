use crate::error::{ProviderError, Result};
use crate::openai::{ChatClient, ChunkStream};
use crate::prompt::with_system_prompt;
use crate::router::ProviderConfig;
use async_trait::async_trait;
use shared::agent_api::ChatMessage;
use shared::device::SystemDetails;
use shared::models::{ModelId, ProviderKeys};

/// Something that can stream a completion for a conversation history.
#[async_trait]
pub trait CompletionSource: Send + Sync {
    async fn stream_completion(&self, history: Vec<ChatMessage>) -> Result<ChunkStream>;
}

/// The live completion path: routed provider plus telemetry-aware prompt.
///
/// Built fresh whenever the model, the keys or the telemetry snapshot
/// change; it holds no shared mutable state.
pub struct CompletionAdapter {
    model: ModelId,
    client: std::result::Result<ChatClient, ProviderError>,
    system_details: Option<SystemDetails>,
}

impl CompletionAdapter {
    pub fn new(model: ModelId, keys: &ProviderKeys, system_details: Option<SystemDetails>) -> Self {
        let client = ProviderConfig::resolve(model, keys).map(ChatClient::new);
        if let Err(e) = &client {
            tracing::info!(model = model.as_str(), "completion unavailable: {}", e);
        }
        Self {
            model,
            client,
            system_details,
        }
    }

    /// Point at an explicit endpoint, such as a mock server.
    #[cfg(test)]
    pub(crate) fn from_config(config: ProviderConfig, system_details: Option<SystemDetails>) -> Self {
        Self {
            model: config.model,
            client: Ok(ChatClient::new(config)),
            system_details,
        }
    }
}

#[async_trait]
impl CompletionSource for CompletionAdapter {
    async fn stream_completion(&self, history: Vec<ChatMessage>) -> Result<ChunkStream> {
        let client = match &self.client {
            Ok(client) => client,
            Err(_) => return Err(ProviderError::MissingCredential(self.model.provider())),
        };
        let messages = with_system_prompt(self.system_details.as_ref(), &history);
        client.stream_chat(&messages).await
    }
}
