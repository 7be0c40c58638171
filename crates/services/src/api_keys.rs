use crate::backend::BackendClient;
use crate::error::Result;
use reqwest::Method;
use shared::models::{Provider, ProviderKeys};

pub const SAVE_FAILED: &str = "Failed to save API keys";

pub fn delete_failed_message(provider: Provider) -> String {
    format!("Failed to delete {} API key", provider.key_name())
}

impl BackendClient {
    /// `GET /api/api-keys`. Absent keys come back blank.
    pub async fn fetch_api_keys(&self) -> Result<ProviderKeys> {
        let req = self.authed(Method::GET, "/api/api-keys")?;
        Self::send_json(req).await
    }

    /// Store `keys`, creating the record (`POST`) when none existed yet and
    /// updating it (`PUT`) otherwise.
    pub async fn save_api_keys(&self, keys: &ProviderKeys, existing: bool) -> Result<()> {
        let method = if existing { Method::PUT } else { Method::POST };
        tracing::info!(%method, "saving provider API keys");
        let req = self.authed(method, "/api/api-keys")?.json(keys);
        Self::send_empty(req).await
    }

    /// `DELETE /api/api-keys?<provider>=true`.
    pub async fn delete_api_key(&self, provider: Provider) -> Result<()> {
        tracing::info!(provider = provider.key_name(), "deleting provider API key");
        let req = self
            .authed(Method::DELETE, "/api/api-keys")?
            .query(&[(provider.key_name(), "true")]);
        Self::send_empty(req).await
    }
}
