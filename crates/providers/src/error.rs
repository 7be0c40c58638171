use shared::models::Provider;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The selected model's provider has no API key configured.
    #[error("missing credential: no {} API key configured", .0.key_name())]
    MissingCredential(Provider),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} error: {status}{}", detail_suffix(.detail))]
    Status {
        provider: Provider,
        status: reqwest::StatusCode,
        detail: String,
    },

    #[error("stream read error: {0}")]
    Stream(String),
}

fn detail_suffix(detail: &str) -> String {
    if detail.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", detail)
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
