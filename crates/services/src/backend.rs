//! REST client for the Llinux backend (auth, keys, paired device).

use crate::error::{ApiError, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(4)
        .build()
        .expect("failed to build HTTP client")
});

/// Header the backend reads the bearer token from.
pub const AUTH_HEADER: &str = "x-auth-token";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl BackendClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.trim().is_empty());
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http.post(self.url(path))
    }

    /// Start a request carrying the session token; fails without one.
    pub(crate) fn authed(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(ApiError::Unauthenticated)?;
        Ok(self
            .http
            .request(method, self.url(path))
            .header(AUTH_HEADER, token))
    }

    /// Send `req` and decode a JSON body, mapping error statuses to
    /// [`ApiError::Server`] with the backend's `msg` when present.
    pub(crate) async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T> {
        let resp = Self::send_checked(req).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send `req` and only check the status.
    pub(crate) async fn send_empty(req: RequestBuilder) -> Result<()> {
        Self::send_checked(req).await.map(|_| ())
    }

    async fn send_checked(req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.msg)
            .filter(|m| !m.trim().is_empty());
        tracing::debug!(status = status.as_u16(), "backend request failed");
        Err(ApiError::Server { status, message })
    }
}
