//! Streaming client for OpenAI-compatible chat completion endpoints.
//!
//! OpenAI and DeepSeek share the wire format, so one client serves both;
//! only the base URL and key differ (see [`crate::router::ProviderConfig`]).

use crate::error::{ProviderError, Result};
use crate::router::ProviderConfig;
use crate::sse::SseParser;
use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::ChatMessage;
use std::collections::VecDeque;
use std::sync::LazyLock;
use std::time::Duration;

static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(15))
        .timeout(Duration::from_secs(300))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// Text deltas of one streamed completion, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<String>>;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

pub struct ChatClient {
    http: Client,
    config: ProviderConfig,
}

impl ChatClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            http: SHARED_HTTP.clone(),
            config,
        }
    }

    /// Start a streamed completion over `messages` (system prompt included).
    ///
    /// Errors before the first byte are returned directly; errors after
    /// that arrive as items of the stream.
    pub async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let req = ChatRequest {
            model: self.config.model.as_str(),
            messages,
            stream: true,
        };
        tracing::debug!(
            provider = ?self.config.provider,
            model = self.config.model.as_str(),
            messages = messages.len(),
            "starting chat completion stream"
        );

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: self.config.provider,
                status,
                detail: body.chars().take(800).collect(),
            });
        }

        let body = resp
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| ProviderError::Stream(e.to_string()))
            })
            .boxed();
        Ok(text_deltas(body))
    }
}

struct DeltaState<S> {
    body: S,
    parser: SseParser,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw SSE byte stream into `choices[0].delta.content` strings.
///
/// Ends at `[DONE]` or when the body closes. Unparseable events are
/// skipped; transport errors end the stream after being yielded.
pub fn text_deltas<S>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<Vec<u8>>> + Send + Unpin + 'static,
{
    let state = DeltaState {
        body,
        parser: SseParser::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(text) = st.pending.pop_front() {
                return Some((Ok(text), st));
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(bytes)) => {
                    for event in st.parser.feed(&bytes) {
                        if event.is_done() {
                            st.finished = true;
                            break;
                        }
                        match serde_json::from_str::<StreamResponse>(&event.data) {
                            Ok(resp) => {
                                let content = resp
                                    .choices
                                    .into_iter()
                                    .next()
                                    .and_then(|c| c.delta)
                                    .and_then(|d| d.content);
                                if let Some(text) = content.filter(|t| !t.is_empty()) {
                                    st.pending.push_back(text);
                                }
                            }
                            Err(e) => tracing::debug!("skipping unparseable stream event: {}", e),
                        }
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e), st));
                }
                None => st.finished = true,
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{ModelId, Provider};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_body(chunks: &[&str]) -> String {
        let mut body = String::new();
        for chunk in chunks {
            let event = serde_json::json!({"choices": [{"delta": {"content": chunk}}]});
            body.push_str(&format!("data: {}\n\n", event));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn byte_chunks(parts: Vec<&str>) -> impl Stream<Item = Result<Vec<u8>>> + Send + Unpin {
        futures::stream::iter(
            parts
                .into_iter()
                .map(|p| Ok(p.as_bytes().to_vec()))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_text_deltas_in_order() {
        let body = sse_body(&["Hel", "lo", " world"]);
        let deltas: Vec<String> = text_deltas(byte_chunks(vec![body.as_str()]))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["Hel", "lo", " world"]);
    }

    #[tokio::test]
    async fn test_text_deltas_survive_arbitrary_splits() {
        let body = sse_body(&["a", "b"]);
        let (left, right) = body.split_at(17);
        let deltas: Vec<String> = text_deltas(byte_chunks(vec![left, right]))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(deltas.concat(), "ab");
    }

    #[tokio::test]
    async fn test_role_only_and_garbage_events_are_skipped() {
        let body = "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
                    data: not-json\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n\
                    data: [DONE]\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n";
        let deltas: Vec<String> = text_deltas(byte_chunks(vec![body]))
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["ok"]);
    }

    #[tokio::test]
    async fn test_transport_error_is_yielded_then_stream_ends() {
        let body = futures::stream::iter(vec![
            Ok(sse_body(&["x"]).replace("data: [DONE]\n\n", "").into_bytes()),
            Err(ProviderError::Stream("reset".into())),
            Ok(b"data: {}\n\n".to_vec()),
        ]);
        let items: Vec<Result<String>> = text_deltas(body).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "x");
        assert!(matches!(items[1], Err(ProviderError::Stream(_))));
    }

    #[tokio::test]
    async fn test_stream_chat_against_mock_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "stream": true,
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body(&["Hi", "!"]), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let client = ChatClient::new(ProviderConfig {
            provider: Provider::DeepSeek,
            base_url: server.uri(),
            api_key: "sk-test".into(),
            model: ModelId::DeepSeekChat,
        });
        let stream = client.stream_chat(&[ChatMessage::user("hi")]).await.unwrap();
        let text: Vec<String> = stream.map(|r| r.unwrap()).collect().await;
        assert_eq!(text.concat(), "Hi!");
    }

    #[tokio::test]
    async fn test_stream_chat_reports_http_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let client = ChatClient::new(ProviderConfig {
            provider: Provider::OpenAI,
            base_url: server.uri(),
            api_key: "bad".into(),
            model: ModelId::Gpt4o,
        });
        let err = match client.stream_chat(&[ChatMessage::user("hi")]).await {
            Err(e) => e,
            Ok(_) => panic!("expected an error"),
        };
        match err {
            ProviderError::Status { status, detail, .. } => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(detail, "invalid api key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
