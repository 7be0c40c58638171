//! Drives one streamed completion at a time into a [`Conversation`].
//!
//! The stream runs on a background thread with its own runtime; updates come
//! back over a channel and are applied by [`StreamController::poll`], which
//! the UI calls every frame. Each update carries the full accumulated text,
//! so the reply is overwritten rather than appended to.

use crate::conversation::Conversation;
use crate::error::{SendError, StreamError};
use futures::future::{AbortHandle, Abortable};
use futures::StreamExt;
use providers::{CompletionSource, ProviderError};
use shared::agent_api::ChatMessage;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;

/// Shown in place of the reply when generation fails.
pub const STREAM_ERROR_TEXT: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    /// Everything received so far.
    Content(String),
    Finished(Result<(), StreamError>),
}

struct StreamSession {
    abort: AbortHandle,
    updates: Receiver<StreamUpdate>,
    reply_index: usize,
}

#[derive(Default)]
pub struct StreamController {
    session: Option<StreamSession>,
    last_outcome: Option<Result<(), StreamError>>,
}

impl StreamController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// How the most recent stream ended, once it has.
    pub fn last_outcome(&self) -> Option<&Result<(), StreamError>> {
        self.last_outcome.as_ref()
    }

    /// Append `content` as a user message plus an empty assistant reply and
    /// start streaming into the reply.
    ///
    /// Rejected while another stream is active so at most one reply is
    /// ever being written.
    pub fn send(
        &mut self,
        conversation: &mut Conversation,
        content: &str,
        source: Arc<dyn CompletionSource>,
    ) -> Result<(), SendError> {
        if self.is_active() {
            return Err(SendError::Busy);
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(SendError::Empty);
        }

        conversation.push(ChatMessage::user(content));
        let history = conversation.messages().to_vec();
        let reply_index = conversation.begin_reply();

        let (tx, rx) = channel();
        let (abort, registration) = AbortHandle::new_pair();

        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    let _ = tx.send(StreamUpdate::Finished(Err(StreamError::Failed(format!(
                        "failed to start async runtime: {}",
                        e
                    )))));
                    return;
                }
            };

            let result = rt.block_on(Abortable::new(
                drive_stream(source.as_ref(), history, &tx),
                registration,
            ));
            let outcome = match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(StreamError::Failed(e.to_string())),
                Err(_aborted) => Err(StreamError::Cancelled),
            };
            let _ = tx.send(StreamUpdate::Finished(outcome));
        });

        tracing::debug!(reply_index, "chat stream started");
        self.last_outcome = None;
        self.session = Some(StreamSession {
            abort,
            updates: rx,
            reply_index,
        });
        Ok(())
    }

    /// Cancel the active stream. Content received so far is kept.
    pub fn stop(&mut self) {
        if let Some(session) = &self.session {
            tracing::info!("stopping chat stream");
            session.abort.abort();
        }
    }

    /// Apply pending updates to `conversation`. Returns true if anything
    /// changed.
    pub fn poll(&mut self, conversation: &mut Conversation) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        let reply_index = session.reply_index;

        let mut changed = false;
        let mut finished = None;
        loop {
            match session.updates.try_recv() {
                Ok(StreamUpdate::Content(text)) => {
                    changed |= conversation.set_content(reply_index, text);
                }
                Ok(StreamUpdate::Finished(outcome)) => {
                    finished = Some(outcome);
                    break;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = Some(Err(StreamError::Failed("stream worker exited".into())));
                    break;
                }
            }
        }

        if let Some(outcome) = finished {
            match &outcome {
                Ok(()) => tracing::debug!("chat stream finished"),
                Err(StreamError::Cancelled) => tracing::info!("chat stream cancelled"),
                Err(StreamError::Failed(e)) => {
                    tracing::warn!("chat stream failed: {}", e);
                    conversation.set_content(reply_index, STREAM_ERROR_TEXT);
                }
            }
            self.session = None;
            self.last_outcome = Some(outcome);
            changed = true;
        }
        changed
    }
}

impl Drop for StreamController {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pull chunks from `source`, sending the running total after each one.
pub async fn drive_stream(
    source: &dyn CompletionSource,
    history: Vec<ChatMessage>,
    tx: &Sender<StreamUpdate>,
) -> Result<(), ProviderError> {
    let mut stream = source.stream_completion(history).await?;
    let mut accumulated = String::new();
    while let Some(chunk) = stream.next().await {
        accumulated.push_str(&chunk?);
        if tx.send(StreamUpdate::Content(accumulated.clone())).is_err() {
            // Controller is gone; nobody is listening.
            break;
        }
    }
    Ok(())
}
