//! Chat completion providers for the Linux assistant.
//!
//! Every supported model speaks the OpenAI chat-completions wire format;
//! [`router`] picks the endpoint and key, [`openai`] streams the reply.

pub mod adapter;
pub mod error;
pub mod openai;
pub mod prompt;
pub mod router;
pub mod sse;

pub use adapter::{CompletionAdapter, CompletionSource};
pub use error::{ProviderError, Result};
pub use openai::{ChatClient, ChunkStream};
pub use router::ProviderConfig;
