//! Chat session state: the conversation, the streaming controller that fills
//! it, and the command panel fed from shell fences in assistant replies.

pub mod conversation;
pub mod error;
pub mod execution;
pub mod staging;
pub mod stream;

pub use conversation::{Conversation, GREETING};
pub use error::{SendError, StreamError};
pub use execution::{CommandDispatcher, CommandPanel, DeviceDispatcher};
pub use staging::{shell_fences, CommandExtractor, CommandStaging};
pub use stream::{StreamController, StreamUpdate, STREAM_ERROR_TEXT};
