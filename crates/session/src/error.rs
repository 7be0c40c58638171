use thiserror::Error;

/// How a generation ended when it did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// Stopped by the user; partial content stays as it is.
    #[error("generation cancelled")]
    Cancelled,

    #[error("generation failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("a response is still being generated")]
    Busy,

    #[error("message is empty")]
    Empty,
}
