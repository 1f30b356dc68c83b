/// Result alias used throughout the crate.
pub type RenderResult<T> = Result<T, RenderError>;

/// Error taxonomy for a render session.
///
/// Only [`RenderError::Asset`], [`RenderError::Encode`] and I/O failures surfaced through
/// [`RenderError::Other`] abort a session. Sampling misses and filter initialization failures are
/// recovered locally and never reach this type.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// The render request or configuration is malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// An asset failed to load or decode. Session-fatal.
    #[error("asset error: {0}")]
    Asset(String),

    /// A filter could not be parsed or executed.
    #[error("filter error: {0}")]
    Filter(String),

    /// The frame sink or the external encoder failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// (De)serialization of a request or configuration failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The session was cancelled through its cancellation token.
    #[error("render cancelled")]
    Cancelled,

    /// Any other failure, with its source chain preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RenderError {
    /// Construct a [`RenderError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Construct a [`RenderError::Asset`].
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Construct a [`RenderError::Filter`].
    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter(msg.into())
    }

    /// Construct a [`RenderError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Construct a [`RenderError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors caused by cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
