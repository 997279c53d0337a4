//! Error types for the chat backend.

use thiserror::Error;

/// Top-level error type for the bot core.
#[derive(Debug, Error)]
pub enum BotError {
    /// The inbound message was empty or otherwise unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The active behavior profile refuses to handle requests.
    #[error("behavior profile '{0}' is disabled")]
    ProfileDisabled(String),
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A capability client failed.
    #[error("capability error: {0}")]
    Capability(#[from] CapabilityError),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for bot operations.
pub type BotResult<T> = Result<T, BotError>;

/// Errors produced by the external capability clients (catalog and
/// language model). The orchestrator folds all of these into fallback
/// text; only a surrounding HTTP layer distinguishes them.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// A required credential is not configured.
    #[error("missing credential: {0}")]
    MissingCredential(String),
    /// The client-side or upstream rate limit was exceeded.
    #[error("rate limit exceeded")]
    RateLimited,
    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Transport-level HTTP failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The upstream API answered with an unexpected payload or status.
    #[error("unexpected api response: {0}")]
    Api(String),
}

/// Convenience result alias for capability client operations.
pub type CapabilityResult<T> = Result<T, CapabilityError>;
