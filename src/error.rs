use thiserror::Error;

/// Error taxonomy for the farm engine.
///
/// Every stage returns its error to the immediate caller; nothing is retried
/// or logged on the caller's behalf.
#[derive(Debug, Error)]
pub enum FarmError {
    /// Transport, timeout or HTTP-status failure. Recoverable by retrying
    /// the call.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered but the body is unusable (empty, bad JSON, or
    /// missing the expected structure).
    #[error("invalid data from server: {0}")]
    Data(String),

    /// Operation attempted against a platform the index does not know.
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),

    /// Target box absent from an otherwise valid snapshot. Warning-level:
    /// platform-wide counts in the accompanying result remain valid.
    #[error("box '{0}' not found on this platform")]
    BoxNotFound(String),
}

pub type Result<T> = std::result::Result<T, FarmError>;
