use thiserror::Error;

/// Failures surfaced to the caller as error responses.
///
/// Anything that only means "no hint right now" is an
/// [`Unavailable`](crate::Unavailable) reason instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown document: {0}")]
    UnknownDocument(String),

    #[error("invalid edit in {uri}: {reason}")]
    InvalidEdit { uri: String, reason: String },

    #[error("stale change for {uri}: version {received} is not newer than {current}")]
    StaleChange {
        uri: String,
        current: i32,
        received: i32,
    },

    #[error("analysis worker failed: {0}")]
    Worker(String),
}
