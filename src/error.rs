//! Error type shared by every client operation.
//!
//! Nothing is retried or translated inside the crate: each variant reaches the
//! caller as-is so it can decide whether to re-authenticate, retry or give up.

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input was missing or empty. Raised before any request is built.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation needs a session that was never established.
    #[error("Not authenticated: call authenticate() first")]
    Unauthenticated,

    /// The service answered with a non-success HTTP status.
    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// The response parsed but did not have the expected shape.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Malformed compact date '{0}'")]
    MalformedDate(String),

    #[error("Malformed compact time '{0}'")]
    MalformedTime(String),

    /// A timetable period points at an entity the payload does not contain.
    #[error("Period on {date} references missing element (type {element_type}, id {id:?})")]
    MissingReference {
        element_type: i64,
        id: Option<i64>,
        date: String,
    },

    /// The requester failed before a response status was available.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    pub(crate) fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
