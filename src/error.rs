//! Unified error type.

/// A boxed error produced by application code (handlers, custom bodies).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shorthand for `Result<T, spout::Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by spout's fallible operations.
///
/// Application-level outcomes (404, 405, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// everything else, and nothing in the crate retries or swallows it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A route collector rejected the methods or the pattern of a route.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A handler returned an error. The original error is the `source()`.
    #[error("handler failed: {0}")]
    Handler(#[source] BoxError),

    /// Writing to the transport, reading a body, or ending a buffering layer failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration, e.g. a zero chunk size.
    #[error("configuration: {0}")]
    Config(String),

    /// A route points at a named controller the application does not know.
    #[error("no handler registered for controller `{0}`")]
    UnresolvedController(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
