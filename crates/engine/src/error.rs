use thiserror::Error;

/// Failure reading from or writing to an engine session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session was stopped (possibly while the caller was reading it).
    #[error("session stopped")]
    Stopped,

    /// The engine backend could not serve the request.
    #[error("session unavailable: {0}")]
    Unavailable(String),
}

impl SessionError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
