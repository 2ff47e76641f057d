use sparkcrumbs_core::SessionId;
use sparkcrumbs_engine::SessionError;
use thiserror::Error;

/// Bridge installation error.
///
/// These surface on the engine's startup path; enrichment failures never do.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Reading or instrumenting the session failed.
    #[error("session: {0}")]
    Session(#[from] SessionError),

    /// An earlier activation failed and its listener could not be detached.
    /// The session will not be instrumented again.
    #[error("session {0} is partially instrumented")]
    Stranded(SessionId),

    #[error("invalid bridge config: {0}")]
    Config(#[from] serde_json::Error),
}
