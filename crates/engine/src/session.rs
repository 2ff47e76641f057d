use std::sync::Arc;

use sparkcrumbs_core::SessionId;
use sparkcrumbs_events::EngineListener;

use crate::error::SessionError;

/// An engine session as seen from the outside.
///
/// Every accessor is fallible: a session can be torn down by another thread
/// at any point, after which reads return [`SessionError::Stopped`].
pub trait Session: Send + Sync {
    fn id(&self) -> SessionId;

    /// Whether the session has been torn down.
    fn is_stopped(&self) -> bool;

    fn app_name(&self) -> Result<String, SessionError>;

    fn application_id(&self) -> Result<String, SessionError>;

    /// Engine version string.
    fn version(&self) -> Result<String, SessionError>;

    /// Cluster manager address, e.g. `local[*]` or `yarn`.
    fn master(&self) -> Result<String, SessionError>;

    fn spark_home(&self) -> Result<Option<String>, SessionError>;

    fn ui_web_url(&self) -> Result<Option<String>, SessionError>;

    /// User the session runs as.
    fn spark_user(&self) -> Result<String, SessionError>;

    /// Look up a configuration entry (see [`crate::conf`]).
    fn conf(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Set a property that is shipped to remote workers with every task.
    fn set_local_property(&self, key: &str, value: &str) -> Result<(), SessionError>;

    fn local_property(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Subscribe a listener to the session's event bus.
    fn add_listener(&self, listener: Arc<dyn EngineListener>) -> Result<(), SessionError>;

    /// Detach a listener previously passed to [`Session::add_listener`],
    /// matched by pointer. Returns whether it was attached.
    ///
    /// Events already queued for the listener are still delivered.
    fn remove_listener(&self, listener: &Arc<dyn EngineListener>) -> Result<bool, SessionError>;
}
