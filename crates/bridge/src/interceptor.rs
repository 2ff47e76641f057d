use std::sync::Arc;

use tracing::debug;

use sparkcrumbs_engine::Session;

use crate::guard::{Activation, ActivationGuard};

/// Wraps the engine's session initialization so every new session gets the
/// bridge installed once it has started.
#[derive(Debug, Clone)]
pub struct InitializationInterceptor {
    guard: Arc<ActivationGuard>,
}

impl InitializationInterceptor {
    pub fn new(guard: Arc<ActivationGuard>) -> Self {
        Self { guard }
    }

    pub fn guard(&self) -> &Arc<ActivationGuard> {
        &self.guard
    }

    /// Whether the integration is enabled on the reporter right now.
    pub fn is_enabled(&self) -> bool {
        let integration = &self.guard.config().integration;
        self.guard.reporter().has_integration(integration)
    }

    /// Run `init`, then activate the bridge on the session it produced.
    ///
    /// With the integration disabled this is a plain call to `init`.
    /// Initialization and activation errors both go back to the caller.
    pub fn initialize<S, F>(&self, init: F) -> anyhow::Result<Arc<S>>
    where
        S: Session + 'static,
        F: FnOnce() -> anyhow::Result<Arc<S>>,
    {
        if !self.is_enabled() {
            return init();
        }

        let session = init()?;
        let dyn_session: Arc<dyn Session> = session.clone();
        if self.guard.activate(&dyn_session)? == Activation::AlreadyActive {
            debug!(session_id = %session.id(), "initialized session was already instrumented");
        }
        Ok(session)
    }
}
