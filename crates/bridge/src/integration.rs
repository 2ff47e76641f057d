use std::sync::{Arc, Mutex, PoisonError};

use sparkcrumbs_engine::SessionAccessor;
use sparkcrumbs_reporting::Reporter;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::guard::ActivationGuard;
use crate::interceptor::InitializationInterceptor;

/// Entry point wiring the bridge into a reporter and an engine.
///
/// ```ignore
/// let integration = SparkIntegration::new(BridgeConfig::default());
/// let interceptor = integration.setup_once(reporter, registry.clone())?;
/// let session = interceptor.initialize(|| Ok(LocalSession::start(settings, registry)))?;
/// ```
#[derive(Debug, Default)]
pub struct SparkIntegration {
    config: BridgeConfig,
    interceptor: Mutex<Option<InitializationInterceptor>>,
}

impl SparkIntegration {
    pub const IDENTIFIER: &'static str = "spark";

    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            interceptor: Mutex::new(None),
        }
    }

    /// Default config with environment overrides applied.
    pub fn from_env() -> Self {
        Self::new(BridgeConfig::default().with_env_overrides())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Install the bridge. Later calls return the first successful call's
    /// interceptor.
    ///
    /// If a session is already active (the process started the engine before
    /// the bridge was set up) it is activated right away. Sessions created
    /// afterwards must go through the returned interceptor.
    pub fn setup_once(
        &self,
        reporter: Arc<dyn Reporter>,
        sessions: Arc<dyn SessionAccessor>,
    ) -> Result<InitializationInterceptor, BridgeError> {
        // Held for the whole setup so racing callers cannot both activate.
        let mut slot = self.interceptor.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slot.as_ref() {
            return Ok(existing.clone());
        }

        let guard = Arc::new(ActivationGuard::new(
            reporter,
            sessions.clone(),
            self.config.clone(),
        ));
        let interceptor = InitializationInterceptor::new(guard.clone());

        if interceptor.is_enabled() {
            if let Some(session) = sessions.active() {
                guard.activate(&session)?;
            }
        }

        *slot = Some(interceptor.clone());
        Ok(interceptor)
    }
}
