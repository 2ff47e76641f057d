//! In-process engine session for tests/dev.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use sparkcrumbs_core::SessionId;
use sparkcrumbs_events::{
    EngineEvent, EngineListener, EventBus, InMemoryEventBus, ListenerWorker, WorkerHandle,
};

use crate::conf;
use crate::error::SessionError;
use crate::registry::SessionRegistry;
use crate::session::Session;

/// Settings a [`LocalSession`] is started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub app_name: String,
    pub master: String,
    pub version: String,
    pub spark_user: String,
    pub spark_home: Option<String>,
    pub ui_web_url: Option<String>,
    pub conf: BTreeMap<String, String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            app_name: "sparkcrumbs".to_string(),
            master: "local[*]".to_string(),
            version: "3.5.1".to_string(),
            spark_user: std::env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
            spark_home: None,
            ui_web_url: None,
            conf: BTreeMap::new(),
        }
    }
}

impl SessionSettings {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            ..Self::default()
        }
    }

    pub fn with_master(mut self, master: impl Into<String>) -> Self {
        self.master = master.into();
        self
    }

    pub fn with_spark_user(mut self, user: impl Into<String>) -> Self {
        self.spark_user = user.into();
        self
    }

    pub fn with_spark_home(mut self, home: impl Into<String>) -> Self {
        self.spark_home = Some(home.into());
        self
    }

    pub fn with_ui_web_url(mut self, url: impl Into<String>) -> Self {
        self.ui_web_url = Some(url.into());
        self
    }

    pub fn with_conf(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conf.insert(key.into(), value.into());
        self
    }
}

/// A running engine session backed by an [`InMemoryEventBus`].
///
/// Each registered listener gets its own [`ListenerWorker`] thread. Stopping
/// the session drains queued events and clears it from the registry; after
/// that every read fails with [`SessionError::Stopped`].
pub struct LocalSession {
    id: SessionId,
    application_id: String,
    settings: SessionSettings,
    registry: Arc<SessionRegistry>,
    bus: InMemoryEventBus<EngineEvent>,
    properties: RwLock<HashMap<String, String>>,
    workers: Mutex<Vec<(Arc<dyn EngineListener>, WorkerHandle)>>,
    spawned: AtomicUsize,
    property_writes: AtomicUsize,
    stopped: AtomicBool,
}

impl LocalSession {
    /// Start a session and make it the registry's active one.
    pub fn start(mut settings: SessionSettings, registry: Arc<SessionRegistry>) -> Arc<Self> {
        settings
            .conf
            .entry(conf::APP_NAME.to_string())
            .or_insert_with(|| settings.app_name.clone());
        settings
            .conf
            .entry(conf::MASTER.to_string())
            .or_insert_with(|| settings.master.clone());
        settings
            .conf
            .entry(conf::EXECUTOR_ID.to_string())
            .or_insert_with(|| conf::DRIVER_EXECUTOR_ID.to_string());

        let session = Arc::new(Self {
            id: SessionId::new(),
            application_id: format!("local-{}", Utc::now().timestamp_millis()),
            settings,
            registry: registry.clone(),
            bus: InMemoryEventBus::new(),
            properties: RwLock::new(HashMap::new()),
            workers: Mutex::new(Vec::new()),
            spawned: AtomicUsize::new(0),
            property_writes: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
        });

        registry.set_active(session.clone());
        info!(session_id = %session.id, app_name = %session.settings.app_name, "session started");
        session
    }

    /// Publish an event to every registered listener.
    pub fn post(&self, event: EngineEvent) -> Result<(), SessionError> {
        self.ensure_running()?;
        let event_type = event.event_type();
        let delivered = self
            .bus
            .publish(event)
            .map_err(|e| SessionError::unavailable(e.to_string()))?;
        trace!(session_id = %self.id, event_type, delivered, "event posted");
        Ok(())
    }

    /// Stop the session. Idempotent.
    pub fn stop(&self) {
        let workers = {
            let mut guard = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        for (_, worker) in workers {
            worker.shutdown();
        }

        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.bus.close();
        self.registry.clear_if(self.id);
        info!(session_id = %self.id, "session stopped");
    }

    /// Number of listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Number of `set_local_property` calls served.
    pub fn property_writes(&self) -> usize {
        self.property_writes.load(Ordering::SeqCst)
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        if self.is_stopped() {
            return Err(SessionError::Stopped);
        }
        Ok(())
    }
}

impl Session for LocalSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn app_name(&self) -> Result<String, SessionError> {
        self.ensure_running()?;
        Ok(self.settings.app_name.clone())
    }

    fn application_id(&self) -> Result<String, SessionError> {
        self.ensure_running()?;
        Ok(self.application_id.clone())
    }

    fn version(&self) -> Result<String, SessionError> {
        self.ensure_running()?;
        Ok(self.settings.version.clone())
    }

    fn master(&self) -> Result<String, SessionError> {
        self.ensure_running()?;
        Ok(self.settings.master.clone())
    }

    fn spark_home(&self) -> Result<Option<String>, SessionError> {
        self.ensure_running()?;
        Ok(self.settings.spark_home.clone())
    }

    fn ui_web_url(&self) -> Result<Option<String>, SessionError> {
        self.ensure_running()?;
        Ok(self.settings.ui_web_url.clone())
    }

    fn spark_user(&self) -> Result<String, SessionError> {
        self.ensure_running()?;
        Ok(self.settings.spark_user.clone())
    }

    fn conf(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.ensure_running()?;
        Ok(self.settings.conf.get(key).cloned())
    }

    fn set_local_property(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.ensure_running()?;
        let mut props = self.properties.write().unwrap_or_else(PoisonError::into_inner);
        props.insert(key.to_string(), value.to_string());
        self.property_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn local_property(&self, key: &str) -> Result<Option<String>, SessionError> {
        self.ensure_running()?;
        let props = self.properties.read().unwrap_or_else(PoisonError::into_inner);
        Ok(props.get(key).cloned())
    }

    fn add_listener(&self, listener: Arc<dyn EngineListener>) -> Result<(), SessionError> {
        self.ensure_running()?;
        let n = self.spawned.fetch_add(1, Ordering::SeqCst);
        let name = format!("listener-bus-{n}");
        let worker = ListenerWorker::spawn(name.clone(), self.bus.subscribe(), listener.clone())
            .map_err(|e| SessionError::unavailable(e.to_string()))?;

        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((listener, worker));
        debug!(session_id = %self.id, worker = %name, "listener registered");
        Ok(())
    }

    fn remove_listener(&self, listener: &Arc<dyn EngineListener>) -> Result<bool, SessionError> {
        let removed = {
            let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
            workers
                .iter()
                .position(|(l, _)| std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)))
                .map(|i| workers.remove(i))
        };

        // Joined outside the lock; the worker may still be flushing.
        match removed {
            Some((_, worker)) => {
                worker.shutdown();
                debug!(session_id = %self.id, "listener removed");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl core::fmt::Debug for LocalSession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LocalSession")
            .field("id", &self.id)
            .field("application_id", &self.application_id)
            .field("app_name", &self.settings.app_name)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use sparkcrumbs_core::JobId;
    use sparkcrumbs_events::{JobStart, ListenerError};

    use super::*;
    use crate::registry::SessionAccessor;

    #[derive(Default)]
    struct CountJobs {
        started: AtomicUsize,
    }

    impl EngineListener for CountJobs {
        fn on_job_start(&self, _event: &JobStart) -> Result<(), ListenerError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_registry() -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new())
    }

    fn eventually(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn start_registers_active_session_with_defaults() {
        let registry = test_registry();
        let session = LocalSession::start(
            SessionSettings::new("etl").with_conf(conf::DRIVER_HOST, "10.0.0.5"),
            registry.clone(),
        );

        assert_eq!(registry.active_id(), Some(session.id()));
        assert_eq!(session.conf(conf::EXECUTOR_ID).unwrap().as_deref(), Some("driver"));
        assert_eq!(session.conf(conf::APP_NAME).unwrap().as_deref(), Some("etl"));
        assert_eq!(session.conf(conf::DRIVER_HOST).unwrap().as_deref(), Some("10.0.0.5"));
        assert!(session.application_id().unwrap().starts_with("local-"));
    }

    #[test]
    fn stop_fails_reads_and_clears_registry() {
        let registry = test_registry();
        let session = LocalSession::start(SessionSettings::new("etl"), registry.clone());
        assert!(!session.is_stopped());
        session.stop();
        session.stop();

        assert!(session.is_stopped());
        assert!(registry.active().is_none());
        assert_eq!(session.app_name(), Err(SessionError::Stopped));
        assert_eq!(
            session.set_local_property("k", "v"),
            Err(SessionError::Stopped)
        );
    }

    #[test]
    fn stopping_an_old_session_keeps_the_newer_one_active() {
        let registry = test_registry();
        let first = LocalSession::start(SessionSettings::new("a"), registry.clone());
        let second = LocalSession::start(SessionSettings::new("b"), registry.clone());

        first.stop();
        assert_eq!(registry.active_id(), Some(second.id()));
    }

    #[test]
    fn posted_events_reach_listeners() {
        let registry = test_registry();
        let session = LocalSession::start(SessionSettings::new("etl"), registry);
        let listener = Arc::new(CountJobs::default());
        session.add_listener(listener.clone()).unwrap();

        session.post(EngineEvent::job_start(JobId::new(1))).unwrap();
        session.post(EngineEvent::job_start(JobId::new(2))).unwrap();

        assert!(eventually(|| listener.started.load(Ordering::SeqCst) == 2));
        assert_eq!(session.listener_count(), 1);
    }

    #[test]
    fn removed_listener_stops_receiving() {
        let session = LocalSession::start(SessionSettings::new("etl"), test_registry());
        let counter = Arc::new(CountJobs::default());
        let listener: Arc<dyn EngineListener> = counter.clone();
        session.add_listener(listener.clone()).unwrap();

        session.post(EngineEvent::job_start(JobId::new(1))).unwrap();
        assert!(session.remove_listener(&listener).unwrap());
        assert!(!session.remove_listener(&listener).unwrap());
        session.post(EngineEvent::job_start(JobId::new(2))).unwrap();
        session.stop();

        assert_eq!(counter.started.load(Ordering::SeqCst), 1);
        assert_eq!(session.listener_count(), 0);
    }

    #[test]
    fn local_properties_round_trip() {
        let session = LocalSession::start(SessionSettings::new("etl"), test_registry());
        session.set_local_property("app_name", "etl").unwrap();
        assert_eq!(session.local_property("app_name").unwrap().as_deref(), Some("etl"));
        assert_eq!(session.property_writes(), 1);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let json = serde_json::json!({"app_name": "nightly", "conf": {"spark.driver.port": "7077"}});
        let settings: SessionSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.app_name, "nightly");
        assert_eq!(settings.master, "local[*]");
        assert_eq!(settings.conf.get(conf::DRIVER_PORT).map(String::as_str), Some("7077"));
    }
}
