//! Report-time enrichment with session metadata.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use sparkcrumbs_core::SessionId;
use sparkcrumbs_engine::{Session, SessionAccessor, SessionError, conf};
use sparkcrumbs_reporting::{EventProcessor, Hint, Report, Reporter};

pub const TAG_EXECUTOR_ID: &str = "executor.id";
pub const TAG_DEPLOY_MODE: &str = "spark-submit.deployMode";
pub const TAG_DRIVER_HOST: &str = "driver.host";
pub const TAG_DRIVER_PORT: &str = "driver.port";
pub const TAG_SPARK_VERSION: &str = "spark_version";
pub const TAG_APP_NAME: &str = "app_name";
pub const TAG_APPLICATION_ID: &str = "application_id";
pub const TAG_MASTER: &str = "master";
pub const TAG_SPARK_HOME: &str = "spark_home";
pub const EXTRA_WEB_URL: &str = "web_url";

/// Fills report fields from the session it was installed for.
///
/// Only writes fields the report does not already carry, and only reads a
/// session attribute when its field is missing. Never fails the report:
/// a session read error leaves the report as far as it got.
pub struct EventEnricher {
    reporter: Weak<dyn Reporter>,
    sessions: Arc<dyn SessionAccessor>,
    session_id: SessionId,
    integration: String,
}

impl EventEnricher {
    /// `reporter` is held weakly; the reporter owns the processor built from
    /// this enricher.
    pub fn new(
        reporter: &Arc<dyn Reporter>,
        sessions: Arc<dyn SessionAccessor>,
        session_id: SessionId,
        integration: impl Into<String>,
    ) -> Self {
        Self {
            reporter: Arc::downgrade(reporter),
            sessions,
            session_id,
            integration: integration.into(),
        }
    }

    pub fn into_processor(self) -> EventProcessor {
        Arc::new(move |report: Report, hint: &Hint| self.process(report, hint))
    }

    /// Processor entry point. Always hands the report back, even if the
    /// session implementation panics mid-read.
    pub fn process(&self, mut report: Report, _hint: &Hint) -> Option<Report> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match self.target_session() {
            Some(session) => enrich(&*session, &mut report),
            None => Ok(()),
        }));

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                debug!(session_id = %self.session_id, error = %err, "report enrichment stopped early");
            }
            Err(_) => {
                warn!(session_id = %self.session_id, "session panicked during report enrichment");
            }
        }
        Some(report)
    }

    /// The session to read from, if the bridge is on and it is still active.
    fn target_session(&self) -> Option<Arc<dyn Session>> {
        let reporter = self.reporter.upgrade()?;
        if !reporter.has_integration(&self.integration) {
            return None;
        }

        let session = self.sessions.active()?;
        // An enricher left over from an earlier session must not tag reports
        // with the new session's identity.
        (session.id() == self.session_id).then_some(session)
    }
}

/// Merge session metadata into `report` without replacing existing values.
pub fn enrich(session: &dyn Session, report: &mut Report) -> Result<(), SessionError> {
    let has_user_id = report.user.as_ref().is_some_and(|u| u.id.is_some());
    if !has_user_id {
        report.set_user_id_if_absent(session.spark_user()?);
    }

    tag(report, TAG_EXECUTOR_ID, || session.conf(conf::EXECUTOR_ID))?;
    tag(report, TAG_DEPLOY_MODE, || session.conf(conf::SUBMIT_DEPLOY_MODE))?;
    tag(report, TAG_DRIVER_HOST, || session.conf(conf::DRIVER_HOST))?;
    tag(report, TAG_DRIVER_PORT, || session.conf(conf::DRIVER_PORT))?;
    tag(report, TAG_SPARK_VERSION, || session.version().map(Some))?;
    tag(report, TAG_APP_NAME, || session.app_name().map(Some))?;
    tag(report, TAG_APPLICATION_ID, || session.application_id().map(Some))?;
    tag(report, TAG_MASTER, || session.master().map(Some))?;
    tag(report, TAG_SPARK_HOME, || session.spark_home())?;

    if !report.extra.contains_key(EXTRA_WEB_URL) {
        if let Some(url) = session.ui_web_url()? {
            report.set_extra_if_absent(EXTRA_WEB_URL, url);
        }
    }
    Ok(())
}

fn tag<F>(report: &mut Report, key: &str, read: F) -> Result<(), SessionError>
where
    F: FnOnce() -> Result<Option<String>, SessionError>,
{
    if report.tags.contains_key(key) {
        return Ok(());
    }
    if let Some(value) = read()? {
        report.set_tag_if_absent(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use proptest::prelude::*;
    use sparkcrumbs_engine::{LocalSession, SessionRegistry, SessionSettings};
    use sparkcrumbs_events::EngineListener;
    use sparkcrumbs_reporting::{InMemoryReporter, Level};

    use super::*;

    const INTEGRATION: &str = "spark";

    fn test_settings() -> SessionSettings {
        SessionSettings::new("etl")
            .with_master("yarn")
            .with_spark_user("etl-bot")
            .with_spark_home("/opt/spark")
            .with_ui_web_url("http://driver:4040")
            .with_conf(conf::SUBMIT_DEPLOY_MODE, "cluster")
            .with_conf(conf::DRIVER_HOST, "10.0.0.5")
            .with_conf(conf::DRIVER_PORT, "40123")
    }

    struct Fixture {
        reporter: Arc<InMemoryReporter>,
        registry: Arc<SessionRegistry>,
    }

    fn setup() -> Fixture {
        Fixture {
            reporter: Arc::new(InMemoryReporter::new().with_integration(INTEGRATION)),
            registry: Arc::new(SessionRegistry::new()),
        }
    }

    fn enricher_for(f: &Fixture, session_id: SessionId) -> EventEnricher {
        let reporter: Arc<dyn Reporter> = f.reporter.clone();
        EventEnricher::new(&reporter, f.registry.clone(), session_id, INTEGRATION)
    }

    #[test]
    fn fills_every_field_from_the_session() {
        let f = setup();
        let session = LocalSession::start(test_settings(), f.registry.clone());
        let enricher = enricher_for(&f, session.id());

        let report = enricher.process(Report::new(Level::Error), &Hint::new()).unwrap();

        assert_eq!(report.user.unwrap().id.as_deref(), Some("etl-bot"));
        assert_eq!(report.tags[TAG_EXECUTOR_ID], "driver");
        assert_eq!(report.tags[TAG_DEPLOY_MODE], "cluster");
        assert_eq!(report.tags[TAG_DRIVER_HOST], "10.0.0.5");
        assert_eq!(report.tags[TAG_DRIVER_PORT], "40123");
        assert_eq!(report.tags[TAG_SPARK_VERSION], "3.5.1");
        assert_eq!(report.tags[TAG_APP_NAME], "etl");
        assert_eq!(report.tags[TAG_APPLICATION_ID], session.application_id().unwrap());
        assert_eq!(report.tags[TAG_MASTER], "yarn");
        assert_eq!(report.tags[TAG_SPARK_HOME], "/opt/spark");
        assert_eq!(report.extra[EXTRA_WEB_URL], "http://driver:4040");
    }

    #[test]
    fn caller_values_win() {
        let f = setup();
        let session = LocalSession::start(test_settings(), f.registry.clone());
        let enricher = enricher_for(&f, session.id());

        let report = Report::new(Level::Error)
            .with_user_id("alice")
            .with_tag(TAG_APP_NAME, "X")
            .with_extra(EXTRA_WEB_URL, "http://proxy/ui");
        let report = enricher.process(report, &Hint::new()).unwrap();

        assert_eq!(report.user.unwrap().id.as_deref(), Some("alice"));
        assert_eq!(report.tags[TAG_APP_NAME], "X");
        assert_eq!(report.extra[EXTRA_WEB_URL], "http://proxy/ui");
        assert_eq!(report.tags[TAG_MASTER], "yarn");
    }

    #[test]
    fn unset_optional_values_are_skipped() {
        let f = setup();
        let session = LocalSession::start(SessionSettings::new("bare"), f.registry.clone());
        let enricher = enricher_for(&f, session.id());

        let report = enricher.process(Report::new(Level::Error), &Hint::new()).unwrap();

        assert!(!report.tags.contains_key(TAG_SPARK_HOME));
        assert!(!report.tags.contains_key(TAG_DRIVER_PORT));
        assert!(!report.extra.contains_key(EXTRA_WEB_URL));
        assert_eq!(report.tags[TAG_APP_NAME], "bare");
    }

    #[test]
    fn no_active_session_leaves_report_untouched() {
        let f = setup();
        let session = LocalSession::start(test_settings(), f.registry.clone());
        let enricher = enricher_for(&f, session.id());
        session.stop();

        let before = Report::message(Level::Error, "boom").with_tag("k", "v");
        let after = enricher.process(before.clone(), &Hint::new()).unwrap();
        assert_eq!(after, before);
    }

    #[test]
    fn disabled_integration_leaves_report_untouched() {
        let f = setup();
        let session = LocalSession::start(test_settings(), f.registry.clone());
        let enricher = enricher_for(&f, session.id());
        f.reporter.disable_integration(INTEGRATION);

        let before = Report::new(Level::Error);
        assert_eq!(enricher.process(before.clone(), &Hint::new()).unwrap(), before);
    }

    #[test]
    fn stale_enricher_ignores_newer_session() {
        let f = setup();
        let old = LocalSession::start(SessionSettings::new("old"), f.registry.clone());
        let stale = enricher_for(&f, old.id());
        let _new = LocalSession::start(SessionSettings::new("new"), f.registry.clone());

        let before = Report::new(Level::Error);
        assert_eq!(stale.process(before.clone(), &Hint::new()).unwrap(), before);
    }

    #[test]
    fn dropped_reporter_disables_enrichment() {
        let f = setup();
        let session = LocalSession::start(test_settings(), f.registry.clone());
        let enricher = enricher_for(&f, session.id());
        drop(f.reporter);

        let before = Report::new(Level::Error);
        assert_eq!(enricher.process(before.clone(), &Hint::new()).unwrap(), before);
    }

    /// Serves a fixed number of reads, then behaves as torn down (or panics).
    struct TearingSession {
        inner: Arc<LocalSession>,
        reads_left: AtomicUsize,
        panics: bool,
    }

    impl TearingSession {
        fn new(inner: Arc<LocalSession>, reads: usize) -> Self {
            Self {
                inner,
                reads_left: AtomicUsize::new(reads),
                panics: false,
            }
        }

        fn read(&self) -> Result<(), SessionError> {
            let left = self.reads_left.load(Ordering::SeqCst);
            if left == 0 {
                if self.panics {
                    panic!("session backend lock poisoned");
                }
                return Err(SessionError::Stopped);
            }
            self.reads_left.store(left - 1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Session for TearingSession {
        fn id(&self) -> SessionId {
            self.inner.id()
        }
        fn is_stopped(&self) -> bool {
            self.inner.is_stopped()
        }
        fn app_name(&self) -> Result<String, SessionError> {
            self.read()?;
            self.inner.app_name()
        }
        fn application_id(&self) -> Result<String, SessionError> {
            self.read()?;
            self.inner.application_id()
        }
        fn version(&self) -> Result<String, SessionError> {
            self.read()?;
            self.inner.version()
        }
        fn master(&self) -> Result<String, SessionError> {
            self.read()?;
            self.inner.master()
        }
        fn spark_home(&self) -> Result<Option<String>, SessionError> {
            self.read()?;
            self.inner.spark_home()
        }
        fn ui_web_url(&self) -> Result<Option<String>, SessionError> {
            self.read()?;
            self.inner.ui_web_url()
        }
        fn spark_user(&self) -> Result<String, SessionError> {
            self.read()?;
            self.inner.spark_user()
        }
        fn conf(&self, key: &str) -> Result<Option<String>, SessionError> {
            self.read()?;
            self.inner.conf(key)
        }
        fn set_local_property(&self, key: &str, value: &str) -> Result<(), SessionError> {
            self.inner.set_local_property(key, value)
        }
        fn local_property(&self, key: &str) -> Result<Option<String>, SessionError> {
            self.inner.local_property(key)
        }
        fn add_listener(&self, listener: Arc<dyn EngineListener>) -> Result<(), SessionError> {
            self.inner.add_listener(listener)
        }
        fn remove_listener(
            &self,
            listener: &Arc<dyn EngineListener>,
        ) -> Result<bool, SessionError> {
            self.inner.remove_listener(listener)
        }
    }

    #[test]
    fn teardown_mid_read_keeps_partial_enrichment() {
        let f = setup();
        let inner = LocalSession::start(test_settings(), Arc::new(SessionRegistry::new()));
        let tearing: Arc<dyn Session> = Arc::new(TearingSession::new(inner, 3));
        f.registry.set_active(tearing.clone());
        let enricher = enricher_for(&f, tearing.id());

        let report = enricher
            .process(Report::message(Level::Error, "boom"), &Hint::new())
            .unwrap();

        // user.id, executor.id and deployMode were read before the teardown.
        assert_eq!(report.user.unwrap().id.as_deref(), Some("etl-bot"));
        assert_eq!(report.tags.len(), 2);
        assert_eq!(report.tags[TAG_DEPLOY_MODE], "cluster");
        assert!(report.extra.is_empty());
        assert_eq!(report.message.as_deref(), Some("boom"));
    }

    #[test]
    fn present_fields_are_not_read() {
        let f = setup();
        let inner = LocalSession::start(test_settings(), Arc::new(SessionRegistry::new()));
        let tearing: Arc<dyn Session> = Arc::new(TearingSession::new(inner, 0));
        f.registry.set_active(tearing.clone());
        let enricher = enricher_for(&f, tearing.id());

        let mut report = Report::new(Level::Error).with_user_id("alice");
        for key in [
            TAG_EXECUTOR_ID,
            TAG_DEPLOY_MODE,
            TAG_DRIVER_HOST,
            TAG_DRIVER_PORT,
            TAG_SPARK_VERSION,
            TAG_APP_NAME,
            TAG_APPLICATION_ID,
            TAG_MASTER,
            TAG_SPARK_HOME,
        ] {
            report = report.with_tag(key, "preset");
        }
        report = report.with_extra(EXTRA_WEB_URL, "preset");

        // No reads are allowed, so any lookup would stop enrichment with an error.
        assert!(enrich(&*tearing, &mut report.clone()).is_ok());
        assert_eq!(enricher.process(report.clone(), &Hint::new()).unwrap(), report);
    }

    #[test]
    fn panicking_session_does_not_abort_delivery() {
        let f = setup();
        let inner = LocalSession::start(test_settings(), Arc::new(SessionRegistry::new()));
        let panicking: Arc<dyn Session> = Arc::new(TearingSession {
            panics: true,
            ..TearingSession::new(inner, 2)
        });
        f.registry.set_active(panicking.clone());
        f.reporter
            .add_event_processor(enricher_for(&f, panicking.id()).into_processor());

        let id = f.reporter.capture(Report::message(Level::Error, "boom"));

        assert!(id.is_some());
        let report = f.reporter.captured().pop().unwrap();
        assert_eq!(report.message.as_deref(), Some("boom"));
        assert_eq!(report.tags[TAG_EXECUTOR_ID], "driver");
        assert!(!report.tags.contains_key(TAG_DEPLOY_MODE));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            ..ProptestConfig::default()
        })]

        /// Property: any tag already on the report survives enrichment unchanged.
        #[test]
        fn preset_tags_are_never_overwritten(
            preset in prop::collection::btree_map(
                prop::sample::select(vec![
                    TAG_EXECUTOR_ID,
                    TAG_DEPLOY_MODE,
                    TAG_DRIVER_HOST,
                    TAG_DRIVER_PORT,
                    TAG_SPARK_VERSION,
                    TAG_APP_NAME,
                    TAG_APPLICATION_ID,
                    TAG_MASTER,
                    TAG_SPARK_HOME,
                ]),
                "[a-zA-Z0-9_.-]{0,16}",
                0..9,
            )
        ) {
            let f = setup();
            let session = LocalSession::start(test_settings(), f.registry.clone());
            let enricher = enricher_for(&f, session.id());

            let mut report = Report::new(Level::Error);
            for (k, v) in &preset {
                report = report.with_tag(*k, v.clone());
            }

            let out = enricher.process(report, &Hint::new()).unwrap();
            for (k, v) in &preset {
                prop_assert_eq!(&out.tags[*k], v);
            }
            prop_assert_eq!(out.tags.len(), 9);
        }
    }
}
