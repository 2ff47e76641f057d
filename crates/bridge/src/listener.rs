use std::sync::Arc;

use tracing::debug;

use sparkcrumbs_core::FieldError;
use sparkcrumbs_engine::{SessionAccessor, SessionError};
use sparkcrumbs_events::{
    EngineListener, JobEnd, JobStart, ListenerError, StageCompleted, StageSubmitted,
};
use sparkcrumbs_reporting::{Breadcrumb, Level, Reporter};

use crate::properties::PropertyPropagator;

const JOB_SUCCEEDED: &str = "JobSucceeded";

/// Turns job and stage lifecycle callbacks into breadcrumbs.
///
/// Every other callback keeps the trait's no-op default.
pub struct BridgeListener {
    reporter: Arc<dyn Reporter>,
    sessions: Arc<dyn SessionAccessor>,
    propagator: PropertyPropagator,
}

impl BridgeListener {
    pub fn new(
        reporter: Arc<dyn Reporter>,
        sessions: Arc<dyn SessionAccessor>,
        propagator: PropertyPropagator,
    ) -> Self {
        Self {
            reporter,
            sessions,
            propagator,
        }
    }

    /// Re-push identity properties to whichever session is active now.
    fn refresh_properties(&self) -> Result<(), ListenerError> {
        let active = self.sessions.active();
        match self.propagator.propagate(active.as_deref()) {
            Ok(()) => Ok(()),
            // Torn down between lookup and write: nothing left to tag.
            Err(SessionError::Stopped) => {
                debug!("active session stopped before properties could be written");
                Ok(())
            }
            Err(err) => Err(ListenerError::other(err)),
        }
    }
}

impl EngineListener for BridgeListener {
    fn on_job_start(&self, event: &JobStart) -> Result<(), ListenerError> {
        let message = format!("Job {} Started", event.job_id);
        self.reporter.add_breadcrumb(Breadcrumb::new(Level::Info, message));
        self.refresh_properties()
    }

    fn on_job_end(&self, event: &JobEnd) -> Result<(), ListenerError> {
        let result = event.job_result.to_string();

        let (level, message) = if result == JOB_SUCCEEDED {
            (Level::Info, format!("Job {} Ended", event.job_id))
        } else {
            (Level::Warning, format!("Job {} Failed", event.job_id))
        };

        self.reporter
            .add_breadcrumb(Breadcrumb::new(level, message).with_data("result", result));
        Ok(())
    }

    fn on_stage_submitted(&self, event: &StageSubmitted) -> Result<(), ListenerError> {
        let info = &event.stage_info;
        let crumb = Breadcrumb::new(Level::Info, format!("Stage {} Submitted", info.stage_id()))
            .with_data("attemptId", info.attempt_id())
            .with_data("name", info.name());

        self.reporter.add_breadcrumb(crumb);
        self.refresh_properties()
    }

    fn on_stage_completed(&self, event: &StageCompleted) -> Result<(), ListenerError> {
        let info = &event.stage_info;

        let crumb = match info.failure_reason() {
            Ok(reason) => {
                Breadcrumb::new(Level::Warning, format!("Stage {} Failed", info.stage_id()))
                    .with_data("reason", reason)
            }
            Err(FieldError::Empty) => {
                Breadcrumb::new(Level::Info, format!("Stage {} Completed", info.stage_id()))
            }
            Err(err) => return Err(err.into()),
        };

        self.reporter.add_breadcrumb(
            crumb
                .with_data("attemptId", info.attempt_id())
                .with_data("name", info.name()),
        );
        Ok(())
    }
}
