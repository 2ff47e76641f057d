//! Listener contract for engine lifecycle callbacks.

use sparkcrumbs_core::FieldError;
use thiserror::Error;

use crate::event::*;

/// Failure raised by a listener callback.
///
/// Returned to whoever delivered the event; the engine keeps running.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// An engine-side field could not be read.
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ListenerError {
    pub fn other(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Other(Box::new(err))
    }
}

/// Receiver for every callback kind the engine's event bus can deliver.
///
/// The engine requires a listener to accept the full set, so each method has
/// a no-op default. Implementors override only the callbacks they act on.
///
/// Callbacks run on the bus delivery thread and must not block.
pub trait EngineListener: Send + Sync {
    fn on_application_start(&self, _event: &ApplicationStart) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_application_end(&self, _event: &ApplicationEnd) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_block_manager_added(&self, _event: &BlockManagerAdded) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_block_manager_removed(&self, _event: &BlockManagerRemoved) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_block_updated(&self, _event: &BlockUpdated) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_environment_update(&self, _event: &EnvironmentUpdate) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_executor_added(&self, _event: &ExecutorAdded) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_executor_removed(&self, _event: &ExecutorRemoved) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_executor_blacklisted(&self, _event: &ExecutorBlacklisted) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_executor_blacklisted_for_stage(
        &self,
        _event: &ExecutorBlacklistedForStage,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_executor_metrics_update(
        &self,
        _event: &ExecutorMetricsUpdate,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_job_start(&self, _event: &JobStart) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_job_end(&self, _event: &JobEnd) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_node_blacklisted(&self, _event: &NodeBlacklisted) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_node_blacklisted_for_stage(
        &self,
        _event: &NodeBlacklistedForStage,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_node_unblacklisted(&self, _event: &NodeUnblacklisted) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_other_event(&self, _event: &OtherEvent) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_speculative_task_submitted(
        &self,
        _event: &SpeculativeTaskSubmitted,
    ) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_stage_submitted(&self, _event: &StageSubmitted) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_stage_completed(&self, _event: &StageCompleted) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_task_start(&self, _event: &TaskStart) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_task_getting_result(&self, _event: &TaskGettingResult) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_task_end(&self, _event: &TaskEnd) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_unpersist_rdd(&self, _event: &UnpersistRdd) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Route an event to the matching listener callback.
pub fn dispatch<L>(listener: &L, event: &EngineEvent) -> Result<(), ListenerError>
where
    L: EngineListener + ?Sized,
{
    match event {
        EngineEvent::ApplicationStart(e) => listener.on_application_start(e),
        EngineEvent::ApplicationEnd(e) => listener.on_application_end(e),
        EngineEvent::BlockManagerAdded(e) => listener.on_block_manager_added(e),
        EngineEvent::BlockManagerRemoved(e) => listener.on_block_manager_removed(e),
        EngineEvent::BlockUpdated(e) => listener.on_block_updated(e),
        EngineEvent::EnvironmentUpdate(e) => listener.on_environment_update(e),
        EngineEvent::ExecutorAdded(e) => listener.on_executor_added(e),
        EngineEvent::ExecutorRemoved(e) => listener.on_executor_removed(e),
        EngineEvent::ExecutorBlacklisted(e) => listener.on_executor_blacklisted(e),
        EngineEvent::ExecutorBlacklistedForStage(e) => {
            listener.on_executor_blacklisted_for_stage(e)
        }
        EngineEvent::ExecutorMetricsUpdate(e) => listener.on_executor_metrics_update(e),
        EngineEvent::JobStart(e) => listener.on_job_start(e),
        EngineEvent::JobEnd(e) => listener.on_job_end(e),
        EngineEvent::NodeBlacklisted(e) => listener.on_node_blacklisted(e),
        EngineEvent::NodeBlacklistedForStage(e) => listener.on_node_blacklisted_for_stage(e),
        EngineEvent::NodeUnblacklisted(e) => listener.on_node_unblacklisted(e),
        EngineEvent::Other(e) => listener.on_other_event(e),
        EngineEvent::SpeculativeTaskSubmitted(e) => listener.on_speculative_task_submitted(e),
        EngineEvent::StageSubmitted(e) => listener.on_stage_submitted(e),
        EngineEvent::StageCompleted(e) => listener.on_stage_completed(e),
        EngineEvent::TaskStart(e) => listener.on_task_start(e),
        EngineEvent::TaskGettingResult(e) => listener.on_task_getting_result(e),
        EngineEvent::TaskEnd(e) => listener.on_task_end(e),
        EngineEvent::UnpersistRdd(e) => listener.on_unpersist_rdd(e),
    }
}
