//! Lifecycle events published by the engine's scheduler.
//!
//! One payload type per callback kind. Only a handful carry data anyone acts
//! on today; the rest are kept so the enumeration matches the engine's
//! listener interface one-to-one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sparkcrumbs_core::{JobId, JobResult, StageId, StageInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStart {
    pub app_name: String,
    pub app_id: Option<String>,
    pub time: DateTime<Utc>,
    pub spark_user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationEnd {
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockManagerAdded {
    pub executor_id: String,
    pub host: String,
    pub port: u16,
    pub max_mem: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockManagerRemoved {
    pub executor_id: String,
    pub host: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockUpdated {
    pub block_id: String,
    pub executor_id: String,
    pub mem_size: u64,
    pub disk_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentUpdate {
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorAdded {
    pub executor_id: String,
    pub host: String,
    pub total_cores: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorRemoved {
    pub executor_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorBlacklisted {
    pub executor_id: String,
    pub task_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorBlacklistedForStage {
    pub executor_id: String,
    pub task_failures: u32,
    pub stage_id: StageId,
    pub stage_attempt_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorMetricsUpdate {
    pub executor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStart {
    pub job_id: JobId,
    pub time: DateTime<Utc>,
    pub stage_ids: Vec<StageId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEnd {
    pub job_id: JobId,
    pub time: DateTime<Utc>,
    pub job_result: JobResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBlacklisted {
    pub host: String,
    pub executor_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeBlacklistedForStage {
    pub host: String,
    pub executor_failures: u32,
    pub stage_id: StageId,
    pub stage_attempt_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeUnblacklisted {
    pub host: String,
}

/// Catch-all for events the scheduler posts outside the fixed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherEvent {
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeculativeTaskSubmitted {
    pub stage_id: StageId,
    pub stage_attempt_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSubmitted {
    pub stage_info: StageInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCompleted {
    pub stage_info: StageInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStart {
    pub stage_id: StageId,
    pub stage_attempt_id: u32,
    pub task_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGettingResult {
    pub task_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEnd {
    pub stage_id: StageId,
    pub stage_attempt_id: u32,
    pub task_id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpersistRdd {
    pub rdd_id: u64,
}

/// Everything the engine's event bus can deliver to a listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    ApplicationStart(ApplicationStart),
    ApplicationEnd(ApplicationEnd),
    BlockManagerAdded(BlockManagerAdded),
    BlockManagerRemoved(BlockManagerRemoved),
    BlockUpdated(BlockUpdated),
    EnvironmentUpdate(EnvironmentUpdate),
    ExecutorAdded(ExecutorAdded),
    ExecutorRemoved(ExecutorRemoved),
    ExecutorBlacklisted(ExecutorBlacklisted),
    ExecutorBlacklistedForStage(ExecutorBlacklistedForStage),
    ExecutorMetricsUpdate(ExecutorMetricsUpdate),
    JobStart(JobStart),
    JobEnd(JobEnd),
    NodeBlacklisted(NodeBlacklisted),
    NodeBlacklistedForStage(NodeBlacklistedForStage),
    NodeUnblacklisted(NodeUnblacklisted),
    Other(OtherEvent),
    SpeculativeTaskSubmitted(SpeculativeTaskSubmitted),
    StageSubmitted(StageSubmitted),
    StageCompleted(StageCompleted),
    TaskStart(TaskStart),
    TaskGettingResult(TaskGettingResult),
    TaskEnd(TaskEnd),
    UnpersistRdd(UnpersistRdd),
}

impl EngineEvent {
    /// Stable event name (e.g. "job.start"), used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ApplicationStart(_) => "application.start",
            Self::ApplicationEnd(_) => "application.end",
            Self::BlockManagerAdded(_) => "block_manager.added",
            Self::BlockManagerRemoved(_) => "block_manager.removed",
            Self::BlockUpdated(_) => "block.updated",
            Self::EnvironmentUpdate(_) => "environment.update",
            Self::ExecutorAdded(_) => "executor.added",
            Self::ExecutorRemoved(_) => "executor.removed",
            Self::ExecutorBlacklisted(_) => "executor.blacklisted",
            Self::ExecutorBlacklistedForStage(_) => "executor.blacklisted_for_stage",
            Self::ExecutorMetricsUpdate(_) => "executor.metrics_update",
            Self::JobStart(_) => "job.start",
            Self::JobEnd(_) => "job.end",
            Self::NodeBlacklisted(_) => "node.blacklisted",
            Self::NodeBlacklistedForStage(_) => "node.blacklisted_for_stage",
            Self::NodeUnblacklisted(_) => "node.unblacklisted",
            Self::Other(_) => "other",
            Self::SpeculativeTaskSubmitted(_) => "task.speculative_submitted",
            Self::StageSubmitted(_) => "stage.submitted",
            Self::StageCompleted(_) => "stage.completed",
            Self::TaskStart(_) => "task.start",
            Self::TaskGettingResult(_) => "task.getting_result",
            Self::TaskEnd(_) => "task.end",
            Self::UnpersistRdd(_) => "rdd.unpersist",
        }
    }

    pub fn job_start(job_id: JobId) -> Self {
        Self::JobStart(JobStart {
            job_id,
            time: Utc::now(),
            stage_ids: Vec::new(),
        })
    }

    pub fn job_end(job_id: JobId, job_result: JobResult) -> Self {
        Self::JobEnd(JobEnd {
            job_id,
            time: Utc::now(),
            job_result,
        })
    }

    pub fn stage_submitted(stage_info: StageInfo) -> Self {
        Self::StageSubmitted(StageSubmitted { stage_info })
    }

    pub fn stage_completed(stage_info: StageInfo) -> Self {
        Self::StageCompleted(StageCompleted { stage_info })
    }
}
