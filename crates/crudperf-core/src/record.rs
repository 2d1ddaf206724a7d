//! Result records emitted once per (object type, operation, size) run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stats::RunStatistics;
use crate::workload::{ObjectType, OperationKind, RunKey};

/// Whether a run finished its timed section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    /// The target became unreachable; statistics cover the partial window.
    Aborted,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

/// Reduced statistics for one run, flat so it serializes as one table row
/// keyed by `(object_type, operation, count)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub object_type: ObjectType,
    pub operation: OperationKind,

    /// Size requested for the run
    pub workload_size: usize,

    /// Operations actually issued in the timed section
    pub count: usize,

    /// Operations in the timed section that returned a failure outcome
    pub failed_count: usize,

    pub time_seconds: f64,
    pub avg_time_per_op: f64,
    pub cpu_avg_percent: f64,
    pub cpu_max_percent: f64,
    pub memory_avg_mb: f64,
    pub memory_max_mb: f64,
    pub sample_count: usize,
    pub operations_per_second: f64,

    pub status: RunStatus,

    /// Abort reason, empty for completed runs
    pub error: Option<String>,
}

impl ResultRecord {
    /// Record for a run whose timed section ran to completion.
    pub fn completed(key: RunKey, count: usize, failed_count: usize, stats: RunStatistics) -> Self {
        Self::assemble(key, count, failed_count, stats, RunStatus::Completed, None)
    }

    /// Record for a run cut short by a catastrophic failure.
    pub fn aborted(
        key: RunKey,
        count: usize,
        failed_count: usize,
        stats: RunStatistics,
        reason: impl Into<String>,
    ) -> Self {
        Self::assemble(
            key,
            count,
            failed_count,
            stats,
            RunStatus::Aborted,
            Some(reason.into()),
        )
    }

    fn assemble(
        key: RunKey,
        count: usize,
        failed_count: usize,
        stats: RunStatistics,
        status: RunStatus,
        error: Option<String>,
    ) -> Self {
        Self {
            object_type: key.object_type,
            operation: key.operation,
            workload_size: key.workload_size,
            count,
            failed_count,
            time_seconds: stats.time_seconds,
            avg_time_per_op: stats.avg_time_per_op,
            cpu_avg_percent: stats.cpu_avg_percent,
            cpu_max_percent: stats.cpu_max_percent,
            memory_avg_mb: stats.memory_avg_mb,
            memory_max_mb: stats.memory_max_mb,
            sample_count: stats.sample_count,
            operations_per_second: stats.operations_per_second,
            status,
            error,
        }
    }

    pub fn key(&self) -> RunKey {
        RunKey {
            object_type: self.object_type,
            operation: self.operation,
            workload_size: self.workload_size,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Operations that returned a success outcome.
    pub fn succeeded(&self) -> usize {
        self.count.saturating_sub(self.failed_count)
    }
}
