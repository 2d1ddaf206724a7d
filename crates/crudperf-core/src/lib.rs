//! Core domain types for the crudperf performance harness.

pub mod config;
pub mod error;
pub mod record;
pub mod sample;
pub mod stats;
pub mod workload;

pub use config::{BenchConfig, DriverConfig, ExportFormat, OutputConfig, SamplingConfig, TargetConfig};
pub use error::{CoreError, CoreResult};
pub use record::{ResultRecord, RunStatus};
pub use sample::{Sample, BYTES_PER_MB};
pub use stats::{reduce, RunStatistics};
pub use workload::{ObjectType, OperationKind, RunKey, WorkloadConfig};
