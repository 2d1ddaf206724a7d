//! Performance-measurement harness for remote CRUD services.
//!
//! Provides:
//! - A background [`ResourceSampler`] with an arm/disarm/drain contract
//! - An [`ExperimentDriver`] that sequences pre-population, monitored timed
//!   execution and cooldown per (object type, operation, size)
//! - Export of the resulting records as CSV or JSON

pub mod driver;
pub mod error;
pub mod export;
pub mod probe;
pub mod sampler;
pub mod service;

pub use driver::{DriverOptions, ExperimentDriver, RunOutput};
pub use error::{HarnessError, HarnessResult};
pub use export::{summarize, write_records, write_records_to_path, write_samples, write_samples_to_path};
pub use probe::{ProbeError, ProcessProbe, ResourceProbe, ResourceReading};
pub use sampler::{ResourceSampler, DEFAULT_STOP_GRACE};
pub use service::{EntityId, OperationError, OperationOutcome, OperationResult, TargetService};
