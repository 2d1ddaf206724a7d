use std::time::Duration;

use thiserror::Error;

use crate::probe::ProbeError;

/// Errors raised by the harness itself, as opposed to the target service.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The sampling loop did not acknowledge a stop request in time.
    #[error("resource sampler did not stop within {grace:?}")]
    SamplerStopTimeout {
        /// Bound that was exceeded.
        grace: Duration,
    },

    /// A sampling window needs a non-zero interval between readings.
    #[error("sampling interval must be greater than zero")]
    ZeroInterval,

    /// Samples were requested while a sampling window is still open.
    #[error("resource sampler is still armed; disarm it before draining samples")]
    SamplerArmed,

    /// A previous window failed to stop cleanly; the sampler cannot be reused.
    #[error("resource sampler is unusable after an earlier stop failure")]
    SamplerPoisoned,

    /// The sampling loop terminated without reporting its samples.
    #[error("resource sampler thread panicked")]
    SamplerPanicked,

    /// The OS refused to start the sampling thread.
    #[error("failed to spawn resource sampler thread: {0}")]
    SamplerSpawn(#[source] std::io::Error),

    #[error("resource probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenient result alias for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;
