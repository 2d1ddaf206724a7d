//! Resource usage samples.

use std::time::Instant;

/// Bytes per megabyte used for all memory figures.
pub const BYTES_PER_MB: f64 = 1_048_576.0;

/// One resource reading taken by the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Instant,

    /// CPU usage relative to the interval since the previous reading.
    /// May exceed 100 on multi-core hosts.
    pub cpu_percent: f64,

    /// Resident set size in MB
    pub memory_mb: f64,
}

impl Sample {
    pub fn new(timestamp: Instant, cpu_percent: f64, rss_bytes: u64) -> Self {
        Self {
            timestamp,
            cpu_percent,
            memory_mb: rss_bytes as f64 / BYTES_PER_MB,
        }
    }
}
