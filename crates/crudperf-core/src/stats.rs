//! Reduction of one run's timing and samples into summary statistics.
//!
//! Everything here is a pure function of its inputs so it can be tested
//! without the sampler thread or a live target.

use std::time::Duration;

use crate::sample::Sample;

/// Summary aggregates for one timed run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunStatistics {
    pub time_seconds: f64,
    pub avg_time_per_op: f64,
    pub cpu_avg_percent: f64,
    pub cpu_max_percent: f64,
    pub memory_avg_mb: f64,
    pub memory_max_mb: f64,
    pub sample_count: usize,
    pub operations_per_second: f64,
}

/// Reduce a timed section into [`RunStatistics`].
///
/// `executed` is the number of operations issued in the timed section and
/// `succeeded` the subset that returned a success outcome. Average time is
/// taken over `executed`, throughput over `succeeded`. Rate fields are 0
/// whenever their divisor is 0.
pub fn reduce(
    duration: Duration,
    samples: &[Sample],
    executed: usize,
    succeeded: usize,
) -> RunStatistics {
    let time_seconds = duration.as_secs_f64();

    let avg_time_per_op = if executed > 0 {
        time_seconds / executed as f64
    } else {
        0.0
    };

    let operations_per_second = if time_seconds > 0.0 {
        succeeded as f64 / time_seconds
    } else {
        0.0
    };

    let (cpu_avg_percent, cpu_max_percent) = mean_and_max(samples.iter().map(|s| s.cpu_percent));
    let (memory_avg_mb, memory_max_mb) = mean_and_max(samples.iter().map(|s| s.memory_mb));

    RunStatistics {
        time_seconds,
        avg_time_per_op,
        cpu_avg_percent,
        cpu_max_percent,
        memory_avg_mb,
        memory_max_mb,
        sample_count: samples.len(),
        operations_per_second,
    }
}

/// Mean and maximum of a series, `(0.0, 0.0)` when empty.
fn mean_and_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut max = f64::NEG_INFINITY;

    for value in values {
        count += 1;
        sum += value;
        max = max.max(value);
    }

    if count == 0 {
        return (0.0, 0.0);
    }
    (sum / count as f64, max)
}
