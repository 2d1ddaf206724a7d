//! Experiment driver: sequences pre-population, monitored timed execution
//! and cooldown for every run of a workload matrix.

use std::time::{Duration, Instant};

use crudperf_core::{
    reduce, BenchConfig, ObjectType, OperationKind, ResultRecord, RunKey, RunStatistics, Sample,
    WorkloadConfig,
};
use tracing::{debug, error, info, warn};

use crate::error::HarnessResult;
use crate::sampler::ResourceSampler;
use crate::service::{EntityId, OperationError, OperationOutcome, OperationResult, TargetService};

/// Timing knobs of the driver. A zero `sampling_interval` is rejected when
/// the first run arms the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverOptions {
    pub sampling_interval: Duration,

    /// Pause after each run so transient resource usage decays before the
    /// next one starts
    pub cooldown: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            sampling_interval: Duration::from_millis(100),
            cooldown: Duration::from_secs(2),
        }
    }
}

impl From<&BenchConfig> for DriverOptions {
    fn from(config: &BenchConfig) -> Self {
        Self {
            sampling_interval: config.sampling.interval(),
            cooldown: config.driver.cooldown(),
        }
    }
}

/// One run's record plus the raw samples it was reduced from.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub record: ResultRecord,
    pub samples: Vec<Sample>,
}

/// Operation counts for one timed section.
#[derive(Debug, Default)]
struct Tally {
    executed: usize,
    failed: usize,
    abort: Option<OperationError>,
}

impl Tally {
    /// Account for one result; returns false once the run must stop.
    fn observe(&mut self, result: OperationResult) -> bool {
        self.executed += 1;
        match result {
            Ok(OperationOutcome::Succeeded { .. }) => true,
            Ok(OperationOutcome::Failed { reason }) => {
                self.failed += 1;
                debug!(%reason, "operation failed");
                true
            }
            Err(err) => {
                self.failed += 1;
                self.abort = Some(err);
                false
            }
        }
    }

    fn succeeded(&self) -> usize {
        self.executed - self.failed
    }
}

/// Runs a workload matrix against a [`TargetService`] while a
/// [`ResourceSampler`] observes resource usage.
pub struct ExperimentDriver<S> {
    service: S,
    sampler: ResourceSampler,
    options: DriverOptions,
    outputs: Vec<RunOutput>,
}

impl<S: TargetService> ExperimentDriver<S> {
    pub fn new(service: S, sampler: ResourceSampler, options: DriverOptions) -> Self {
        Self {
            service,
            sampler,
            options,
            outputs: Vec::new(),
        }
    }

    /// Execute every run of `workload` in declared order.
    pub async fn run(&mut self, workload: &WorkloadConfig) -> HarnessResult<()> {
        self.run_with(workload, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `on_record` after each run.
    ///
    /// A failed run still yields a record. Only harness defects (a sampler
    /// that cannot be stopped) end the suite early; records collected until
    /// then stay available through [`outputs`](Self::outputs).
    pub async fn run_with<F>(&mut self, workload: &WorkloadConfig, mut on_record: F) -> HarnessResult<()>
    where
        F: FnMut(&ResultRecord),
    {
        let total = workload.run_count();

        for (index, key) in workload.runs().enumerate() {
            info!(run = %key, "starting run {}/{}", index + 1, total);

            let output = self.run_one(key).await?;
            on_record(&output.record);
            self.outputs.push(output);

            if index + 1 < total && !self.options.cooldown.is_zero() {
                tokio::time::sleep(self.options.cooldown).await;
            }
        }

        Ok(())
    }

    /// Execute a single (object type, operation, size) run.
    pub async fn run_one(&mut self, key: RunKey) -> HarnessResult<RunOutput> {
        let targets = if key.operation.requires_existing() {
            match self.prepopulate(key.object_type, key.workload_size).await {
                Ok(ids) => Some(ids),
                Err(err) => {
                    error!(run = %key, error = %err, "pre-population aborted");
                    let record = ResultRecord::aborted(
                        key,
                        0,
                        0,
                        RunStatistics::default(),
                        format!("pre-population failed: {}", err),
                    );
                    return Ok(RunOutput {
                        record,
                        samples: Vec::new(),
                    });
                }
            }
        } else {
            None
        };

        self.sampler.arm(self.options.sampling_interval).await?;

        let started = Instant::now();
        let tally = match &targets {
            None => self.create_many(key.object_type, key.workload_size).await,
            Some(ids) => self.act_on(key.object_type, key.operation, ids).await,
        };
        let duration = started.elapsed();

        self.sampler.disarm().await?;
        let samples = self.sampler.drain()?;

        let stats = reduce(duration, &samples, tally.executed, tally.succeeded());
        let record = match tally.abort {
            None => ResultRecord::completed(key, tally.executed, tally.failed, stats),
            Some(err) => {
                error!(run = %key, error = %err, executed = tally.executed, "run aborted");
                ResultRecord::aborted(key, tally.executed, tally.failed, stats, err.to_string())
            }
        };

        info!(
            run = %key,
            count = record.count,
            failed = record.failed_count,
            seconds = record.time_seconds,
            cpu_avg = record.cpu_avg_percent,
            cpu_max = record.cpu_max_percent,
            memory_avg_mb = record.memory_avg_mb,
            memory_max_mb = record.memory_max_mb,
            samples = record.sample_count,
            "run finished"
        );

        Ok(RunOutput { record, samples })
    }

    /// Create `size` entities, best effort, returning the identifiers of
    /// those that were created.
    async fn prepopulate(
        &self,
        object_type: ObjectType,
        size: usize,
    ) -> Result<Vec<EntityId>, OperationError> {
        let mut ids = Vec::with_capacity(size);

        for _ in 0..size {
            match self.service.create(object_type).await? {
                OperationOutcome::Succeeded { id: Some(id) } => ids.push(id),
                OperationOutcome::Succeeded { id: None } => {
                    warn!(%object_type, "create succeeded without an identifier; skipping")
                }
                OperationOutcome::Failed { reason } => {
                    debug!(%object_type, %reason, "pre-population create failed")
                }
            }
        }

        if ids.len() < size {
            warn!(
                %object_type,
                requested = size,
                created = ids.len(),
                "pre-population incomplete"
            );
        }

        Ok(ids)
    }

    async fn create_many(&self, object_type: ObjectType, size: usize) -> Tally {
        let mut tally = Tally::default();
        for _ in 0..size {
            if !tally.observe(self.service.create(object_type).await) {
                break;
            }
        }
        tally
    }

    async fn act_on(&self, object_type: ObjectType, operation: OperationKind, ids: &[EntityId]) -> Tally {
        let mut tally = Tally::default();
        for id in ids {
            let result = match operation {
                OperationKind::Update => self.service.update(object_type, id).await,
                OperationKind::Delete => self.service.delete(object_type, id).await,
                OperationKind::Create => self.service.create(object_type).await,
            };
            if !tally.observe(result) {
                break;
            }
        }
        tally
    }

    pub fn outputs(&self) -> &[RunOutput] {
        &self.outputs
    }

    /// Records collected so far, in execution order.
    pub fn records(&self) -> Vec<ResultRecord> {
        self.outputs.iter().map(|o| o.record.clone()).collect()
    }

    pub fn into_outputs(self) -> Vec<RunOutput> {
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_failures() {
        let mut tally = Tally::default();
        assert!(tally.observe(Ok(OperationOutcome::succeeded())));
        assert!(tally.observe(Ok(OperationOutcome::failed("400 Bad Request"))));
        assert!(tally.observe(Ok(OperationOutcome::created("7"))));

        assert_eq!(tally.executed, 3);
        assert_eq!(tally.failed, 1);
        assert_eq!(tally.succeeded(), 2);
        assert!(tally.abort.is_none());
    }

    #[test]
    fn test_tally_stops_on_unreachable() {
        let mut tally = Tally::default();
        assert!(tally.observe(Ok(OperationOutcome::succeeded())));
        assert!(!tally.observe(Err(OperationError::Unreachable(
            "connection refused".to_string()
        ))));

        assert_eq!(tally.executed, 2);
        assert_eq!(tally.succeeded(), 1);
        assert!(tally.abort.is_some());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = BenchConfig::default();
        config.sampling.interval_ms = 10;
        config.driver.cooldown_ms = 0;

        let options = DriverOptions::from(&config);
        assert_eq!(options.sampling_interval, Duration::from_millis(10));
        assert!(options.cooldown.is_zero());
    }
}
