//! `run` and `check` subcommands.

use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use crudperf_client::HttpTargetService;
use crudperf_core::{BenchConfig, CoreResult, ExportFormat, ObjectType, OperationKind};
use crudperf_harness::{
    summarize, write_records_to_path, write_samples_to_path, DriverOptions, ExperimentDriver,
    ProcessProbe, ResourceSampler, RunOutput,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

/// Options of `crudperf run`. Every flag overrides the loaded configuration.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "CRUDPERF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the target REST API
    #[arg(long)]
    pub base_url: Option<String>,

    /// Workload sizes, comma separated
    #[arg(long, value_delimiter = ',')]
    pub sizes: Option<Vec<usize>>,

    /// Operations to run (create, update, delete), comma separated
    #[arg(long, value_delimiter = ',')]
    pub operations: Option<Vec<OperationKind>>,

    /// Object types to run (todo, project), comma separated
    #[arg(long, value_delimiter = ',')]
    pub object_types: Option<Vec<ObjectType>>,

    /// Sampling interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Pause between runs in milliseconds
    #[arg(long)]
    pub cooldown_ms: Option<u64>,

    /// Observe this process (e.g. the target server) instead of the harness
    #[arg(long)]
    pub target_pid: Option<u32>,

    /// Results file path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Results format (csv or json)
    #[arg(long)]
    pub format: Option<ExportFormat>,

    /// Raw samples CSV path
    #[arg(long)]
    pub samples_output: Option<String>,
}

impl RunArgs {
    fn apply(self, config: &mut BenchConfig) {
        if let Some(base_url) = self.base_url {
            config.target.base_url = base_url;
        }
        if let Some(pid) = self.target_pid {
            config.target.pid = Some(pid);
        }
        if let Some(sizes) = self.sizes {
            config.workload.sizes = sizes;
        }
        if let Some(operations) = self.operations {
            config.workload.operations = operations;
        }
        if let Some(object_types) = self.object_types {
            config.workload.object_types = object_types;
        }
        if let Some(interval_ms) = self.interval_ms {
            config.sampling.interval_ms = interval_ms;
        }
        if let Some(cooldown_ms) = self.cooldown_ms {
            config.driver.cooldown_ms = cooldown_ms;
        }
        if let Some(path) = self.output {
            config.output.path = path;
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if let Some(path) = self.samples_output {
            config.output.samples_path = Some(path);
        }
    }
}

/// Load configuration, apply the flags on top and validate the result.
fn resolve_config(args: RunArgs) -> CoreResult<BenchConfig> {
    let mut config = BenchConfig::load_unvalidated(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    Ok(config)
}

pub async fn run_suite(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let config = resolve_config(args)?;

    info!("Target: {}", config.target.base_url);
    info!(
        "Workload: sizes={:?}, operations={:?}, object_types={:?}",
        config.workload.sizes, config.workload.operations, config.workload.object_types
    );

    let service = HttpTargetService::new(&config.target.base_url, config.target.request_timeout())?;
    if !service.is_running().await {
        return Err(format!(
            "target is not running at {}; start it before running the suite",
            config.target.base_url
        )
        .into());
    }

    let sampler = match config.target.pid {
        Some(pid) => {
            info!("Observing process {}", pid);
            ResourceSampler::new(ProcessProbe::for_pid(pid))
        }
        None => ResourceSampler::new(ProcessProbe::current()?),
    }
    .with_stop_grace(config.sampling.stop_grace());

    let mut driver = ExperimentDriver::new(service, sampler, DriverOptions::from(&config));

    let pb = ProgressBar::new(config.workload.run_count() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let result = tokio::select! {
        result = driver.run_with(&config.workload, |record| {
            pb.println(summarize(record));
            pb.inc(1);
        }) => result.map_err(Box::<dyn Error>::from),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; writing the results collected so far");
            Err("interrupted".into())
        }
    };
    pb.finish_and_clear();

    let outputs = driver.into_outputs();
    export(&config, &outputs)?;

    let aborted = outputs.iter().filter(|o| !o.record.is_completed()).count();
    if aborted > 0 {
        warn!("{} of {} runs aborted", aborted, outputs.len());
    }

    if let Err(err) = result {
        error!("Suite stopped early: {}", err);
        return Err(err);
    }

    info!("Completed {} runs", outputs.len());
    Ok(())
}

fn export(config: &BenchConfig, outputs: &[RunOutput]) -> Result<(), Box<dyn Error>> {
    let records: Vec<_> = outputs.iter().map(|o| o.record.clone()).collect();

    write_records_to_path(&config.output.path, &records, config.output.format)?;
    println!(
        "Results written to {} ({} records, {})",
        config.output.path,
        records.len(),
        config.output.format
    );

    if let Some(path) = &config.output.samples_path {
        write_samples_to_path(path, outputs)?;
        println!("Samples written to {}", path);
    }

    Ok(())
}

pub async fn check_target(
    config: Option<PathBuf>,
    base_url: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let mut config = BenchConfig::load_unvalidated(config.as_deref())?;
    if let Some(base_url) = base_url {
        config.target.base_url = base_url;
    }
    config.validate()?;

    let service = HttpTargetService::new(&config.target.base_url, config.target.request_timeout())?;
    if service.is_running().await {
        println!("Target is running at {}", service.base_url());
        Ok(())
    } else {
        Err(format!("target is not running at {}", service.base_url()).into())
    }
}
