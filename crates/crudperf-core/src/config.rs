//! Configuration management for crudperf
//!
//! Sources, lowest precedence first:
//! - Hardcoded defaults
//! - ./config/crudperf.{toml,yaml,json}
//! - A file named by `CRUDPERF_CONFIG` or passed explicitly
//! - Environment variables (`CRUDPERF_SAMPLING__INTERVAL_MS=50`)

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::workload::WorkloadConfig;

/// Default address of the Todo Manager REST API.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4567";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct BenchConfig {
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub workload: WorkloadConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub driver: DriverConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl BenchConfig {
    /// Load configuration from defaults, files and environment, then
    /// validate it.
    ///
    /// `explicit` takes precedence over `CRUDPERF_CONFIG`; both are optional.
    pub fn load(explicit: Option<&Path>) -> CoreResult<Self> {
        let config = Self::load_unvalidated(explicit)?;
        config.validate()?;

        Ok(config)
    }

    /// Like [`load`](Self::load) without validation, for callers that apply
    /// further overrides (CLI flags) before calling [`validate`](Self::validate).
    pub fn load_unvalidated(explicit: Option<&Path>) -> CoreResult<Self> {
        let mut builder = Config::builder()
            .set_default("target.base_url", DEFAULT_BASE_URL)?
            .set_default("sampling.interval_ms", 100)?
            .set_default("sampling.stop_grace_ms", 1000)?
            .set_default("driver.cooldown_ms", 2000)?
            .add_source(File::with_name("./config/crudperf").required(false));

        if let Ok(config_path) = std::env::var("CRUDPERF_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        // Example: CRUDPERF_WORKLOAD__SIZES=10,50,100
        builder = builder.add_source(
            Environment::with_prefix("CRUDPERF")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("workload.sizes")
                .with_list_parse_key("workload.operations")
                .with_list_parse_key("workload.object_types")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load configuration from a single file, without environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let config: BenchConfig = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.target.base_url.trim().is_empty() {
            return Err(CoreError::validation("target.base_url must not be empty"));
        }
        if self.target.request_timeout_secs == Some(0) {
            return Err(CoreError::validation(
                "target.request_timeout_secs must be > 0 when set",
            ));
        }
        if self.sampling.interval_ms == 0 {
            return Err(CoreError::validation("sampling.interval_ms must be > 0"));
        }
        if self.sampling.stop_grace_ms == 0 {
            return Err(CoreError::validation("sampling.stop_grace_ms must be > 0"));
        }
        self.workload.validate()
    }
}

/// Target service configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL of the REST API
    pub base_url: String,

    /// Client-side timeout per request; unset means operations may block
    /// for as long as the target takes
    pub request_timeout_secs: Option<u64>,

    /// Process to observe instead of the harness itself
    pub pid: Option<u32>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            pid: None,
        }
    }
}

impl TargetConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Resource sampler configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    /// Time between two samples
    pub interval_ms: u64,

    /// How long `disarm` waits for the sampling loop to stop
    pub stop_grace_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            stop_grace_ms: 1000,
        }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

/// Experiment driver configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DriverConfig {
    /// Settling pause after every run
    pub cooldown_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { cooldown_ms: 2000 }
    }
}

impl DriverConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Export format for result records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(CoreError::UnknownFormat(other.to_string())),
        }
    }
}

/// Where results are written
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub format: ExportFormat,

    /// Raw sample time series, written only when set
    pub samples_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "performance_results.csv".to_string(),
            format: ExportFormat::Csv,
            samples_path: None,
        }
    }
}
