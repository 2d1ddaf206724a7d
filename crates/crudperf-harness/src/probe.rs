//! Resource probes read CPU and memory usage of one process.

use sysinfo::{get_current_pid, Pid, ProcessExt, System, SystemExt};
use thiserror::Error;

/// One raw reading taken by a probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceReading {
    /// CPU percent since the previous reading
    pub cpu_percent: f64,

    /// Resident set size in bytes
    pub rss_bytes: u64,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    /// The observed process no longer exists or cannot be inspected.
    #[error("process {pid} is not available")]
    ProcessUnavailable { pid: String },

    /// The current process id could not be determined.
    #[error("cannot determine current process id: {0}")]
    CurrentPid(String),
}

/// Source of resource readings for the sampler.
///
/// Implementations are moved onto the sampling thread for the duration of
/// a window and handed back when it closes.
pub trait ResourceProbe: Send + 'static {
    fn read(&mut self) -> Result<ResourceReading, ProbeError>;
}

/// Probe backed by `sysinfo`, observing a single process.
pub struct ProcessProbe {
    system: System,
    pid: Pid,
}

impl ProcessProbe {
    /// Observe the process running the harness.
    pub fn current() -> Result<Self, ProbeError> {
        let pid = get_current_pid().map_err(|e| ProbeError::CurrentPid(e.to_string()))?;
        Ok(Self::with_pid(pid))
    }

    /// Observe another process, e.g. the target service.
    pub fn for_pid(pid: u32) -> Self {
        Self::with_pid(Pid::from(pid as usize))
    }

    fn with_pid(pid: Pid) -> Self {
        let mut system = System::new();
        // Prime the CPU baseline so the first sampled reading has a reference
        system.refresh_process(pid);
        Self { system, pid }
    }

    pub fn pid(&self) -> String {
        self.pid.to_string()
    }
}

impl ResourceProbe for ProcessProbe {
    fn read(&mut self) -> Result<ResourceReading, ProbeError> {
        if !self.system.refresh_process(self.pid) {
            return Err(ProbeError::ProcessUnavailable {
                pid: self.pid.to_string(),
            });
        }

        let process = self
            .system
            .process(self.pid)
            .ok_or_else(|| ProbeError::ProcessUnavailable {
                pid: self.pid.to_string(),
            })?;

        Ok(ResourceReading {
            cpu_percent: f64::from(process.cpu_usage()),
            rss_bytes: process.memory(),
        })
    }
}
