//! Background resource sampler.
//!
//! A sampling window runs on a dedicated OS thread so that sampling never
//! competes with the driver's timed section for runtime workers. The thread
//! owns the probe and the sample buffer for the whole window; both are moved
//! back to the [`ResourceSampler`] through a oneshot channel when the loop
//! acknowledges a stop request. Samples are therefore only observable after
//! [`ResourceSampler::disarm`] has returned.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crudperf_core::Sample;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::probe::ResourceProbe;

/// Default bound on how long `disarm` waits for the loop to stop.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(1);

/// State handed back by the sampling thread when it stops.
struct LoopExit {
    probe: Box<dyn ResourceProbe>,
    samples: Vec<Sample>,
}

/// An open sampling window.
struct ActiveWindow {
    stop_tx: mpsc::Sender<()>,
    done_rx: oneshot::Receiver<LoopExit>,
    handle: JoinHandle<()>,
    armed_at: Instant,
}

/// Records timestamped CPU and memory readings while armed.
pub struct ResourceSampler {
    probe: Option<Box<dyn ResourceProbe>>,
    stop_grace: Duration,
    active: Option<ActiveWindow>,
    samples: Vec<Sample>,
}

impl ResourceSampler {
    pub fn new(probe: impl ResourceProbe) -> Self {
        Self {
            probe: Some(Box::new(probe)),
            stop_grace: DEFAULT_STOP_GRACE,
            active: None,
            samples: Vec::new(),
        }
    }

    pub fn with_stop_grace(mut self, stop_grace: Duration) -> Self {
        self.stop_grace = stop_grace;
        self
    }

    pub fn is_armed(&self) -> bool {
        self.active.is_some()
    }

    /// Start a new sampling window, discarding samples of the previous one.
    ///
    /// Arming an armed sampler closes the open window first. Returns as soon
    /// as the sampling thread is spawned. A zero `interval` is rejected.
    pub async fn arm(&mut self, interval: Duration) -> HarnessResult<()> {
        if interval.is_zero() {
            return Err(HarnessError::ZeroInterval);
        }
        if self.active.is_some() {
            debug!("sampler already armed; closing the open window first");
            self.disarm().await?;
        }

        let probe = self.probe.take().ok_or(HarnessError::SamplerPoisoned)?;
        self.samples.clear();

        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = oneshot::channel();

        let handle = thread::Builder::new()
            .name("resource-sampler".to_string())
            .spawn(move || sample_loop(probe, interval, stop_rx, done_tx))
            .map_err(HarnessError::SamplerSpawn)?;

        self.active = Some(ActiveWindow {
            stop_tx,
            done_rx,
            handle,
            armed_at: Instant::now(),
        });

        Ok(())
    }

    /// Stop the sampling loop and wait, at most the stop grace, until it has
    /// handed its samples back. No-op when not armed.
    ///
    /// On timeout the sampler is poisoned: the probe stays with the stray
    /// thread and every later `arm` fails with [`HarnessError::SamplerPoisoned`].
    pub async fn disarm(&mut self) -> HarnessResult<()> {
        let Some(window) = self.active.take() else {
            return Ok(());
        };

        // A closed receiver means the loop is already on its way out
        let _ = window.stop_tx.send(());

        match tokio::time::timeout(self.stop_grace, window.done_rx).await {
            Ok(Ok(exit)) => {
                // The loop reports as its last action; reap it off the runtime
                let handle = window.handle;
                match tokio::task::spawn_blocking(move || handle.join()).await {
                    Ok(Ok(())) => {}
                    _ => warn!("resource sampler thread panicked after reporting"),
                }
                debug!(
                    samples = exit.samples.len(),
                    window_ms = window.armed_at.elapsed().as_millis() as u64,
                    "sampling window closed"
                );
                self.probe = Some(exit.probe);
                self.samples = exit.samples;
                Ok(())
            }
            Ok(Err(_)) => {
                error!("resource sampler thread exited without reporting samples");
                Err(HarnessError::SamplerPanicked)
            }
            Err(_) => {
                error!(
                    grace_ms = self.stop_grace.as_millis() as u64,
                    "resource sampler failed to stop in time"
                );
                Err(HarnessError::SamplerStopTimeout {
                    grace: self.stop_grace,
                })
            }
        }
    }

    /// Take the samples of the last closed window, in collection order.
    ///
    /// Rejected while armed. A second call without re-arming returns an
    /// empty sequence.
    pub fn drain(&mut self) -> HarnessResult<Vec<Sample>> {
        if self.active.is_some() {
            return Err(HarnessError::SamplerArmed);
        }
        Ok(std::mem::take(&mut self.samples))
    }
}

impl Drop for ResourceSampler {
    fn drop(&mut self) {
        if let Some(window) = self.active.take() {
            let _ = window.stop_tx.send(());
        }
    }
}

fn sample_loop(
    mut probe: Box<dyn ResourceProbe>,
    interval: Duration,
    stop_rx: mpsc::Receiver<()>,
    done_tx: oneshot::Sender<LoopExit>,
) {
    let mut samples = Vec::new();

    loop {
        match probe.read() {
            Ok(reading) => samples.push(Sample::new(
                Instant::now(),
                reading.cpu_percent,
                reading.rss_bytes,
            )),
            Err(err) => warn!(error = %err, "resource sampling failed; continuing"),
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = done_tx.send(LoopExit { probe, samples });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeError, ResourceReading};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingProbe {
        reads: Arc<AtomicUsize>,
    }

    impl ResourceProbe for CountingProbe {
        fn read(&mut self) -> Result<ResourceReading, ProbeError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(ResourceReading {
                cpu_percent: n as f64,
                rss_bytes: 64 * 1_048_576,
            })
        }
    }

    /// Fails every other read.
    struct FlakyProbe {
        calls: usize,
    }

    impl ResourceProbe for FlakyProbe {
        fn read(&mut self) -> Result<ResourceReading, ProbeError> {
            self.calls += 1;
            if self.calls % 2 == 0 {
                return Err(ProbeError::ProcessUnavailable {
                    pid: "42".to_string(),
                });
            }
            Ok(ResourceReading {
                cpu_percent: 1.0,
                rss_bytes: 1_048_576,
            })
        }
    }

    /// Blocks forever on its second read.
    struct StuckProbe {
        calls: usize,
    }

    impl ResourceProbe for StuckProbe {
        fn read(&mut self) -> Result<ResourceReading, ProbeError> {
            self.calls += 1;
            if self.calls > 1 {
                thread::sleep(Duration::from_secs(3600));
            }
            Ok(ResourceReading {
                cpu_percent: 0.0,
                rss_bytes: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_samples_match_reads() {
        let reads = Arc::new(AtomicUsize::new(0));
        let mut sampler = ResourceSampler::new(CountingProbe {
            reads: Arc::clone(&reads),
        });

        sampler.arm(Duration::from_millis(5)).await.unwrap();
        assert!(sampler.is_armed());
        tokio::time::sleep(Duration::from_millis(50)).await;
        sampler.disarm().await.unwrap();

        let samples = sampler.drain().unwrap();
        assert_eq!(samples.len(), reads.load(Ordering::SeqCst));
        assert!(!samples.is_empty());
        assert!(samples.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(samples[0].memory_mb, 64.0);
    }

    #[tokio::test]
    async fn test_drain_rejected_while_armed() {
        let mut sampler = ResourceSampler::new(FlakyProbe { calls: 0 });
        sampler.arm(Duration::from_millis(5)).await.unwrap();

        assert!(matches!(sampler.drain(), Err(HarnessError::SamplerArmed)));

        sampler.disarm().await.unwrap();
        assert!(sampler.drain().is_ok());
    }

    #[tokio::test]
    async fn test_read_failures_do_not_end_window() {
        let mut sampler = ResourceSampler::new(FlakyProbe { calls: 0 });
        sampler.arm(Duration::from_millis(2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        sampler.disarm().await.unwrap();

        // Roughly half the reads fail, the rest must still be collected
        let samples = sampler.drain().unwrap();
        assert!(samples.len() >= 2, "got {} samples", samples.len());
    }

    #[tokio::test]
    async fn test_rearm_closes_previous_window() {
        let reads = Arc::new(AtomicUsize::new(0));
        let mut sampler = ResourceSampler::new(CountingProbe {
            reads: Arc::clone(&reads),
        });

        sampler.arm(Duration::from_millis(5)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        sampler.arm(Duration::from_millis(5)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        sampler.disarm().await.unwrap();

        // Read indices are sequential, so the second window holds exactly the
        // trailing reads
        let samples = sampler.drain().unwrap();
        let total = reads.load(Ordering::SeqCst);
        assert!(!samples.is_empty());
        assert!(samples.len() < total);
        assert_eq!(samples[0].cpu_percent as usize, total - samples.len());
        assert_eq!(samples[samples.len() - 1].cpu_percent as usize, total - 1);
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let mut sampler = ResourceSampler::new(FlakyProbe { calls: 0 });

        let err = sampler.arm(Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, HarnessError::ZeroInterval));
        assert!(!sampler.is_armed());

        // The probe is untouched, so a valid window still works
        sampler.arm(Duration::from_millis(5)).await.unwrap();
        sampler.disarm().await.unwrap();
        assert!(!sampler.drain().unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_windows_on_single_thread_runtime() {
        let reads = Arc::new(AtomicUsize::new(0));
        let mut sampler = ResourceSampler::new(CountingProbe {
            reads: Arc::clone(&reads),
        });
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..20 {
            sampler.arm(Duration::from_millis(1)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
            sampler.disarm().await.unwrap();
            assert_eq!(sampler.drain().unwrap().len(), reads.swap(0, Ordering::SeqCst));
        }

        ticker.abort();
        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_disarm_without_arm_is_noop() {
        let mut sampler = ResourceSampler::new(FlakyProbe { calls: 0 });
        sampler.disarm().await.unwrap();
        assert!(sampler.drain().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_timeout_poisons_sampler() {
        let mut sampler = ResourceSampler::new(StuckProbe { calls: 0 })
            .with_stop_grace(Duration::from_millis(50));

        sampler.arm(Duration::from_millis(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = sampler.disarm().await.unwrap_err();
        assert!(matches!(err, HarnessError::SamplerStopTimeout { .. }));
        assert!(matches!(
            sampler.arm(Duration::from_millis(1)).await,
            Err(HarnessError::SamplerPoisoned)
        ));
    }
}
