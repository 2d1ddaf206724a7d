//! Shared doubles for harness integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use crudperf_core::ObjectType;
use crudperf_harness::{
    EntityId, OperationError, OperationOutcome, OperationResult, ProbeError, ResourceProbe,
    ResourceReading, TargetService,
};

/// Probe whose `cpu_percent` is the zero-based index of the read, so tests
/// can detect lost or duplicated samples.
pub struct SequenceProbe {
    reads: Arc<AtomicUsize>,
}

impl SequenceProbe {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let reads = Arc::new(AtomicUsize::new(0));
        (
            Self {
                reads: Arc::clone(&reads),
            },
            reads,
        )
    }
}

impl ResourceProbe for SequenceProbe {
    fn read(&mut self) -> Result<ResourceReading, ProbeError> {
        let index = self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(ResourceReading {
            cpu_percent: index as f64,
            rss_bytes: 128 * 1_048_576,
        })
    }
}

/// Probe that hangs on every read after the first `healthy_reads`.
pub struct HangingProbe {
    pub healthy_reads: usize,
    pub calls: usize,
}

impl ResourceProbe for HangingProbe {
    fn read(&mut self) -> Result<ResourceReading, ProbeError> {
        self.calls += 1;
        if self.calls > self.healthy_reads {
            thread::sleep(Duration::from_secs(3600));
        }
        Ok(ResourceReading {
            cpu_percent: 0.0,
            rss_bytes: 0,
        })
    }
}

/// In-memory stand-in for the target service.
#[derive(Default)]
pub struct MockService {
    pub latency: Duration,
    next_id: AtomicUsize,

    /// Zero-based indices of create calls that return a failure outcome
    failing_creates: Mutex<HashSet<usize>>,
    /// Update/delete calls on these ids return a failure outcome
    failing_ids: Mutex<HashSet<String>>,
    /// Every call after this many total calls is unreachable
    unreachable_after: Mutex<Option<usize>>,

    calls: AtomicUsize,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub down: AtomicBool,
}

impl MockService {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Default::default()
        }
    }

    pub fn fail_creates(self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.failing_creates.lock().unwrap().extend(indices);
        self
    }

    pub fn fail_ids(self, ids: impl IntoIterator<Item = &'static str>) -> Self {
        self.failing_ids
            .lock()
            .unwrap()
            .extend(ids.into_iter().map(String::from));
        self
    }

    pub fn unreachable_after(self, calls: usize) -> Self {
        *self.unreachable_after.lock().unwrap() = Some(calls);
        self
    }

    async fn enter(&self) -> Result<(), OperationError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let cutoff = *self.unreachable_after.lock().unwrap();
        if self.down.load(Ordering::SeqCst) || cutoff.is_some_and(|limit| call >= limit) {
            return Err(OperationError::Unreachable("connection refused".to_string()));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(())
    }

    fn id_fails(&self, id: &EntityId) -> bool {
        self.failing_ids.lock().unwrap().contains(id.as_str())
    }
}

#[async_trait]
impl TargetService for MockService {
    async fn create(&self, _object_type: ObjectType) -> OperationResult {
        self.enter().await?;
        let index = self.creates.fetch_add(1, Ordering::SeqCst);
        if self.failing_creates.lock().unwrap().contains(&index) {
            return Ok(OperationOutcome::failed("400 Bad Request"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OperationOutcome::created(id.to_string()))
    }

    async fn update(&self, _object_type: ObjectType, id: &EntityId) -> OperationResult {
        self.enter().await?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.id_fails(id) {
            return Ok(OperationOutcome::failed("404 Not Found"));
        }
        Ok(OperationOutcome::succeeded())
    }

    async fn delete(&self, _object_type: ObjectType, id: &EntityId) -> OperationResult {
        self.enter().await?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.id_fails(id) {
            return Ok(OperationOutcome::failed("404 Not Found"));
        }
        Ok(OperationOutcome::succeeded())
    }
}
