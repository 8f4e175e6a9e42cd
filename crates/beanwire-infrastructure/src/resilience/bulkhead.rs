//! Bulkhead
//!
//! One semaphore per circuit. A call that finds no free permit is rejected
//! immediately with `ServiceUnavailable` instead of queueing; the permit is
//! released when the caller drops its [`Admission`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::{Admission, FaultTolerance};
use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

use crate::config::ResilienceConfig;

#[derive(Debug)]
struct Circuit {
    limit: usize,
    permits: Arc<Semaphore>,
    active: Arc<AtomicUsize>,
    rejected: AtomicU64,
}

/// Snapshot of one circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitStats {
    /// Admission limit
    pub limit: usize,
    /// Calls currently holding a permit
    pub active: usize,
    /// Calls rejected since the circuit was created
    pub rejected: u64,
}

/// Permit plus the active-call counter it decrements on drop
struct BulkheadPermit {
    _permit: OwnedSemaphorePermit,
    active: Arc<AtomicUsize>,
}

impl Drop for BulkheadPermit {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Semaphore-backed [`FaultTolerance`]
#[derive(Debug)]
pub struct Bulkhead {
    config: ResilienceConfig,
    circuits: DashMap<String, Arc<Circuit>>,
}

impl Bulkhead {
    /// Bulkhead governed by `config`
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            config,
            circuits: DashMap::new(),
        }
    }

    /// Statistics of a circuit that has seen at least one call
    pub fn stats(&self, circuit: &str) -> Option<CircuitStats> {
        self.circuits.get(circuit).map(|c| CircuitStats {
            limit: c.limit,
            active: c.active.load(Ordering::Relaxed),
            rejected: c.rejected.load(Ordering::Relaxed),
        })
    }

    fn circuit(&self, name: &str) -> Arc<Circuit> {
        let entry = self.circuits.entry(name.to_string()).or_insert_with(|| {
            let limit = self.config.max_concurrent(name);
            debug!(circuit = name, limit, "Created bulkhead circuit");
            Arc::new(Circuit {
                limit,
                permits: Arc::new(Semaphore::new(limit)),
                active: Arc::new(AtomicUsize::new(0)),
                rejected: AtomicU64::new(0),
            })
        });
        Arc::clone(entry.value())
    }
}

#[async_trait]
impl FaultTolerance for Bulkhead {
    async fn admit(&self, circuit: &str) -> Result<Admission> {
        if !self.config.is_enabled(circuit) {
            return Ok(Admission::unguarded());
        }
        let state = self.circuit(circuit);
        match Arc::clone(&state.permits).try_acquire_owned() {
            Ok(permit) => {
                state.active.fetch_add(1, Ordering::Relaxed);
                Ok(Admission::guarded(BulkheadPermit {
                    _permit: permit,
                    active: Arc::clone(&state.active),
                }))
            }
            Err(_) => {
                let rejected = state.rejected.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(circuit, limit = state.limit, rejected, "Bulkhead full, rejecting call");
                Err(Error::service_unavailable(
                    circuit,
                    format!("bulkhead full ({} concurrent calls)", state.limit),
                ))
            }
        }
    }
}
