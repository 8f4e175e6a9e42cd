//! Lease manager
//!
//! One background loop per bean factory. Every renewal interval it looks up
//! each leased service again and rebinds the services whose registry
//! properties changed:
//!
//! | Lookup outcome | Action |
//! |----------------|--------|
//! | registry error | log, keep the current provider |
//! | same properties | nothing |
//! | new properties | bind and swap the provider |
//! | not registered | swap in a `ServiceUnavailable` stand-in |
//!
//! Renewals run concurrently over a snapshot of the leases, so a slow
//! registry call for one service never delays the others.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beanwire_application::RemoteApi;
use beanwire_domain::ServiceDefinition;
use beanwire_domain::error::Result;
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use rand::Rng;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::leased::LeasedService;
use crate::binder::ServiceBinder;
use crate::config::LeaseConfig;
use crate::error_ext::ErrorContext;
use crate::registry::ServiceRegistryClient;

/// Outcome of renewing one lease
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renewal {
    /// Properties unchanged
    Unchanged,
    /// Provider swapped
    Rebound,
}

/// Counts of one renewal pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenewalReport {
    /// Leases whose provider was swapped
    pub rebound: usize,
    /// Leases left as they were
    pub unchanged: usize,
    /// Leases whose lookup or rebinding failed
    pub failed: usize,
}

#[async_trait]
trait Lease: Send + Sync {
    fn api(&self) -> &str;

    async fn renew(&self, registry: &ServiceRegistryClient) -> Result<Renewal>;
}

struct ManagedLease<A: RemoteApi> {
    definition: ServiceDefinition,
    service: Arc<LeasedService<A::Target>>,
    binder: Arc<ServiceBinder>,
}

#[async_trait]
impl<A: RemoteApi> Lease for ManagedLease<A> {
    fn api(&self) -> &str {
        &self.definition.api
    }

    async fn renew(&self, registry: &ServiceRegistryClient) -> Result<Renewal> {
        let properties = registry
            .lookup(&self.definition.api, self.definition.lookup_qualifier())
            .await?;
        if self.service.properties().as_deref() == properties.as_ref() {
            return Ok(Renewal::Unchanged);
        }
        let instance = self.binder.bind::<A>(&self.definition, properties.as_ref())?;
        info!(
            service = %self.definition.api,
            registered = properties.is_some(),
            "Provider changed, swapping"
        );
        self.service.swap(instance, properties);
        Ok(Renewal::Rebound)
    }
}

/// Keeps leased services bound to their current providers
pub struct LeaseManager {
    registry: ServiceRegistryClient,
    config: LeaseConfig,
    leases: Arc<RwLock<Vec<Arc<dyn Lease>>>>,
    cancel_token: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl LeaseManager {
    /// Manager renewing through `registry`
    pub fn new(registry: ServiceRegistryClient, config: LeaseConfig) -> Self {
        Self {
            registry,
            config,
            leases: Arc::new(RwLock::new(Vec::new())),
            cancel_token: CancellationToken::new(),
            task_handle: Mutex::new(None),
        }
    }

    /// Look a service up, bind it and keep it bound
    ///
    /// Never fails: when the registry or the provider cannot be reached the
    /// handle starts with a stand-in and is rebound on a later renewal.
    /// The first call starts the renewal loop.
    pub async fn lease<A: RemoteApi>(
        &self,
        definition: ServiceDefinition,
        binder: Arc<ServiceBinder>,
    ) -> Arc<LeasedService<A::Target>> {
        let qualifier = definition.lookup_qualifier().map(str::to_string);
        let (instance, properties) = match self.registry.lookup(&definition.api, qualifier.as_deref()).await {
            Ok(properties) => match binder.bind::<A>(&definition, properties.as_ref()) {
                Ok(instance) => (instance, properties),
                Err(e) => {
                    warn!(service = %definition.api, error = %e, "Failed to bind provider");
                    (unavailable::<A>(&definition, &e), None)
                }
            },
            Err(e) => {
                warn!(service = %definition.api, error = %e, "Registry lookup failed");
                (unavailable::<A>(&definition, &e), None)
            }
        };

        let service = Arc::new(LeasedService::new(definition.api.clone(), instance, properties));
        let lease: Arc<dyn Lease> = Arc::new(ManagedLease::<A> {
            definition,
            service: Arc::clone(&service),
            binder,
        });
        self.leases.write().push(lease);
        self.ensure_started();
        service
    }

    /// Renew every lease once
    pub async fn renew_all(&self) -> RenewalReport {
        renew_all(&self.registry, &self.snapshot()).await
    }

    /// Number of leased services
    pub fn lease_count(&self) -> usize {
        self.leases.read().len()
    }

    /// Leased api names
    pub fn leased_apis(&self) -> Vec<String> {
        self.leases.read().iter().map(|l| l.api().to_string()).collect()
    }

    /// Whether the renewal loop is running
    pub fn is_running(&self) -> bool {
        self.task_handle.lock().is_some() && !self.cancel_token.is_cancelled()
    }

    /// Stop the renewal loop and release every leased service
    pub async fn stop(&self) {
        self.cancel_token.cancel();
        let handle = self.task_handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await.context("Lease renewal loop did not finish cleanly") {
                warn!(error = %e, "Lease manager stopped with an error");
            }
        }
        let released = std::mem::take(&mut *self.leases.write());
        debug!(leases = released.len(), "Released leased services");
    }

    fn ensure_started(&self) {
        let mut task = self.task_handle.lock();
        if task.is_some() || self.cancel_token.is_cancelled() {
            return;
        }
        let registry = self.registry.clone();
        let config = self.config.clone();
        let leases = Arc::clone(&self.leases);
        let cancel_token = self.cancel_token.clone();
        *task = Some(tokio::spawn(async move {
            renewal_loop(registry, config, leases, cancel_token).await;
        }));
    }

    fn snapshot(&self) -> Vec<Arc<dyn Lease>> {
        self.leases.read().clone()
    }
}

fn unavailable<A: RemoteApi>(definition: &ServiceDefinition, cause: &beanwire_domain::Error) -> Arc<A::Target> {
    ServiceBinder::rejecting::<A>(
        definition,
        beanwire_domain::Error::service_unavailable(definition.api.clone(), cause.to_string()),
    )
}

async fn renew_all(registry: &ServiceRegistryClient, leases: &[Arc<dyn Lease>]) -> RenewalReport {
    let outcomes = join_all(leases.iter().map(|lease| async move {
        let outcome = lease.renew(registry).await;
        if let Err(e) = &outcome {
            warn!(service = %lease.api(), error = %e, "Lease renewal failed, keeping current provider");
        }
        outcome
    }))
    .await;

    let mut report = RenewalReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(Renewal::Rebound) => report.rebound += 1,
            Ok(Renewal::Unchanged) => report.unchanged += 1,
            Err(_) => report.failed += 1,
        }
    }
    report
}

async fn renewal_loop(
    registry: ServiceRegistryClient,
    config: LeaseConfig,
    leases: Arc<RwLock<Vec<Arc<dyn Lease>>>>,
    cancel_token: CancellationToken,
) {
    info!(interval_ms = config.renew_interval_ms, "Lease manager started");
    loop {
        let delay = config.renew_interval() + jitter(config.jitter());
        tokio::select! {
            () = cancel_token.cancelled() => break,
            () = tokio::time::sleep(delay) => {
                let snapshot = leases.read().clone();
                let report = renew_all(&registry, &snapshot).await;
                debug!(
                    rebound = report.rebound,
                    unchanged = report.unchanged,
                    failed = report.failed,
                    "Lease renewal pass complete"
                );
            }
        }
    }
    info!("Lease manager stopped");
}

fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    let millis = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rand::rng().random_range(0..=millis))
}

impl std::fmt::Debug for LeaseManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaseManager")
            .field("leases", &self.lease_count())
            .field("running", &self.is_running())
            .finish()
    }
}
