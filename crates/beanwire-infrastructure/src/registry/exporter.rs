//! Service exporter
//!
//! Keeps the registry entries of locally exported services alive. Every
//! export interval all exports are registered again, which restarts their
//! lease; a failed pass is retried after the shorter retry interval.

use std::sync::Arc;
use std::time::Duration;

use beanwire_domain::ServiceProperties;
use beanwire_domain::error::Result;
use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::client::ServiceRegistryClient;
use crate::config::RegistryConfig;

#[derive(Debug, Clone)]
struct Export {
    api: String,
    properties: ServiceProperties,
}

/// Periodically re-registers exported services
pub struct ServiceExporter {
    registry: ServiceRegistryClient,
    config: RegistryConfig,
    exports: Arc<Mutex<Vec<Export>>>,
    cancel_token: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ServiceExporter {
    /// Exporter publishing through `registry`
    pub fn new(registry: ServiceRegistryClient, config: RegistryConfig) -> Self {
        Self {
            registry,
            config,
            exports: Arc::new(Mutex::new(Vec::new())),
            cancel_token: CancellationToken::new(),
            task_handle: Mutex::new(None),
        }
    }

    /// Add an export and register it immediately
    ///
    /// A registration failure is logged; the background loop retries it.
    pub async fn export(&self, api: impl Into<String>, properties: ServiceProperties) {
        let export = Export {
            api: api.into(),
            properties,
        };
        {
            let mut exports = self.exports.lock();
            exports.retain(|e| !(e.api == export.api && e.properties.qualifier == export.properties.qualifier));
            exports.push(export.clone());
        }
        if let Err(e) = self.register(&export).await {
            warn!(service = %export.api, error = %e, "Initial registration failed, will retry");
        }
    }

    /// Exported apis
    pub fn exported_apis(&self) -> Vec<String> {
        self.exports.lock().iter().map(|e| e.api.clone()).collect()
    }

    /// Register every export once
    ///
    /// Returns the number of failed registrations.
    pub async fn register_all(&self) -> usize {
        register_all(&self.registry, &self.config, &self.snapshot()).await
    }

    /// Start the background loop; later calls do nothing
    pub fn start(&self) {
        let mut task = self.task_handle.lock();
        if task.is_some() {
            return;
        }
        let registry = self.registry.clone();
        let config = self.config.clone();
        let exports = Arc::clone(&self.exports);
        let cancel_token = self.cancel_token.clone();
        *task = Some(tokio::spawn(async move {
            export_loop(registry, config, exports, cancel_token).await;
        }));
    }

    /// Stop the loop and remove all registrations
    pub async fn stop(&self) {
        self.cancel_token.cancel();
        let handle = self.task_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        for export in self.snapshot() {
            if let Err(e) = self
                .registry
                .deregister(&export.api, export.properties.qualifier.as_deref())
                .await
            {
                warn!(service = %export.api, error = %e, "Failed to deregister service");
            }
        }
    }

    /// Whether the background loop is running
    pub fn is_running(&self) -> bool {
        self.task_handle.lock().is_some() && !self.cancel_token.is_cancelled()
    }

    fn snapshot(&self) -> Vec<Export> {
        self.exports.lock().clone()
    }

    async fn register(&self, export: &Export) -> Result<()> {
        self.registry
            .register(&export.api, &export.properties, self.config.lease_ms)
            .await
    }
}

async fn register_all(
    registry: &ServiceRegistryClient,
    config: &RegistryConfig,
    exports: &[Export],
) -> usize {
    let outcomes = join_all(exports.iter().map(|export| async move {
        let outcome = registry
            .register(&export.api, &export.properties, config.lease_ms)
            .await;
        if let Err(e) = &outcome {
            warn!(service = %export.api, error = %e, "Service registration failed");
        }
        outcome
    }))
    .await;
    outcomes.iter().filter(|o| o.is_err()).count()
}

async fn export_loop(
    registry: ServiceRegistryClient,
    config: RegistryConfig,
    exports: Arc<Mutex<Vec<Export>>>,
    cancel_token: CancellationToken,
) {
    info!(
        interval_ms = config.export_interval_ms,
        retry_ms = config.retry_interval_ms,
        "Service exporter started"
    );
    let mut delay = config.export_interval();
    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,
            () = tokio::time::sleep(delay) => {
                let snapshot = exports.lock().clone();
                let failures = register_all(&registry, &config, &snapshot).await;
                delay = next_delay(&config, failures);
            }
        }
    }
    info!("Service exporter stopped");
}

fn next_delay(config: &RegistryConfig, failures: usize) -> Duration {
    if failures == 0 {
        config.export_interval()
    } else {
        config.retry_interval()
    }
}

impl std::fmt::Debug for ServiceExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceExporter")
            .field("exports", &self.exports.lock().len())
            .field("running", &self.is_running())
            .finish()
    }
}
