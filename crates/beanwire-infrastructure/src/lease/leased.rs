//! Leased service handle
//!
//! The bean handed out for a remote service. Its identity never changes;
//! the provider behind it is swapped atomically when the lease manager
//! observes new registry properties.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::{ArcSwap, ArcSwapOption};
use beanwire_domain::ServiceProperties;

/// Stable handle to the current provider of a remote api
pub struct LeasedService<T: ?Sized> {
    api: String,
    current: ArcSwap<Arc<T>>,
    properties: ArcSwapOption<ServiceProperties>,
    generation: AtomicU64,
}

impl<T: ?Sized + Send + Sync + 'static> LeasedService<T> {
    /// Handle bound to an initial provider
    pub fn new(api: impl Into<String>, instance: Arc<T>, properties: Option<ServiceProperties>) -> Self {
        Self {
            api: api.into(),
            current: ArcSwap::from_pointee(instance),
            properties: ArcSwapOption::from(properties.map(Arc::new)),
            generation: AtomicU64::new(0),
        }
    }

    /// Provider to call right now
    ///
    /// A call made on the returned provider completes against it even if a
    /// swap happens meanwhile.
    pub fn current(&self) -> Arc<T> {
        let guard = self.current.load();
        Arc::clone(&**guard)
    }

    /// Properties the current provider was built from; `None` for stand-ins
    pub fn properties(&self) -> Option<Arc<ServiceProperties>> {
        self.properties.load_full()
    }

    /// Api name
    pub fn api(&self) -> &str {
        &self.api
    }

    /// Number of swaps so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replace the provider
    pub fn swap(&self, instance: Arc<T>, properties: Option<ServiceProperties>) {
        self.current.store(Arc::new(instance));
        self.properties.store(properties.map(Arc::new));
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl<T: ?Sized> std::fmt::Debug for LeasedService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeasedService")
            .field("api", &self.api)
            .field("properties", &self.properties.load_full())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish()
    }
}
