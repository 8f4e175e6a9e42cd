//! Bean Factory
//!
//! Resolves beans lazily and caches every instance it builds.
//!
//! ## Resolution
//!
//! ```text
//! get_bean::<A>()
//!   └─ resolve(A, path = [])
//!        ├─ cached?                       → return instance
//!        ├─ A already on path?            → CircularDependency
//!        ├─ no provider?                  → MissingBeanProvider / MissingBeanDependency
//!        ├─ lock slot(A), re-check cache
//!        └─ provider.create(path = [A])
//!             └─ resolution.get::<B>()
//!                  └─ resolve(B, path = [A]) ...
//! ```
//!
//! The in-progress path travels with each call chain, so concurrent
//! resolutions of unrelated beans never see each other's state. Creation is
//! serialized per bean key only.

use std::any::type_name;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use beanwire_domain::BeanKey;
use beanwire_domain::error::{Error, Result};
use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::registry::{Bean, FactoryRegistry};

/// Async teardown action run by [`BeanFactory::destroy`]
pub type ShutdownHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Lazily constructing, caching bean resolver
///
/// Cloning is cheap; clones share the cache.
#[derive(Clone)]
pub struct BeanFactory {
    inner: Arc<BeanFactoryInner>,
}

struct BeanFactoryInner {
    registry: Arc<FactoryRegistry>,
    instances: DashMap<BeanKey, Bean>,
    creation_locks: DashMap<BeanKey, Arc<Mutex<()>>>,
    creation_graph: parking_lot::Mutex<CreationGraph>,
    next_chain: AtomicU64,
    shutdown_hooks: parking_lot::Mutex<Vec<ShutdownHook>>,
    destroyed: AtomicBool,
}

impl BeanFactory {
    /// Create a factory over a provider registry
    pub fn new(registry: Arc<FactoryRegistry>) -> Self {
        Self {
            inner: Arc::new(BeanFactoryInner {
                registry,
                instances: DashMap::new(),
                creation_locks: DashMap::new(),
                creation_graph: parking_lot::Mutex::new(CreationGraph::default()),
                next_chain: AtomicU64::new(0),
                shutdown_hooks: parking_lot::Mutex::new(Vec::new()),
                destroyed: AtomicBool::new(false),
            }),
        }
    }

    /// Provider registry backing this factory
    pub fn registry(&self) -> &Arc<FactoryRegistry> {
        &self.inner.registry
    }

    /// Get the unqualified bean of type `T`
    pub async fn get_bean<T>(&self) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_by_key(&BeanKey::of::<T>()).await
    }

    /// Get a qualified bean of type `T`
    pub async fn get_qualified_bean<T>(&self, qualifier: &str) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_by_key(&BeanKey::qualified::<T>(qualifier)).await
    }

    /// Get the bean registered under `key`
    pub async fn get_by_key<T>(&self, key: &BeanKey) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let chain = self.inner.next_chain.fetch_add(1, Ordering::Relaxed);
        let bean = self.resolve(key.clone(), Vec::new(), chain).await?;
        downcast(key, &bean)
    }

    /// Whether an instance for `key` has already been built
    pub fn is_instantiated(&self, key: &BeanKey) -> bool {
        self.inner.instances.contains_key(key)
    }

    /// Number of cached instances
    pub fn instance_count(&self) -> usize {
        self.inner.instances.len()
    }

    /// Register an action to run when the factory is destroyed
    pub fn add_shutdown_hook(&self, hook: ShutdownHook) {
        self.inner.shutdown_hooks.lock().push(hook);
    }

    /// Whether [`destroy`](Self::destroy) has run
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Run shutdown hooks in reverse registration order and drop all instances
    pub async fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        let hooks: Vec<ShutdownHook> = std::mem::take(&mut *self.inner.shutdown_hooks.lock());
        info!(hooks = hooks.len(), beans = self.instance_count(), "Destroying bean factory");
        for hook in hooks.into_iter().rev() {
            hook().await;
        }
        self.inner.instances.clear();
        self.inner.creation_locks.clear();
    }

    fn resolve(&self, key: BeanKey, path: Vec<BeanKey>, chain: u64) -> BoxFuture<'static, Result<Bean>> {
        let factory = self.clone();
        async move {
            if let Some(bean) = factory.cached(&key) {
                return Ok(bean);
            }

            if let Some(start) = path.iter().position(|k| k == &key) {
                let chain = path[start..]
                    .iter()
                    .chain(std::iter::once(&key))
                    .map(ToString::to_string);
                let err = Error::circular_dependency(chain);
                warn!(bean = %key, error = %err, "Bean resolution failed");
                return Err(err);
            }

            let Some(provider) = factory.inner.registry.get(&key) else {
                return Err(match path.last() {
                    Some(parent) => Error::missing_bean_dependency(parent.to_string(), key.to_string()),
                    None => Error::missing_bean_provider(key.to_string()),
                });
            };

            let _creating = factory.acquire_slot(&key, &path, chain).await?;

            if let Some(bean) = factory.cached(&key) {
                return Ok(bean);
            }
            if factory.is_destroyed() {
                return Err(Error::bean_creation(
                    key.to_string(),
                    "bean factory has been destroyed",
                ));
            }

            debug!(bean = %key, depth = path.len(), "Creating bean");
            let mut child_path = path;
            child_path.push(key.clone());
            let resolution = BeanResolution {
                factory: factory.clone(),
                path: child_path,
                chain,
            };
            let bean = provider.create(resolution).await?;
            factory.inner.instances.insert(key, Arc::clone(&bean));
            Ok(bean)
        }
        .boxed()
    }

    async fn acquire_slot(&self, key: &BeanKey, path: &[BeanKey], chain: u64) -> Result<SlotGuard> {
        let slot = Arc::clone(&*self.inner.creation_locks.entry(key.clone()).or_default());

        let waiting = {
            let mut graph = self.inner.creation_graph.lock();
            if let Ok(lock) = Arc::clone(&slot).try_lock_owned() {
                graph.holders.insert(key.clone(), chain);
                return Ok(SlotGuard::new(&self.inner, key, lock));
            }
            if let Some(cycle) = graph.cycle(chain, key) {
                let err = Error::circular_dependency(
                    path.last().into_iter().chain(&cycle).map(ToString::to_string),
                );
                warn!(bean = %key, error = %err, "Bean resolution failed");
                return Err(err);
            }
            graph.waiting.insert(chain, key.clone());
            WaitGuard {
                inner: Arc::clone(&self.inner),
                chain,
            }
        };

        let lock = slot.lock_owned().await;
        drop(waiting);
        self.inner
            .creation_graph
            .lock()
            .holders
            .insert(key.clone(), chain);
        Ok(SlotGuard::new(&self.inner, key, lock))
    }

    fn cached(&self, key: &BeanKey) -> Option<Bean> {
        self.inner
            .instances
            .get(key)
            .map(|entry| Arc::clone(entry.value()))
    }
}

/// Which chain holds each creation slot and which slot each chain waits for
#[derive(Default)]
struct CreationGraph {
    holders: HashMap<BeanKey, u64>,
    waiting: HashMap<u64, BeanKey>,
}

impl CreationGraph {
    /// Slots leading from `key` back to a slot held by `chain`, if any
    fn cycle(&self, chain: u64, key: &BeanKey) -> Option<Vec<BeanKey>> {
        let mut keys = vec![key.clone()];
        let mut current = key;
        while let Some(&owner) = self.holders.get(current) {
            if owner == chain {
                return Some(keys);
            }
            if keys.len() > self.holders.len() {
                return None;
            }
            current = self.waiting.get(&owner)?;
            keys.push(current.clone());
        }
        None
    }
}

struct SlotGuard {
    inner: Arc<BeanFactoryInner>,
    key: BeanKey,
    _lock: OwnedMutexGuard<()>,
}

impl SlotGuard {
    fn new(inner: &Arc<BeanFactoryInner>, key: &BeanKey, lock: OwnedMutexGuard<()>) -> Self {
        Self {
            inner: Arc::clone(inner),
            key: key.clone(),
            _lock: lock,
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // runs before `_lock` is released
        self.inner.creation_graph.lock().holders.remove(&self.key);
    }
}

struct WaitGuard {
    inner: Arc<BeanFactoryInner>,
    chain: u64,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.inner.creation_graph.lock().waiting.remove(&self.chain);
    }
}

impl std::fmt::Debug for BeanFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanFactory")
            .field("providers", &self.inner.registry.len())
            .field("instances", &self.inner.instances.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Resolution context handed to a bean provider
///
/// Carries the chain of beans currently under construction so dependency
/// lookups made from inside a provider can detect cycles.
#[derive(Clone)]
pub struct BeanResolution {
    factory: BeanFactory,
    path: Vec<BeanKey>,
    chain: u64,
}

impl BeanResolution {
    /// Get the unqualified dependency of type `T`
    pub async fn get<T>(&self) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_by_key(&BeanKey::of::<T>()).await
    }

    /// Get a qualified dependency of type `T`
    pub async fn get_qualified<T>(&self, qualifier: &str) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_by_key(&BeanKey::qualified::<T>(qualifier)).await
    }

    /// Get the dependency registered under `key`
    pub async fn get_by_key<T>(&self, key: &BeanKey) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let bean = self
            .factory
            .resolve(key.clone(), self.path.clone(), self.chain)
            .await?;
        downcast(key, &bean)
    }

    /// Bean currently being created
    pub fn current(&self) -> Option<&BeanKey> {
        self.path.last()
    }

    /// Chain of beans under construction, outermost first
    pub fn path(&self) -> &[BeanKey] {
        &self.path
    }

    /// Factory performing the resolution
    pub fn factory(&self) -> &BeanFactory {
        &self.factory
    }
}

fn downcast<T>(key: &BeanKey, bean: &Bean) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
{
    bean.downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| Error::bean_type(key.to_string(), type_name::<T>()))
}
