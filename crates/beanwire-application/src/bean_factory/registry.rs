//! Factory Registry
//!
//! Maps a [`BeanKey`] to the provider able to construct that bean. The table
//! is filled with explicit registration calls at startup and read by every
//! resolution afterwards.

use std::any::Any;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use beanwire_domain::BeanKey;
use beanwire_domain::error::Result;
use dashmap::DashMap;

use super::factory::BeanResolution;

/// Type-erased bean instance
pub type Bean = Arc<dyn Any + Send + Sync>;

/// Constructs one bean
///
/// Providers may resolve their own dependencies through the
/// [`BeanResolution`] they receive.
#[async_trait]
pub trait BeanProvider: Send + Sync {
    /// Create the bean
    async fn create(&self, resolution: BeanResolution) -> Result<Bean>;
}

/// Provider backed by an async closure
struct FnProvider<F, T> {
    factory: F,
    _bean: PhantomData<fn() -> T>,
}

#[async_trait]
impl<F, Fut, T> BeanProvider for FnProvider<F, T>
where
    F: Fn(BeanResolution) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + Sync + 'static,
{
    async fn create(&self, resolution: BeanResolution) -> Result<Bean> {
        let bean = (self.factory)(resolution).await?;
        Ok(Arc::new(bean))
    }
}

/// Provider that hands out a prebuilt value
struct InstanceProvider<T> {
    value: T,
}

#[async_trait]
impl<T> BeanProvider for InstanceProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn create(&self, _resolution: BeanResolution) -> Result<Bean> {
        Ok(Arc::new(self.value.clone()))
    }
}

/// Registration table of bean providers
#[derive(Default)]
pub struct FactoryRegistry {
    providers: DashMap<BeanKey, Arc<dyn BeanProvider>>,
}

impl FactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async factory for the unqualified bean of type `T`
    pub fn register<T, F, Fut>(&self, factory: F)
    where
        F: Fn(BeanResolution) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        self.register_provider(BeanKey::of::<T>(), Self::closure(factory));
    }

    /// Register an async factory for a qualified bean of type `T`
    pub fn register_qualified<T, F, Fut>(&self, qualifier: impl Into<String>, factory: F)
    where
        F: Fn(BeanResolution) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        self.register_provider(BeanKey::qualified::<T>(qualifier), Self::closure(factory));
    }

    /// Register a prebuilt value
    pub fn register_instance<T>(&self, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        self.register_provider(BeanKey::of::<T>(), Arc::new(InstanceProvider { value }));
    }

    /// Register a provider under an explicit key
    ///
    /// The provider must create a bean of the key's type. A later
    /// registration for the same key replaces the earlier one.
    pub fn register_provider(&self, key: BeanKey, provider: Arc<dyn BeanProvider>) {
        if self.providers.insert(key.clone(), provider).is_some() {
            tracing::debug!(bean = %key, "Replaced bean provider");
        }
    }

    /// Provider registered for a key
    pub fn get(&self, key: &BeanKey) -> Option<Arc<dyn BeanProvider>> {
        self.providers.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether a provider is registered for a key
    pub fn contains(&self, key: &BeanKey) -> bool {
        self.providers.contains_key(key)
    }

    /// All registered keys
    pub fn keys(&self) -> Vec<BeanKey> {
        self.providers.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn closure<T, F, Fut>(factory: F) -> Arc<dyn BeanProvider>
    where
        F: Fn(BeanResolution) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Clone + Send + Sync + 'static,
    {
        Arc::new(FnProvider {
            factory,
            _bean: PhantomData,
        })
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("providers", &self.keys())
            .finish()
    }
}
