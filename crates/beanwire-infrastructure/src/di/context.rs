//! Application context
//!
//! Wires configuration, the bean factory, the registry client, the lease
//! manager and the exporter into one object, and owns their shutdown.

use std::sync::Arc;

use beanwire_application::bean_factory::ShutdownHook;
use beanwire_application::ports::TransportComponent;
use beanwire_application::{
    BeanFactory, BeanResolution, ExposedApi, FactoryRegistry, RemoteApi, ServiceActivator,
};
use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::{FaultTolerance, ObjectSerializer, ServiceRegistryBackend};
use beanwire_domain::{BeanKey, ServiceDefinition, ServiceProperties};
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::binder::ServiceBinder;
use crate::config::{AppConfig, loader::validate_app_config};
use crate::constants::DIRECT_TRANSPORT;
use crate::lease::{LeaseManager, LeasedService};
use crate::registry::{InMemoryRegistry, ServiceExporter, ServiceRegistryClient};
use crate::resilience::Bulkhead;
use crate::serializer::SerializerCatalog;
use crate::transport::DirectTransportComponent;

/// Bean key of the leased handle for `A`
pub fn service_key<A: RemoteApi>(qualifier: Option<&str>) -> BeanKey {
    let key = BeanKey::of::<Arc<LeasedService<A::Target>>>();
    match qualifier {
        Some(qualifier) => key.with_qualifier(qualifier),
        None => key,
    }
}

/// Build a context with defaults for everything but the configuration
pub fn init_context(config: AppConfig) -> Result<ApplicationContext> {
    ApplicationContext::builder(config).build()
}

/// Builder for [`ApplicationContext`]
pub struct ApplicationContextBuilder {
    config: AppConfig,
    beans: Option<Arc<FactoryRegistry>>,
    backend: Option<Arc<dyn ServiceRegistryBackend>>,
    components: Vec<Arc<dyn TransportComponent>>,
    serializers: Vec<(u32, Arc<dyn ObjectSerializer>)>,
    fault_tolerance: Option<Arc<dyn FaultTolerance>>,
}

impl ApplicationContextBuilder {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            beans: None,
            backend: None,
            components: Vec::new(),
            serializers: Vec::new(),
            fault_tolerance: None,
        }
    }

    /// Use a pre-filled bean registry
    pub fn with_beans(mut self, beans: Arc<FactoryRegistry>) -> Self {
        self.beans = Some(beans);
        self
    }

    /// Registry backend; defaults to a fresh [`InMemoryRegistry`]
    pub fn with_registry_backend(mut self, backend: Arc<dyn ServiceRegistryBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Add a transport component; a "direct" component is always present
    pub fn with_component(mut self, component: Arc<dyn TransportComponent>) -> Self {
        self.components.push(component);
        self
    }

    /// Configured serializer instance for `version`
    pub fn with_serializer(mut self, version: u32, serializer: Arc<dyn ObjectSerializer>) -> Self {
        self.serializers.push((version, serializer));
        self
    }

    /// Admission control; defaults to a [`Bulkhead`] over the resilience section
    pub fn with_fault_tolerance(mut self, fault_tolerance: Arc<dyn FaultTolerance>) -> Self {
        self.fault_tolerance = Some(fault_tolerance);
        self
    }

    /// Validate the configuration and wire the context
    pub fn build(self) -> Result<ApplicationContext> {
        validate_app_config(&self.config)?;
        let config = Arc::new(self.config);

        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(InMemoryRegistry::new()));
        let registry = ServiceRegistryClient::new(backend);

        let serializers = Arc::new(SerializerCatalog::new());
        for (version, serializer) in self.serializers {
            serializers.register(version, serializer);
        }

        let fault_tolerance = self
            .fault_tolerance
            .unwrap_or_else(|| Arc::new(Bulkhead::new(config.resilience.clone())));
        let binder = ServiceBinder::new(config.subsystem.clone(), Arc::clone(&serializers))
            .with_fault_tolerance(fault_tolerance);
        if !self.components.iter().any(|c| c.name() == DIRECT_TRANSPORT) {
            binder.add_component(Arc::new(DirectTransportComponent::new()));
        }
        for component in self.components {
            binder.add_component(component);
        }
        let binder = Arc::new(binder);

        let lease_manager = Arc::new(LeaseManager::new(registry.clone(), config.lease.clone()));
        let exporter = Arc::new(ServiceExporter::new(registry.clone(), config.registry.clone()));

        let beans = self.beans.unwrap_or_default();
        beans.register_instance(Arc::clone(&config));
        beans.register_instance(registry.clone());
        beans.register_instance(Arc::clone(&lease_manager));
        let factory = BeanFactory::new(beans);

        let context = ApplicationContext {
            config,
            factory,
            registry,
            serializers,
            binder,
            lease_manager,
            exporter,
            exports: Arc::new(Mutex::new(Vec::new())),
        };
        context.install_shutdown_hooks();
        info!(
            subsystem = %context.config.subsystem.name,
            registry = context.registry.backend_name(),
            "Application context ready"
        );
        Ok(context)
    }
}

/// Provider-side record of one export
struct LocalExport {
    component: Arc<dyn TransportComponent>,
    properties: ServiceProperties,
}

/// Composition root of a beanwire process
pub struct ApplicationContext {
    config: Arc<AppConfig>,
    factory: BeanFactory,
    registry: ServiceRegistryClient,
    serializers: Arc<SerializerCatalog>,
    binder: Arc<ServiceBinder>,
    lease_manager: Arc<LeaseManager>,
    exporter: Arc<ServiceExporter>,
    exports: Arc<Mutex<Vec<LocalExport>>>,
}

impl ApplicationContext {
    /// Start building a context
    pub fn builder(config: AppConfig) -> ApplicationContextBuilder {
        ApplicationContextBuilder::new(config)
    }

    /// Configuration in effect
    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    /// Bean factory
    pub fn factory(&self) -> &BeanFactory {
        &self.factory
    }

    /// Registry client
    pub fn registry(&self) -> &ServiceRegistryClient {
        &self.registry
    }

    /// Serializers
    pub fn serializers(&self) -> &Arc<SerializerCatalog> {
        &self.serializers
    }

    /// Service binder
    pub fn binder(&self) -> &Arc<ServiceBinder> {
        &self.binder
    }

    /// Lease manager
    pub fn lease_manager(&self) -> &Arc<LeaseManager> {
        &self.lease_manager
    }

    /// Exporter
    pub fn exporter(&self) -> &Arc<ServiceExporter> {
        &self.exporter
    }

    /// Declare a remote service bean
    ///
    /// The bean is the leased handle for `A`, created on first request. The
    /// definition's bean key must be [`service_key`] for `A`.
    pub fn remote_service<A: RemoteApi>(&self, definition: ServiceDefinition) -> Result<()> {
        let expected = service_key::<A>(definition.bean_key.qualifier());
        if definition.bean_key != expected {
            return Err(Error::configuration(format!(
                "Bean key {} of {} does not match {expected}",
                definition.bean_key, definition.api
            )));
        }

        let lease_manager = Arc::clone(&self.lease_manager);
        let binder = Arc::clone(&self.binder);
        let factory = move |_resolution: BeanResolution| {
            let lease_manager = Arc::clone(&lease_manager);
            let binder = Arc::clone(&binder);
            let definition = definition.clone();
            async move { Ok(lease_manager.lease::<A>(definition, binder).await) }
        };
        let beans = self.factory.registry();
        match expected.qualifier() {
            Some(qualifier) => beans.register_qualified::<Arc<LeasedService<A::Target>>, _, _>(
                qualifier.to_string(),
                factory,
            ),
            None => beans.register::<Arc<LeasedService<A::Target>>, _, _>(factory),
        }
        Ok(())
    }

    /// Leased handle for `A`
    pub async fn remote<A: RemoteApi>(
        &self,
        qualifier: Option<&str>,
    ) -> Result<Arc<LeasedService<A::Target>>> {
        self.factory.get_by_key(&service_key::<A>(qualifier)).await
    }

    /// Export a provider
    ///
    /// Every provider instance serves one partition. The table is built once
    /// per partition and must name the definition's api. The returned
    /// properties are kept registered until shutdown.
    pub async fn export_service<S, F>(
        &self,
        definition: &ServiceDefinition,
        providers: Vec<Arc<S>>,
        table: F,
    ) -> Result<ServiceProperties>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn() -> ExposedApi<S>,
    {
        let serializer = self.serializers.resolve(&definition.serialization)?;
        let component = self
            .binder
            .component(&definition.transport_component)
            .ok_or_else(|| {
                Error::configuration(format!(
                    "No transport component '{}' for {}",
                    definition.transport_component, definition.api
                ))
            })?;

        let mut activators = Vec::with_capacity(providers.len());
        for provider in providers {
            let exposed = table();
            if exposed.api() != definition.api {
                return Err(Error::configuration(format!(
                    "Exposed api {} does not match definition {}",
                    exposed.api(),
                    definition.api
                )));
            }
            let activator = ServiceActivator::new();
            activator.publish(provider, Arc::clone(&serializer), [exposed]);
            activators.push(Arc::new(activator));
        }

        let transport_properties = component.export(&definition.api, activators)?;
        let mut properties = ServiceProperties::new(component.name())
            .with_subsystem(self.config.subsystem.name.clone())
            .with_qualifier(definition.lookup_qualifier().map(str::to_string))
            .with_api_version(definition.serialization.version);
        for (key, value) in transport_properties {
            properties = properties.with_property(key, value);
        }

        self.exporter
            .export(definition.api.clone(), properties.clone())
            .await;
        self.exporter.start();
        self.exports.lock().push(LocalExport {
            component,
            properties: properties.clone(),
        });
        info!(
            service = %definition.api,
            qualifier = ?properties.qualifier,
            subsystem = %properties.subsystem,
            "Exported service"
        );
        Ok(properties)
    }

    /// Stop background loops, deregister exports and drop all beans
    pub async fn shutdown(&self) {
        self.factory.destroy().await;
    }

    fn install_shutdown_hooks(&self) {
        let exports = Arc::clone(&self.exports);
        let unexport: ShutdownHook = Box::new(move || {
            async move {
                let exports = std::mem::take(&mut *exports.lock());
                for export in exports {
                    if let Err(e) = export.component.unexport(&export.properties) {
                        warn!(component = export.component.name(), error = %e, "Failed to unexport");
                    }
                }
            }
            .boxed()
        });

        let exporter = Arc::clone(&self.exporter);
        let stop_exporter: ShutdownHook =
            Box::new(move || async move { exporter.stop().await }.boxed());

        let lease_manager = Arc::clone(&self.lease_manager);
        let stop_leases: ShutdownHook =
            Box::new(move || async move { lease_manager.stop().await }.boxed());

        // Hooks run in reverse order.
        self.factory.add_shutdown_hook(unexport);
        self.factory.add_shutdown_hook(stop_exporter);
        self.factory.add_shutdown_hook(stop_leases);
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("subsystem", &self.config.subsystem.name)
            .field("binder", &self.binder)
            .field("leases", &self.lease_manager.lease_count())
            .field("exports", &self.exporter.exported_apis())
            .finish()
    }
}
