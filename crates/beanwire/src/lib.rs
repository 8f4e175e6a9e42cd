//! # beanwire
//!
//! Runtime wiring for processes that expose and consume remote services.
//!
//! - Beans are built lazily, once, with cycle detection.
//! - Remote service beans are leased: they follow the registry and swap
//!   their provider without changing identity.
//! - Calls are routed by argument, broadcast to every partition and reduced,
//!   or pushed to subscribers through [`Reactive`](application::Reactive).
//!
//! ## Example
//!
//! ```ignore
//! use beanwire::infrastructure::config::ConfigLoader;
//!
//! let context = beanwire::bootstrap(&ConfigLoader::new())?;
//! context.export_service(&definition, providers, exposed_greeter).await?;
//! context.remote_service::<GreeterApi>(client_definition)?;
//! let greeter = context.remote::<GreeterApi>(None).await?;
//! greeter.current().hello(request).await?;
//! context.shutdown().await;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - value types, errors, collaborator ports
//! - `application` - bean factory, activator, remoting proxy, reactive bridge
//! - `infrastructure` - config, logging, registry, leases, transports, wiring

/// Domain layer
pub mod domain {
    pub use beanwire_domain::*;
}

/// Application layer
pub mod application {
    pub use beanwire_application::*;
}

/// Infrastructure layer
pub mod infrastructure {
    pub use beanwire_infrastructure::*;
}

pub use beanwire_application::remoting::{ListReducer, MapReducer, Reducer, SetReducer, TolerantListReducer};
pub use beanwire_application::{
    Arguments, BeanFactory, CallArgs, ExposedApi, FactoryRegistry, MethodDescriptor, Reactive,
    RemoteApi, RemotingProxy,
};
pub use beanwire_domain::{BeanKey, Error, Result, SerializationConfig, ServiceDefinition};
pub use beanwire_infrastructure::{ApplicationContext, LeasedService, service_key};

use beanwire_infrastructure::config::ConfigLoader;
use beanwire_infrastructure::logging::init_logging;

/// Load configuration, install logging and build the application context
///
/// Logging that is already installed is kept.
pub fn bootstrap(loader: &ConfigLoader) -> Result<ApplicationContext> {
    let config = loader.load()?;
    if let Err(e) = init_logging(&config.logging) {
        tracing::debug!(error = %e, "Logging already initialized");
    }
    ApplicationContext::builder(config).build()
}
