//! # beanwire infrastructure
//!
//! Adapters for the domain ports and the wiring that turns them into a
//! running process.
//!
//! ### Configuration & Wiring
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Figment configuration: defaults, TOML, `BEANWIRE_` env |
//! | [`di`] | `ApplicationContext` composition root |
//! | [`constants`] | Defaults and property names |
//!
//! ### Service Discovery
//! | Module | Description |
//! |--------|-------------|
//! | [`registry`] | Registry client, in-memory backend, exporter |
//! | [`lease`] | Leased service handles and the renewal loop |
//! | [`binder`] | Registry properties to client adapters, subsystem checks |
//!
//! ### Remoting
//! | Module | Description |
//! |--------|-------------|
//! | [`serializer`] | Versioned JSON serializer |
//! | [`transport`] | In-process "direct" transport component |
//! | [`resilience`] | Pass-through and bulkhead admission control |
//!
//! ### Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`logging`] | tracing-subscriber setup |

pub mod binder;
pub mod config;
pub mod constants;
pub mod di;
pub mod error_ext;
pub mod lease;
pub mod logging;
pub mod registry;
pub mod resilience;
pub mod serializer;
pub mod transport;

pub use binder::ServiceBinder;
pub use di::{ApplicationContext, ApplicationContextBuilder, init_context, service_key};
pub use error_ext::ErrorContext;
pub use lease::{LeaseManager, LeasedService};
pub use registry::{InMemoryRegistry, ServiceExporter, ServiceRegistryClient};
