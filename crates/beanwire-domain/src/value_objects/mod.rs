//! Value objects
//!
//! Immutable types identifying beans and providers, and the messages that
//! cross the wire.

pub mod bean;
pub mod invocation;
pub mod routing;
pub mod service;

pub use bean::BeanKey;
pub use invocation::{InvocationRequest, InvocationResponse, MethodSignature, Payload};
pub use routing::{RemoteResult, RoutingKey};
pub use service::{RegistryEntry, SerializationConfig, ServiceDefinition, ServiceProperties};
