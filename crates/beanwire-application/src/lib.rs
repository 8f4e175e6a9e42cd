//! # beanwire application layer
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bean_factory`] | Lazy, cached, cycle-checked bean resolution |
//! | [`activator`] | Server-side dispatch of invocation requests |
//! | [`remoting`] | Client-side proxies, routing and broadcast reducers |
//! | [`reactive`] | Push-based results for asynchronous calls |
//! | [`ports`] | Transport components and the serializer registry |

pub mod activator;
pub mod bean_factory;
pub mod ports;
pub mod reactive;
pub mod remoting;

pub use activator::{Arguments, ExposedApi, ServiceActivator};
pub use bean_factory::{BeanFactory, BeanResolution, FactoryRegistry};
pub use reactive::Reactive;
pub use remoting::{CallArgs, MethodDescriptor, RemoteApi, RemotingProxy};
