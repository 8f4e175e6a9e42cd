//! Dependency graph resolver
//!
//! [`FactoryRegistry`] holds one provider per [`BeanKey`](beanwire_domain::BeanKey);
//! [`BeanFactory`] builds beans from it depth first, memoizes every instance
//! and fails with `CircularDependency` when a bean depends on itself through
//! any chain of providers.

pub mod factory;
pub mod registry;

pub use factory::{BeanFactory, BeanResolution, ShutdownHook};
pub use registry::{Bean, BeanProvider, FactoryRegistry};
