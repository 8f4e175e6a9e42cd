//! Remote api binding
//!
//! An api crate implements [`RemoteApi`] once per service trait. `bind`
//! wraps a [`RemotingProxy`] into a client adapter that implements the
//! trait by delegating each method to the proxy with its descriptor.

use std::sync::Arc;

use super::proxy::RemotingProxy;

/// A service trait that can be called remotely
pub trait RemoteApi: Send + Sync + 'static {
    /// The service trait object, e.g. `dyn Greeter`
    type Target: ?Sized + Send + Sync + 'static;

    /// Api identifier, used as registry key and `serviceApi` header
    const NAME: &'static str;

    /// Build a client adapter over a proxy
    fn bind(proxy: RemotingProxy) -> Arc<Self::Target>;
}
