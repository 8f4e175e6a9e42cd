//! Service registry
//!
//! | Type | Role |
//! |------|------|
//! | [`ServiceRegistryClient`] | lookup / register / deregister over a backend |
//! | [`InMemoryRegistry`] | backend with lease expiry, for tests and single-process setups |
//! | [`ServiceExporter`] | keeps local exports registered |

pub mod client;
pub mod exporter;
pub mod memory;

pub use client::ServiceRegistryClient;
pub use exporter::ServiceExporter;
pub use memory::InMemoryRegistry;
