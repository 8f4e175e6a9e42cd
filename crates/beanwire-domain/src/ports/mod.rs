//! Ports for external collaborators
//!
//! | Port | Implemented by |
//! |------|----------------|
//! | [`ObjectSerializer`] | version-aware payload codecs |
//! | [`Transport`] | wire transports, one instance per connected provider |
//! | [`ServiceRegistryBackend`] | key-value stores with lease semantics |
//! | [`FaultTolerance`] | circuit breakers and bulkheads |

pub mod registry;
pub mod resilience;
pub mod serializer;
pub mod transport;

pub use registry::ServiceRegistryBackend;
pub use resilience::{Admission, FaultTolerance};
pub use serializer::{ObjectSerializer, ObjectSerializerExt};
pub use transport::Transport;
