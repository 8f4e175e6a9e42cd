//! Application ports
//!
//! | Port | Description |
//! |------|-------------|
//! | [`TransportComponent`] | Named transport plugin (export / connect) |
//! | [`registry`] | Link-time serializer registry |

pub mod registry;
pub mod transport_component;

pub use transport_component::TransportComponent;
