//! # beanwire domain
//!
//! Value types, the error taxonomy and the ports through which the framework
//! talks to its external collaborators (serializers, transports, registry
//! backends, fault tolerance).
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`value_objects`] | Bean keys, service metadata, wire messages, routing |
//! | [`ports`] | Collaborator traits |
//! | [`error`] | Error enum and `Result` alias |
//! | [`constants`] | Wire-level names |

pub mod constants;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use error::{Error, Result};
pub use value_objects::*;
