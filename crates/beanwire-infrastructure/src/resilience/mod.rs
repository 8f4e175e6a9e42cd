//! Fault tolerance adapters
//!
//! | Adapter | Behavior |
//! |---------|----------|
//! | [`PassThrough`] | admits everything |
//! | [`Bulkhead`] | bounded concurrent calls per circuit, rejects when full |

pub mod bulkhead;
pub mod passthrough;

pub use bulkhead::{Bulkhead, CircuitStats};
pub use passthrough::PassThrough;
