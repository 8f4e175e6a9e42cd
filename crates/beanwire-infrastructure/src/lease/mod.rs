//! Leased remote services
//!
//! A remote service bean is an `Arc<LeasedService<dyn Api>>` whose provider
//! the [`LeaseManager`] swaps when the registry changes.

pub mod leased;
pub mod manager;

pub use leased::LeasedService;
pub use manager::{LeaseManager, RenewalReport, Renewal};
