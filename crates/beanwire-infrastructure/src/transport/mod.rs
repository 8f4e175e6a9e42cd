//! Transport components

pub mod direct;

pub use direct::DirectTransportComponent;
