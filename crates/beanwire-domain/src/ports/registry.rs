//! Service Registry Backend Port
//!
//! Any key-value store with lease (TTL) semantics can back the registry.
//! Entries are keyed by service api and qualifier; the last registration
//! for a key wins.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::RegistryEntry;

/// Storage for registry entries
#[async_trait]
pub trait ServiceRegistryBackend: Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &str;

    /// Find the live entry for an api and qualifier
    async fn lookup(&self, api: &str, qualifier: Option<&str>) -> Result<Option<RegistryEntry>>;

    /// Store an entry, replacing any previous entry and restarting its lease
    async fn register(&self, entry: RegistryEntry) -> Result<()>;

    /// Remove an entry
    async fn deregister(&self, api: &str, qualifier: Option<&str>) -> Result<()>;

    /// All live entries
    async fn list(&self) -> Result<Vec<RegistryEntry>>;
}
