//! In-memory registry backend with lease expiry

use std::time::{Duration, Instant};

use async_trait::async_trait;
use beanwire_domain::RegistryEntry;
use beanwire_domain::error::Result;
use beanwire_domain::ports::ServiceRegistryBackend;
use dashmap::DashMap;
use tracing::debug;

type EntryKey = (String, Option<String>);

struct LeasedEntry {
    entry: RegistryEntry,
    expires_at: Instant,
}

/// Registry backend holding entries in process memory
///
/// Entries expire when their lease runs out without a new registration.
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: DashMap<EntryKey, LeasedEntry>,
}

impl InMemoryRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    /// Whether there are no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|(api, qualifier), leased| {
            let live = leased.expires_at > now;
            if !live {
                debug!(service = %api, qualifier = ?qualifier, "Registry entry expired");
            }
            live
        });
    }
}

#[async_trait]
impl ServiceRegistryBackend for InMemoryRegistry {
    fn name(&self) -> &str {
        "memory"
    }

    async fn lookup(&self, api: &str, qualifier: Option<&str>) -> Result<Option<RegistryEntry>> {
        self.purge_expired();
        let key = (api.to_string(), qualifier.map(str::to_string));
        Ok(self.entries.get(&key).map(|leased| leased.entry.clone()))
    }

    async fn register(&self, entry: RegistryEntry) -> Result<()> {
        let key = (entry.service_bean_type.clone(), entry.qualifier.clone());
        let expires_at = Instant::now() + Duration::from_millis(entry.lease_millis);
        self.entries.insert(key, LeasedEntry { entry, expires_at });
        Ok(())
    }

    async fn deregister(&self, api: &str, qualifier: Option<&str>) -> Result<()> {
        self.entries
            .remove(&(api.to_string(), qualifier.map(str::to_string)));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RegistryEntry>> {
        self.purge_expired();
        Ok(self.entries.iter().map(|e| e.entry.clone()).collect())
    }
}
