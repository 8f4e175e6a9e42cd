//! JSON serializer with per-type version adapters
//!
//! A serializer is built for the api version its process implements
//! (`current`). Values crossing the wire at an older version are migrated
//! one version step at a time:
//!
//! ```text
//! deserialize(v1 payload) : v1 ──upgrade(1)──▶ v2 ──upgrade(2)──▶ v3 (current)
//! serialize(for v1 peer)  : v3 ──downgrade(2)──▶ v2 ──downgrade(1)──▶ v1
//! ```
//!
//! A missing step means the type did not change in that version. Payloads
//! from versions newer than `current` are passed through unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use beanwire_domain::Payload;
use beanwire_domain::error::{Error, Result};
use beanwire_domain::ports::ObjectSerializer;
use serde_json::Value;
use tracing::trace;

/// Rewrites a JSON value between two adjacent versions of a type
pub type Migration = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Version-aware JSON [`ObjectSerializer`]
#[derive(Clone)]
pub struct JsonSerializer {
    current: u32,
    upgrades: HashMap<(String, u32), Migration>,
    downgrades: HashMap<(String, u32), Migration>,
}

impl JsonSerializer {
    /// Serializer for a process implementing api version `current`
    pub fn new(current: u32) -> Self {
        Self {
            current,
            upgrades: HashMap::new(),
            downgrades: HashMap::new(),
        }
    }

    /// Migrate `type_name` from version `from` to `from + 1`
    pub fn with_upgrade<F>(mut self, type_name: impl Into<String>, from: u32, migration: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.upgrades
            .insert((type_name.into(), from), Arc::new(migration));
        self
    }

    /// Migrate `type_name` from version `to + 1` down to `to`
    pub fn with_downgrade<F>(mut self, type_name: impl Into<String>, to: u32, migration: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.downgrades
            .insert((type_name.into(), to), Arc::new(migration));
        self
    }

    /// Api version this serializer speaks natively
    pub fn current_version(&self) -> u32 {
        self.current
    }

    fn upgrade(&self, mut value: Value, type_name: &str, version: u32) -> Result<Value> {
        for step in version..self.current {
            if let Some(migration) = self.upgrades.get(&(type_name.to_string(), step)) {
                trace!(type_name, from = step, "Upgrading payload");
                value = migration(value)?;
            }
        }
        Ok(value)
    }

    fn downgrade(&self, mut value: Value, type_name: &str, version: u32) -> Result<Value> {
        for step in (version..self.current).rev() {
            if let Some(migration) = self.downgrades.get(&(type_name.to_string(), step)) {
                trace!(type_name, to = step, "Downgrading payload");
                value = migration(value)?;
            }
        }
        Ok(value)
    }
}

impl ObjectSerializer for JsonSerializer {
    fn name(&self) -> &str {
        "json"
    }

    fn serialize(&self, value: &Value, type_name: &str, version: u32) -> Result<Payload> {
        let value = self.downgrade(value.clone(), type_name, version)?;
        serde_json::to_vec(&value).map_err(|e| {
            Error::serialization_with_source(format!("Failed to serialize {type_name}"), e)
        })
    }

    fn deserialize(&self, payload: &[u8], type_name: &str, version: u32) -> Result<Value> {
        let value: Value = serde_json::from_slice(payload).map_err(|e| {
            Error::serialization_with_source(format!("Failed to deserialize {type_name}"), e)
        })?;
        self.upgrade(value, type_name, version)
    }
}

impl std::fmt::Debug for JsonSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSerializer")
            .field("current", &self.current)
            .field("upgrades", &self.upgrades.len())
            .field("downgrades", &self.downgrades.len())
            .finish()
    }
}
