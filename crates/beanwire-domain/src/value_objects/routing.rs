//! Partition routing and per-partition outcomes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Selects the partition that handles a routed call
///
/// Keys derived from argument values are stable across processes: the value
/// is hashed in its canonical JSON form with SHA-256.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingKey(u64);

impl RoutingKey {
    /// Wrap a precomputed hash
    pub fn new(hash: u64) -> Self {
        Self(hash)
    }

    /// Derive a key from a routing argument
    pub fn from_value(value: &serde_json::Value) -> Self {
        let canonical = value.to_string();
        Self::from_bytes(canonical.as_bytes())
    }

    /// Derive a key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(head))
    }

    /// Raw hash value
    pub fn hash(&self) -> u64 {
        self.0
    }

    /// Partition index for the given partition count
    pub fn partition(&self, partition_count: usize) -> usize {
        if partition_count == 0 {
            return 0;
        }
        // Both operands fit: the remainder is below partition_count.
        (self.0 % partition_count as u64) as usize
    }
}

/// Outcome of one partition of a broadcast call
#[derive(Debug, Clone)]
pub struct RemoteResult<T> {
    partition: usize,
    outcome: Result<T>,
}

impl<T> RemoteResult<T> {
    /// Successful partition result
    pub fn success(partition: usize, value: T) -> Self {
        Self {
            partition,
            outcome: Ok(value),
        }
    }

    /// Failed partition result
    pub fn failure(partition: usize, error: Error) -> Self {
        Self {
            partition,
            outcome: Err(error),
        }
    }

    /// Build from a partition outcome
    pub fn from_result(partition: usize, outcome: Result<T>) -> Self {
        Self { partition, outcome }
    }

    /// Partition index
    pub fn partition(&self) -> usize {
        self.partition
    }

    /// Value, if the partition succeeded
    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    /// Error, if the partition failed
    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }

    /// Whether the partition failed
    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// Value or the partition error
    pub fn into_result(self) -> Result<T> {
        self.outcome
    }

    /// Transform the error, keeping the partition index
    pub fn map_err<F>(self, f: F) -> Self
    where
        F: FnOnce(Error) -> Error,
    {
        Self {
            partition: self.partition,
            outcome: self.outcome.map_err(f),
        }
    }

    /// Transform a successful value, keeping the partition index
    pub fn and_then<U, F>(self, f: F) -> RemoteResult<U>
    where
        F: FnOnce(T) -> Result<U>,
    {
        RemoteResult {
            partition: self.partition,
            outcome: self.outcome.and_then(f),
        }
    }
}
