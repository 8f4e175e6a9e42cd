//! Broadcast reducers
//!
//! A reducer folds the per-partition results of a broadcast call into the
//! method's return value. Failure policy belongs to the reducer: the built-in
//! list, set and map reducers rethrow the first partition error (in
//! partition order); [`TolerantListReducer`] skips failed partitions.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use beanwire_domain::RemoteResult;
use beanwire_domain::error::{Error, Result};
use tracing::warn;

/// Folds per-partition results
pub trait Reducer<T, R>: Send + Sync {
    /// Combine all partition results
    fn reduce(&self, results: Vec<RemoteResult<T>>) -> Result<R>;
}

/// Concatenates list results in partition order
#[derive(Debug, Clone, Copy, Default)]
pub struct ListReducer;

impl<E> Reducer<Vec<E>, Vec<E>> for ListReducer {
    fn reduce(&self, results: Vec<RemoteResult<Vec<E>>>) -> Result<Vec<E>> {
        let mut merged = Vec::new();
        for result in in_partition_order(results) {
            merged.extend(result.into_result()?);
        }
        Ok(merged)
    }
}

/// Unions set results
#[derive(Debug, Clone, Copy, Default)]
pub struct SetReducer;

impl<E: Eq + Hash> Reducer<HashSet<E>, HashSet<E>> for SetReducer {
    fn reduce(&self, results: Vec<RemoteResult<HashSet<E>>>) -> Result<HashSet<E>> {
        let mut merged = HashSet::new();
        for result in in_partition_order(results) {
            merged.extend(result.into_result()?);
        }
        Ok(merged)
    }
}

/// Unions map results; later partitions win on duplicate keys
#[derive(Debug, Clone, Copy, Default)]
pub struct MapReducer;

impl<K: Eq + Hash, V> Reducer<HashMap<K, V>, HashMap<K, V>> for MapReducer {
    fn reduce(&self, results: Vec<RemoteResult<HashMap<K, V>>>) -> Result<HashMap<K, V>> {
        let mut merged = HashMap::new();
        for result in in_partition_order(results) {
            merged.extend(result.into_result()?);
        }
        Ok(merged)
    }
}

/// Concatenates the lists of the partitions that answered
///
/// Fails only when every partition failed, with the first error.
#[derive(Debug, Clone, Copy, Default)]
pub struct TolerantListReducer;

impl<E> Reducer<Vec<E>, Vec<E>> for TolerantListReducer {
    fn reduce(&self, results: Vec<RemoteResult<Vec<E>>>) -> Result<Vec<E>> {
        let mut merged = Vec::new();
        let mut first_error: Option<Error> = None;
        let mut answered = 0usize;
        for result in in_partition_order(results) {
            let partition = result.partition();
            match result.into_result() {
                Ok(values) => {
                    answered += 1;
                    merged.extend(values);
                }
                Err(err) => {
                    warn!(partition, error = %err, "Skipping failed partition");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) if answered == 0 => Err(err),
            _ => Ok(merged),
        }
    }
}

/// Reducer backed by a closure
pub struct FnReducer<F>(pub F);

impl<T, R, F> Reducer<T, R> for FnReducer<F>
where
    F: Fn(Vec<RemoteResult<T>>) -> Result<R> + Send + Sync,
{
    fn reduce(&self, results: Vec<RemoteResult<T>>) -> Result<R> {
        (self.0)(results)
    }
}

fn in_partition_order<T>(mut results: Vec<RemoteResult<T>>) -> Vec<RemoteResult<T>> {
    results.sort_by_key(RemoteResult::partition);
    results
}
