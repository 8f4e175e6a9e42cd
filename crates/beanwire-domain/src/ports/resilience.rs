//! Fault Tolerance Port
//!
//! The remoting layer asks for an [`Admission`] before every remote call and
//! holds it until the call completes. Implementations decide whether the
//! call may proceed (circuit open, bulkhead full) and reject it with
//! `ServiceUnavailable` otherwise.

use std::any::Any;

use async_trait::async_trait;

use crate::error::Result;

/// Guard held for the duration of an admitted call
pub struct Admission {
    guard: Option<Box<dyn Any + Send + Sync>>,
}

impl Admission {
    /// Admission that holds nothing
    pub fn unguarded() -> Self {
        Self { guard: None }
    }

    /// Admission that releases `guard` when dropped
    pub fn guarded<G: Any + Send + Sync>(guard: G) -> Self {
        Self {
            guard: Some(Box::new(guard)),
        }
    }
}

impl std::fmt::Debug for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admission")
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// Admission control for remote calls, keyed by circuit name
#[async_trait]
pub trait FaultTolerance: Send + Sync {
    /// Admit a call on the given circuit
    async fn admit(&self, circuit: &str) -> Result<Admission>;
}
