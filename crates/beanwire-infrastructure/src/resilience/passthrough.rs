//! Admission control that admits every call

use async_trait::async_trait;
use beanwire_domain::error::Result;
use beanwire_domain::ports::{Admission, FaultTolerance};

/// No-op [`FaultTolerance`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

#[async_trait]
impl FaultTolerance for PassThrough {
    async fn admit(&self, _circuit: &str) -> Result<Admission> {
        Ok(Admission::unguarded())
    }
}
