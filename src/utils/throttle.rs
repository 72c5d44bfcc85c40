//! Fixed inter-request throttle.
//!
//! NCBI allows a handful of requests per second per client. Retrieval waits a
//! fixed delay after every record fetch instead of relying on a token bucket,
//! which keeps requests strictly sequential and evenly spaced.

use async_trait::async_trait;
use std::time::Duration;

/// Something that pauses between outbound requests.
#[async_trait]
pub trait Throttle: Send + Sync + std::fmt::Debug {
    /// Wait before the next request may be issued
    async fn pause(&self);
}

/// Sleeps for a constant duration on every call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// The delay applied per call
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}
