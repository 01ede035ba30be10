//! Time source abstraction
//!
//! Recoverers schedule their retries through this trait rather than calling
//! `tokio::time` directly, so tests can observe or reshape the delays.

use std::{
    fmt,
    time::{Duration, SystemTime},
};

use async_trait::async_trait;

/// Monotonic time source and delayed wakeup facility
#[async_trait]
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current wall-clock time
    fn now(&self) -> SystemTime;

    /// Suspend the calling task for `duration`
    async fn sleep(&self, duration: Duration);
}

/// The production clock, backed by the tokio timer wheel
///
/// Honours `tokio::time::pause` in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
