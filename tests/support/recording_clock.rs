//! Clock wrapper that records requested sleep durations
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use parking_lot::Mutex;

use appservice_delivery::Clock;

/// Records every delay requested through it, then defers to the tokio timer
///
/// Under a paused runtime the actual sleeps auto-advance, so tests can
/// assert the exact retry schedule without waiting for it.
#[derive(Debug, Default)]
pub struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requested delays, in request order
    pub fn recorded_sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        tokio::time::sleep(duration).await;
    }
}
