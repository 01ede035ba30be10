//! Shared test doubles for the delivery pipeline tests

pub mod mock_client;
pub mod recording_clock;

use std::time::Duration;

/// Poll `condition` until it holds, yielding between checks
///
/// Panics after a bounded number of rounds so a broken pipeline fails the
/// test instead of hanging it. Under `start_paused` runtimes the sleeps
/// auto-advance, so this stays fast.
pub async fn wait_until(description: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..5_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting until: {description}");
}
