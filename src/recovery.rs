//! Backlog recovery with capped exponential backoff
//!
//! One recoverer exists per destination currently marked down. It replays
//! the durable backlog oldest-first, waiting `2^exponent` seconds between
//! rounds, and finishes only once the backlog is empty.

use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    client::DeliveryOutcome, controller::TransactionController, types::Destination,
};

/// Retry delay for a given backoff exponent: `2^min(exponent, max)` seconds
#[must_use]
pub fn backoff_delay(exponent: u32, max_exponent: u32) -> Duration {
    // A shift of 63 or more would overflow; clamp well before that
    let exponent = exponent.min(max_exponent).min(62);
    Duration::from_secs(1_u64 << exponent)
}

/// Outcome of one drain round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainOutcome {
    /// The backlog is empty; the destination has recovered
    Drained,
    /// A transaction was rejected or an error occurred; back off and retry
    Stalled,
}

/// Owns the retry schedule for one currently-down destination
///
/// Never cancelled externally; the sole terminal outcome is draining the
/// backlog to empty and reporting back via
/// `TransactionController::on_recovered`.
#[derive(Debug)]
pub(crate) struct Recoverer {
    destination: Destination,
    controller: Arc<TransactionController>,
    backoff_exponent: u32,
}

impl Recoverer {
    pub(crate) fn new(destination: Destination, controller: Arc<TransactionController>) -> Self {
        let backoff_exponent = controller.config().initial_backoff_exponent;
        Self {
            destination,
            controller,
            backoff_exponent,
        }
    }

    /// Run the retry loop as its own task
    ///
    /// A panic in one destination's recovery is contained by the task
    /// boundary and cannot affect other destinations.
    pub(crate) fn spawn(self) {
        tokio::task::spawn(self.run());
    }

    async fn run(mut self) {
        let max_exponent = self.controller.config().max_backoff_exponent;

        loop {
            let delay = backoff_delay(self.backoff_exponent, max_exponent);
            debug!(
                destination = %self.destination,
                delay_secs = delay.as_secs(),
                "Waiting before retrying backlog"
            );
            self.controller.clock().sleep(delay).await;

            match self.drain().await {
                DrainOutcome::Drained => {
                    self.controller.on_recovered(&self.destination).await;
                    return;
                }
                DrainOutcome::Stalled => {
                    self.backoff_exponent = (self.backoff_exponent + 1).min(max_exponent);
                }
            }
        }
    }

    /// Replay the durable backlog oldest-first until it is empty or an
    /// attempt does not go through
    async fn drain(&mut self) -> DrainOutcome {
        loop {
            let transaction = match self.controller.store().oldest_unsent(&self.destination).await
            {
                Ok(Some(transaction)) => transaction,
                Ok(None) => return DrainOutcome::Drained,
                Err(store_error) => {
                    warn!(
                        destination = %self.destination,
                        error = %store_error,
                        "Failed to read backlog during recovery"
                    );
                    return DrainOutcome::Stalled;
                }
            };

            match self.controller.client().deliver(&transaction).await {
                Ok(DeliveryOutcome::Accepted) => {
                    if let Err(store_error) = self.controller.store().complete(&transaction).await
                    {
                        warn!(
                            destination = %self.destination,
                            txn_id = %transaction.id,
                            error = %store_error,
                            "Recovered transaction could not be marked complete"
                        );
                        return DrainOutcome::Stalled;
                    }
                    debug!(
                        destination = %self.destination,
                        txn_id = %transaction.id,
                        "Backlog transaction delivered"
                    );
                    self.backoff_exponent = self.controller.config().initial_backoff_exponent;
                }
                Ok(DeliveryOutcome::Rejected) => {
                    debug!(
                        destination = %self.destination,
                        txn_id = %transaction.id,
                        "Backlog transaction rejected, backing off"
                    );
                    return DrainOutcome::Stalled;
                }
                Err(transport_error) => {
                    debug!(
                        destination = %self.destination,
                        txn_id = %transaction.id,
                        error = %transport_error,
                        "Backlog delivery failed, backing off"
                    );
                    return DrainOutcome::Stalled;
                }
            }
        }
    }
}
