//! Scripted delivery client for testing pipeline scenarios
//!
//! - Scripts per-destination outcomes (accept, reject, transport failure)
//! - Records every accepted transaction for verification
//! - Tracks concurrent attempts per destination to assert that the pipeline
//!   never has two deliveries in flight for one destination
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;

use appservice_delivery::{
    DeliveryClient, DeliveryOutcome, Destination, Transaction, TransportError,
};

/// What the next delivery attempt for a destination should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// Destination accepts the transaction
    Accept,
    /// Destination answers but refuses the transaction
    Reject,
    /// Transport-level failure (connection refused)
    Fail,
}

#[derive(Debug, Default)]
struct DestinationState {
    script: VecDeque<ScriptedOutcome>,
    attempts: usize,
    in_flight: usize,
    max_in_flight: usize,
}

/// Configurable mock [`DeliveryClient`]
///
/// Outcomes are consumed from the per-destination script front to back;
/// once the script is exhausted every further attempt is accepted.
#[derive(Debug)]
pub struct MockClient {
    states: Mutex<HashMap<Destination, DestinationState>>,
    delivered: Mutex<Vec<Transaction>>,
    attempt_delay: Option<Duration>,
    /// What an attempt does once its destination's script is exhausted
    default_outcome: ScriptedOutcome,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            states: Mutex::default(),
            delivered: Mutex::default(),
            attempt_delay: None,
            default_outcome: ScriptedOutcome::Accept,
        }
    }
}

impl MockClient {
    /// A client that accepts everything
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose every attempt fails at the transport level
    pub fn failing() -> Self {
        Self {
            default_outcome: ScriptedOutcome::Fail,
            ..Self::default()
        }
    }

    /// A client that holds every attempt open for `delay` before answering,
    /// widening the window in which overlapping attempts would be observed
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            attempt_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Queue outcomes for the next attempts against `destination`
    pub fn script(
        &self,
        destination: &Destination,
        outcomes: impl IntoIterator<Item = ScriptedOutcome>,
    ) {
        self.states
            .lock()
            .entry(destination.clone())
            .or_default()
            .script
            .extend(outcomes);
    }

    /// All accepted transactions, in acceptance order
    pub fn delivered(&self) -> Vec<Transaction> {
        self.delivered.lock().clone()
    }

    /// Accepted transactions for one destination, in acceptance order
    pub fn delivered_to(&self, destination: &Destination) -> Vec<Transaction> {
        self.delivered
            .lock()
            .iter()
            .filter(|transaction| &transaction.destination == destination)
            .cloned()
            .collect()
    }

    /// Total attempts made against `destination`
    pub fn attempts(&self, destination: &Destination) -> usize {
        self.states
            .lock()
            .get(destination)
            .map_or(0, |state| state.attempts)
    }

    /// High-water mark of concurrent attempts against `destination`
    pub fn max_in_flight(&self, destination: &Destination) -> usize {
        self.states
            .lock()
            .get(destination)
            .map_or(0, |state| state.max_in_flight)
    }
}

#[async_trait]
impl DeliveryClient for MockClient {
    async fn deliver(
        &self,
        transaction: &Transaction,
    ) -> Result<DeliveryOutcome, TransportError> {
        let outcome = {
            let mut states = self.states.lock();
            let state = states.entry(transaction.destination.clone()).or_default();
            state.attempts += 1;
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.script.pop_front().unwrap_or(self.default_outcome)
        };

        if let Some(delay) = self.attempt_delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut states = self.states.lock();
            if let Some(state) = states.get_mut(&transaction.destination) {
                state.in_flight -= 1;
            }
        }

        match outcome {
            ScriptedOutcome::Accept => {
                self.delivered.lock().push(transaction.clone());
                Ok(DeliveryOutcome::Accepted)
            }
            ScriptedOutcome::Reject => Ok(DeliveryOutcome::Rejected),
            ScriptedOutcome::Fail => Err(TransportError::ConnectionFailed(
                "scripted failure".to_string(),
            )),
        }
    }
}
