//! Composition root and public submission API

use std::sync::Arc;

use tracing::info;

use crate::{
    client::DeliveryClient,
    clock::{Clock, TokioClock},
    config::DeliveryConfig,
    controller::TransactionController,
    error::DeliveryError,
    queue::DestinationQueue,
    store::TransactionStore,
    types::{Destination, DestinationHealth, PendingItem},
};

/// Top-level facade over the delivery pipeline
///
/// Owns the controller and the per-destination queue; producers submit items
/// through it and never observe delivery failures directly. Multiple
/// independent schedulers can coexist (each carries its own registries), so
/// tests can run several side by side.
///
/// Must be used from within a tokio runtime; sender and recoverer tasks are
/// spawned onto it.
#[derive(Debug)]
pub struct DeliveryScheduler {
    controller: Arc<TransactionController>,
    queue: DestinationQueue,
}

impl DeliveryScheduler {
    /// Build a scheduler with the default configuration and clock
    #[must_use]
    pub fn new(store: Arc<dyn TransactionStore>, client: Arc<dyn DeliveryClient>) -> Self {
        Self::with_config(store, client, Arc::new(TokioClock), DeliveryConfig::default())
    }

    /// Build a scheduler with explicit configuration and clock
    #[must_use]
    pub fn with_config(
        store: Arc<dyn TransactionStore>,
        client: Arc<dyn DeliveryClient>,
        clock: Arc<dyn Clock>,
        config: DeliveryConfig,
    ) -> Self {
        let controller = Arc::new(TransactionController::new(store, client, clock, config));
        let queue = DestinationQueue::new(Arc::clone(&controller));
        Self { controller, queue }
    }

    /// Resume recovery for every destination the store records as down
    ///
    /// Call once after the durable store is available; this is what makes
    /// outstanding backlogs drain after a process restart without any new
    /// `submit_*` call. Idempotent: destinations that already have an active
    /// recoverer are left alone.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the store cannot list down
    /// destinations.
    pub async fn start(&self) -> Result<(), DeliveryError> {
        let down = self
            .controller
            .store()
            .destinations_with_health(DestinationHealth::Down)
            .await?;

        if !down.is_empty() {
            info!(count = down.len(), "Resuming recovery for down destinations");
        }
        for destination in down {
            self.controller.begin_recovery(&destination);
        }
        Ok(())
    }

    /// Submit a persistent event for `destination`
    ///
    /// Fire and forget: only touches in-memory buffers and at most starts a
    /// background task.
    pub fn submit_event(&self, destination: &Destination, event: PendingItem) {
        self.queue.enqueue_event(destination, event);
    }

    /// Submit ephemeral items for `destination`
    pub fn submit_ephemeral(&self, destination: &Destination, items: Vec<PendingItem>) {
        self.queue.enqueue_ephemeral(destination, items);
    }

    /// Whether a recoverer is currently active for `destination`
    #[must_use]
    pub fn is_recovering(&self, destination: &Destination) -> bool {
        self.controller.has_active_recoverer(destination)
    }
}
