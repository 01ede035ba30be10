//! Transaction creation, delivery decisions, and destination health
//!
//! The controller is the single place that turns buffered items into durable
//! transactions and owns the up/down transition for each destination. All
//! failures funnel into the down state + recoverer mechanism; nothing here
//! ever stops the sender loops that call into it.

use std::{collections::HashSet, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    client::{DeliveryClient, DeliveryOutcome},
    clock::Clock,
    config::DeliveryConfig,
    error::DeliveryError,
    recovery::Recoverer,
    store::TransactionStore,
    types::{Destination, DestinationHealth, PendingItem},
};

/// Creates durable transactions and manages destination health
#[derive(Debug)]
pub struct TransactionController {
    store: Arc<dyn TransactionStore>,
    client: Arc<dyn DeliveryClient>,
    clock: Arc<dyn Clock>,
    config: DeliveryConfig,
    /// Destinations with a live recoverer. A cache of activity, not a source
    /// of truth; rebuilt from the store's health records at startup.
    recoverers: Mutex<HashSet<Destination>>,
}

impl TransactionController {
    /// Wire up a controller against its collaborators
    #[must_use]
    pub fn new(
        store: Arc<dyn TransactionStore>,
        client: Arc<dyn DeliveryClient>,
        clock: Arc<dyn Clock>,
        config: DeliveryConfig,
    ) -> Self {
        Self {
            store,
            client,
            clock,
            config,
            recoverers: Mutex::new(HashSet::new()),
        }
    }

    /// Persist one batch as a transaction and, if the destination is
    /// healthy, attempt delivery once
    ///
    /// Persistence is unconditional and happens before any network attempt,
    /// so a submitted batch survives a crash from this point on. A rejected
    /// or failed attempt flips the destination down and hands its backlog to
    /// a recoverer; the transaction stays persisted and unsent.
    ///
    /// # Errors
    ///
    /// Returns the underlying error for logging. By the time this returns,
    /// the failure has already been absorbed into durable state; callers
    /// must log and carry on rather than stop draining.
    pub async fn send(
        self: &Arc<Self>,
        destination: &Destination,
        events: Vec<PendingItem>,
        ephemeral: Vec<PendingItem>,
    ) -> Result<(), DeliveryError> {
        let transaction = match self
            .store
            .create_transaction(destination, events, ephemeral)
            .await
        {
            Ok(transaction) => transaction,
            Err(store_error) => {
                // The one scenario where a picked-up batch can be lost: the
                // store itself refused the write. The recoverer will find no
                // new backlog entry for it.
                error!(
                    destination = %destination,
                    error = %store_error,
                    "Failed to persist transaction, batch dropped"
                );
                self.mark_down(destination).await;
                return Err(store_error.into());
            }
        };

        let health = match self.store.health(destination).await {
            Ok(health) => health,
            Err(store_error) => {
                warn!(
                    destination = %destination,
                    error = %store_error,
                    "Failed to read destination health"
                );
                self.mark_down(destination).await;
                return Err(store_error.into());
            }
        };

        if !health.is_up() {
            // The recoverer is the exclusive sender while the destination is
            // down; leave the freshly persisted transaction for it. The
            // transition call is idempotent and also covers a down
            // destination whose recoverer was lost to a restart.
            debug!(
                destination = %destination,
                txn_id = %transaction.id,
                "Destination is down, transaction queued for recovery"
            );
            self.mark_down(destination).await;
            return Ok(());
        }

        match self.client.deliver(&transaction).await {
            Ok(DeliveryOutcome::Accepted) => {
                if let Err(store_error) = self.store.complete(&transaction).await {
                    warn!(
                        destination = %destination,
                        txn_id = %transaction.id,
                        error = %store_error,
                        "Delivered transaction could not be marked complete"
                    );
                    self.mark_down(destination).await;
                    return Err(store_error.into());
                }
                debug!(
                    destination = %destination,
                    txn_id = %transaction.id,
                    events = transaction.events.len(),
                    ephemeral = transaction.ephemeral.len(),
                    "Transaction delivered"
                );
                Ok(())
            }
            Ok(DeliveryOutcome::Rejected) => {
                warn!(
                    destination = %destination,
                    txn_id = %transaction.id,
                    "Destination rejected transaction, marking down"
                );
                self.mark_down(destination).await;
                Ok(())
            }
            Err(transport_error) => {
                warn!(
                    destination = %destination,
                    txn_id = %transaction.id,
                    error = %transport_error,
                    "Delivery attempt failed, marking down"
                );
                self.mark_down(destination).await;
                Err(transport_error.into())
            }
        }
    }

    /// The down transition: persist the state and ensure exactly one
    /// recoverer. Idempotent, so concurrent failures for the same
    /// destination collapse onto the existing recoverer.
    pub(crate) async fn mark_down(self: &Arc<Self>, destination: &Destination) {
        if let Err(store_error) = self
            .store
            .set_health(destination, DestinationHealth::Down)
            .await
        {
            warn!(
                destination = %destination,
                error = %store_error,
                "Failed to persist down state"
            );
        }
        self.begin_recovery(destination);
    }

    /// Register and start a recoverer for `destination` unless one is
    /// already active
    pub(crate) fn begin_recovery(self: &Arc<Self>, destination: &Destination) {
        let registered = self.recoverers.lock().insert(destination.clone());
        if !registered {
            return;
        }

        info!(destination = %destination, "Starting backlog recovery");
        Recoverer::new(destination.clone(), Arc::clone(self)).spawn();
    }

    /// Invoked by a recoverer that has drained its backlog to empty
    ///
    /// Unregisters the recoverer and persists the destination as up.
    ///
    /// # Panics
    ///
    /// Panics if no recoverer was registered for `destination`; a finished
    /// recoverer that was never registered means the single-recoverer
    /// invariant was already broken.
    pub(crate) async fn on_recovered(&self, destination: &Destination) {
        let removed = self.recoverers.lock().remove(destination);
        assert!(
            removed,
            "recoverer for {destination} finished but was never registered"
        );

        if let Err(store_error) = self
            .store
            .set_health(destination, DestinationHealth::Up)
            .await
        {
            warn!(
                destination = %destination,
                error = %store_error,
                "Failed to persist up state after recovery"
            );
        }
        info!(destination = %destination, "Destination recovered");
    }

    /// Whether a recoverer is currently active for `destination`
    #[must_use]
    pub fn has_active_recoverer(&self, destination: &Destination) -> bool {
        self.recoverers.lock().contains(destination)
    }

    pub(crate) fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    pub(crate) fn client(&self) -> &Arc<dyn DeliveryClient> {
        &self.client
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) const fn config(&self) -> &DeliveryConfig {
        &self.config
    }
}
