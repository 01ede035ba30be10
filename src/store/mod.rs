//! Durable transaction storage
//!
//! The store is the single source of truth for "is there more work" and "is
//! this destination healthy". In-memory buffers and the active
//! sender/recoverer markers are caches of activity and must be rebuildable
//! from here after a crash.

mod memory;

use std::fmt;

use async_trait::async_trait;

pub use memory::MemoryTransactionStore;

use crate::{
    error::StoreError,
    types::{Destination, DestinationHealth, PendingItem, Transaction},
};

/// Durable log of pending transactions and destination health
#[async_trait]
pub trait TransactionStore: Send + Sync + fmt::Debug {
    /// Durably create a transaction with the given contents
    ///
    /// Assigns the next strictly increasing identifier for `destination`.
    /// Persistence is unconditional; it happens whether or not the
    /// destination is currently reachable.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the transaction could not be persisted.
    async fn create_transaction(
        &self,
        destination: &Destination,
        events: Vec<PendingItem>,
        ephemeral: Vec<PendingItem>,
    ) -> Result<Transaction, StoreError>;

    /// The lowest-id transaction still pending for `destination`, if any
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backlog could not be read.
    async fn oldest_unsent(
        &self,
        destination: &Destination,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Mark `transaction` complete, removing it from the durable backlog
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TransactionNotFound`] if the transaction is not
    /// in the backlog, or another [`StoreError`] on I/O failure.
    async fn complete(&self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Recorded health for `destination`
    ///
    /// [`DestinationHealth::Unknown`] when nothing has been recorded yet.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the state could not be read.
    async fn health(&self, destination: &Destination) -> Result<DestinationHealth, StoreError>;

    /// Persist `health` for `destination`
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the state could not be written.
    async fn set_health(
        &self,
        destination: &Destination,
        health: DestinationHealth,
    ) -> Result<(), StoreError>;

    /// All destinations whose recorded health equals `health`
    ///
    /// Used at startup to resume recovery for destinations left down by a
    /// previous process.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the state could not be read.
    async fn destinations_with_health(
        &self,
        health: DestinationHealth,
    ) -> Result<Vec<Destination>, StoreError>;
}
