use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::{
    error::StoreError,
    store::TransactionStore,
    types::{Destination, DestinationHealth, PendingItem, Transaction, TransactionId},
};

/// Per-destination durable record
#[derive(Debug)]
struct DestinationRecord {
    /// Next transaction identifier to hand out
    next_id: u64,
    /// Pending transactions keyed by id; the `BTreeMap` gives oldest-first
    /// iteration for free
    pending: BTreeMap<u64, Transaction>,
    /// Last persisted health state
    health: DestinationHealth,
}

impl Default for DestinationRecord {
    fn default() -> Self {
        Self {
            next_id: 1,
            pending: BTreeMap::new(),
            health: DestinationHealth::Unknown,
        }
    }
}

/// In-memory transaction store
///
/// Stores per-destination records in a `HashMap` protected by an `RwLock`.
/// Primarily intended for testing, but also usable for transient deployments
/// that accept losing the backlog on restart.
///
/// # Concurrency
/// Uses an `RwLock` for interior mutability; a poisoned lock is surfaced as
/// [`StoreError::Internal`]. Identifier assignment and backlog mutation for
/// one destination happen under the write lock, so ids are strictly
/// increasing and never reused.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransactionStore {
    records: Arc<RwLock<HashMap<Destination, DestinationRecord>>>,
}

impl MemoryTransactionStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending transactions for `destination`
    ///
    /// Useful for monitoring backlog growth during a long outage.
    #[must_use]
    pub fn pending_len(&self, destination: &Destination) -> usize {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(destination)
            .map_or(0, |record| record.pending.len())
    }

    /// Whether no destination has any pending transaction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .all(|record| record.pending.is_empty())
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn create_transaction(
        &self,
        destination: &Destination,
        events: Vec<PendingItem>,
        ephemeral: Vec<PendingItem>,
    ) -> Result<Transaction, StoreError> {
        let mut records = self.records.write()?;
        let record = records.entry(destination.clone()).or_default();

        let id = record.next_id;
        record.next_id += 1;

        let transaction = Transaction {
            id: TransactionId(id),
            destination: destination.clone(),
            events,
            ephemeral,
        };
        record.pending.insert(id, transaction.clone());

        Ok(transaction)
    }

    async fn oldest_unsent(
        &self,
        destination: &Destination,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .records
            .read()?
            .get(destination)
            .and_then(|record| record.pending.values().next().cloned()))
    }

    async fn complete(&self, transaction: &Transaction) -> Result<(), StoreError> {
        self.records
            .write()?
            .get_mut(&transaction.destination)
            .and_then(|record| record.pending.remove(&transaction.id.0))
            .map(|_| ())
            .ok_or_else(|| StoreError::TransactionNotFound {
                destination: transaction.destination.clone(),
                id: transaction.id,
            })
    }

    async fn health(&self, destination: &Destination) -> Result<DestinationHealth, StoreError> {
        Ok(self
            .records
            .read()?
            .get(destination)
            .map_or(DestinationHealth::Unknown, |record| record.health))
    }

    async fn set_health(
        &self,
        destination: &Destination,
        health: DestinationHealth,
    ) -> Result<(), StoreError> {
        self.records
            .write()?
            .entry(destination.clone())
            .or_default()
            .health = health;
        Ok(())
    }

    async fn destinations_with_health(
        &self,
        health: DestinationHealth,
    ) -> Result<Vec<Destination>, StoreError> {
        Ok(self
            .records
            .read()?
            .iter()
            .filter(|(_, record)| record.health == health)
            .map(|(destination, _)| destination.clone())
            .collect())
    }
}
