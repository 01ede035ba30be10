//! Outbound delivery pipeline for registered application services
//!
//! This crate provides functionality to:
//! - Buffer locally generated events and ephemeral updates per destination
//! - Batch them into ordered, durably persisted transactions
//! - Deliver transactions with at-most-one attempt in flight per destination
//! - Recover unreachable destinations with capped exponential backoff,
//!   resuming across process restarts
//!
//! The durable store, the outbound client, and the clock are trait seams
//! supplied by the embedding server; see [`TransactionStore`],
//! [`DeliveryClient`], and [`Clock`].

mod client;
mod clock;
mod config;
mod controller;
mod error;
mod queue;
mod recovery;
mod scheduler;
pub mod store;
mod types;

pub use client::{DeliveryClient, DeliveryOutcome};
pub use clock::{Clock, TokioClock};
pub use config::DeliveryConfig;
pub use controller::TransactionController;
pub use error::{DeliveryError, Result, StoreError, TransportError};
pub use queue::DestinationQueue;
pub use recovery::backoff_delay;
pub use scheduler::DeliveryScheduler;
pub use store::{MemoryTransactionStore, TransactionStore};
pub use types::{Destination, DestinationHealth, PendingItem, Transaction, TransactionId};
