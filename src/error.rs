//! Typed error handling for the delivery pipeline.
//!
//! This module distinguishes between:
//! - Store failures (durable persistence could not be reached)
//! - Transport failures (a delivery attempt could not complete)
//!
//! Both are absorbed by the controller into the down-state + recovery
//! mechanism; neither ever reaches a producer calling `submit_*`.

use std::io;

use thiserror::Error;

use crate::types::{Destination, TransactionId};

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The durable transaction store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A delivery attempt failed at the transport level.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl DeliveryError {
    /// Returns `true` if this error came from the durable store.
    #[must_use]
    pub const fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Returns `true` if this error came from a delivery attempt.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Errors raised by a [`TransactionStore`](crate::TransactionStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure while persisting or reading a transaction.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A completed transaction was not found in the pending backlog.
    #[error("Transaction {id} not found for destination {destination}")]
    TransactionNotFound {
        /// The owning destination
        destination: Destination,
        /// The missing transaction identifier
        id: TransactionId,
    },

    /// Internal error (lock poisoning, etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(error: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {error}"))
    }
}

/// Transport-level failures reported by a
/// [`DeliveryClient`](crate::DeliveryClient).
///
/// All variants are treated identically to a rejected transaction: the
/// destination is marked down and its backlog is drained by a recoverer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to establish a connection to the destination.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The delivery attempt timed out.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The destination answered with something unintelligible.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
