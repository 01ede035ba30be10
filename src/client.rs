//! Outbound client abstraction
//!
//! The pipeline never speaks the wire protocol itself; one delivery attempt
//! per transaction is delegated to an implementation of [`DeliveryClient`].
//! Attempt timeouts are the client's responsibility and surface here as an
//! ordinary [`TransportError`].

use std::fmt;

use async_trait::async_trait;

use crate::{error::TransportError, types::Transaction};

/// Result of a completed delivery attempt
///
/// Distinct from a [`TransportError`]: the destination was reached and gave
/// an answer. A rejection is handled identically to a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The destination accepted the transaction
    Accepted,
    /// The destination refused the transaction
    Rejected,
}

/// Performs one network delivery attempt per transaction
#[async_trait]
pub trait DeliveryClient: Send + Sync + fmt::Debug {
    /// Attempt to deliver `transaction` to its destination
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the attempt could not complete; the
    /// caller treats this the same as [`DeliveryOutcome::Rejected`].
    async fn deliver(
        &self,
        transaction: &Transaction,
    ) -> Result<DeliveryOutcome, TransportError>;
}
