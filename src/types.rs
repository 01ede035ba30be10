//! Type definitions for the delivery pipeline

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// Identifier of a registered application service
///
/// This newtype prevents accidentally passing user identifiers or other
/// strings where a destination is expected. The `#[repr(transparent)]`
/// attribute ensures this is a zero-cost abstraction at runtime.
///
/// # Examples
///
/// ```
/// use appservice_delivery::Destination;
///
/// let destination = Destination::new("bridge.example.com");
/// assert_eq!(destination.as_str(), "bridge.example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Destination(Arc<str>);

impl Destination {
    /// Create a new `Destination` from any type that can be converted to `Arc<str>`
    #[must_use]
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    /// Get the destination as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the destination into the inner `Arc<str>`
    #[must_use]
    pub fn into_inner(self) -> Arc<str> {
        self.0
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Destination {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Destination {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single buffered item awaiting delivery
///
/// Either a persistent event or an ephemeral update; which of the two it is
/// follows from the buffer it was submitted to. The payload is opaque to the
/// pipeline and immutable once created (Arc for cheap cloning).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingItem {
    payload: Arc<[u8]>,
}

impl PendingItem {
    /// Wrap an opaque payload
    #[must_use]
    pub fn new(payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The raw payload bytes
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl From<&[u8]> for PendingItem {
    fn from(payload: &[u8]) -> Self {
        Self::new(payload)
    }
}

impl From<Vec<u8>> for PendingItem {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

/// Store-assigned transaction identifier, strictly increasing per destination
///
/// Never reused; gaps are permitted if creation races with other sources of
/// identifiers in the same store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct TransactionId(pub u64);

impl Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The unit of delivery: a durably persisted, ordered batch of items
///
/// Lifecycle: created (persisted, unsent) → sent (accepted by the
/// destination) → complete (removed from the store). A transaction that never
/// reaches complete remains visible as oldest-unsent for its destination,
/// which is how work survives a process crash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned identifier, strictly increasing per destination
    pub id: TransactionId,
    /// The destination this transaction belongs to
    pub destination: Destination,
    /// Persistent items, in submission order
    pub events: Vec<PendingItem>,
    /// Ephemeral items, in submission order
    pub ephemeral: Vec<PendingItem>,
}

impl Transaction {
    /// Whether the transaction carries no items at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.ephemeral.is_empty()
    }
}

/// Persisted per-destination health state
///
/// `Unknown` means the store has no recorded state for the destination and is
/// treated as `Up` when deciding whether to attempt delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestinationHealth {
    /// No recorded state; treated as healthy
    Unknown,
    /// Destination is accepting transactions
    Up,
    /// Destination is unreachable; a recoverer owns its backlog
    Down,
}

impl DestinationHealth {
    /// Whether delivery attempts should be made directly
    #[must_use]
    pub const fn is_up(self) -> bool {
        matches!(self, Self::Up | Self::Unknown)
    }
}

impl Display for DestinationHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}
