//! Per-destination buffering and sender tasks
//!
//! Items are buffered in memory per destination; the first enqueue for an
//! idle destination lazily starts a sender task that batches and hands work
//! to the controller until both buffers are empty, then exits. Backpressure
//! is deliberately not applied here because durability happens downstream.

use std::{collections::VecDeque, sync::Arc};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::warn;

use crate::{
    controller::TransactionController,
    types::{Destination, PendingItem},
};

/// In-memory buffers for one destination
#[derive(Debug, Default)]
struct Buffers {
    events: VecDeque<PendingItem>,
    ephemeral: VecDeque<PendingItem>,
    /// Whether a sender task currently owns this destination's drain.
    ///
    /// Guarded by the same mutex as the buffers: a sender only clears it
    /// while holding the lock and having observed both buffers empty, and an
    /// enqueuer only sets it while holding the lock, so an item is never
    /// left behind without a live sender.
    sender_active: bool,
}

/// Take up to `max` items from the front of `buffer`
fn take_batch(buffer: &mut VecDeque<PendingItem>, max: usize) -> Vec<PendingItem> {
    buffer.drain(..max.min(buffer.len())).collect()
}

/// Accepts items per destination and drives one sender task each
#[derive(Debug, Clone)]
pub struct DestinationQueue {
    controller: Arc<TransactionController>,
    /// Map of destination to its buffers (lock-free concurrent access)
    buffers: Arc<DashMap<Destination, Arc<Mutex<Buffers>>>>,
}

impl DestinationQueue {
    /// Create an empty queue feeding `controller`
    #[must_use]
    pub fn new(controller: Arc<TransactionController>) -> Self {
        Self {
            controller,
            buffers: Arc::new(DashMap::new()),
        }
    }

    /// Append a persistent event to `destination`'s buffer
    ///
    /// Starts a sender task for the destination if none is active. Never
    /// blocks on network I/O.
    pub fn enqueue_event(&self, destination: &Destination, event: PendingItem) {
        let handle = self.buffer_handle(destination);
        let start_sender = {
            let mut buffers = handle.lock();
            buffers.events.push_back(event);
            buffers.try_claim_sender()
        };
        if start_sender {
            self.spawn_sender(destination.clone(), handle);
        }
    }

    /// Append ephemeral items to `destination`'s buffer
    ///
    /// Same starting behaviour as [`Self::enqueue_event`].
    pub fn enqueue_ephemeral(&self, destination: &Destination, items: Vec<PendingItem>) {
        if items.is_empty() {
            return;
        }
        let handle = self.buffer_handle(destination);
        let start_sender = {
            let mut buffers = handle.lock();
            buffers.ephemeral.extend(items);
            buffers.try_claim_sender()
        };
        if start_sender {
            self.spawn_sender(destination.clone(), handle);
        }
    }

    fn buffer_handle(&self, destination: &Destination) -> Arc<Mutex<Buffers>> {
        self.buffers
            .entry(destination.clone())
            .or_default()
            .clone()
    }

    fn spawn_sender(&self, destination: Destination, handle: Arc<Mutex<Buffers>>) {
        let controller = Arc::clone(&self.controller);
        let max_events = controller.config().max_events_per_transaction;
        let max_ephemeral = controller.config().max_ephemeral_per_transaction;

        tokio::task::spawn(drain_destination(
            controller,
            destination,
            handle,
            max_events,
            max_ephemeral,
        ));
    }
}

impl Buffers {
    /// Returns `true` if the caller should start a sender task
    fn try_claim_sender(&mut self) -> bool {
        if self.sender_active {
            false
        } else {
            self.sender_active = true;
            true
        }
    }
}

/// Sender task body: batch and hand work to the controller until both
/// buffers are empty for this destination
///
/// Controller errors are logged and the loop continues; transactions keep
/// being created even while the destination is down, with actual delivery
/// ceded to the recoverer. Taking both slices is a single critical section,
/// so concurrent enqueuers can never corrupt or split a batch.
async fn drain_destination(
    controller: Arc<TransactionController>,
    destination: Destination,
    handle: Arc<Mutex<Buffers>>,
    max_events: usize,
    max_ephemeral: usize,
) {
    loop {
        let (events, ephemeral) = {
            let mut buffers = handle.lock();
            let events = take_batch(&mut buffers.events, max_events);
            let ephemeral = take_batch(&mut buffers.ephemeral, max_ephemeral);
            if events.is_empty() && ephemeral.is_empty() {
                buffers.sender_active = false;
                return;
            }
            (events, ephemeral)
        };

        if let Err(error) = controller.send(&destination, events, ephemeral).await {
            warn!(
                destination = %destination,
                error = %error,
                "Transaction send failed, destination handed to recovery"
            );
        }
    }
}
