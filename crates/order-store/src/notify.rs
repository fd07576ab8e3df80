//! Change notification adapter.
//!
//! ```text
//! store write (create / transition / billing / replace / delete)
//!       │ OrderChanged { order_id, kind }
//!       ▼
//! ChangeNotifier ── broadcast::Sender ──► ProjectionProcessor, ...
//! ```
//!
//! A notification says only that something changed; subscribers re-fetch.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::OrderId;

/// Buffer large enough to absorb a burst of kitchen updates.
const BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    StatusChanged,
    Billing,
    Replaced,
    Deleted,
}

/// "An order changed" event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChanged {
    pub order_id: OrderId,
    pub kind: ChangeKind,
}

/// Fan-out of order change events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<OrderChanged>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderChanged> {
        self.tx.subscribe()
    }

    /// Publishes a change. Having no subscribers is not an error.
    pub fn publish(&self, order_id: OrderId, kind: ChangeKind) {
        let delivered = self.tx.send(OrderChanged { order_id, kind }).unwrap_or(0);
        tracing::trace!(%order_id, ?kind, delivered, "order change published");
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
