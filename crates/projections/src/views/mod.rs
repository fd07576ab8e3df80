//! Read model views for the operational terminals.

pub mod kitchen_queue;
pub mod payment_due;

pub use kitchen_queue::{KitchenQueue, KitchenQueueView, PaymentBadge, QueueCard};
pub use payment_due::{PaymentDueEntry, PaymentDueView};
