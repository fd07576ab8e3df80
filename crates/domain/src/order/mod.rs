//! Order record, lifecycle and related types.

mod commands;
mod patch;
mod payment;
mod record;
mod status;
mod value_objects;

pub use commands::{PlaceOrder, TransitionRequest, validate_items, validate_total};
pub use patch::{DeliverySignature, OrderPatch, PaymentConfirmation};
pub use payment::{BillingUpdate, PaymentStatus, is_paid, is_paid_status};
pub use record::Order;
pub use status::{OrderStatus, UnknownStatus};
pub use value_objects::{
    Actor, BillingType, ChargeReference, Courier, CustomerInfo, Money, OrderCode, OrderItem,
    ServiceType,
};

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// An item has a blank product name.
    #[error("Item {index} has no product name")]
    MissingProductName { index: usize },

    /// Invalid quantity.
    #[error("Item {index} has invalid quantity {quantity} (must be greater than 0)")]
    InvalidQuantity { index: usize, quantity: u32 },

    /// Negative price on an item (`index` set) or on the order total.
    #[error("Invalid price: {cents} cents (must not be negative)")]
    InvalidPrice { index: Option<usize>, cents: i64 },

    /// A line total (`index` set) or the order total exceeds [`Money::MAX`].
    #[error("Amount too large (limit {limit})")]
    AmountTooLarge { index: Option<usize>, limit: Money },

    /// Transition not in the lifecycle table.
    #[error("Invalid transition: cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// SAIU_ENTREGA requested without courier name and phone.
    #[error("Courier name and phone are required to go out for delivery")]
    MissingCourier,

    /// ENTREGUE requested without a staff signature.
    #[error("Delivery confirmation requires the staff member's id and name")]
    MissingDeliverySignature,

    /// ENTREGUE requested on an unpaid order without a payment override.
    #[error("Payment not confirmed: {amount_due} due")]
    PaymentNotConfirmed {
        amount_due: Money,
        billing_type: Option<BillingType>,
    },

    /// Administrative replace tried to change an immutable field.
    #[error("Field '{field}' cannot be changed")]
    ImmutableField { field: &'static str },
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NoItems
            | OrderError::MissingProductName { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. }
            | OrderError::AmountTooLarge { .. }
            | OrderError::ImmutableField { .. } => ErrorKind::Validation,
            OrderError::MissingCourier | OrderError::MissingDeliverySignature => {
                ErrorKind::MissingField
            }
            OrderError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            OrderError::PaymentNotConfirmed { .. } => ErrorKind::PaymentNotConfirmed,
        }
    }
}
