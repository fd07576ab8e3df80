//! Changes produced by transition planning and applied by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Courier, OrderStatus};

/// Delivery signature stamped at the ENTREGUE transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySignature {
    pub by_id: String,
    pub by_name: String,
    pub at: DateTime<Utc>,
}

/// Operator confirmation of an in-person payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub by_id: String,
    pub by_name: String,
    pub at: DateTime<Utc>,
}

/// The writes a validated transition makes to an order.
///
/// A patch is always planned against a known `from` status and is only
/// applied if the stored order is still in that status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub from: OrderStatus,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub courier: Option<Courier>,

    #[serde(default)]
    pub delivery: Option<DeliverySignature>,

    #[serde(default)]
    pub payment_confirmation: Option<PaymentConfirmation>,

    #[serde(default)]
    pub cancel_reason: Option<String>,
}

impl OrderPatch {
    /// A plain status change with no side fields.
    pub fn status_change(from: OrderStatus, status: OrderStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            from,
            status,
            updated_at,
            courier: None,
            delivery: None,
            payment_confirmation: None,
            cancel_reason: None,
        }
    }

    /// Returns true if the patch carries an operator payment override.
    pub fn overrides_payment(&self) -> bool {
        self.payment_confirmation.is_some()
    }
}
