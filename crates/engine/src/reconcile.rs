//! Payment reconciliation inputs and outputs.

use common::OrderId;
use domain::{BillingType, Money, Order, OrderCode, OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Payment status notification from the billing provider.
///
/// `order_id` is the external reference sent when the charge was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentNotice {
    pub order_id: OrderId,
    #[serde(default)]
    pub charge_id: Option<String>,
    /// Raw provider status (`PAYMENT_RECEIVED`, `pago`, `PENDING`, ...).
    pub status: String,
}

impl PaymentNotice {
    pub fn new(order_id: OrderId, status: impl Into<String>) -> Self {
        Self {
            order_id,
            charge_id: None,
            status: status.into(),
        }
    }

    /// Normalised status; `None` for a blank one.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.status)
    }
}

/// Everything a terminal needs to collect payment before delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentCollection {
    pub order_id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    pub amount_due: Money,
    pub billing_type: Option<BillingType>,
    pub paid: bool,
    pub payment_status: Option<PaymentStatus>,
    pub charge_id: Option<String>,
    pub qr_payload: Option<String>,
    pub invoice_url: Option<String>,
}

impl PaymentCollection {
    pub fn for_order(order: &Order) -> Self {
        let charge = order.charge.as_ref();
        Self {
            order_id: order.id,
            code: order.code.clone(),
            status: order.status,
            amount_due: order.amount_due(),
            billing_type: order.billing_type,
            paid: order.is_paid(),
            payment_status: order.payment_status.clone(),
            charge_id: charge.map(|c| c.charge_id.clone()),
            qr_payload: charge.and_then(|c| c.qr_payload.clone()),
            invoice_url: charge.and_then(|c| c.invoice_url.clone()),
        }
    }
}
