//! The durable order record.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::pricing;

use super::{
    BillingType, BillingUpdate, ChargeReference, CustomerInfo, DeliverySignature, Money,
    OrderCode, OrderError, OrderItem, OrderPatch, OrderStatus, PaymentConfirmation,
    PaymentStatus, PlaceOrder, ServiceType, TransitionRequest, validate_items,
    validate_total,
};

/// An order as persisted by the store.
///
/// Mutated only through [`Order::plan_transition`] + [`Order::apply`],
/// billing updates, or an audited administrative replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Short ticket code, immutable once assigned.
    pub code: OrderCode,

    pub status: OrderStatus,
    pub service_type: ServiceType,

    /// Free-text origin tag, informational only.
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub customer: Option<CustomerInfo>,

    /// Snapshot of what was ordered.
    pub items: Vec<OrderItem>,

    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,

    #[serde(default)]
    pub billing_type: Option<BillingType>,

    /// Precomputed total; derived from `items` when absent.
    #[serde(default)]
    pub total: Option<Money>,

    #[serde(default)]
    pub charge: Option<ChargeReference>,

    #[serde(default)]
    pub motoboy_name: Option<String>,
    #[serde(default)]
    pub motoboy_phone: Option<String>,

    #[serde(default)]
    pub delivered_by_id: Option<String>,
    #[serde(default)]
    pub delivered_by_name: Option<String>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub payment_confirmed_by_id: Option<String>,
    #[serde(default)]
    pub payment_confirmed_by_name: Option<String>,
    #[serde(default)]
    pub payment_confirmed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub cancel_reason: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Construction and queries
impl Order {
    /// Builds a PENDENTE order from a validated placement command.
    pub fn place(
        cmd: PlaceOrder,
        id: OrderId,
        code: OrderCode,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let cmd = cmd.validated()?;

        Ok(Order {
            id,
            code,
            status: OrderStatus::Pendente,
            service_type: cmd.service_type,
            source: cmd.source,
            customer: cmd.customer,
            items: cmd.items,
            payment_status: None,
            billing_type: cmd.billing_type,
            total: cmd.total,
            charge: None,
            motoboy_name: None,
            motoboy_phone: None,
            delivered_by_id: None,
            delivered_by_name: None,
            delivered_at: None,
            payment_confirmed_by_id: None,
            payment_confirmed_by_name: None,
            payment_confirmed_at: None,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Amount the customer owes: the stored total, or the item-derived one.
    pub fn amount_due(&self) -> Money {
        self.total
            .unwrap_or_else(|| pricing::compute_order_total(&self.items))
    }

    pub fn is_paid(&self) -> bool {
        super::is_paid(self)
    }

    /// Returns true while the order belongs on the operational queue.
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal() && self.delivered_at.is_none()
    }

    /// Operating day used to scope ticket-code uniqueness.
    pub fn operating_day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

// Transition planning (pure)
impl Order {
    /// Validates a transition request against this order and returns the
    /// patch to persist.
    ///
    /// Does not mutate the order; a rejected request leaves `status` and
    /// `updated_at` untouched.
    pub fn plan_transition(
        &self,
        request: &TransitionRequest,
        now: DateTime<Utc>,
    ) -> Result<OrderPatch, OrderError> {
        let from = self.status;
        let to = request.to;

        if !from.can_transition_to(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }

        let mut patch = OrderPatch::status_change(from, to, self.next_updated_at(now));

        match to {
            OrderStatus::SaiuEntrega => {
                if self.service_type != ServiceType::Delivery {
                    return Err(OrderError::InvalidTransition { from, to });
                }
                let courier = request
                    .courier
                    .as_ref()
                    .and_then(|c| c.normalized())
                    .ok_or(OrderError::MissingCourier)?;
                patch.courier = Some(courier);
            }
            OrderStatus::Entregue => {
                let actor = request
                    .actor
                    .as_ref()
                    .filter(|a| a.is_identified())
                    .ok_or(OrderError::MissingDeliverySignature)?;

                if !self.is_paid() {
                    if !request.confirm_payment {
                        return Err(OrderError::PaymentNotConfirmed {
                            amount_due: self.amount_due(),
                            billing_type: self.billing_type,
                        });
                    }
                    patch.payment_confirmation = Some(PaymentConfirmation {
                        by_id: actor.id.trim().to_string(),
                        by_name: actor.name.trim().to_string(),
                        at: patch.updated_at,
                    });
                }

                patch.delivery = Some(DeliverySignature {
                    by_id: actor.id.trim().to_string(),
                    by_name: actor.name.trim().to_string(),
                    at: patch.updated_at,
                });
            }
            OrderStatus::Cancelado => {
                patch.cancel_reason = request
                    .reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from);
            }
            _ => {}
        }

        Ok(patch)
    }

    /// Returns a timestamp strictly after the current `updated_at`.
    fn next_updated_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        }
    }
}

// Mutation
impl Order {
    /// Applies a planned patch.
    pub fn apply(&mut self, patch: &OrderPatch) {
        self.status = patch.status;
        self.updated_at = patch.updated_at;

        if let Some(courier) = &patch.courier {
            self.motoboy_name = Some(courier.name.clone());
            self.motoboy_phone = Some(courier.phone.clone());
        }

        if let Some(delivery) = &patch.delivery {
            self.delivered_by_id = Some(delivery.by_id.clone());
            self.delivered_by_name = Some(delivery.by_name.clone());
            self.delivered_at = Some(delivery.at);
        }

        if let Some(confirmation) = &patch.payment_confirmation {
            self.payment_status = Some(PaymentStatus::Paid);
            self.payment_confirmed_by_id = Some(confirmation.by_id.clone());
            self.payment_confirmed_by_name = Some(confirmation.by_name.clone());
            self.payment_confirmed_at = Some(confirmation.at);
        }

        if patch.cancel_reason.is_some() {
            self.cancel_reason = patch.cancel_reason.clone();
        }
    }

    /// Applies a billing update. Never touches `status`.
    pub fn apply_billing(&mut self, update: &BillingUpdate) {
        if let Some(charge) = &update.charge {
            self.charge = Some(charge.clone());
        }
        if let Some(status) = &update.payment_status {
            // A late PENDING must not undo a received payment.
            if !(self.is_paid() && *status == PaymentStatus::Pending) {
                self.payment_status = Some(status.clone());
            }
        }
        self.updated_at = if update.updated_at > self.updated_at {
            update.updated_at
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    /// Checks that `replacement` may overwrite this order administratively
    /// and returns it with normalised items.
    pub fn check_replacement(&self, mut replacement: Order) -> Result<Order, OrderError> {
        if replacement.id != self.id {
            return Err(OrderError::ImmutableField { field: "id" });
        }
        if replacement.code != self.code {
            return Err(OrderError::ImmutableField { field: "code" });
        }
        replacement.items = validate_items(&replacement.items)?;
        validate_total(replacement.total)?;
        replacement.created_at = self.created_at;
        Ok(replacement)
    }
}
