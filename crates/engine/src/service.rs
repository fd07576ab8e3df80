//! Order lifecycle engine.

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::OrderId;
use domain::{
    Actor, BillingType, BillingUpdate, ChargeReference, Order, OrderCode, OrderPatch, OrderStatus,
    PlaceOrder, TransitionRequest,
};
use order_store::{AuditRecord, OrderQuery, OrderStore, StoreError};

use crate::code::CodeGenerator;
use crate::error::{EngineError, Result};
use crate::reconcile::{PaymentCollection, PaymentNotice};
use crate::services::{BillingError, BillingProvider, ChargeRequest};

/// Default number of ticket codes tried before giving up.
pub const DEFAULT_CODE_ATTEMPTS: u32 = 8;

/// A placed order and the outcome of its charge request.
///
/// A failed charge never fails placement; terminals can retry with
/// [`OrderEngine::charge_order`].
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub billing_error: Option<BillingError>,
}

/// Drives orders through their lifecycle on top of an [`OrderStore`].
///
/// Every status change is a compare-and-set on the persisted status: two
/// terminals acting on the same order cannot both succeed, and the loser
/// gets [`EngineError::ConflictingTransition`] with the status it lost to.
pub struct OrderEngine<S, B>
where
    S: OrderStore + ?Sized,
    B: BillingProvider,
{
    store: Arc<S>,
    billing: B,
    codes: CodeGenerator,
    code_attempts: u32,
}

impl<S, B> OrderEngine<S, B>
where
    S: OrderStore + ?Sized,
    B: BillingProvider,
{
    /// Creates an engine with the default ticket code settings.
    pub fn new(store: Arc<S>, billing: B) -> Self {
        Self {
            store,
            billing,
            codes: CodeGenerator::default(),
            code_attempts: DEFAULT_CODE_ATTEMPTS,
        }
    }

    pub fn with_codes(mut self, codes: CodeGenerator, attempts: u32) -> Self {
        self.codes = codes;
        self.code_attempts = attempts.max(1);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn billing(&self) -> &B {
        &self.billing
    }

    /// Validates and persists a new PENDENTE order, then requests a charge
    /// when the billing method goes through the provider.
    #[tracing::instrument(skip(self, cmd), fields(service_type = %cmd.service_type))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<PlacedOrder> {
        let cmd = cmd.validated()?;
        let id = OrderId::new();
        let now = Utc::now();

        for attempt in 1..=self.code_attempts {
            let code = self.codes.next_code();
            let order = Order::place(cmd.clone(), id, code, now)?;

            match self.store.create(&order).await {
                Ok(()) => {
                    metrics::counter!("orders_created_total").increment(1);
                    tracing::info!(order_id = %order.id, code = %order.code, attempt, "order placed");
                    return Ok(self.request_charge(order).await);
                }
                Err(StoreError::DuplicateCode { code, .. }) => {
                    metrics::counter!("order_code_collisions_total").increment(1);
                    tracing::debug!(%code, attempt, "order code taken, drawing another");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(attempts = self.code_attempts, "no free order code");
        Err(EngineError::CodeSpaceExhausted {
            attempts: self.code_attempts,
        })
    }

    /// Requests a charge for a freshly persisted order.
    ///
    /// The order exists at this point, so nothing here fails placement:
    /// charge-side errors are reported in [`PlacedOrder::billing_error`].
    async fn request_charge(&self, order: Order) -> PlacedOrder {
        let Some(billing_type) = order.billing_type.filter(|b| b.is_provider_charged()) else {
            return PlacedOrder {
                order,
                billing_error: None,
            };
        };
        if order.is_paid() {
            return PlacedOrder {
                order,
                billing_error: None,
            };
        }

        let charge = match self.create_charge(&order, billing_type).await {
            Ok(charge) => charge,
            Err(e) => {
                return PlacedOrder {
                    order,
                    billing_error: Some(e),
                };
            }
        };

        match self.record_charge(order.id, &charge).await {
            Ok(order) => PlacedOrder {
                order,
                billing_error: None,
            },
            Err(e) => {
                metrics::counter!("billing_charge_unrecorded_total").increment(1);
                tracing::error!(
                    order_id = %order.id,
                    charge_id = %charge.charge_id,
                    error = %e,
                    "charge issued but not recorded on the order"
                );
                PlacedOrder {
                    order,
                    billing_error: Some(BillingError::NotRecorded {
                        charge_id: charge.charge_id,
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    async fn create_charge(
        &self,
        order: &Order,
        billing_type: BillingType,
    ) -> std::result::Result<ChargeReference, BillingError> {
        let request = ChargeRequest {
            order_id: order.id,
            code: order.code.clone(),
            amount: order.amount_due(),
            billing_type,
            customer: order.customer.clone(),
        };

        match self.billing.create_charge(request).await {
            Ok(charge) => {
                tracing::info!(order_id = %order.id, charge_id = %charge.charge_id, "charge issued");
                Ok(charge)
            }
            Err(e) => {
                metrics::counter!("billing_charge_failures_total").increment(1);
                tracing::warn!(order_id = %order.id, error = %e, "charge request failed");
                Err(e)
            }
        }
    }

    async fn record_charge(&self, id: OrderId, charge: &ChargeReference) -> Result<Order> {
        let update = BillingUpdate::charge(charge.clone(), Utc::now());
        Ok(self.store.update_billing(id, &update).await?)
    }

    /// Charges an unpaid, provider-billed order that has no charge yet.
    ///
    /// An order already carrying a charge is returned as is; the provider
    /// is not called again.
    #[tracing::instrument(skip(self))]
    pub async fn charge_order(&self, id: OrderId) -> Result<Order> {
        let order = self.get(id).await?;
        let billing_type = match order.billing_type {
            Some(b) if b.is_provider_charged() && !order.is_paid() && !order.status.is_terminal() => b,
            _ => {
                return Err(EngineError::NotChargeable {
                    billing_type: order.billing_type,
                });
            }
        };

        if let Some(charge) = &order.charge {
            tracing::debug!(charge_id = %charge.charge_id, "order already charged");
            return Ok(order);
        }

        let charge = self.create_charge(&order, billing_type).await?;
        self.record_charge(id, &charge).await
    }

    pub async fn get(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(EngineError::NotFound(id))
    }

    /// Most recent order carrying `code`.
    pub async fn get_by_code(&self, code: &OrderCode) -> Result<Option<Order>> {
        Ok(self.store.get_by_code(code).await?)
    }

    pub async fn list(&self, query: OrderQuery) -> Result<Vec<Order>> {
        Ok(self.store.list(query).await?)
    }

    pub async fn list_active(&self) -> Result<Vec<Order>> {
        Ok(self.store.list_active().await?)
    }

    /// Moves an order to `request.to`.
    ///
    /// Rejections leave the record untouched. When `request.expected_from`
    /// is set it must match the persisted status.
    #[tracing::instrument(skip(self, request), fields(to = %request.to))]
    pub async fn transition(&self, id: OrderId, request: TransitionRequest) -> Result<Order> {
        let current = self.get(id).await?;

        if let Some(expected) = request.expected_from
            && expected != current.status
        {
            return Err(self.conflict(id, expected, current.status));
        }

        let patch = current.plan_transition(&request, Utc::now())?;

        let Some(updated) = self
            .store
            .conditional_update(id, current.status, &patch)
            .await?
        else {
            let actual = self.get(id).await?.status;
            return Err(self.conflict(id, current.status, actual));
        };

        self.record_transition(&current, &patch);
        Ok(updated)
    }

    fn conflict(&self, order_id: OrderId, expected: OrderStatus, actual: OrderStatus) -> EngineError {
        metrics::counter!("order_transition_conflicts_total").increment(1);
        tracing::info!(%order_id, %expected, %actual, "transition lost to a concurrent change");
        EngineError::ConflictingTransition {
            order_id,
            expected,
            actual,
        }
    }

    fn record_transition(&self, current: &Order, patch: &OrderPatch) {
        metrics::counter!("order_transitions_total", "to" => patch.status.as_str()).increment(1);
        tracing::info!(
            order_id = %current.id,
            code = %current.code,
            from = %patch.from,
            to = %patch.status,
            "order status changed"
        );

        if let Some(confirmation) = &patch.payment_confirmation {
            tracing::warn!(
                order_id = %current.id,
                actor_id = %confirmation.by_id,
                actor_name = %confirmation.by_name,
                amount_due = %current.amount_due(),
                "payment confirmed manually at delivery"
            );
        }
    }

    /// Applies a provider payment notification. Never changes `status`.
    ///
    /// A blank provider status is ignored and the order returned unchanged.
    #[tracing::instrument(skip(self, notice), fields(order_id = %notice.order_id, status = %notice.status))]
    pub async fn ingest_payment_status(&self, notice: PaymentNotice) -> Result<Order> {
        let Some(status) = notice.payment_status() else {
            tracing::debug!("blank payment status ignored");
            return self.get(notice.order_id).await;
        };

        let order = self
            .store
            .update_billing(notice.order_id, &BillingUpdate::status(status, Utc::now()))
            .await?;
        tracing::info!(paid = order.is_paid(), "payment status ingested");
        Ok(order)
    }

    /// Amount due, method and charge details for collecting payment.
    pub async fn payment_collection(&self, id: OrderId) -> Result<PaymentCollection> {
        let order = self.get(id).await?;
        Ok(PaymentCollection::for_order(&order))
    }

    /// Overwrites an order outside the lifecycle table, leaving an audit record.
    ///
    /// `id`, `code` and `created_at` are kept from the stored order.
    #[tracing::instrument(skip(self, replacement, actor, reason), fields(actor_id = %actor.id))]
    pub async fn admin_replace(
        &self,
        id: OrderId,
        replacement: Order,
        actor: Actor,
        reason: Option<String>,
    ) -> Result<Order> {
        if !actor.is_identified() {
            return Err(EngineError::UnidentifiedActor);
        }

        let current = self.get(id).await?;
        let mut replacement = current.check_replacement(replacement)?;
        let now = Utc::now();
        replacement.updated_at = if now > current.updated_at {
            now
        } else {
            current.updated_at + Duration::microseconds(1)
        };

        tracing::warn!(
            order_id = %id,
            actor_id = %actor.id,
            actor_name = %actor.name,
            from = %current.status,
            to = %replacement.status,
            "administrative replace"
        );

        let audit = AuditRecord::replace(current, replacement.clone(), actor, reason);
        self.store.full_replace(id, &replacement, audit).await?;
        metrics::counter!("admin_overrides_total", "action" => "replace").increment(1);

        Ok(replacement)
    }

    /// Deletes an order, leaving an audit record with its last state.
    #[tracing::instrument(skip(self, actor, reason), fields(actor_id = %actor.id))]
    pub async fn admin_delete(&self, id: OrderId, actor: Actor, reason: Option<String>) -> Result<()> {
        if !actor.is_identified() {
            return Err(EngineError::UnidentifiedActor);
        }

        let current = self.get(id).await?;
        tracing::warn!(
            order_id = %id,
            code = %current.code,
            actor_id = %actor.id,
            actor_name = %actor.name,
            "administrative delete"
        );

        let audit = AuditRecord::delete(current, actor, reason);
        self.store.delete(id, audit).await?;
        metrics::counter!("admin_overrides_total", "action" => "delete").increment(1);
        Ok(())
    }

    pub async fn audit_trail(&self, id: OrderId) -> Result<Vec<AuditRecord>> {
        Ok(self.store.audit_trail(id).await?)
    }
}
