//! Payment-due read model: ready orders that still need to be collected.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::OrderId;
use domain::{BillingType, Money, Order, OrderCode, OrderStatus, ServiceType};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentDueEntry {
    pub order_id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    pub service_type: ServiceType,
    pub amount_due: Money,
    pub billing_type: Option<BillingType>,
    /// PIX copy-paste payload, when a charge was issued.
    pub qr_payload: Option<String>,
    pub invoice_url: Option<String>,
}

impl PaymentDueEntry {
    /// Returns an entry if the order is ready to hand over and unpaid.
    pub fn for_order(order: &Order) -> Option<Self> {
        let ready = matches!(order.status, OrderStatus::Pronto | OrderStatus::SaiuEntrega);
        if !ready || !order.is_active() || order.is_paid() {
            return None;
        }

        let charge = order.charge.as_ref();
        Some(Self {
            order_id: order.id,
            code: order.code.clone(),
            status: order.status,
            service_type: order.service_type,
            amount_due: order.amount_due(),
            billing_type: order.billing_type,
            qr_payload: charge.and_then(|c| c.qr_payload.clone()),
            invoice_url: charge.and_then(|c| c.invoice_url.clone()),
        })
    }
}

/// Read model view for the cashier's payment-due list.
#[derive(Clone, Default)]
pub struct PaymentDueView {
    entries: Arc<RwLock<Vec<PaymentDueEntry>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl PaymentDueView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<PaymentDueEntry> {
        self.entries.read().await.clone()
    }

    /// Sum of everything still to collect.
    pub async fn total_due(&self) -> Money {
        self.entries.read().await.iter().map(|e| e.amount_due).sum()
    }
}

#[async_trait]
impl Projection for PaymentDueView {
    fn name(&self) -> &'static str {
        "PaymentDueView"
    }

    async fn refresh(&self, active: &[Order]) -> Result<()> {
        let mut ordered: Vec<&Order> = active.iter().collect();
        ordered.sort_by_key(|o| o.created_at);
        let entries = ordered
            .into_iter()
            .filter_map(PaymentDueEntry::for_order)
            .collect();
        *self.entries.write().await = entries;

        let mut pos = self.position.write().await;
        *pos = pos.advance(Utc::now());
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.entries.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for PaymentDueView {
    fn name(&self) -> &'static str {
        "PaymentDueView"
    }

    fn count(&self) -> usize {
        self.entries.try_read().map(|e| e.len()).unwrap_or(0)
    }
}
