//! Kitchen queue read model: active orders grouped into status columns.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{BillingType, Money, Order, OrderCode, OrderItem, OrderStatus, ServiceType};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Paid/unpaid marker shown on cards that are ready to hand over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentBadge {
    Paid,
    Unpaid,
}

/// One order as shown on the kitchen display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueCard {
    pub order_id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    pub service_type: ServiceType,
    pub items: Vec<OrderItem>,
    pub amount_due: Money,
    pub billing_type: Option<BillingType>,
    /// Only set in the PRONTO and SAIU_ENTREGA columns.
    pub payment_badge: Option<PaymentBadge>,
    pub motoboy_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QueueCard {
    fn from_order(order: &Order) -> Self {
        let payment_badge = matches!(order.status, OrderStatus::Pronto | OrderStatus::SaiuEntrega)
            .then(|| {
                if order.is_paid() {
                    PaymentBadge::Paid
                } else {
                    PaymentBadge::Unpaid
                }
            });

        Self {
            order_id: order.id,
            code: order.code.clone(),
            status: order.status,
            service_type: order.service_type,
            items: order.items.clone(),
            amount_due: order.amount_due(),
            billing_type: order.billing_type,
            payment_badge,
            motoboy_name: order.motoboy_name.clone(),
            created_at: order.created_at,
        }
    }
}

/// The four operational columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KitchenQueue {
    pub pendente: Vec<QueueCard>,
    pub em_preparo: Vec<QueueCard>,
    pub pronto: Vec<QueueCard>,
    pub saiu_entrega: Vec<QueueCard>,
}

impl KitchenQueue {
    /// Groups orders into columns.
    ///
    /// Terminal orders are dropped. Within a column, cards keep arrival
    /// order (created_at, ties in input order).
    pub fn project(orders: &[Order]) -> Self {
        let mut active: Vec<&Order> = orders.iter().filter(|o| o.is_active()).collect();
        active.sort_by_key(|o| o.created_at);

        let mut queue = KitchenQueue::default();
        for order in active {
            let card = QueueCard::from_order(order);
            match order.status {
                OrderStatus::Pendente => queue.pendente.push(card),
                OrderStatus::EmPreparo => queue.em_preparo.push(card),
                OrderStatus::Pronto => queue.pronto.push(card),
                OrderStatus::SaiuEntrega => queue.saiu_entrega.push(card),
                OrderStatus::Entregue | OrderStatus::Cancelado => {}
            }
        }
        queue
    }

    /// Returns the column for a status, if it has one.
    pub fn column(&self, status: OrderStatus) -> Option<&[QueueCard]> {
        match status {
            OrderStatus::Pendente => Some(&self.pendente),
            OrderStatus::EmPreparo => Some(&self.em_preparo),
            OrderStatus::Pronto => Some(&self.pronto),
            OrderStatus::SaiuEntrega => Some(&self.saiu_entrega),
            OrderStatus::Entregue | OrderStatus::Cancelado => None,
        }
    }

    pub fn len(&self) -> usize {
        self.pendente.len() + self.em_preparo.len() + self.pronto.len() + self.saiu_entrega.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        OrderStatus::ACTIVE
            .iter()
            .filter_map(|s| self.column(*s))
            .flatten()
            .any(|card| card.order_id == order_id)
    }
}

/// Read model view for the kitchen display.
#[derive(Clone, Default)]
pub struct KitchenQueueView {
    queue: Arc<RwLock<KitchenQueue>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl KitchenQueueView {
    /// Creates a new empty kitchen queue view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current columns.
    pub async fn snapshot(&self) -> KitchenQueue {
        self.queue.read().await.clone()
    }

    /// Returns the cards in one column.
    pub async fn column(&self, status: OrderStatus) -> Vec<QueueCard> {
        self.queue
            .read()
            .await
            .column(status)
            .map(<[QueueCard]>::to_vec)
            .unwrap_or_default()
    }
}

#[async_trait]
impl Projection for KitchenQueueView {
    fn name(&self) -> &'static str {
        "KitchenQueueView"
    }

    async fn refresh(&self, active: &[Order]) -> Result<()> {
        let queue = KitchenQueue::project(active);
        *self.queue.write().await = queue;

        let mut pos = self.position.write().await;
        *pos = pos.advance(Utc::now());
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        *self.queue.write().await = KitchenQueue::default();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for KitchenQueueView {
    fn name(&self) -> &'static str {
        "KitchenQueueView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.queue.try_read().map(|q| q.len()).unwrap_or(0)
    }
}
