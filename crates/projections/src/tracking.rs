//! Customer-facing tracking projector.
//!
//! Unlike the kitchen views this one is pulled, not pushed: the customer
//! page polls by ticket code and the response advertises the poll interval.

use std::time::Duration;

use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Order, OrderCode, OrderStatus, ServiceType};
use order_store::OrderStore;
use serde::Serialize;

use crate::Result;

/// Steps shown on the tracking page, in order.
///
/// SAIU_ENTREGA shares the last step with ENTREGUE.
pub const TRACKING_STEPS: [OrderStatus; 4] = [
    OrderStatus::Pendente,
    OrderStatus::EmPreparo,
    OrderStatus::Pronto,
    OrderStatus::Entregue,
];

/// Maps a raw status name to its step index.
///
/// Returns `None` for CANCELADO, which has no step progress. Names that do
/// not parse fall back to the first step.
pub fn step_index(raw: &str) -> Option<usize> {
    match raw.parse::<OrderStatus>() {
        Ok(status) => status_step(status),
        Err(_) => Some(0),
    }
}

fn status_step(status: OrderStatus) -> Option<usize> {
    match status {
        OrderStatus::Pendente => Some(0),
        OrderStatus::EmPreparo => Some(1),
        OrderStatus::Pronto => Some(2),
        OrderStatus::SaiuEntrega | OrderStatus::Entregue => Some(3),
        OrderStatus::Cancelado => None,
    }
}

/// What the customer sees for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingView {
    pub order_id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    pub service_type: ServiceType,
    pub steps: Vec<OrderStatus>,
    /// Index into `steps`; `None` when cancelled.
    pub active_step: Option<usize>,
    pub cancelled: bool,
    pub terminal: bool,
    pub paid: bool,
    pub updated_at: DateTime<Utc>,
    pub poll_after_secs: u64,
}

/// Builds tracking views for the polling customer page.
#[derive(Debug, Clone, Copy)]
pub struct TrackingProjector {
    poll_interval: Duration,
}

impl TrackingProjector {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Derives the view from a single order. Pure function of its status.
    pub fn project(&self, order: &Order) -> TrackingView {
        let cancelled = order.status == OrderStatus::Cancelado;
        let terminal = order.status.is_terminal() || order.delivered_at.is_some();

        TrackingView {
            order_id: order.id,
            code: order.code.clone(),
            status: order.status,
            service_type: order.service_type,
            steps: TRACKING_STEPS.to_vec(),
            active_step: status_step(order.status),
            cancelled,
            terminal,
            paid: order.is_paid(),
            updated_at: order.updated_at,
            // Terminal orders never change again; nothing to poll for.
            poll_after_secs: if terminal { 0 } else { self.poll_interval.as_secs() },
        }
    }

    /// Looks up the most recent order with `code` and projects it.
    #[tracing::instrument(skip(self, store), fields(code = %code))]
    pub async fn track<S>(&self, store: &S, code: &OrderCode) -> Result<Option<TrackingView>>
    where
        S: OrderStore + ?Sized,
    {
        let order = store.get_by_code(code).await?;
        Ok(order.map(|o| self.project(&o)))
    }
}

impl Default for TrackingProjector {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[cfg(test)]
mod tests {
    use domain::{Money, OrderItem, PlaceOrder};
    use order_store::InMemoryOrderStore;

    use super::*;

    fn order(status: OrderStatus) -> Order {
        let cmd = PlaceOrder::new(
            ServiceType::Delivery,
            vec![OrderItem::new("X-Burger", 1, Money::from_cents(2500))],
        );
        let mut order =
            Order::place(cmd, OrderId::new(), OrderCode::new('A', 482), Utc::now()).unwrap();
        order.status = status;
        order
    }

    #[test]
    fn test_step_index_by_name() {
        assert_eq!(step_index("PENDENTE"), Some(0));
        assert_eq!(step_index("EM_PREPARO"), Some(1));
        assert_eq!(step_index("PRONTO"), Some(2));
        assert_eq!(step_index("SAIU_ENTREGA"), Some(3));
        assert_eq!(step_index("ENTREGUE"), Some(3));
        assert_eq!(step_index("CANCELADO"), None);
    }

    #[test]
    fn test_unknown_status_falls_back_to_first_step() {
        assert_eq!(step_index("AGUARDANDO_MOTOBOY"), Some(0));
        assert_eq!(step_index(""), Some(0));
    }

    #[test]
    fn test_out_for_delivery_shares_last_step() {
        let projector = TrackingProjector::default();
        let out = projector.project(&order(OrderStatus::SaiuEntrega));
        let done = projector.project(&order(OrderStatus::Entregue));

        assert_eq!(out.active_step, done.active_step);
        assert!(!out.terminal);
        assert_eq!(out.poll_after_secs, 15);
        assert!(done.terminal);
        assert_eq!(done.poll_after_secs, 0);
    }

    #[test]
    fn test_cancelled_has_no_progress() {
        let view = TrackingProjector::default().project(&order(OrderStatus::Cancelado));
        assert!(view.cancelled);
        assert!(view.terminal);
        assert_eq!(view.active_step, None);
    }

    #[tokio::test]
    async fn test_track_by_code() {
        let store = InMemoryOrderStore::new();
        let placed = order(OrderStatus::Pendente);
        store.create(&placed).await.unwrap();

        let projector = TrackingProjector::new(Duration::from_secs(20));
        let view = projector
            .track(&store, &OrderCode::new('A', 482))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.order_id, placed.id);
        assert_eq!(view.active_step, Some(0));
        assert_eq!(view.poll_after_secs, 20);

        let missing = projector
            .track(&store, &OrderCode::new('B', 999))
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
