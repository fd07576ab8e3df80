use std::sync::Arc;

use async_trait::async_trait;
use domain::{BillingUpdate, Order, OrderCode, OrderPatch, OrderStatus};
use tokio::sync::RwLock;

use crate::{
    AuditRecord, ChangeKind, ChangeNotifier, OrderId, OrderQuery, Result, StoreError,
    store::OrderStore,
};

/// In-memory order store implementation for testing and single-node use.
///
/// Orders are kept in arrival order and guarded by a single lock, so the
/// status check and the write of [`OrderStore::conditional_update`] are
/// atomic with respect to other writers.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
    audit: Arc<RwLock<Vec<AuditRecord>>>,
    notifier: ChangeNotifier,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders and audit entries.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
        self.audit.write().await.clear();
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;

        if orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::AlreadyExists(order.id));
        }

        let day = order.operating_day();
        if orders
            .iter()
            .any(|o| o.code == order.code && o.operating_day() == day)
        {
            return Err(StoreError::DuplicateCode {
                code: order.code.clone(),
                operating_day: day,
            });
        }

        orders.push(order.clone());
        drop(orders);

        self.notifier.publish(order.id, ChangeKind::Created);
        Ok(())
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == id).cloned())
    }

    async fn get_by_code(&self, code: &OrderCode) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .iter()
            .filter(|o| &o.code == code)
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn list(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matched: Vec<_> = orders
            .iter()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();

        // Stable: ties keep insertion order
        matched.sort_by_key(|o| o.created_at);

        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn conditional_update(
        &self,
        id: OrderId,
        expected: OrderStatus,
        patch: &OrderPatch,
    ) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;

        let Some(order) = orders
            .iter_mut()
            .find(|o| o.id == id && o.status == expected)
        else {
            return Ok(None);
        };
        order.apply(patch);
        let updated = order.clone();
        drop(orders);

        self.notifier.publish(id, ChangeKind::StatusChanged);
        Ok(Some(updated))
    }

    async fn update_billing(&self, id: OrderId, update: &BillingUpdate) -> Result<Order> {
        let mut orders = self.orders.write().await;

        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::NotFound(id))?;
        order.apply_billing(update);
        let updated = order.clone();
        drop(orders);

        self.notifier.publish(id, ChangeKind::Billing);
        Ok(updated)
    }

    async fn full_replace(&self, id: OrderId, order: &Order, audit: AuditRecord) -> Result<()> {
        let mut orders = self.orders.write().await;

        let slot = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(StoreError::NotFound(id))?;
        *slot = order.clone();
        self.audit.write().await.push(audit);
        drop(orders);

        self.notifier.publish(id, ChangeKind::Replaced);
        Ok(())
    }

    async fn delete(&self, id: OrderId, audit: AuditRecord) -> Result<()> {
        let mut orders = self.orders.write().await;

        let index = orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(StoreError::NotFound(id))?;
        orders.remove(index);
        self.audit.write().await.push(audit);
        drop(orders);

        self.notifier.publish(id, ChangeKind::Deleted);
        Ok(())
    }

    async fn audit_trail(&self, id: OrderId) -> Result<Vec<AuditRecord>> {
        let audit = self.audit.read().await;
        Ok(audit.iter().filter(|r| r.order_id == id).cloned().collect())
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
