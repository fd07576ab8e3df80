use async_trait::async_trait;
use domain::{BillingUpdate, Order, OrderCode, OrderPatch, OrderStatus};
use tokio::sync::broadcast;

use crate::{AuditRecord, ChangeNotifier, OrderChanged, OrderId, OrderQuery, Result, StoreError};

/// Core trait for order store implementations.
///
/// Every successful write publishes an [`OrderChanged`] on the store's
/// notifier after it is durable. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order.
    ///
    /// Fails with `DuplicateCode` if another order created on the same
    /// operating day already uses the code, and with `AlreadyExists` if the
    /// id is taken.
    async fn create(&self, order: &Order) -> Result<()>;

    /// Retrieves an order by id.
    async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>>;

    /// Retrieves the most recent order with this ticket code.
    async fn get_by_code(&self, code: &OrderCode) -> Result<Option<Order>>;

    /// Lists orders matching a query, in arrival order.
    async fn list(&self, query: OrderQuery) -> Result<Vec<Order>>;

    /// Lists every non-terminal order, in arrival order.
    async fn list_active(&self) -> Result<Vec<Order>> {
        self.list(OrderQuery::active()).await
    }

    /// Applies a transition patch only if the order is still in `expected`.
    ///
    /// Returns the record as written, or None when no order with that id
    /// and status exists; nothing is written in that case.
    async fn conditional_update(
        &self,
        id: OrderId,
        expected: OrderStatus,
        patch: &OrderPatch,
    ) -> Result<Option<Order>>;

    /// Applies payment-side fields. Never changes `status`.
    async fn update_billing(&self, id: OrderId, update: &BillingUpdate) -> Result<Order>;

    /// Overwrites the whole record (last write wins) and records the audit
    /// entry in the same write.
    async fn full_replace(&self, id: OrderId, order: &Order, audit: AuditRecord) -> Result<()>;

    /// Physically deletes an order and records the audit entry in the same
    /// write.
    async fn delete(&self, id: OrderId, audit: AuditRecord) -> Result<()>;

    /// Lists audit entries for an order, oldest first.
    async fn audit_trail(&self, id: OrderId) -> Result<Vec<AuditRecord>>;

    /// Change notifications published by this store.
    fn notifier(&self) -> &ChangeNotifier;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Retrieves an order, failing with `NotFound` if it doesn't exist.
    async fn require(&self, id: OrderId) -> Result<Order> {
        self.get_by_id(id).await?.ok_or(StoreError::NotFound(id))
    }

    /// Checks if an order exists.
    async fn exists(&self, id: OrderId) -> Result<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    /// Subscribes to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<OrderChanged> {
        self.notifier().subscribe()
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
