//! Engine error types.

use common::OrderId;
use domain::{BillingType, CartError, ErrorKind, OrderError, OrderStatus};
use order_store::StoreError;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::services::BillingError;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Validation or lifecycle rule rejected by the domain.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Order not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// Another actor changed the order first.
    #[error("Order {order_id} is {actual}, expected {expected}")]
    ConflictingTransition {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// Every ticket code tried was already taken today.
    #[error("No free order code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },

    /// Override or audited action without an identified staff member.
    #[error("Staff id and name are required")]
    UnidentifiedActor,

    /// The order's billing method is not charged through the provider.
    #[error("Order is not chargeable (billing type {billing_type:?})")]
    NotChargeable { billing_type: Option<BillingType> },

    /// Billing provider error.
    #[error("Billing provider error: {0}")]
    Billing(#[from] BillingError),

    /// Cart assembly error.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Product id not in the catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Catalog source error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Order store error.
    #[error("Order store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Order(e) => e.kind(),
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::ConflictingTransition { .. } => ErrorKind::ConflictingTransition,
            EngineError::UnidentifiedActor => ErrorKind::MissingField,
            EngineError::NotChargeable { .. }
            | EngineError::Cart(_)
            | EngineError::UnknownProduct(_) => ErrorKind::Validation,
            EngineError::Billing(_) => ErrorKind::UpstreamBilling,
            EngineError::CodeSpaceExhausted { .. }
            | EngineError::Catalog(_)
            | EngineError::Store(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for engine results.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_becomes_engine_not_found() {
        let id = OrderId::new();
        let err: EngineError = StoreError::NotFound(id).into();
        assert!(matches!(err, EngineError::NotFound(found) if found == id));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_kinds() {
        let conflict = EngineError::ConflictingTransition {
            order_id: OrderId::new(),
            expected: OrderStatus::Pronto,
            actual: OrderStatus::Entregue,
        };
        assert_eq!(conflict.kind(), ErrorKind::ConflictingTransition);
        assert_eq!(
            EngineError::from(OrderError::MissingCourier).kind(),
            ErrorKind::MissingField
        );
        assert_eq!(
            EngineError::from(BillingError::Unavailable("timeout".into())).kind(),
            ErrorKind::UpstreamBilling
        );
        assert_eq!(
            EngineError::CodeSpaceExhausted { attempts: 8 }.kind(),
            ErrorKind::Internal
        );
    }
}
