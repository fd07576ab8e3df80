//! Shared application state.

use std::sync::Arc;

use engine::{CatalogCache, InMemoryBillingProvider, OrderEngine, StaticCatalog};
use order_store::OrderStore;
use projections::{KitchenQueueView, PaymentDueView, ProjectionProcessor, TrackingProjector};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore + ?Sized> {
    pub engine: OrderEngine<S, InMemoryBillingProvider>,
    pub kitchen_queue: KitchenQueueView,
    pub payment_due: PaymentDueView,
    pub tracking: TrackingProjector,
    pub catalog: CatalogCache<StaticCatalog>,
    pub projection_processor: Arc<ProjectionProcessor<S>>,
}

impl<S: OrderStore + ?Sized + 'static> AppState<S> {
    /// Brings the queue views up to date before a read.
    ///
    /// The background processor normally has them current already; this
    /// gives a terminal its own writes back on the next request.
    pub async fn refresh_views(&self) -> Result<(), ApiError> {
        self.projection_processor.refresh_all().await?;
        Ok(())
    }
}
