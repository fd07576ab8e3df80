//! Kitchen display and cashier views.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use order_store::OrderStore;

use crate::dto::{KitchenQueueResponse, PaymentDueResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /queue: active orders in their four status columns.
#[tracing::instrument(skip(state))]
pub async fn kitchen<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<KitchenQueueResponse>, ApiError> {
    state.refresh_views().await?;
    let queue = state.kitchen_queue.snapshot().await;
    Ok(Json(KitchenQueueResponse::from(&queue)))
}

/// GET /queue/payment-due: ready orders still waiting for payment.
#[tracing::instrument(skip(state))]
pub async fn payment_due<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<PaymentDueResponse>, ApiError> {
    state.refresh_views().await?;
    let entries = state.payment_due.entries().await;
    Ok(Json(PaymentDueResponse::new(&entries)))
}
