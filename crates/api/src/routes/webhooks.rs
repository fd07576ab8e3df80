//! Billing provider callbacks.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use engine::{EngineError, PaymentNotice};
use order_store::OrderStore;

use crate::dto::OrderResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /webhooks/billing: record a payment status reported by the provider.
///
/// Only payment fields change; the order's lifecycle status is left alone.
#[tracing::instrument(skip(state, notice), fields(order_id = %notice.order_id, status = %notice.status))]
pub async fn billing<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(notice): Json<PaymentNotice>,
) -> Result<Json<OrderResponse>, ApiError> {
    let result = state.engine.ingest_payment_status(notice).await;

    let outcome = match &result {
        Ok(_) => "applied",
        Err(EngineError::NotFound(_)) => "unknown_order",
        Err(_) => "failed",
    };
    metrics::counter!("billing_webhooks_total", "outcome" => outcome).increment(1);

    let order = result?;
    Ok(Json(OrderResponse::from(&order)))
}
