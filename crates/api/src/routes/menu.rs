//! Menu and cart quote endpoints, served from the catalog cache.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use engine::{EngineError, QuoteRequest};
use order_store::OrderStore;

use crate::dto::{CartQuoteRequest, CartQuoteResponse, MenuResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /menu
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<MenuResponse>, ApiError> {
    let catalog = state.catalog.get().await.map_err(EngineError::from)?;
    Ok(Json(MenuResponse::from(catalog.as_ref())))
}

/// POST /menu/invalidate: drop the cached menu so the next read reloads it.
#[tracing::instrument(skip(state))]
pub async fn invalidate<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> StatusCode {
    state.catalog.invalidate().await;
    tracing::info!("menu cache invalidated");
    StatusCode::NO_CONTENT
}

/// POST /cart/quote: price a cart and return items ready for `POST /orders`.
#[tracing::instrument(skip(state, req))]
pub async fn quote<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CartQuoteRequest>,
) -> Result<Json<CartQuoteResponse>, ApiError> {
    let catalog = state.catalog.get().await.map_err(EngineError::from)?;
    let quote = engine::quote(&catalog, &QuoteRequest::try_from(req)?)?;
    Ok(Json(CartQuoteResponse::from(&quote)))
}
