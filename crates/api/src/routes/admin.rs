//! Administrative overrides. Every write leaves an audit record.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use order_store::OrderStore;

use super::parse_order_id;
use crate::dto::{AdminDeleteRequest, AdminReplaceRequest, AuditRecordResponse, OrderResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// PUT /admin/orders/{id}: overwrite the record outside the lifecycle table.
#[tracing::instrument(skip(state, req))]
pub async fn replace<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AdminReplaceRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let id = parse_order_id(&id)?;
    let current = state.engine.get(id).await?;
    let replacement = req.order.into_order(&current)?;

    let order = state
        .engine
        .admin_replace(id, replacement, req.actor, req.reason)
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// DELETE /admin/orders/{id}
#[tracing::instrument(skip(state, req))]
pub async fn delete<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<AdminDeleteRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .engine
        .admin_delete(parse_order_id(&id)?, req.actor, req.reason)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/orders/{id}/audit
#[tracing::instrument(skip(state))]
pub async fn audit<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditRecordResponse>>, ApiError> {
    let records = state.engine.audit_trail(parse_order_id(&id)?).await?;
    Ok(Json(records.iter().map(AuditRecordResponse::from).collect()))
}
