//! Order placement, lookup, lifecycle and payment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use domain::{OrderCode, OrderStatus, PlaceOrder, ServiceType, TransitionRequest};
use order_store::{OrderQuery, OrderStore};
use projections::TrackingView;
use serde::Deserialize;

use super::parse_order_id;
use crate::dto::{OrderCreatedResponse, OrderResponse, PaymentCollectionResponse, PlaceOrderRequest};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<OrderStatus>,
    pub service_type: Option<ServiceType>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<ListParams> for OrderQuery {
    fn from(params: ListParams) -> Self {
        OrderQuery {
            status: params.status,
            service_type: params.service_type,
            limit: params.limit,
            offset: params.offset,
            ..OrderQuery::default()
        }
    }
}

/// POST /orders: place an order and, for PIX or card, request a charge.
///
/// A billing failure does not fail placement; it is reported in `billing_error`.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let placed = state.engine.place_order(PlaceOrder::try_from(req)?).await?;

    let response = OrderCreatedResponse {
        id: placed.order.id,
        code: placed.order.code.clone(),
        status: placed.order.status,
        charge: placed.order.charge.clone(),
        billing_error: placed.billing_error.map(|e| e.to_string()),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /orders: list orders in arrival order.
#[tracing::instrument(skip(state))]
pub async fn list<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.engine.list(params.into()).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.engine.get(parse_order_id(&id)?).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// PATCH /orders/{id}/status: move an order along its lifecycle.
#[tracing::instrument(skip(state, req), fields(to = %req.to))]
pub async fn transition<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.engine.transition(parse_order_id(&id)?, req).await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /orders/track/{code}: customer tracking page data.
#[tracing::instrument(skip(state))]
pub async fn track<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(code): Path<String>,
) -> Result<Json<TrackingView>, ApiError> {
    let code = OrderCode::parse(&code)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid order code: {code}")))?;

    let view = state
        .tracking
        .track(state.engine.store().as_ref(), &code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {code} not found")))?;

    Ok(Json(view))
}

/// GET /orders/{id}/payment: what to collect before delivery.
#[tracing::instrument(skip(state))]
pub async fn payment<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentCollectionResponse>, ApiError> {
    let collection = state.engine.payment_collection(parse_order_id(&id)?).await?;
    Ok(Json(collection.into()))
}

/// POST /orders/{id}/charge: issue the provider charge if the order has none.
#[tracing::instrument(skip(state))]
pub async fn charge<S: OrderStore + ?Sized + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.engine.charge_order(parse_order_id(&id)?).await?;
    Ok(Json(OrderResponse::from(&order)))
}
