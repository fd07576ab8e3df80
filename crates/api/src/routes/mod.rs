//! HTTP route handlers, one module per resource.

pub mod admin;
pub mod health;
pub mod menu;
pub mod metrics;
pub mod orders;
pub mod queue;
pub mod webhooks;

use common::OrderId;

use crate::error::ApiError;

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
