//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{ErrorKind, OrderError};
use engine::EngineError;
use projections::ProjectionError;
use serde_json::{Map, Value, json};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Engine operation error, mapped by its [`ErrorKind`].
    Engine(EngineError),
    /// Read-side failure.
    Projection(ProjectionError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::BadRequest(_) => ErrorKind::Validation,
            ApiError::Engine(err) => err.kind(),
            ApiError::Projection(_) => ErrorKind::Internal,
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::MissingField => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::InvalidTransition | ErrorKind::ConflictingTransition => StatusCode::CONFLICT,
        ErrorKind::PaymentNotConfirmed => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::UpstreamBilling => StatusCode::BAD_GATEWAY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Extra body fields a terminal needs to recover from the error.
fn details(err: &EngineError) -> Map<String, Value> {
    let mut details = Map::new();
    match err {
        EngineError::Order(OrderError::InvalidTransition { from, to }) => {
            details.insert("current_status".into(), json!(from));
            details.insert("requested_status".into(), json!(to));
        }
        EngineError::Order(OrderError::PaymentNotConfirmed {
            amount_due,
            billing_type,
        }) => {
            details.insert("amount_due".into(), json!(amount_due.to_decimal()));
            details.insert("billing_type".into(), json!(billing_type));
        }
        EngineError::ConflictingTransition {
            expected, actual, ..
        } => {
            details.insert("current_status".into(), json!(actual));
            details.insert("expected_status".into(), json!(expected));
        }
        _ => {}
    }
    details
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        let (message, mut body) = match &self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => (msg.clone(), Map::new()),
            ApiError::Engine(err) => (err.to_string(), details(err)),
            ApiError::Projection(err) => (err.to_string(), Map::new()),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %message, "internal server error");
        }

        body.insert("error".into(), Value::String(message));
        body.insert("kind".into(), Value::String(kind.as_str().to_string()));
        (status, axum::Json(Value::Object(body))).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        ApiError::Projection(err)
    }
}
