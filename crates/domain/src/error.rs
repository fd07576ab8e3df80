//! Error classification shared by every layer.

use serde::{Deserialize, Serialize};

/// Classification of an error, independent of the layer that raised it.
///
/// Terminals use it to pick the UI to render: a validation message, the
/// current status, a re-fetch, or the payment-collection flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input; nothing was written.
    Validation,
    /// Validation failure caused by a required transition field.
    MissingField,
    /// The status change is not in the lifecycle table.
    InvalidTransition,
    /// Another actor moved the order first.
    ConflictingTransition,
    /// Delivery requested on an unpaid order without override.
    PaymentNotConfirmed,
    /// The billing provider call failed.
    UpstreamBilling,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation | ErrorKind::MissingField => "validation",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::ConflictingTransition => "conflicting_transition",
            ErrorKind::PaymentNotConfirmed => "payment_not_confirmed",
            ErrorKind::UpstreamBilling => "upstream_billing",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
