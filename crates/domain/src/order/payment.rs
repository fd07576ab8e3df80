//! Billing reconciliation: the single boundary where provider payment
//! statuses become the engine's paid/unpaid determination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChargeReference, Order};

/// Provider statuses that mean the money was collected.
const PAID_SYNONYMS: [&str; 4] = ["PAYMENT_RECEIVED", "PAGO", "RECEIVED", "CONFIRMED"];

/// Normalised payment status.
///
/// Persisted as a string: `Paid` is written as `PAYMENT_RECEIVED`, other
/// values keep the provider's (upper-cased) name. Reading goes through
/// [`PaymentStatus::parse`], so legacy synonyms still read back as `Paid`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    /// Charge issued, money not received yet.
    Pending,
    /// Money received (any provider synonym).
    Paid,
    /// Any other provider status (overdue, refunded, ...).
    Other(String),
}

impl PaymentStatus {
    /// Normalises a raw provider status. Blank input means "no status".
    pub fn parse(raw: &str) -> Option<PaymentStatus> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return None;
        }
        Some(Self::from_normalized(normalized))
    }

    fn from_normalized(normalized: String) -> PaymentStatus {
        if PAID_SYNONYMS.contains(&normalized.as_str()) {
            PaymentStatus::Paid
        } else if normalized == "PENDING" {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Other(normalized)
        }
    }

    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAYMENT_RECEIVED",
            PaymentStatus::Other(s) => s,
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(raw: String) -> Self {
        Self::from_normalized(raw.trim().to_ascii_uppercase())
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns true if a raw provider status means the order is paid.
pub fn is_paid_status(raw: Option<&str>) -> bool {
    raw.and_then(PaymentStatus::parse)
        .is_some_and(|status| status.is_paid())
}

/// Returns true if the order's payment has been received.
///
/// Gates the ENTREGUE transition.
pub fn is_paid(order: &Order) -> bool {
    order
        .payment_status
        .as_ref()
        .is_some_and(PaymentStatus::is_paid)
}

/// Payment-side update applied outside the status state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingUpdate {
    /// New normalised payment status, if it changed.
    pub payment_status: Option<PaymentStatus>,

    /// Charge issued by the provider, if one was created.
    pub charge: Option<ChargeReference>,

    pub updated_at: DateTime<Utc>,
}

impl BillingUpdate {
    pub fn status(payment_status: PaymentStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            payment_status: Some(payment_status),
            charge: None,
            updated_at,
        }
    }

    pub fn charge(charge: ChargeReference, updated_at: DateTime<Utc>) -> Self {
        Self {
            payment_status: Some(PaymentStatus::Pending),
            charge: Some(charge),
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_synonyms() {
        assert!(is_paid_status(Some("PAYMENT_RECEIVED")));
        assert!(is_paid_status(Some("pago")));
        assert!(is_paid_status(Some("Pago")));
        assert!(is_paid_status(Some("received")));
        assert!(is_paid_status(Some("CONFIRMED")));
    }

    #[test]
    fn test_unpaid_values() {
        assert!(!is_paid_status(Some("PENDING")));
        assert!(!is_paid_status(None));
        assert!(!is_paid_status(Some("")));
        assert!(!is_paid_status(Some("   ")));
        assert!(!is_paid_status(Some("OVERDUE")));
    }

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(PaymentStatus::parse("pending"), Some(PaymentStatus::Pending));
        assert_eq!(PaymentStatus::parse(" confirmed "), Some(PaymentStatus::Paid));
        assert_eq!(
            PaymentStatus::parse("refunded"),
            Some(PaymentStatus::Other("REFUNDED".to_string()))
        );
        assert_eq!(PaymentStatus::parse(""), None);
    }

    #[test]
    fn test_serialization_uses_canonical_name() {
        let json = serde_json::to_string(&PaymentStatus::Paid).unwrap();
        assert_eq!(json, "\"PAYMENT_RECEIVED\"");

        let legacy: PaymentStatus = serde_json::from_str("\"pago\"").unwrap();
        assert_eq!(legacy, PaymentStatus::Paid);

        let other: PaymentStatus = serde_json::from_str("\"overdue\"").unwrap();
        assert_eq!(other.as_str(), "OVERDUE");
    }
}
