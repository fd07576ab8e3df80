//! Billing provider trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderId;
use domain::{BillingType, ChargeReference, CustomerInfo, Money, OrderCode};
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors reported by the billing provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BillingError {
    /// The provider refused the charge.
    #[error("Charge rejected: {0}")]
    Rejected(String),

    /// The provider could not be reached or timed out.
    #[error("Billing provider unavailable: {0}")]
    Unavailable(String),

    /// The provider issued the charge but it could not be stored on the order.
    #[error("Charge {charge_id} issued but not recorded: {reason}")]
    NotRecorded { charge_id: String, reason: String },
}

/// What the provider needs to issue a charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub order_id: OrderId,
    pub code: OrderCode,
    pub amount: Money,
    pub billing_type: BillingType,
    pub customer: Option<CustomerInfo>,
}

impl ChargeRequest {
    pub fn description(&self) -> String {
        format!("Pedido {}", self.code)
    }
}

/// Trait for issuing charges with an external payment provider.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Issues a charge and returns the provider's reference to it.
    async fn create_charge(&self, request: ChargeRequest) -> Result<ChargeReference, BillingError>;
}

#[derive(Debug, Default)]
struct InMemoryBillingState {
    charges: HashMap<String, ChargeRequest>,
    next_id: u32,
    fail_with: Option<BillingError>,
}

/// In-memory billing provider for tests and local runs.
///
/// PIX charges carry a copy-paste QR payload; card charges only an invoice URL.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBillingProvider {
    state: Arc<Mutex<InMemoryBillingState>>,
}

impl InMemoryBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following charge fail with `error` (or succeed again on `None`).
    pub async fn fail_with(&self, error: Option<BillingError>) {
        self.state.lock().await.fail_with = error;
    }

    pub async fn charge_count(&self) -> usize {
        self.state.lock().await.charges.len()
    }

    pub async fn charge(&self, charge_id: &str) -> Option<ChargeRequest> {
        self.state.lock().await.charges.get(charge_id).cloned()
    }
}

#[async_trait]
impl BillingProvider for InMemoryBillingProvider {
    async fn create_charge(&self, request: ChargeRequest) -> Result<ChargeReference, BillingError> {
        let mut state = self.state.lock().await;

        if let Some(error) = &state.fail_with {
            return Err(error.clone());
        }
        if !request.billing_type.is_provider_charged() {
            return Err(BillingError::Rejected(format!(
                "{} is settled in person",
                request.billing_type
            )));
        }

        state.next_id += 1;
        let charge_id = format!("pay_{:06}", state.next_id);
        let qr_payload = (request.billing_type == BillingType::Pix).then(|| {
            format!(
                "00020126580014br.gov.bcb.pix0136{}5204000053039865406{}5802BR",
                request.order_id,
                request.amount.to_decimal()
            )
        });

        let reference = ChargeReference {
            charge_id: charge_id.clone(),
            invoice_url: Some(format!("https://billing.local/i/{charge_id}")),
            qr_payload,
            qr_image: None,
        };
        state.charges.insert(charge_id, request);

        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(billing_type: BillingType) -> ChargeRequest {
        ChargeRequest {
            order_id: OrderId::new(),
            code: OrderCode::new('A', 123),
            amount: Money::from_cents(5000),
            billing_type,
            customer: None,
        }
    }

    #[tokio::test]
    async fn test_pix_charge_carries_qr_payload() {
        let provider = InMemoryBillingProvider::new();
        let charge = provider.create_charge(request(BillingType::Pix)).await.unwrap();

        assert_eq!(charge.charge_id, "pay_000001");
        assert!(charge.qr_payload.unwrap().contains("br.gov.bcb.pix"));
        assert_eq!(provider.charge_count().await, 1);
        assert_eq!(
            provider.charge("pay_000001").await.unwrap().description(),
            "Pedido A123"
        );
    }

    #[tokio::test]
    async fn test_card_charge_has_no_qr() {
        let provider = InMemoryBillingProvider::new();
        let charge = provider
            .create_charge(request(BillingType::CreditCard))
            .await
            .unwrap();
        assert!(charge.qr_payload.is_none());
        assert!(charge.invoice_url.is_some());
    }

    #[tokio::test]
    async fn test_cash_is_not_charged() {
        let provider = InMemoryBillingProvider::new();
        let result = provider.create_charge(request(BillingType::Dinheiro)).await;
        assert!(matches!(result, Err(BillingError::Rejected(_))));
        assert_eq!(provider.charge_count().await, 0);
    }

    #[tokio::test]
    async fn test_configured_failure() {
        let provider = InMemoryBillingProvider::new();
        provider
            .fail_with(Some(BillingError::Unavailable("timeout".into())))
            .await;
        let result = provider.create_charge(request(BillingType::Pix)).await;
        assert_eq!(result, Err(BillingError::Unavailable("timeout".into())));

        provider.fail_with(None).await;
        assert!(provider.create_charge(request(BillingType::Pix)).await.is_ok());
    }
}
