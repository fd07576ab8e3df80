//! Order commands: checkout placement and status transition requests.

use serde::{Deserialize, Serialize};

use super::{Actor, BillingType, Courier, CustomerInfo, Money, OrderError, OrderItem, OrderStatus, ServiceType};

/// Command to place a new order (PDV, self-service or API checkout).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub service_type: ServiceType,

    /// Free-text origin tag (PDV, self-service, auto-checkout, ...).
    #[serde(default)]
    pub source: String,

    pub items: Vec<OrderItem>,

    #[serde(default)]
    pub customer: Option<CustomerInfo>,

    #[serde(default)]
    pub billing_type: Option<BillingType>,

    /// Precomputed total; derived from the items when absent.
    #[serde(default)]
    pub total: Option<Money>,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(service_type: ServiceType, items: Vec<OrderItem>) -> Self {
        Self {
            service_type,
            source: String::new(),
            items,
            customer: None,
            billing_type: None,
            total: None,
        }
    }

    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn billed_as(mut self, billing_type: BillingType) -> Self {
        self.billing_type = Some(billing_type);
        self
    }

    pub fn for_customer(mut self, customer: CustomerInfo) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total = Some(total);
        self
    }

    /// Validates and normalises the command.
    ///
    /// Rejects the whole command on the first invalid item; nothing is
    /// partially accepted.
    pub fn validated(mut self) -> Result<PlaceOrder, OrderError> {
        self.items = validate_items(&self.items)?;
        self.source = self.source.trim().to_string();
        validate_total(self.total)?;
        Ok(self)
    }
}

/// Checks a precomputed order total: not negative, not above [`Money::MAX`].
pub fn validate_total(total: Option<Money>) -> Result<(), OrderError> {
    let Some(total) = total else {
        return Ok(());
    };
    if total.is_negative() {
        return Err(OrderError::InvalidPrice {
            index: None,
            cents: total.cents(),
        });
    }
    if total > Money::MAX {
        return Err(OrderError::AmountTooLarge {
            index: None,
            limit: Money::MAX,
        });
    }
    Ok(())
}

/// Line total of an already sign-checked item, bounded by [`Money::MAX`].
fn bounded_line_total(index: usize, item: &OrderItem) -> Result<Money, OrderError> {
    let total = match item.total_price {
        Some(total) => Some(total),
        None => item
            .price
            .unwrap_or_default()
            .checked_multiply(item.quantity),
    };
    total
        .filter(|total| *total <= Money::MAX)
        .ok_or(OrderError::AmountTooLarge {
            index: Some(index),
            limit: Money::MAX,
        })
}

/// Validates order items and returns their normalised form.
///
/// Names and notes are trimmed; blank notes are dropped. Each line total
/// and their sum must stay within [`Money::MAX`], so totals computed from
/// accepted items never overflow.
pub fn validate_items(items: &[OrderItem]) -> Result<Vec<OrderItem>, OrderError> {
    if items.is_empty() {
        return Err(OrderError::NoItems);
    }

    let mut order_total = Money::zero();
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let product_name = item.product_name.trim();
            if product_name.is_empty() {
                return Err(OrderError::MissingProductName { index });
            }
            if item.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    index,
                    quantity: item.quantity,
                });
            }
            for amount in [item.price, item.total_price].into_iter().flatten() {
                if amount.is_negative() {
                    return Err(OrderError::InvalidPrice {
                        index: Some(index),
                        cents: amount.cents(),
                    });
                }
            }
            order_total = order_total
                .checked_add(bounded_line_total(index, item)?)
                .filter(|total| *total <= Money::MAX)
                .ok_or(OrderError::AmountTooLarge {
                    index: None,
                    limit: Money::MAX,
                })?;

            Ok(OrderItem {
                product_name: product_name.to_string(),
                quantity: item.quantity,
                notes: item
                    .notes
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from),
                price: item.price,
                total_price: item.total_price,
            })
        })
        .collect()
}

/// Request to move an order to another status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransitionRequest {
    /// Target status.
    pub to: OrderStatus,

    /// Status the requesting terminal last observed. When set, the request
    /// is rejected as a conflict if the order has moved since.
    #[serde(default)]
    pub expected_from: Option<OrderStatus>,

    /// Staff member performing the transition. Required for ENTREGUE.
    #[serde(default)]
    pub actor: Option<Actor>,

    /// Courier assignment. Required for SAIU_ENTREGA.
    #[serde(default)]
    pub courier: Option<Courier>,

    /// Operator confirms having collected payment in person.
    #[serde(default)]
    pub confirm_payment: bool,

    /// Reason recorded on cancellation.
    #[serde(default)]
    pub reason: Option<String>,
}

impl TransitionRequest {
    /// Creates a request targeting `to`.
    pub fn to(to: OrderStatus) -> Self {
        Self {
            to,
            ..Self::default()
        }
    }

    pub fn expecting(mut self, from: OrderStatus) -> Self {
        self.expected_from = Some(from);
        self
    }

    pub fn by(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_courier(mut self, name: impl Into<String>, phone: impl Into<String>) -> Self {
        self.courier = Some(Courier::new(name, phone));
        self
    }

    pub fn confirming_payment(mut self) -> Self {
        self.confirm_payment = true;
        self
    }

    pub fn because(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_items() {
        let result = validate_items(&[]);
        assert!(matches!(result, Err(OrderError::NoItems)));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let items = vec![
            OrderItem::new("X-Burger", 1, Money::from_cents(2500)),
            OrderItem::new("   ", 1, Money::from_cents(500)),
        ];
        let result = validate_items(&items);
        assert!(matches!(
            result,
            Err(OrderError::MissingProductName { index: 1 })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_quantity() {
        let items = vec![OrderItem::new("Suco", 0, Money::from_cents(800))];
        assert!(matches!(
            validate_items(&items),
            Err(OrderError::InvalidQuantity { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let items = vec![OrderItem::new("Suco", 1, Money::from_cents(-800))];
        assert!(matches!(
            validate_items(&items),
            Err(OrderError::InvalidPrice { index: Some(0), .. })
        ));
    }

    #[test]
    fn test_validate_rejects_line_total_overflow() {
        let items = vec![OrderItem::new("X-Burger", 2, Money::from_cents(5_000_000_000_000_000_000))];
        assert!(matches!(
            validate_items(&items),
            Err(OrderError::AmountTooLarge { index: Some(0), .. })
        ));

        let cmd = PlaceOrder::new(ServiceType::Balcao, items);
        let err = cmd.validated().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
    }

    #[test]
    fn test_validate_rejects_order_total_above_limit() {
        let items = vec![
            OrderItem::new("Banquete", 1, Money::MAX),
            OrderItem::new("Suco", 1, Money::from_cents(800)),
        ];
        assert!(matches!(
            validate_items(&items),
            Err(OrderError::AmountTooLarge { index: None, .. })
        ));

        let preset = OrderItem::new("Combo", 1, Money::zero())
            .with_total_price(Money::from_cents(Money::MAX.cents() + 1));
        assert!(matches!(
            validate_items(&[preset]),
            Err(OrderError::AmountTooLarge { index: Some(0), .. })
        ));
    }

    #[test]
    fn test_accepted_items_total_without_overflow() {
        let items = vec![OrderItem::new("Banquete", 4, Money::from_cents(Money::MAX.cents() / 4))];
        let normalized = validate_items(&items).unwrap();
        assert_eq!(
            crate::pricing::compute_order_total(&normalized),
            Money::from_cents(Money::MAX.cents() / 4 * 4)
        );
    }

    #[test]
    fn test_place_order_rejects_total_above_limit() {
        let cmd = PlaceOrder::new(
            ServiceType::Balcao,
            vec![OrderItem::new("Suco", 1, Money::from_cents(800))],
        )
        .with_total(Money::from_cents(i64::MAX));
        assert!(matches!(
            cmd.validated(),
            Err(OrderError::AmountTooLarge { index: None, .. })
        ));
    }

    #[test]
    fn test_validate_normalizes() {
        let items = vec![OrderItem::new("  X-Salada ", 2, Money::from_cents(2200)).with_notes("  ")];
        let normalized = validate_items(&items).unwrap();
        assert_eq!(normalized[0].product_name, "X-Salada");
        assert_eq!(normalized[0].notes, None);
    }

    #[test]
    fn test_place_order_rejects_negative_total() {
        let cmd = PlaceOrder::new(
            ServiceType::Balcao,
            vec![OrderItem::new("Suco", 1, Money::from_cents(800))],
        )
        .with_total(Money::from_cents(-1));
        assert!(matches!(
            cmd.validated(),
            Err(OrderError::InvalidPrice { index: None, .. })
        ));
    }

    #[test]
    fn test_transition_request_builder() {
        let req = TransitionRequest::to(OrderStatus::SaiuEntrega)
            .expecting(OrderStatus::Pronto)
            .with_courier("Carlos", "11999990000");
        assert_eq!(req.to, OrderStatus::SaiuEntrega);
        assert_eq!(req.expected_from, Some(OrderStatus::Pronto));
        assert_eq!(req.courier.unwrap().name, "Carlos");
        assert!(!req.confirm_payment);
    }

    #[test]
    fn test_transition_request_deserializes_with_defaults() {
        let req: TransitionRequest = serde_json::from_str(r#"{"to":"EM_PREPARO"}"#).unwrap();
        assert_eq!(req.to, OrderStatus::EmPreparo);
        assert!(req.actor.is_none());
        assert!(req.expected_from.is_none());
    }
}
