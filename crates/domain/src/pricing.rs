//! Pricing: line totals, order totals and display-only discounts.

use serde::{Deserialize, Serialize};

use crate::order::{Money, OrderItem};

/// Returns the total for one order line.
///
/// A precomputed `total_price` is authoritative; otherwise the line costs
/// `price * quantity`, with a missing price counted as zero.
pub fn line_total(item: &OrderItem) -> Money {
    item.total_price
        .unwrap_or_else(|| item.price.unwrap_or_default().multiply(item.quantity))
}

/// Returns the order total as the sum of its line totals.
pub fn compute_order_total(items: &[OrderItem]) -> Money {
    items.iter().map(line_total).sum()
}

/// Discount offered at settlement. Never persisted on the order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Discount {
    /// Percentage of the subtotal (`10.0` = 10%).
    Percent(f64),
    /// Fixed amount off the subtotal.
    Fixed(Money),
}

/// Applies a discount to a subtotal, never going below zero.
pub fn apply_discount(subtotal: Money, discount: Option<&Discount>) -> Money {
    let off = match discount {
        None => return subtotal,
        Some(Discount::Percent(percent)) => subtotal.percent(*percent),
        Some(Discount::Fixed(amount)) => *amount,
    };
    (subtotal - off).non_negative()
}
