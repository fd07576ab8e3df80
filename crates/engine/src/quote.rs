//! Cart quotes: catalog products plus selections turned into priced order items.

use domain::{Cart, CartLine, Discount, Money, OrderItem, apply_discount};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub group_id: String,
    pub option_id: String,
}

/// One requested cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub selections: Vec<Selection>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteRequest {
    pub lines: Vec<QuoteLine>,
    pub discount: Option<Discount>,
}

/// Priced cart, with items ready to place as an order.
///
/// The discount only changes `total`; `items` keep their undiscounted prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartQuote {
    pub items: Vec<OrderItem>,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

/// Builds and prices a cart against the catalog.
///
/// Fails on the first line with an unknown product or option, or with a
/// required choice group left unselected.
pub fn quote(catalog: &Catalog, request: &QuoteRequest) -> Result<CartQuote> {
    let mut cart = Cart::new();

    for line in &request.lines {
        let product = catalog
            .product(&line.product_id)
            .ok_or_else(|| EngineError::UnknownProduct(line.product_id.clone()))?;

        let mut cart_line = CartLine::new(product.clone(), line.quantity)?;
        for selection in &line.selections {
            cart_line.select(&selection.group_id, &selection.option_id)?;
        }
        if let Some(notes) = &line.notes {
            cart_line = cart_line.with_notes(notes.clone());
        }
        cart.add(cart_line)?;
    }

    let subtotal = cart.subtotal();
    let total = apply_discount(subtotal, request.discount.as_ref());

    Ok(CartQuote {
        items: cart.to_order_items()?,
        subtotal,
        discount: subtotal - total,
        total,
    })
}
