//! Wire shapes for the HTTP surface.
//!
//! Amounts travel as decimals (`25.0`) and are converted to and from
//! [`Money`] here, rounding to the nearest cent.

use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{
    Actor, BillingType, ChargeReference, ChoiceGroup, ChoiceOption, CustomerInfo, Discount, Money,
    Order, OrderCode, OrderItem, OrderStatus, PaymentStatus, PlaceOrder, Product, ServiceType,
};
use engine::{CartQuote, Catalog, PaymentCollection, QuoteLine, QuoteRequest};
use order_store::{AuditAction, AuditRecord};
use projections::{KitchenQueue, PaymentBadge, PaymentDueEntry, QueueCard};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

fn decimal(money: Money) -> f64 {
    money.to_decimal()
}

fn money(field: &str, amount: f64) -> Result<Money, ApiError> {
    Money::from_decimal(amount).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid {field}: amounts must be finite and at most {}",
            Money::MAX
        ))
    })
}

fn optional_money(field: &str, amount: Option<f64>) -> Result<Option<Money>, ApiError> {
    amount.map(|amount| money(field, amount)).transpose()
}

fn order_items(items: Vec<OrderItemRequest>) -> Result<Vec<OrderItem>, ApiError> {
    items.into_iter().map(OrderItem::try_from).collect()
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub total_price: Option<f64>,
}

impl TryFrom<OrderItemRequest> for OrderItem {
    type Error = ApiError;

    fn try_from(req: OrderItemRequest) -> Result<Self, ApiError> {
        Ok(OrderItem {
            product_name: req.product_name,
            quantity: req.quantity,
            notes: req.notes,
            price: optional_money("price", req.price)?,
            total_price: optional_money("total_price", req.total_price)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub service_type: ServiceType,
    #[serde(default)]
    pub source: String,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub billing_type: Option<BillingType>,
    #[serde(default)]
    pub total: Option<f64>,
}

impl TryFrom<PlaceOrderRequest> for PlaceOrder {
    type Error = ApiError;

    fn try_from(req: PlaceOrderRequest) -> Result<Self, ApiError> {
        Ok(PlaceOrder {
            service_type: req.service_type,
            source: req.source,
            items: order_items(req.items)?,
            customer: req.customer,
            billing_type: req.billing_type,
            total: optional_money("total", req.total)?,
        })
    }
}

/// Replacement record for an administrative override.
///
/// Fields left out are cleared; `id`, `code` and `created_at` always come
/// from the stored order.
#[derive(Debug, Deserialize)]
pub struct OrderReplacement {
    pub status: OrderStatus,
    pub service_type: ServiceType,
    #[serde(default)]
    pub source: String,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub billing_type: Option<BillingType>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub motoboy_name: Option<String>,
    #[serde(default)]
    pub motoboy_phone: Option<String>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
}

impl OrderReplacement {
    /// Overlays the replacement onto the stored order.
    pub fn into_order(self, current: &Order) -> Result<Order, ApiError> {
        Ok(Order {
            status: self.status,
            service_type: self.service_type,
            source: self.source,
            customer: self.customer,
            items: order_items(self.items)?,
            payment_status: self.payment_status,
            billing_type: self.billing_type,
            total: optional_money("total", self.total)?,
            motoboy_name: self.motoboy_name,
            motoboy_phone: self.motoboy_phone,
            cancel_reason: self.cancel_reason,
            ..current.clone()
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminReplaceRequest {
    pub actor: Actor,
    #[serde(default)]
    pub reason: Option<String>,
    pub order: OrderReplacement,
}

#[derive(Debug, Deserialize)]
pub struct AdminDeleteRequest {
    pub actor: Actor,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DiscountRequest {
    Percent(f64),
    Fixed(f64),
}

impl TryFrom<DiscountRequest> for Discount {
    type Error = ApiError;

    fn try_from(req: DiscountRequest) -> Result<Self, ApiError> {
        match req {
            DiscountRequest::Percent(percent) if percent.is_finite() => {
                Ok(Discount::Percent(percent))
            }
            DiscountRequest::Percent(_) => {
                Err(ApiError::BadRequest("Invalid discount percentage".to_string()))
            }
            DiscountRequest::Fixed(amount) => Ok(Discount::Fixed(money("discount", amount)?)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CartQuoteRequest {
    pub lines: Vec<QuoteLine>,
    #[serde(default)]
    pub discount: Option<DiscountRequest>,
}

impl TryFrom<CartQuoteRequest> for QuoteRequest {
    type Error = ApiError;

    fn try_from(req: CartQuoteRequest) -> Result<Self, ApiError> {
        Ok(QuoteRequest {
            lines: req.lines,
            discount: req.discount.map(Discount::try_from).transpose()?,
        })
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_name: String,
    pub quantity: u32,
    pub notes: Option<String>,
    pub price: Option<f64>,
    pub total_price: Option<f64>,
    pub line_total: f64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            notes: item.notes.clone(),
            price: item.price.map(decimal),
            total_price: item.total_price.map(decimal),
            line_total: decimal(domain::line_total(item)),
        }
    }
}

fn items(items: &[OrderItem]) -> Vec<OrderItemResponse> {
    items.iter().map(OrderItemResponse::from).collect()
}

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    /// Provider charge, when one was issued at placement.
    pub charge: Option<ChargeReference>,
    /// Why no charge was issued, when the provider refused or failed.
    pub billing_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    pub service_type: ServiceType,
    pub source: String,
    pub customer: Option<CustomerInfo>,
    pub items: Vec<OrderItemResponse>,
    pub total: Option<f64>,
    pub amount_due: f64,
    pub billing_type: Option<BillingType>,
    pub payment_status: Option<PaymentStatus>,
    pub paid: bool,
    pub charge: Option<ChargeReference>,
    pub motoboy_name: Option<String>,
    pub motoboy_phone: Option<String>,
    pub delivered_by_id: Option<String>,
    pub delivered_by_name: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub payment_confirmed_by_id: Option<String>,
    pub payment_confirmed_by_name: Option<String>,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            code: order.code.clone(),
            status: order.status,
            service_type: order.service_type,
            source: order.source.clone(),
            customer: order.customer.clone(),
            items: items(&order.items),
            total: order.total.map(decimal),
            amount_due: decimal(order.amount_due()),
            billing_type: order.billing_type,
            payment_status: order.payment_status.clone(),
            paid: order.is_paid(),
            charge: order.charge.clone(),
            motoboy_name: order.motoboy_name.clone(),
            motoboy_phone: order.motoboy_phone.clone(),
            delivered_by_id: order.delivered_by_id.clone(),
            delivered_by_name: order.delivered_by_name.clone(),
            delivered_at: order.delivered_at,
            payment_confirmed_by_id: order.payment_confirmed_by_id.clone(),
            payment_confirmed_by_name: order.payment_confirmed_by_name.clone(),
            payment_confirmed_at: order.payment_confirmed_at,
            cancel_reason: order.cancel_reason.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentCollectionResponse {
    pub order_id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    pub amount_due: f64,
    pub billing_type: Option<BillingType>,
    pub paid: bool,
    pub payment_status: Option<PaymentStatus>,
    pub charge_id: Option<String>,
    pub qr_payload: Option<String>,
    pub invoice_url: Option<String>,
}

impl From<PaymentCollection> for PaymentCollectionResponse {
    fn from(c: PaymentCollection) -> Self {
        Self {
            order_id: c.order_id,
            code: c.code,
            status: c.status,
            amount_due: decimal(c.amount_due),
            billing_type: c.billing_type,
            paid: c.paid,
            payment_status: c.payment_status,
            charge_id: c.charge_id,
            qr_payload: c.qr_payload,
            invoice_url: c.invoice_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueueCardResponse {
    pub order_id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    pub service_type: ServiceType,
    pub items: Vec<OrderItemResponse>,
    pub amount_due: f64,
    pub billing_type: Option<BillingType>,
    pub payment_badge: Option<PaymentBadge>,
    pub motoboy_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&QueueCard> for QueueCardResponse {
    fn from(card: &QueueCard) -> Self {
        Self {
            order_id: card.order_id,
            code: card.code.clone(),
            status: card.status,
            service_type: card.service_type,
            items: items(&card.items),
            amount_due: decimal(card.amount_due),
            billing_type: card.billing_type,
            payment_badge: card.payment_badge,
            motoboy_name: card.motoboy_name.clone(),
            created_at: card.created_at,
        }
    }
}

fn cards(column: &[QueueCard]) -> Vec<QueueCardResponse> {
    column.iter().map(QueueCardResponse::from).collect()
}

/// Kitchen display columns, keyed by status name.
#[derive(Debug, Serialize)]
pub struct KitchenQueueResponse {
    #[serde(rename = "PENDENTE")]
    pub pendente: Vec<QueueCardResponse>,
    #[serde(rename = "EM_PREPARO")]
    pub em_preparo: Vec<QueueCardResponse>,
    #[serde(rename = "PRONTO")]
    pub pronto: Vec<QueueCardResponse>,
    #[serde(rename = "SAIU_ENTREGA")]
    pub saiu_entrega: Vec<QueueCardResponse>,
}

impl From<&KitchenQueue> for KitchenQueueResponse {
    fn from(queue: &KitchenQueue) -> Self {
        Self {
            pendente: cards(&queue.pendente),
            em_preparo: cards(&queue.em_preparo),
            pronto: cards(&queue.pronto),
            saiu_entrega: cards(&queue.saiu_entrega),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentDueEntryResponse {
    pub order_id: OrderId,
    pub code: OrderCode,
    pub status: OrderStatus,
    pub service_type: ServiceType,
    pub amount_due: f64,
    pub billing_type: Option<BillingType>,
    pub qr_payload: Option<String>,
    pub invoice_url: Option<String>,
}

impl From<&PaymentDueEntry> for PaymentDueEntryResponse {
    fn from(entry: &PaymentDueEntry) -> Self {
        Self {
            order_id: entry.order_id,
            code: entry.code.clone(),
            status: entry.status,
            service_type: entry.service_type,
            amount_due: decimal(entry.amount_due),
            billing_type: entry.billing_type,
            qr_payload: entry.qr_payload.clone(),
            invoice_url: entry.invoice_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentDueResponse {
    pub entries: Vec<PaymentDueEntryResponse>,
    pub total_due: f64,
}

impl PaymentDueResponse {
    pub fn new(entries: &[PaymentDueEntry]) -> Self {
        Self {
            entries: entries.iter().map(PaymentDueEntryResponse::from).collect(),
            total_due: decimal(entries.iter().map(|e| e.amount_due).sum()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CartQuoteResponse {
    pub items: Vec<OrderItemResponse>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
}

impl From<&CartQuote> for CartQuoteResponse {
    fn from(quote: &CartQuote) -> Self {
        Self {
            items: items(&quote.items),
            subtotal: decimal(quote.subtotal),
            discount: decimal(quote.discount),
            total: decimal(quote.total),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChoiceOptionResponse {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl From<&ChoiceOption> for ChoiceOptionResponse {
    fn from(option: &ChoiceOption) -> Self {
        Self {
            id: option.id.clone(),
            name: option.name.clone(),
            price: decimal(option.price),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChoiceGroupResponse {
    pub id: String,
    pub name: String,
    pub min: u32,
    pub max: u32,
    pub options: Vec<ChoiceOptionResponse>,
}

impl From<&ChoiceGroup> for ChoiceGroupResponse {
    fn from(group: &ChoiceGroup) -> Self {
        Self {
            id: group.id.clone(),
            name: group.name.clone(),
            min: group.min,
            max: group.max,
            options: group.options.iter().map(ChoiceOptionResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub promotional_price: Option<f64>,
    pub effective_price: f64,
    pub choice_groups: Vec<ChoiceGroupResponse>,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: decimal(product.price),
            promotional_price: product.promotional_price.map(decimal),
            effective_price: decimal(product.effective_price()),
            choice_groups: product
                .choice_groups
                .iter()
                .map(ChoiceGroupResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub products: Vec<ProductResponse>,
}

impl From<&Catalog> for MenuResponse {
    fn from(catalog: &Catalog) -> Self {
        Self {
            products: catalog.products.iter().map(ProductResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditRecordResponse {
    pub order_id: OrderId,
    pub action: AuditAction,
    pub actor: Actor,
    pub reason: Option<String>,
    pub before: Option<OrderResponse>,
    pub after: Option<OrderResponse>,
    pub recorded_at: DateTime<Utc>,
}

impl From<&AuditRecord> for AuditRecordResponse {
    fn from(record: &AuditRecord) -> Self {
        Self {
            order_id: record.order_id,
            action: record.action,
            actor: record.actor.clone(),
            reason: record.reason.clone(),
            before: record.before.as_ref().map(OrderResponse::from),
            after: record.after.as_ref().map(OrderResponse::from),
            recorded_at: record.recorded_at,
        }
    }
}
