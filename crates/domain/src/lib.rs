//! Domain layer for the restaurant order engine.
//!
//! This crate provides the pure order model:
//! - The `Order` record and its lifecycle state machine
//! - Transition planning with courier, signature and payment rules
//! - Payment status normalisation and the paid predicate
//! - Pricing and cart line assembly
//!
//! Nothing here performs I/O; the store and engine crates persist what
//! this crate plans.

pub mod cart;
pub mod error;
pub mod order;
pub mod pricing;

pub use cart::{Cart, CartError, CartLine, ChoiceGroup, ChoiceOption, Product, SelectOutcome};
pub use error::ErrorKind;
pub use order::{
    Actor, BillingType, BillingUpdate, ChargeReference, Courier, CustomerInfo, DeliverySignature,
    Money, Order, OrderCode, OrderError, OrderItem, OrderPatch, OrderStatus, PaymentConfirmation,
    PaymentStatus, PlaceOrder, ServiceType, TransitionRequest, UnknownStatus, is_paid,
    is_paid_status,
};
pub use pricing::{Discount, apply_discount, compute_order_total, line_total};
