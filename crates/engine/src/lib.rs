//! Order lifecycle engine.
//!
//! Sits between the terminals and the order store:
//! 1. Placement: validation, ticket code draw with retry, charge request
//! 2. Transitions: lifecycle table plus compare-and-set on the stored status
//! 3. Billing: provider charges, webhook ingestion, payment collection
//! 4. Administration: audited replace and delete
//!
//! Also hosts the menu catalog cache and cart quoting.

pub mod catalog;
pub mod code;
pub mod error;
pub mod quote;
pub mod reconcile;
pub mod service;
pub mod services;

pub use catalog::{Catalog, CatalogCache, CatalogError, CatalogSource, StaticCatalog};
pub use code::CodeGenerator;
pub use error::{EngineError, Result};
pub use quote::{CartQuote, QuoteLine, QuoteRequest, Selection, quote};
pub use reconcile::{PaymentCollection, PaymentNotice};
pub use service::{DEFAULT_CODE_ATTEMPTS, OrderEngine, PlacedOrder};
pub use services::{BillingError, BillingProvider, ChargeRequest, InMemoryBillingProvider};
