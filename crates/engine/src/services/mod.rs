//! External service traits and in-memory implementations.

pub mod billing;

pub use billing::{BillingError, BillingProvider, ChargeRequest, InMemoryBillingProvider};
