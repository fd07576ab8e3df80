//! Shared types used across the order lifecycle crates.

mod types;

pub use types::OrderId;
