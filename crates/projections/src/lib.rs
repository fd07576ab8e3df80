//! Read-side projections over the order store.
//!
//! This crate derives the views terminals poll or subscribe to:
//! - [`Projection`] trait for views recomputed from the active order set
//! - [`ReadModel`] trait for query access to a view
//! - [`ProjectionProcessor`] re-projecting on change notifications, lag and resync
//! - Kitchen queue and payment-due views (push, near real time)
//! - [`TrackingProjector`] for customer tracking (polled, per order)

pub mod error;
pub mod processor;
pub mod projection;
pub mod read_model;
pub mod tracking;
pub mod views;

pub use error::{ProjectionError, Result};
pub use processor::ProjectionProcessor;
pub use projection::{Projection, ProjectionPosition};
pub use read_model::ReadModel;
pub use tracking::{TRACKING_STEPS, TrackingProjector, TrackingView, step_index};
pub use views::{
    KitchenQueue, KitchenQueueView, PaymentBadge, PaymentDueEntry, PaymentDueView, QueueCard,
};
