//! Core projection trait and refresh tracking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::Order;

use crate::Result;

/// Tracks how often a projection has been recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of full recomputations.
    pub refreshes: u64,

    /// When the last recomputation finished.
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl ProjectionPosition {
    /// Creates a position that has never refreshed.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position by one refresh.
    pub fn advance(&self, at: DateTime<Utc>) -> Self {
        Self {
            refreshes: self.refreshes + 1,
            last_refreshed_at: Some(at),
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "position({})", self.refreshes)
    }
}

/// A projection recomputed from the full set of active orders.
///
/// `refresh` is a pure derivation from its input: running it twice with
/// the same orders yields the same view, so it is safe to run on every
/// change notification.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Replaces the view with one derived from `active` (arrival order).
    async fn refresh(&self, active: &[Order]) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}
