//! Audit trail for administrative overrides.

use chrono::{DateTime, Utc};
use domain::{Actor, Order};
use serde::{Deserialize, Serialize};

use crate::OrderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Full record overwrite, bypassing the lifecycle table.
    Replace,
    /// Physical delete.
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Replace => "replace",
            AuditAction::Delete => "delete",
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(AuditAction::Replace),
            "delete" => Ok(AuditAction::Delete),
            other => Err(format!("unknown audit action '{other}'")),
        }
    }
}

/// Who overrode which order, when, and what it looked like before and after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub order_id: OrderId,
    pub action: AuditAction,
    pub actor: Actor,
    #[serde(default)]
    pub reason: Option<String>,
    pub before: Option<Order>,
    pub after: Option<Order>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn replace(before: Order, after: Order, actor: Actor, reason: Option<String>) -> Self {
        Self {
            order_id: before.id,
            action: AuditAction::Replace,
            actor,
            reason,
            before: Some(before),
            after: Some(after),
            recorded_at: Utc::now(),
        }
    }

    pub fn delete(before: Order, actor: Actor, reason: Option<String>) -> Self {
        Self {
            order_id: before.id,
            action: AuditAction::Delete,
            actor,
            reason,
            before: Some(before),
            after: None,
            recorded_at: Utc::now(),
        }
    }
}
