//! Order lifecycle states and the transition table.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// PENDENTE ──► EM_PREPARO ──► PRONTO ──┬──► SAIU_ENTREGA ──► ENTREGUE
///    │             │            │      │          │
///    │             │            │      └──────────┼──────► ENTREGUE
///    └─────────────┴────────────┴─────────────────┴──► CANCELADO
/// ```
/// `SAIU_ENTREGA` is only reachable by delivery orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order was placed and waits for the kitchen.
    #[default]
    Pendente,

    /// Kitchen is preparing the order.
    EmPreparo,

    /// Order is ready for pickup, table service or courier handoff.
    Pronto,

    /// Courier left with the order.
    SaiuEntrega,

    /// Order was handed over (terminal state).
    Entregue,

    /// Order was cancelled (terminal state).
    Cancelado,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pendente,
        OrderStatus::EmPreparo,
        OrderStatus::Pronto,
        OrderStatus::SaiuEntrega,
        OrderStatus::Entregue,
        OrderStatus::Cancelado,
    ];

    /// Statuses that still belong on the operational queue.
    pub const ACTIVE: [OrderStatus; 4] = [
        OrderStatus::Pendente,
        OrderStatus::EmPreparo,
        OrderStatus::Pronto,
        OrderStatus::SaiuEntrega,
    ];

    /// Returns the statuses reachable from this one.
    pub fn allowed_targets(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pendente => &[OrderStatus::EmPreparo, OrderStatus::Cancelado],
            OrderStatus::EmPreparo => &[OrderStatus::Pronto, OrderStatus::Cancelado],
            OrderStatus::Pronto => &[
                OrderStatus::SaiuEntrega,
                OrderStatus::Entregue,
                OrderStatus::Cancelado,
            ],
            OrderStatus::SaiuEntrega => &[OrderStatus::Entregue, OrderStatus::Cancelado],
            OrderStatus::Entregue | OrderStatus::Cancelado => &[],
        }
    }

    /// Returns true if the transition table contains `self -> to`.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.allowed_targets().contains(&to)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Entregue | OrderStatus::Cancelado)
    }

    /// Returns true if reaching this status requires the payment-paid check.
    pub fn requires_payment(&self) -> bool {
        matches!(self, OrderStatus::Entregue)
    }

    /// Returns the status name as stored and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendente => "PENDENTE",
            OrderStatus::EmPreparo => "EM_PREPARO",
            OrderStatus::Pronto => "PRONTO",
            OrderStatus::SaiuEntrega => "SAIU_ENTREGA",
            OrderStatus::Entregue => "ENTREGUE",
            OrderStatus::Cancelado => "CANCELADO",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or(UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pendente() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pendente);
    }

    #[test]
    fn test_transition_table() {
        use OrderStatus::*;

        let allowed = [
            (Pendente, EmPreparo),
            (Pendente, Cancelado),
            (EmPreparo, Pronto),
            (EmPreparo, Cancelado),
            (Pronto, SaiuEntrega),
            (Pronto, Entregue),
            (Pronto, Cancelado),
            (SaiuEntrega, Entregue),
            (SaiuEntrega, Cancelado),
        ];

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_cancel_reachable_from_every_non_terminal_status() {
        for status in OrderStatus::ACTIVE {
            assert!(status.can_transition_to(OrderStatus::Cancelado));
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pendente.is_terminal());
        assert!(!OrderStatus::EmPreparo.is_terminal());
        assert!(!OrderStatus::Pronto.is_terminal());
        assert!(!OrderStatus::SaiuEntrega.is_terminal());
        assert!(OrderStatus::Entregue.is_terminal());
        assert!(OrderStatus::Cancelado.is_terminal());
        assert!(OrderStatus::Entregue.allowed_targets().is_empty());
        assert!(OrderStatus::Cancelado.allowed_targets().is_empty());
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            "em_preparo".parse::<OrderStatus>().unwrap(),
            OrderStatus::EmPreparo
        );
        assert_eq!(
            " SAIU_ENTREGA ".parse::<OrderStatus>().unwrap(),
            OrderStatus::SaiuEntrega
        );
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_wire_format_matches_as_str() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
