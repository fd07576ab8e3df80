use domain::{OrderStatus, ServiceType};

/// Builder for constructing order listings.
///
/// Results are always returned in arrival order (oldest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Filter by status.
    pub status: Option<OrderStatus>,

    /// Filter by service type.
    pub service_type: Option<ServiceType>,

    /// Only orders that are not in a terminal status.
    pub active_only: bool,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for the operational queue.
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filters by service type.
    pub fn service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = Some(service_type);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first N results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// `LIMIT` bind value, clamped to the SQL `BIGINT` range.
    pub fn sql_limit(&self) -> Option<i64> {
        self.limit.map(clamp_to_bigint)
    }

    /// `OFFSET` bind value, clamped to the SQL `BIGINT` range.
    pub fn sql_offset(&self) -> Option<i64> {
        self.offset.map(clamp_to_bigint)
    }

    /// Returns true if the order passes the filters (pagination aside).
    pub fn matches(&self, order: &domain::Order) -> bool {
        if let Some(status) = self.status
            && order.status != status
        {
            return false;
        }
        if let Some(service_type) = self.service_type
            && order.service_type != service_type
        {
            return false;
        }
        if self.active_only && !order.is_active() {
            return false;
        }
        true
    }
}

fn clamp_to_bigint(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = OrderQuery::new()
            .status(OrderStatus::Pronto)
            .service_type(ServiceType::Delivery)
            .limit(10)
            .offset(5);

        assert_eq!(query.status, Some(OrderStatus::Pronto));
        assert_eq!(query.service_type, Some(ServiceType::Delivery));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(5));
        assert!(!query.active_only);
    }

    #[test]
    fn test_sql_pagination_is_clamped() {
        let query = OrderQuery::new().limit(usize::MAX).offset(usize::MAX);
        assert_eq!(query.sql_limit(), Some(i64::MAX));
        assert_eq!(query.sql_offset(), Some(i64::MAX));

        let query = OrderQuery::new().limit(20);
        assert_eq!(query.sql_limit(), Some(20));
        assert_eq!(query.sql_offset(), None);
    }

    #[test]
    fn test_active_query() {
        let query = OrderQuery::active();
        assert!(query.active_only);
        assert!(query.status.is_none());
    }
}
