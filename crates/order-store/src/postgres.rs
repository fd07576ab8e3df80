use async_trait::async_trait;
use domain::{Actor, BillingUpdate, Order, OrderCode, OrderPatch, OrderStatus};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    AuditAction, AuditRecord, ChangeKind, ChangeNotifier, OrderId, OrderQuery, Result,
    StoreError, store::OrderStore,
};

/// PostgreSQL-backed order store implementation.
///
/// The full record is stored as JSONB; `status`, `code`, `operating_day`
/// and the timestamps are mirrored into columns so the conditional update
/// and the ticket-code constraint run in SQL.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
    notifier: ChangeNotifier,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let data: serde_json::Value = row.try_get("data")?;
        Ok(serde_json::from_value(data)?)
    }

    fn row_to_audit(row: PgRow) -> Result<AuditRecord> {
        let action: String = row.try_get("action")?;
        let action = action
            .parse::<AuditAction>()
            .map_err(|e| StoreError::Serialization(serde_json::Error::io(std::io::Error::other(e))))?;
        let before: Option<serde_json::Value> = row.try_get("before")?;
        let after: Option<serde_json::Value> = row.try_get("after")?;

        Ok(AuditRecord {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            action,
            actor: Actor::new(
                row.try_get::<String, _>("actor_id")?,
                row.try_get::<String, _>("actor_name")?,
            ),
            reason: row.try_get("reason")?,
            before: before.map(serde_json::from_value).transpose()?,
            after: after.map(serde_json::from_value).transpose()?,
            recorded_at: row.try_get("recorded_at")?,
        })
    }

    /// Locks and loads an order inside a transaction.
    async fn lock_order(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
    ) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT data FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    /// Writes every mirrored column plus the JSONB record.
    async fn write_order(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, service_type = $3, data = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.service_type.as_str())
        .bind(serde_json::to_value(order)?)
        .bind(order.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn insert_audit(tx: &mut Transaction<'_, Postgres>, audit: &AuditRecord) -> Result<()> {
        let before = audit.before.as_ref().map(serde_json::to_value).transpose()?;
        let after = audit.after.as_ref().map(serde_json::to_value).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO order_audit (order_id, action, actor_id, actor_name, reason, before, after, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(audit.order_id.as_uuid())
        .bind(audit.action.as_str())
        .bind(&audit.actor.id)
        .bind(&audit.actor.name)
        .bind(&audit.reason)
        .bind(before)
        .bind(after)
        .bind(audit.recorded_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id, code = %order.code))]
    async fn create(&self, order: &Order) -> Result<()> {
        let operating_day = order.operating_day();

        sqlx::query(
            r#"
            INSERT INTO orders (id, code, operating_day, status, service_type, data, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.code.as_str())
        .bind(operating_day)
        .bind(order.status.as_str())
        .bind(order.service_type.as_str())
        .bind(serde_json::to_value(order)?)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                match db_err.constraint() {
                    Some("unique_code_per_day") => {
                        return StoreError::DuplicateCode {
                            code: order.code.clone(),
                            operating_day,
                        };
                    }
                    Some("orders_pkey") => return StoreError::AlreadyExists(order.id),
                    _ => {}
                }
            }
            StoreError::Database(e)
        })?;

        metrics::counter!("order_store_writes_total", "op" => "create").increment(1);
        self.notifier.publish(order.id, ChangeKind::Created);
        Ok(())
    }

    async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT data FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn get_by_code(&self, code: &OrderCode) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT data FROM orders
            WHERE code = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_order).transpose()
    }

    async fn list(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut sql = String::from("SELECT data FROM orders WHERE 1=1");
        let mut param_count = 0;

        if query.status.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND status = ${param_count}"));
        }
        if query.service_type.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND service_type = ${param_count}"));
        }
        if query.active_only {
            sql.push_str(" AND status NOT IN ('ENTREGUE', 'CANCELADO') AND data->>'delivered_at' IS NULL");
        }

        sql.push_str(" ORDER BY created_at ASC, seq ASC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(status) = query.status {
            sqlx_query = sqlx_query.bind(status.as_str());
        }
        if let Some(service_type) = query.service_type {
            sqlx_query = sqlx_query.bind(service_type.as_str());
        }
        if let Some(limit) = query.sql_limit() {
            sqlx_query = sqlx_query.bind(limit);
        }
        if let Some(offset) = query.sql_offset() {
            sqlx_query = sqlx_query.bind(offset);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    #[tracing::instrument(skip(self, patch), fields(to = %patch.status))]
    async fn conditional_update(
        &self,
        id: OrderId,
        expected: OrderStatus,
        patch: &OrderPatch,
    ) -> Result<Option<Order>> {
        let mut tx = self.pool.begin().await?;

        // FOR UPDATE serialises concurrent transitions; the loser re-reads
        // the committed row and no longer matches `expected`.
        let row = sqlx::query("SELECT data FROM orders WHERE id = $1 AND status = $2 FOR UPDATE")
            .bind(id.as_uuid())
            .bind(expected.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tracing::debug!("conditional update matched no row");
            return Ok(None);
        };

        let mut order = Self::row_to_order(row)?;
        order.apply(patch);

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $3, data = $4, updated_at = $5
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(order.status.as_str())
        .bind(serde_json::to_value(&order)?)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        tx.commit().await?;

        metrics::counter!("order_store_writes_total", "op" => "transition").increment(1);
        self.notifier.publish(id, ChangeKind::StatusChanged);
        Ok(Some(order))
    }

    #[tracing::instrument(skip(self, update))]
    async fn update_billing(&self, id: OrderId, update: &BillingUpdate) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let mut order = Self::lock_order(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        order.apply_billing(update);
        Self::write_order(&mut tx, &order).await?;

        tx.commit().await?;

        metrics::counter!("order_store_writes_total", "op" => "billing").increment(1);
        self.notifier.publish(id, ChangeKind::Billing);
        Ok(order)
    }

    #[tracing::instrument(skip(self, order, audit), fields(actor_id = %audit.actor.id))]
    async fn full_replace(&self, id: OrderId, order: &Order, audit: AuditRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if Self::lock_order(&mut tx, id).await?.is_none() {
            return Err(StoreError::NotFound(id));
        }
        Self::write_order(&mut tx, order).await?;
        Self::insert_audit(&mut tx, &audit).await?;

        tx.commit().await?;

        metrics::counter!("order_store_writes_total", "op" => "replace").increment(1);
        self.notifier.publish(id, ChangeKind::Replaced);
        Ok(())
    }

    #[tracing::instrument(skip(self, audit), fields(actor_id = %audit.actor.id))]
    async fn delete(&self, id: OrderId, audit: AuditRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Self::insert_audit(&mut tx, &audit).await?;

        tx.commit().await?;

        metrics::counter!("order_store_writes_total", "op" => "delete").increment(1);
        self.notifier.publish(id, ChangeKind::Deleted);
        Ok(())
    }

    async fn audit_trail(&self, id: OrderId) -> Result<Vec<AuditRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, action, actor_id, actor_name, reason, before, after, recorded_at
            FROM order_audit
            WHERE order_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_audit).collect()
    }

    fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
