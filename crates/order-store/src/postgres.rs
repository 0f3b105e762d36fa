use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{LineId, OrderId};
use domain::{
    CustomerId, Invoice, Money, Order, OrderLine, OrderNumber, OrderStatus, ProductId,
    ProductSnapshot, Quantity,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{NumberingSequencer, OrderGateway, OrderStore, OrderTransaction, ProductSnapshotResolver},
};

const ORDER_COLUMNS: &str = "id, number, customer_id, status, recipient_name, address, phone, \
     notes, total, invoice_reference, invoice_url, expires_at, paid_at, created_at, created_by, \
     updated_at, updated_by";

const LINE_COLUMNS: &str =
    "id, order_id, product_id, product_name, unit_price, quantity, created_at, created_by";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status)
            .ok_or_else(|| StoreError::CorruptRow(format!("unknown order status '{status}'")))?;

        let invoice_reference: Option<String> = row.try_get("invoice_reference")?;
        let invoice_url: Option<String> = row.try_get("invoice_url")?;
        let invoice = match (invoice_reference, invoice_url) {
            (Some(reference), Some(url)) => Some(Invoice { reference, url }),
            (None, None) => None,
            _ => {
                return Err(StoreError::CorruptRow(
                    "invoice reference and url must be set together".to_string(),
                ));
            }
        };

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            number: OrderNumber::from_stored(row.try_get::<String, _>("number")?),
            customer_id: CustomerId::new(row.try_get::<String, _>("customer_id")?),
            status,
            recipient_name: row.try_get("recipient_name")?,
            address: row.try_get("address")?,
            phone: row.try_get("phone")?,
            notes: row.try_get("notes")?,
            total: Money::from_minor(row.try_get("total")?),
            invoice,
            expires_at: row.try_get("expires_at")?,
            paid_at: row.try_get("paid_at")?,
            created_at: row.try_get("created_at")?,
            created_by: row.try_get("created_by")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
        })
    }

    fn row_to_line(row: &PgRow) -> Result<OrderLine> {
        let raw_quantity: i64 = row.try_get("quantity")?;
        let quantity = Quantity::new(raw_quantity)
            .ok_or_else(|| StoreError::CorruptRow(format!("invalid quantity {raw_quantity}")))?;

        Ok(OrderLine {
            id: LineId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            unit_price: Money::from_minor(row.try_get("unit_price")?),
            quantity,
            created_at: row.try_get("created_at")?,
            created_by: row.try_get("created_by")?,
        })
    }
}

/// Transaction over a [`PostgresOrderStore`].
///
/// Wraps a sqlx transaction; dropping it without commit rolls back.
pub struct PostgresOrderTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    type Transaction = PostgresOrderTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        let tx = self.pool.begin().await?;
        Ok(PostgresOrderTransaction { tx })
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(order_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_order).transpose()
    }

    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = $1 ORDER BY line_seq ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(order_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_line).collect()
    }
}

#[async_trait]
impl NumberingSequencer for PostgresOrderTransaction {
    async fn next_number(&mut self, module: &str) -> Result<i64> {
        // FOR UPDATE: concurrent creators queue here until this transaction ends.
        let number: Option<i64> =
            sqlx::query_scalar("SELECT number FROM numbering WHERE module = $1 FOR UPDATE")
                .bind(module)
                .fetch_optional(&mut *self.tx)
                .await?;

        let number = number.ok_or_else(|| StoreError::NumberingNotSeeded {
            module: module.to_string(),
        })?;
        tracing::debug!(module, number, "numbering row locked");
        Ok(number)
    }

    async fn advance_number(&mut self, module: &str, sequence: i64) -> Result<()> {
        let result = sqlx::query("UPDATE numbering SET number = $2 WHERE module = $1")
            .bind(module)
            .bind(sequence + 1)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NumberingNotSeeded {
                module: module.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProductSnapshotResolver for PostgresOrderTransaction {
    async fn resolve_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, ProductSnapshot>> {
        let ids: Vec<String> = product_ids.iter().map(|id| id.to_string()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, name, price
            FROM products
            WHERE id = ANY($1) AND is_deleted = FALSE
            "#,
        )
        .bind(ids)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|row| {
                let snapshot = ProductSnapshot {
                    product_id: ProductId::new(row.try_get::<String, _>("id")?),
                    name: row.try_get("name")?,
                    price: Money::from_minor(row.try_get("price")?),
                };
                Ok((snapshot.product_id.clone(), snapshot))
            })
            .collect()
    }
}

#[async_trait]
impl OrderGateway for PostgresOrderTransaction {
    async fn insert_order_header(&mut self, order: &Order) -> Result<()> {
        let (invoice_reference, invoice_url) = match &order.invoice {
            Some(invoice) => (Some(invoice.reference.as_str()), Some(invoice.url.as_str())),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO orders (id, number, customer_id, status, recipient_name, address, phone,
                                notes, total, invoice_reference, invoice_url, expires_at, paid_at,
                                created_at, created_by, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.number.as_str())
        .bind(order.customer_id.as_str())
        .bind(order.status.as_str())
        .bind(&order.recipient_name)
        .bind(&order.address)
        .bind(&order.phone)
        .bind(&order.notes)
        .bind(order.total.minor())
        .bind(invoice_reference)
        .bind(invoice_url)
        .bind(order.expires_at)
        .bind(order.paid_at)
        .bind(order.created_at)
        .bind(&order.created_by)
        .bind(order.updated_at)
        .bind(&order.updated_by)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_pkey")
            {
                return StoreError::DuplicateOrder(order.id);
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn attach_invoice(&mut self, order_id: OrderId, invoice: &Invoice) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET invoice_reference = $2, invoice_url = $3
            WHERE id = $1 AND invoice_reference IS NULL
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(&invoice.reference)
        .bind(&invoice.url)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InvoiceNotAttachable(order_id));
        }
        Ok(())
    }

    async fn insert_order_line(&mut self, line: &OrderLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO order_lines (id, order_id, product_id, product_name, unit_price, quantity,
                                     created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(line.id.as_uuid())
        .bind(line.order_id.as_uuid())
        .bind(line.product_id.as_str())
        .bind(&line.product_name)
        .bind(line.unit_price.minor())
        .bind(i64::from(line.quantity))
        .bind(line.created_at)
        .bind(&line.created_by)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn find_order_by_external_reference(
        &mut self,
        reference: OrderId,
    ) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        let row: Option<PgRow> = sqlx::query(&sql)
            .bind(reference.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(PostgresOrderStore::row_to_order).transpose()
    }

    async fn mark_order_paid(
        &mut self,
        order_id: OrderId,
        paid_at: DateTime<Utc>,
        updated_by: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, paid_at = $3, updated_at = $4, updated_by = $5
            WHERE id = $1
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(OrderStatus::Paid.as_str())
        .bind(paid_at)
        .bind(Utc::now())
        .bind(updated_by)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(order_id));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderTransaction for PostgresOrderTransaction {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
