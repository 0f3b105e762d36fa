use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Invoice, Order, OrderLine, ProductId, ProductSnapshot};

use crate::Result;

/// Monotonic per-module counters used for human-facing numbers.
///
/// Both calls run inside the caller's transaction. `next_number` takes a row
/// lock on the counter, so a second transaction asking for the same module
/// blocks until the first one commits or rolls back.
#[async_trait]
pub trait NumberingSequencer: Send {
    /// Reads the current counter value for `module`, locking the row.
    ///
    /// Fails with `NumberingNotSeeded` if the module has no counter row.
    async fn next_number(&mut self, module: &str) -> Result<i64>;

    /// Persists `sequence + 1` as the module's counter value.
    async fn advance_number(&mut self, module: &str, sequence: i64) -> Result<()>;
}

/// Catalog reads used to freeze prices at order time.
#[async_trait]
pub trait ProductSnapshotResolver: Send {
    /// Returns name and price for each requested id.
    ///
    /// Unknown and soft-deleted products are simply absent from the map.
    async fn resolve_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, ProductSnapshot>>;
}

/// Order header and line writes scoped to one transaction.
#[async_trait]
pub trait OrderGateway: Send {
    /// Inserts a new header. Fails with `DuplicateOrder` on id collision.
    async fn insert_order_header(&mut self, order: &Order) -> Result<()>;

    /// Sets invoice reference and url on a header that has none yet.
    async fn attach_invoice(&mut self, order_id: OrderId, invoice: &Invoice) -> Result<()>;

    /// Inserts one immutable order line.
    async fn insert_order_line(&mut self, line: &OrderLine) -> Result<()>;

    /// Looks up the order a processor notification refers to, locking it
    /// for the rest of the transaction.
    async fn find_order_by_external_reference(
        &mut self,
        reference: OrderId,
    ) -> Result<Option<Order>>;

    /// Moves the order to `PAID`.
    async fn mark_order_paid(
        &mut self,
        order_id: OrderId,
        paid_at: DateTime<Utc>,
        updated_by: &str,
    ) -> Result<()>;
}

/// A transactional session over the order store.
///
/// Dropping the session without calling `commit` rolls it back, so a
/// cancelled caller never leaves partial writes behind.
#[async_trait]
pub trait OrderTransaction: NumberingSequencer + ProductSnapshotResolver + OrderGateway {
    /// Makes every write of this session visible atomically.
    async fn commit(self) -> Result<()>;

    /// Discards every write of this session.
    async fn rollback(self) -> Result<()>;
}

/// Core trait for order store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    type Transaction: OrderTransaction + 'static;

    /// Opens a new transactional session.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Checks that the store is reachable without taking any lock.
    async fn ping(&self) -> Result<()>;

    /// Loads a committed order header.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads the committed lines of an order.
    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>>;
}
