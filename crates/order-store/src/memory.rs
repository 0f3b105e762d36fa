use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Invoice, Order, OrderLine, ProductId, ProductSnapshot};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    Result, StoreError,
    store::{NumberingSequencer, OrderGateway, OrderStore, OrderTransaction, ProductSnapshotResolver},
};

#[derive(Debug, Clone)]
struct CatalogEntry {
    snapshot: ProductSnapshot,
    deleted: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    numbering: HashMap<String, i64>,
    products: HashMap<ProductId, CatalogEntry>,
    orders: HashMap<OrderId, Order>,
    lines: Vec<OrderLine>,
}

#[derive(Debug, Default)]
struct FailureSwitches {
    on_line_insert: AtomicBool,
    on_commit: AtomicBool,
}

/// In-memory order store implementation for testing.
///
/// A transaction holds the store-wide writer lock from `begin` until it
/// commits or is dropped, and works on a staged copy of the committed state.
/// Writers are serialized more strictly than by the row lock the PostgreSQL
/// store takes on the numbering counter. Reads never take the writer lock and
/// see the last committed state.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    committed: Arc<RwLock<MemoryState>>,
    writer: Arc<Mutex<()>>,
    failures: Arc<FailureSwitches>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the counter value of a numbering module.
    pub async fn seed_numbering(&self, module: &str, number: i64) {
        let _writer = self.writer.lock().await;
        self.committed
            .write()
            .await
            .numbering
            .insert(module.to_string(), number);
    }

    /// Adds or replaces a catalog product.
    pub async fn upsert_product(&self, snapshot: ProductSnapshot) {
        let _writer = self.writer.lock().await;
        self.committed.write().await.products.insert(
            snapshot.product_id.clone(),
            CatalogEntry {
                snapshot,
                deleted: false,
            },
        );
    }

    /// Soft-deletes a catalog product.
    pub async fn delete_product(&self, product_id: &ProductId) {
        let _writer = self.writer.lock().await;
        if let Some(entry) = self.committed.write().await.products.get_mut(product_id) {
            entry.deleted = true;
        }
    }

    /// Returns the committed counter value of a numbering module.
    pub async fn numbering(&self, module: &str) -> Option<i64> {
        self.committed.read().await.numbering.get(module).copied()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.committed.read().await.orders.len()
    }

    /// Returns the number of committed order lines.
    pub async fn line_count(&self) -> usize {
        self.committed.read().await.lines.len()
    }

    /// Returns every committed order.
    pub async fn all_orders(&self) -> Vec<Order> {
        self.committed.read().await.orders.values().cloned().collect()
    }

    /// Makes every subsequent `insert_order_line` fail.
    pub fn set_fail_on_line_insert(&self, fail: bool) {
        self.failures.on_line_insert.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `commit` fail.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.failures.on_commit.store(fail, Ordering::SeqCst);
    }
}

/// Transaction over an [`InMemoryOrderStore`].
pub struct InMemoryOrderTransaction {
    _writer: OwnedMutexGuard<()>,
    committed: Arc<RwLock<MemoryState>>,
    staged: MemoryState,
    failures: Arc<FailureSwitches>,
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    type Transaction = InMemoryOrderTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        let writer = self.writer.clone().lock_owned().await;
        let staged = self.committed.read().await.clone();
        Ok(InMemoryOrderTransaction {
            _writer: writer,
            committed: self.committed.clone(),
            staged,
            failures: self.failures.clone(),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.committed.read().await.orders.get(&order_id).cloned())
    }

    async fn get_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let state = self.committed.read().await;
        Ok(state
            .lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NumberingSequencer for InMemoryOrderTransaction {
    async fn next_number(&mut self, module: &str) -> Result<i64> {
        self.staged
            .numbering
            .get(module)
            .copied()
            .ok_or_else(|| StoreError::NumberingNotSeeded {
                module: module.to_string(),
            })
    }

    async fn advance_number(&mut self, module: &str, sequence: i64) -> Result<()> {
        let number =
            self.staged
                .numbering
                .get_mut(module)
                .ok_or_else(|| StoreError::NumberingNotSeeded {
                    module: module.to_string(),
                })?;
        *number = sequence + 1;
        Ok(())
    }
}

#[async_trait]
impl ProductSnapshotResolver for InMemoryOrderTransaction {
    async fn resolve_products(
        &mut self,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, ProductSnapshot>> {
        Ok(product_ids
            .iter()
            .filter_map(|id| self.staged.products.get(id))
            .filter(|entry| !entry.deleted)
            .map(|entry| (entry.snapshot.product_id.clone(), entry.snapshot.clone()))
            .collect())
    }
}

#[async_trait]
impl OrderGateway for InMemoryOrderTransaction {
    async fn insert_order_header(&mut self, order: &Order) -> Result<()> {
        if self.staged.orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        self.staged.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn attach_invoice(&mut self, order_id: OrderId, invoice: &Invoice) -> Result<()> {
        match self.staged.orders.get_mut(&order_id) {
            Some(order) => {
                if order.attach_invoice(invoice.clone()) {
                    Ok(())
                } else {
                    Err(StoreError::InvoiceNotAttachable(order_id))
                }
            }
            None => Err(StoreError::InvoiceNotAttachable(order_id)),
        }
    }

    async fn insert_order_line(&mut self, line: &OrderLine) -> Result<()> {
        if self.failures.on_line_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        if !self.staged.orders.contains_key(&line.order_id) {
            return Err(StoreError::OrderNotFound(line.order_id));
        }
        self.staged.lines.push(line.clone());
        Ok(())
    }

    async fn find_order_by_external_reference(
        &mut self,
        reference: OrderId,
    ) -> Result<Option<Order>> {
        Ok(self.staged.orders.get(&reference).cloned())
    }

    async fn mark_order_paid(
        &mut self,
        order_id: OrderId,
        paid_at: DateTime<Utc>,
        updated_by: &str,
    ) -> Result<()> {
        let order = self
            .staged
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.mark_paid(paid_at, updated_by, Utc::now());
        Ok(())
    }
}

#[async_trait]
impl OrderTransaction for InMemoryOrderTransaction {
    async fn commit(self) -> Result<()> {
        if self.failures.on_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        *self.committed.write().await = self.staged;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
