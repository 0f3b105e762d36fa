//! Order creation orchestrator.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use common::OrderId;
use domain::{
    CallerIdentity, Invoice, Money, Order, OrderLine, OrderNumber, PlaceOrder, PricedOrder,
    price_order,
};
use order_store::{
    NumberingSequencer, OrderGateway, OrderStore, OrderTransaction, ProductSnapshotResolver,
    StoreError,
};
use serde::Serialize;

use crate::config::CheckoutConfig;
use crate::error::CheckoutError;
use crate::services::{InvoiceClient, InvoiceItem, InvoiceRequest};

/// Numbering module that issues order numbers.
pub const ORDER_NUMBERING_MODULE: &str = "order";

/// Result of a successful order placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub number: OrderNumber,
    pub total: Money,
    pub invoice_url: String,
}

/// State carried from the in-transaction preparation to the invoice call.
struct PreparedOrder {
    sequence: i64,
    order: Order,
    priced: PricedOrder,
    created_at: DateTime<Utc>,
}

/// Places orders.
///
/// One placement is one store transaction: the numbering counter, the header,
/// the invoice fields and the lines commit together or not at all. The invoice
/// is requested from the processor while the transaction (and the numbering
/// row lock) is held, so concurrent placements are serialized on the counter.
pub struct OrderOrchestrator<S: OrderStore> {
    store: S,
    invoices: Arc<dyn InvoiceClient>,
    config: CheckoutConfig,
}

impl<S: OrderStore> OrderOrchestrator<S> {
    /// Creates a new orchestrator.
    pub fn new(store: S, invoices: Arc<dyn InvoiceClient>, config: CheckoutConfig) -> Self {
        Self {
            store,
            invoices,
            config,
        }
    }

    /// Places an order for `caller`.
    ///
    /// Returns only after the transaction committed. On any error the
    /// transaction is rolled back and nothing is visible in the store.
    #[tracing::instrument(
        skip_all,
        fields(customer_id = %caller.subject_id, order_id = tracing::field::Empty)
    )]
    pub async fn place_order(
        &self,
        caller: &CallerIdentity,
        command: PlaceOrder,
    ) -> Result<PlacedOrder, CheckoutError> {
        let started = std::time::Instant::now();
        let result = self.run(caller, &command).await;
        metrics::histogram!("order_creation_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match &result {
            Ok(placed) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %placed.order_id,
                    number = %placed.number,
                    total = %placed.total,
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("order_creation_failures_total", "reason" => e.reason())
                    .increment(1);
                match e {
                    CheckoutError::Rejected(_) => tracing::info!(error = %e, "order rejected"),
                    CheckoutError::PaymentGateway(_) => {
                        tracing::warn!(error = %e, "invoice could not be issued")
                    }
                    CheckoutError::Store(_) => tracing::error!(error = %e, "order placement failed"),
                }
            }
        }

        result
    }

    async fn run(
        &self,
        caller: &CallerIdentity,
        command: &PlaceOrder,
    ) -> Result<PlacedOrder, CheckoutError> {
        let mut tx = self.store.begin().await?;

        let prepared = match self.prepare(&mut tx, caller, command).await {
            Ok(prepared) => prepared,
            Err(e) => {
                rollback(tx).await;
                return Err(e);
            }
        };
        let order_id = prepared.order.id;
        tracing::Span::current().record("order_id", tracing::field::display(order_id));

        let invoice = match self.request_invoice(caller, &prepared).await {
            Ok(invoice) => invoice,
            Err(e) => {
                rollback(tx).await;
                return Err(e);
            }
        };

        let lines: Vec<OrderLine> = prepared
            .priced
            .lines
            .into_iter()
            .map(|line| line.into_order_line(order_id, prepared.created_at, &caller.display_name))
            .collect();

        if let Err(e) = finalize(&mut tx, order_id, &invoice, &lines, prepared.sequence).await {
            rollback(tx).await;
            self.expire_orphan(order_id, &invoice).await;
            return Err(e.into());
        }

        if let Err(e) = tx.commit().await {
            // Commit outcome unknown: invoice is left for an external sweep.
            metrics::counter!("orders_orphaned_invoices_total").increment(1);
            tracing::error!(
                %order_id,
                invoice_reference = %invoice.reference,
                error = %e,
                "commit failed after invoice was issued"
            );
            return Err(e.into());
        }

        Ok(PlacedOrder {
            order_id,
            number: prepared.order.number,
            total: prepared.order.total,
            invoice_url: invoice.url,
        })
    }

    /// Reserves the number, prices the lines and writes the bare header.
    async fn prepare(
        &self,
        tx: &mut S::Transaction,
        caller: &CallerIdentity,
        command: &PlaceOrder,
    ) -> Result<PreparedOrder, CheckoutError> {
        let sequence = tx.next_number(ORDER_NUMBERING_MODULE).await?;
        tracing::debug!(sequence, "order number reserved");

        let snapshots = tx.resolve_products(&command.product_ids()).await?;
        let priced = price_order(&command.lines, &snapshots)?;
        tracing::debug!(lines = priced.lines.len(), total = %priced.total, "order priced");

        let created_at = Utc::now();
        let order = Order::unpaid(
            OrderId::new(),
            OrderNumber::new(created_at.year(), sequence),
            caller,
            command,
            priced.total,
            created_at,
            self.config.payment_window,
        );
        tx.insert_order_header(&order).await?;
        tracing::debug!(order_id = %order.id, number = %order.number, "order header inserted");

        Ok(PreparedOrder {
            sequence,
            order,
            priced,
            created_at,
        })
    }

    async fn request_invoice(
        &self,
        caller: &CallerIdentity,
        prepared: &PreparedOrder,
    ) -> Result<Invoice, CheckoutError> {
        let request = InvoiceRequest {
            external_reference: prepared.order.id,
            amount: prepared.order.total,
            currency: self.config.currency.clone(),
            customer_name: caller.display_name.clone(),
            success_redirect_url: self.config.success_redirect_url(prepared.order.id),
            items: prepared
                .priced
                .lines
                .iter()
                .map(|line| InvoiceItem {
                    name: line.product_name.clone(),
                    price: line.unit_price,
                    quantity: line.quantity,
                })
                .collect(),
        };

        match self.invoices.create_invoice(&request).await {
            Ok(invoice) => {
                metrics::counter!("invoice_requests_total", "outcome" => "created").increment(1);
                tracing::debug!(invoice_reference = %invoice.reference, "invoice issued");
                Ok(invoice)
            }
            Err(e) => {
                metrics::counter!("invoice_requests_total", "outcome" => "failed").increment(1);
                Err(e.into())
            }
        }
    }

    /// Best-effort expiry of an invoice whose order was rolled back.
    async fn expire_orphan(&self, order_id: OrderId, invoice: &Invoice) {
        match self.invoices.expire_invoice(&invoice.reference).await {
            Ok(()) => {
                metrics::counter!("invoice_requests_total", "outcome" => "expired").increment(1);
                tracing::warn!(
                    %order_id,
                    invoice_reference = %invoice.reference,
                    "invoice expired after order rollback"
                );
            }
            Err(e) => {
                metrics::counter!("invoice_requests_total", "outcome" => "expire_failed")
                    .increment(1);
                metrics::counter!("orders_orphaned_invoices_total").increment(1);
                tracing::error!(
                    %order_id,
                    invoice_reference = %invoice.reference,
                    error = %e,
                    "could not expire invoice of rolled back order"
                );
            }
        }
    }
}

/// Attaches the invoice, writes the lines and advances the counter.
async fn finalize<T: OrderTransaction>(
    tx: &mut T,
    order_id: OrderId,
    invoice: &Invoice,
    lines: &[OrderLine],
    sequence: i64,
) -> Result<(), StoreError> {
    tx.attach_invoice(order_id, invoice).await?;
    for line in lines {
        tx.insert_order_line(line).await?;
    }
    tx.advance_number(ORDER_NUMBERING_MODULE, sequence).await?;
    tracing::debug!(lines = lines.len(), "order lines written");
    Ok(())
}

async fn rollback<T: OrderTransaction>(tx: T) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(error = %e, "rollback failed");
    }
}

#[cfg(test)]
mod tests {
    use domain::{Money, ProductSnapshot, RequestedLine};
    use order_store::InMemoryOrderStore;

    use super::*;
    use crate::services::InMemoryInvoiceClient;

    async fn setup() -> (
        OrderOrchestrator<InMemoryOrderStore>,
        InMemoryOrderStore,
        InMemoryInvoiceClient,
    ) {
        let store = InMemoryOrderStore::new();
        store.seed_numbering(ORDER_NUMBERING_MODULE, 1).await;
        store
            .upsert_product(ProductSnapshot::new("P1", "Coffee", Money::from_minor(100)))
            .await;
        let invoices = InMemoryInvoiceClient::new();
        let orchestrator = OrderOrchestrator::new(
            store.clone(),
            Arc::new(invoices.clone()),
            CheckoutConfig::new("IDR", "https://shop.test"),
        );
        (orchestrator, store, invoices)
    }

    fn caller() -> CallerIdentity {
        CallerIdentity::new("U1", "Ann", "customer")
    }

    #[tokio::test]
    async fn test_invoice_request_contents() {
        let (orchestrator, _store, invoices) = setup().await;
        let command = PlaceOrder::new(
            "1 Main St",
            "555",
            None,
            vec![RequestedLine::new("P1", 3)],
        );

        let placed = orchestrator.place_order(&caller(), command).await.unwrap();

        let requests = invoices.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.external_reference, placed.order_id);
        assert_eq!(request.amount, Money::from_minor(300));
        assert_eq!(request.currency, "IDR");
        assert_eq!(request.customer_name, "Ann");
        assert_eq!(
            request.success_redirect_url,
            format!("https://shop.test/checkout/{}/success", placed.order_id)
        );
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].name, "Coffee");
        assert_eq!(request.items[0].quantity.get(), 3);
    }

    #[tokio::test]
    async fn test_number_uses_creation_year() {
        let (orchestrator, _store, _invoices) = setup().await;
        let command = PlaceOrder::new("addr", "555", None, vec![RequestedLine::new("P1", 1)]);

        let placed = orchestrator.place_order(&caller(), command).await.unwrap();

        let expected = format!("ORD-{}00000001", Utc::now().year());
        assert_eq!(placed.number.as_str(), expected);
    }

    #[tokio::test]
    async fn test_rejection_skips_invoice_call() {
        let (orchestrator, store, invoices) = setup().await;
        let command = PlaceOrder::new("addr", "555", None, vec![RequestedLine::new("P1", 0)]);

        let err = orchestrator
            .place_order(&caller(), command)
            .await
            .unwrap_err();

        assert_eq!(err.reason(), "invalid_quantity");
        assert_eq!(invoices.request_count(), 0);
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.numbering(ORDER_NUMBERING_MODULE).await, Some(1));
    }
}
