//! Integration tests for order placement and payment completion.

use std::sync::Arc;

use checkout::{
    CheckoutConfig, CheckoutError, CompletionOutcome, CompletionReconciler, InMemoryInvoiceClient,
    ORDER_NUMBERING_MODULE, OrderOrchestrator, PaymentGatewayError, ReconcileError, SYSTEM_ACTOR,
};
use chrono::{Duration, Utc};
use domain::{
    CallerIdentity, CompleteInvoice, Money, OrderError, OrderStatus, PlaceOrder, ProductId,
    ProductSnapshot, RequestedLine,
};
use order_store::{InMemoryOrderStore, OrderStore};

struct TestHarness {
    orchestrator: Arc<OrderOrchestrator<InMemoryOrderStore>>,
    reconciler: CompletionReconciler<InMemoryOrderStore>,
    store: InMemoryOrderStore,
    invoices: InMemoryInvoiceClient,
}

impl TestHarness {
    async fn new() -> Self {
        let store = InMemoryOrderStore::new();
        store.seed_numbering(ORDER_NUMBERING_MODULE, 7).await;
        store
            .upsert_product(ProductSnapshot::new("P1", "Coffee", Money::from_minor(100)))
            .await;
        store
            .upsert_product(ProductSnapshot::new("P2", "Tea", Money::from_minor(250)))
            .await;

        Self::with_store(store)
    }

    fn with_store(store: InMemoryOrderStore) -> Self {
        let invoices = InMemoryInvoiceClient::new();
        let orchestrator = Arc::new(OrderOrchestrator::new(
            store.clone(),
            Arc::new(invoices.clone()),
            CheckoutConfig::new("IDR", "https://shop.test"),
        ));
        let reconciler = CompletionReconciler::new(store.clone());

        Self {
            orchestrator,
            reconciler,
            store,
            invoices,
        }
    }
}

fn caller() -> CallerIdentity {
    CallerIdentity::new("U1", "Ann", "customer")
}

fn place(lines: Vec<RequestedLine>) -> PlaceOrder {
    PlaceOrder::new("1 Main St", "555-0100", Some("ring twice".to_string()), lines)
}

#[tokio::test]
async fn test_places_order_with_snapshots_and_invoice() {
    let h = TestHarness::new().await;

    let placed = h
        .orchestrator
        .place_order(
            &caller(),
            place(vec![RequestedLine::new("P1", 2), RequestedLine::new("P2", 1)]),
        )
        .await
        .unwrap();

    assert_eq!(placed.total, Money::from_minor(450));
    assert!(placed.number.as_str().starts_with("ORD-"));
    assert!(placed.number.as_str().ends_with("00000007"));
    assert_eq!(placed.invoice_url, "https://checkout.invoice.test/web/INV-0001");

    let order = h.store.get_order(placed.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Unpaid);
    assert_eq!(order.customer_id.as_str(), "U1");
    assert_eq!(order.recipient_name, "Ann");
    assert_eq!(order.created_by, "Ann");
    assert_eq!(order.notes.as_deref(), Some("ring twice"));
    assert_eq!(order.total, Money::from_minor(450));
    assert_eq!(order.expires_at - order.created_at, Duration::hours(24));
    let invoice = order.invoice.unwrap();
    assert_eq!(invoice.reference, "INV-0001");

    let lines = h.store.get_order_lines(placed.order_id).await.unwrap();
    assert_eq!(lines.len(), 2);
    let line_sum = lines
        .iter()
        .map(|l| l.line_total().unwrap().minor())
        .sum::<i64>();
    assert_eq!(line_sum, 450);

    assert_eq!(h.store.numbering(ORDER_NUMBERING_MODULE).await, Some(8));
    assert_eq!(h.invoices.request_count(), 1);
    let request = &h.invoices.requests()[0];
    assert_eq!(request.amount, Money::from_minor(450));
    assert_eq!(request.items.len(), 2);
}

#[tokio::test]
async fn test_snapshot_survives_catalog_change() {
    let h = TestHarness::new().await;

    let placed = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P1", 1)]))
        .await
        .unwrap();

    h.store
        .upsert_product(ProductSnapshot::new("P1", "Espresso", Money::from_minor(900)))
        .await;

    let lines = h.store.get_order_lines(placed.order_id).await.unwrap();
    assert_eq!(lines[0].product_name, "Coffee");
    assert_eq!(lines[0].unit_price, Money::from_minor(100));
}

#[tokio::test]
async fn test_unknown_product_rolls_back_everything() {
    let h = TestHarness::new().await;

    let err = h
        .orchestrator
        .place_order(
            &caller(),
            place(vec![RequestedLine::new("P1", 1), RequestedLine::new("P9", 1)]),
        )
        .await
        .unwrap_err();

    match err {
        CheckoutError::Rejected(OrderError::ProductNotFound { product_id }) => {
            assert_eq!(product_id, ProductId::new("P9"));
        }
        other => panic!("expected ProductNotFound, got {other:?}"),
    }
    assert_eq!(h.store.numbering(ORDER_NUMBERING_MODULE).await, Some(7));
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.line_count().await, 0);
    assert_eq!(h.invoices.request_count(), 0);
}

#[tokio::test]
async fn test_deleted_product_is_rejected() {
    let h = TestHarness::new().await;
    h.store.delete_product(&ProductId::new("P2")).await;

    let err = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P2", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Rejected(_)));
    assert_eq!(err.reason(), "product_not_found");
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn test_empty_and_non_positive_lines_are_rejected() {
    let h = TestHarness::new().await;

    let empty = h
        .orchestrator
        .place_order(&caller(), place(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(empty, CheckoutError::Rejected(OrderError::NoLines)));

    let negative = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P1", -1)]))
        .await
        .unwrap_err();
    assert!(matches!(
        negative,
        CheckoutError::Rejected(OrderError::InvalidQuantity { quantity: -1, .. })
    ));

    assert_eq!(h.store.numbering(ORDER_NUMBERING_MODULE).await, Some(7));
    assert_eq!(h.invoices.request_count(), 0);
}

#[tokio::test]
async fn test_invoice_failure_rolls_back() {
    let h = TestHarness::new().await;
    h.invoices.set_fail_on_create(true);

    let err = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P1", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::PaymentGateway(PaymentGatewayError::Unavailable(_))
    ));
    assert_eq!(h.invoices.request_count(), 1);
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.numbering(ORDER_NUMBERING_MODULE).await, Some(7));

    // A retry after the processor recovers consumes the same number.
    h.invoices.set_fail_on_create(false);
    let placed = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P1", 1)]))
        .await
        .unwrap();
    assert!(placed.number.as_str().ends_with("00000007"));
}

#[tokio::test]
async fn test_line_failure_expires_issued_invoice() {
    let h = TestHarness::new().await;
    h.store.set_fail_on_line_insert(true);

    let err = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P1", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Store(_)));
    assert_eq!(h.invoices.expired(), vec!["INV-0001".to_string()]);
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.line_count().await, 0);
    assert_eq!(h.store.numbering(ORDER_NUMBERING_MODULE).await, Some(7));
}

#[tokio::test]
async fn test_commit_failure_leaves_invoice_untouched() {
    let h = TestHarness::new().await;
    h.store.set_fail_on_commit(true);

    let err = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P1", 1)]))
        .await
        .unwrap_err();

    assert_eq!(err.reason(), "store");
    assert_eq!(h.invoices.request_count(), 1);
    assert!(h.invoices.expired().is_empty());
    assert_eq!(h.store.order_count().await, 0);
    assert_eq!(h.store.numbering(ORDER_NUMBERING_MODULE).await, Some(7));
}

#[tokio::test]
async fn test_unseeded_numbering_is_a_system_error() {
    let store = InMemoryOrderStore::new();
    store
        .upsert_product(ProductSnapshot::new("P1", "Coffee", Money::from_minor(100)))
        .await;
    let h = TestHarness::with_store(store);

    let err = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P1", 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Store(_)));
    assert_eq!(err.reason(), "store");
    assert_eq!(h.invoices.request_count(), 0);
}

#[tokio::test]
async fn test_concurrent_placements_get_distinct_numbers() {
    let h = TestHarness::new().await;

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let orchestrator = h.orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .place_order(&caller(), place(vec![RequestedLine::new("P1", 1)]))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut numbers: Vec<String> = futures_util::future::join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap().number.as_str().to_string())
        .collect();
    numbers.sort();
    numbers.dedup();

    assert_eq!(numbers.len(), 10);
    assert_eq!(h.store.order_count().await, 10);
    assert_eq!(h.store.numbering(ORDER_NUMBERING_MODULE).await, Some(17));
}

#[tokio::test]
async fn test_completion_marks_paid_once() {
    let h = TestHarness::new().await;
    let placed = h
        .orchestrator
        .place_order(&caller(), place(vec![RequestedLine::new("P2", 2)]))
        .await
        .unwrap();
    let paid_at = Utc::now();

    let first = h
        .reconciler
        .complete_invoice(CompleteInvoice::new(placed.order_id.to_string(), paid_at))
        .await
        .unwrap();
    assert_eq!(first, CompletionOutcome::Paid);

    let order = h.store.get_order(placed.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(order.paid_at, Some(paid_at));
    assert_eq!(order.updated_by.as_deref(), Some(SYSTEM_ACTOR));
    let first_update = order.updated_at;

    let second = h
        .reconciler
        .complete_invoice(CompleteInvoice::new(
            placed.order_id.to_string(),
            paid_at + Duration::minutes(5),
        ))
        .await
        .unwrap();
    assert_eq!(second, CompletionOutcome::AlreadyPaid);

    let order = h.store.get_order(placed.order_id).await.unwrap().unwrap();
    assert_eq!(order.paid_at, Some(paid_at));
    assert_eq!(order.updated_at, first_update);
}

#[tokio::test]
async fn test_completion_for_unknown_order_is_not_found() {
    let h = TestHarness::new().await;
    let unknown = common::OrderId::new();

    let result = h
        .reconciler
        .complete_invoice(CompleteInvoice::new(unknown.to_string(), Utc::now()))
        .await;

    assert!(matches!(result, Err(ReconcileError::NotFound { .. })));
    assert_eq!(h.store.order_count().await, 0);
}
