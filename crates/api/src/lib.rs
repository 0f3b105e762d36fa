//! HTTP API server with observability for the order placement service.
//!
//! Provides the order placement, order lookup and invoice webhook endpoints,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{
    CheckoutConfig, CompletionReconciler, InMemoryInvoiceClient, InvoiceClient,
    ORDER_NUMBERING_MODULE, OrderOrchestrator,
};
use domain::{Money, ProductSnapshot};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{InMemoryOrderStore, OrderStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health::<S>))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/webhooks/invoice", post(routes::webhooks::invoice::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the orchestrator and reconciler over `store`.
pub fn create_state<S: OrderStore + Clone + 'static>(
    store: S,
    invoices: Arc<dyn InvoiceClient>,
    checkout: CheckoutConfig,
    callback_token: Option<String>,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orchestrator: OrderOrchestrator::new(store.clone(), invoices, checkout),
        reconciler: CompletionReconciler::new(store.clone()),
        store,
        callback_token,
    })
}

/// Creates an in-memory store with the order counter seeded and a small
/// demo catalog, for running without a database.
pub async fn create_demo_store() -> InMemoryOrderStore {
    let store = InMemoryOrderStore::new();
    store.seed_numbering(ORDER_NUMBERING_MODULE, 1).await;
    for (id, name, price) in [
        ("P1", "Kopi Susu", 25_000),
        ("P2", "Teh Tarik", 18_000),
        ("P3", "Roti Bakar", 30_000),
    ] {
        store
            .upsert_product(ProductSnapshot::new(id, name, Money::from_minor(price)))
            .await;
    }
    store
}

/// Creates the default application state: demo store and in-memory invoices.
pub async fn create_default_state() -> (
    Arc<AppState<InMemoryOrderStore>>,
    InMemoryOrderStore,
    InMemoryInvoiceClient,
) {
    let store = create_demo_store().await;
    let invoices = InMemoryInvoiceClient::new();
    let state = create_state(
        store.clone(),
        Arc::new(invoices.clone()),
        CheckoutConfig::default(),
        None,
    );
    (state, store, invoices)
}
