//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use checkout::{InMemoryInvoiceClient, InvoiceClient, XenditInvoiceClient};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::{OrderStore, PostgresOrderStore};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn invoice_client(config: &Config) -> Arc<dyn InvoiceClient> {
    match &config.invoice_secret_key {
        Some(secret_key) => {
            tracing::info!(base_url = %config.invoice_api_base_url, "using invoice API");
            Arc::new(XenditInvoiceClient::new(
                &config.invoice_api_base_url,
                secret_key,
            ))
        }
        None => {
            tracing::warn!("INVOICE_SECRET_KEY not set, using in-memory invoice client");
            Arc::new(InMemoryInvoiceClient::new())
        }
    }
}

async fn serve<S: OrderStore + Clone + 'static>(
    config: &Config,
    store: S,
    invoices: Arc<dyn InvoiceClient>,
    metrics_handle: PrometheusHandle,
) {
    let state = api::create_state(
        store,
        invoices,
        config.checkout(),
        config.invoice_callback_token.clone(),
    );
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

#[tokio::main]
async fn main() {
    // 1. Load configuration and initialize tracing
    let config = Config::from_env();
    init_tracing(&config);
    tracing::debug!(?config, "configuration loaded");

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Select the invoice client
    let invoices = invoice_client(&config);

    // 4. Select the order store and start serving
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresOrderStore::new(pool);
            store
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL order store");
            serve(&config, store, invoices, metrics_handle).await;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory order store with demo catalog");
            let store = api::create_demo_store().await;
            serve(&config, store, invoices, metrics_handle).await;
        }
    }

    tracing::info!("server shut down gracefully");
}
