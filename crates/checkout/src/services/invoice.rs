//! Invoice client trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::OrderId;
use domain::{Invoice, Money, Quantity};
use thiserror::Error;

/// One line shown on the hosted invoice page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceItem {
    pub name: String,
    pub price: Money,
    pub quantity: Quantity,
}

/// Everything the processor needs to issue an invoice for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRequest {
    /// Key the processor echoes back on completion: the order id.
    pub external_reference: OrderId,
    pub amount: Money,
    pub currency: String,
    pub customer_name: String,
    pub success_redirect_url: String,
    pub items: Vec<InvoiceItem>,
}

/// Failures talking to the payment processor.
#[derive(Debug, Error)]
pub enum PaymentGatewayError {
    /// The request never produced an HTTP response.
    #[error("Invoice API transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The processor answered with a non-success status.
    #[error("Invoice API rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The processor answered 2xx but the body is unusable.
    #[error("Invoice API returned an invalid response: {0}")]
    InvalidResponse(String),

    /// The processor is not reachable or not configured.
    #[error("Invoice API unavailable: {0}")]
    Unavailable(String),
}

/// Trait for hosted-invoice operations.
///
/// Calls are never retried locally: a retry after a lost response could
/// issue a second invoice for the same order.
#[async_trait]
pub trait InvoiceClient: Send + Sync {
    /// Issues an invoice and returns its reference and payment URL.
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, PaymentGatewayError>;

    /// Expires an invoice so it can no longer be paid.
    async fn expire_invoice(&self, invoice_reference: &str) -> Result<(), PaymentGatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryInvoiceState {
    requests: Vec<InvoiceRequest>,
    expired: Vec<String>,
    next_id: u32,
    fail_on_create: bool,
    fail_on_expire: bool,
}

/// In-memory invoice client for testing and local runs.
///
/// Records every `create_invoice` call, including failed ones.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvoiceClient {
    state: Arc<RwLock<InMemoryInvoiceState>>,
}

impl InMemoryInvoiceClient {
    /// Creates a new in-memory invoice client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the client to fail every create call.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the client to fail every expire call.
    pub fn set_fail_on_expire(&self, fail: bool) {
        self.state.write().unwrap().fail_on_expire = fail;
    }

    /// Number of create calls received.
    pub fn request_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Create calls received, in order.
    pub fn requests(&self) -> Vec<InvoiceRequest> {
        self.state.read().unwrap().requests.clone()
    }

    /// References of invoices that were expired.
    pub fn expired(&self) -> Vec<String> {
        self.state.read().unwrap().expired.clone()
    }
}

#[async_trait]
impl InvoiceClient for InMemoryInvoiceClient {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, PaymentGatewayError> {
        let mut state = self.state.write().unwrap();
        state.requests.push(request.clone());

        if state.fail_on_create {
            return Err(PaymentGatewayError::Unavailable(
                "invoice creation disabled".to_string(),
            ));
        }

        state.next_id += 1;
        let reference = format!("INV-{:04}", state.next_id);
        let url = format!("https://checkout.invoice.test/web/{reference}");
        Ok(Invoice { reference, url })
    }

    async fn expire_invoice(&self, invoice_reference: &str) -> Result<(), PaymentGatewayError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_expire {
            return Err(PaymentGatewayError::Unavailable(
                "invoice expiry disabled".to_string(),
            ));
        }

        state.expired.push(invoice_reference.to_string());
        Ok(())
    }
}
