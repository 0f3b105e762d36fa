//! Order checkout: placement and payment completion.
//!
//! Order placement runs as a single store transaction around one call to the
//! payment processor:
//! 1. Reserve the next order number (locks the counter)
//! 2. Price the requested lines against catalog snapshots
//! 3. Insert the order header
//! 4. Request a hosted invoice
//! 5. Attach the invoice, insert the lines, advance the counter, commit
//!
//! If anything fails the transaction is rolled back. An invoice issued for a
//! rolled back order is expired on a best-effort basis.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod reconciler;
pub mod services;

pub use config::CheckoutConfig;
pub use error::{CheckoutError, ReconcileError};
pub use orchestrator::{ORDER_NUMBERING_MODULE, OrderOrchestrator, PlacedOrder};
pub use reconciler::{CompletionOutcome, CompletionReconciler, SYSTEM_ACTOR};
pub use services::{
    InMemoryInvoiceClient, InvoiceClient, InvoiceItem, InvoiceRequest, PaymentGatewayError,
    XenditInvoiceClient,
};
