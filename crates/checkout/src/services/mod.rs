//! Payment processor clients.

pub mod invoice;
pub mod xendit;

pub use invoice::{
    InMemoryInvoiceClient, InvoiceClient, InvoiceItem, InvoiceRequest, PaymentGatewayError,
};
pub use xendit::XenditInvoiceClient;
