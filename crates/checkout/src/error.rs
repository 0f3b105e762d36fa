//! Checkout error types.

use domain::OrderError;
use order_store::StoreError;
use thiserror::Error;

use crate::services::PaymentGatewayError;

/// Errors that can occur while placing an order.
///
/// Every variant means the order transaction was rolled back.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request violates a business rule. Not retryable.
    #[error(transparent)]
    Rejected(#[from] OrderError),

    /// The payment processor could not issue an invoice. The caller may retry.
    #[error("Payment gateway error: {0}")]
    PaymentGateway(#[from] PaymentGatewayError),

    /// Storage failure.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Short label used for the failure metric.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::Rejected(OrderError::ProductNotFound { .. }) => "product_not_found",
            CheckoutError::Rejected(OrderError::InvalidQuantity { .. }) => "invalid_quantity",
            CheckoutError::Rejected(OrderError::NoLines) => "no_lines",
            CheckoutError::Rejected(OrderError::AmountOverflow) => "amount_overflow",
            CheckoutError::PaymentGateway(_) => "payment_gateway",
            CheckoutError::Store(_) => "store",
        }
    }
}

/// Errors that can occur while recording a payment completion.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No order matches the external reference.
    #[error("No order for external reference '{reference}'")]
    NotFound { reference: String },

    /// Storage failure.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),
}
