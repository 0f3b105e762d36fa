//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::{CheckoutError, ReconcileError};
use domain::OrderError;
use order_store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Missing or invalid caller credentials.
    Unauthorized(String),
    /// Order placement error.
    Checkout(CheckoutError),
    /// Payment completion error.
    Reconcile(ReconcileError),
    /// Order store error.
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Reconcile(ReconcileError::NotFound { reference }) => (
                StatusCode::NOT_FOUND,
                format!("No order for external reference '{reference}'"),
            ),
            ApiError::Reconcile(ReconcileError::Store(err)) | ApiError::Store(err) => {
                internal(err.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Logs the detail and hides it from the caller.
fn internal(detail: String) -> (StatusCode, String) {
    tracing::error!(error = %detail, "internal server error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Rejected(OrderError::ProductNotFound { .. }) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CheckoutError::Rejected(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::PaymentGateway(_) => (
            StatusCode::BAD_GATEWAY,
            "Payment provider unavailable, please retry".to_string(),
        ),
        CheckoutError::Store(_) => internal(err.to_string()),
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        ApiError::Reconcile(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
