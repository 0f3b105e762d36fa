//! Payment processor webhook.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use domain::CompleteInvoice;
use order_store::OrderStore;
use serde::{Deserialize, Serialize};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::AppState;
use crate::error::ApiError;

pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Invoice callback as sent by the processor. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct InvoiceCallback {
    /// Processor-side invoice id.
    pub id: String,
    /// The external reference the invoice was created with.
    pub external_id: String,
    pub status: String,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

impl InvoiceCallback {
    fn is_settled(&self) -> bool {
        self.status.eq_ignore_ascii_case("PAID") || self.status.eq_ignore_ascii_case("SETTLED")
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

type HmacSha256 = Hmac<Sha256>;

/// Constant-time token check: both tokens are MACed under the expected one
/// and the tags are compared with `verify_slice`.
fn token_matches(provided: &str, expected: &str) -> bool {
    let Ok(mut reference) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    reference.update(expected.as_bytes());
    let tag = reference.finalize().into_bytes();

    let Ok(mut mac) = HmacSha256::new_from_slice(expected.as_bytes()) else {
        return false;
    };
    mac.update(provided.as_bytes());
    mac.verify_slice(&tag).is_ok()
}

/// POST /webhooks/invoice — apply an invoice status callback.
#[tracing::instrument(skip_all)]
pub async fn invoice<S: OrderStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(callback): Json<InvoiceCallback>,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(expected) = state.callback_token.as_deref() {
        let provided = headers
            .get(CALLBACK_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !token_matches(provided, expected) {
            tracing::warn!("invoice webhook with invalid callback token");
            return Err(ApiError::Unauthorized(
                "Invalid callback token".to_string(),
            ));
        }
    }

    tracing::debug!(
        invoice_id = %callback.id,
        external_id = %callback.external_id,
        status = %callback.status,
        "invoice callback received"
    );

    if !callback.is_settled() {
        tracing::info!(status = %callback.status, "ignoring non-settled invoice callback");
        return Ok(Json(WebhookResponse { status: "ignored" }));
    }

    let paid_at = callback.paid_at.unwrap_or_else(Utc::now);
    let outcome = state
        .reconciler
        .complete_invoice(CompleteInvoice::new(callback.external_id, paid_at))
        .await?;

    Ok(Json(WebhookResponse {
        status: outcome.as_str(),
    }))
}
