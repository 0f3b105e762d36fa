//! Xendit invoice API client (REST, no SDK dependency).

use async_trait::async_trait;
use domain::Invoice;
use serde::{Deserialize, Serialize};

use super::invoice::{InvoiceClient, InvoiceRequest, PaymentGatewayError};

/// Production base URL of the Xendit API.
pub const DEFAULT_BASE_URL: &str = "https://api.xendit.co";

#[derive(Serialize)]
struct CreateInvoiceBody<'a> {
    external_id: String,
    amount: i64,
    currency: &'a str,
    customer: CustomerBody<'a>,
    success_redirect_url: &'a str,
    items: Vec<ItemBody<'a>>,
}

#[derive(Serialize)]
struct CustomerBody<'a> {
    given_names: &'a str,
}

#[derive(Serialize)]
struct ItemBody<'a> {
    name: &'a str,
    price: i64,
    quantity: i64,
}

#[derive(Deserialize)]
struct InvoiceResponse {
    id: String,
    invoice_url: String,
}

impl<'a> From<&'a InvoiceRequest> for CreateInvoiceBody<'a> {
    fn from(request: &'a InvoiceRequest) -> Self {
        Self {
            external_id: request.external_reference.to_string(),
            amount: request.amount.minor(),
            currency: &request.currency,
            customer: CustomerBody {
                given_names: &request.customer_name,
            },
            success_redirect_url: &request.success_redirect_url,
            items: request
                .items
                .iter()
                .map(|item| ItemBody {
                    name: &item.name,
                    price: item.price.minor(),
                    quantity: i64::from(item.quantity),
                })
                .collect(),
        }
    }
}

/// Invoice client backed by the Xendit REST API.
///
/// Authenticates with HTTP basic auth, secret key as user name and an empty
/// password.
#[derive(Clone)]
pub struct XenditInvoiceClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl std::fmt::Debug for XenditInvoiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XenditInvoiceClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl XenditInvoiceClient {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, secret_key)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, PaymentGatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PaymentGatewayError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl InvoiceClient for XenditInvoiceClient {
    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, PaymentGatewayError> {
        let response = self
            .http
            .post(format!("{}/v2/invoices", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .json(&CreateInvoiceBody::from(request))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let parsed: InvoiceResponse = response
            .json()
            .await
            .map_err(|e| PaymentGatewayError::InvalidResponse(e.to_string()))?;
        if parsed.id.is_empty() || parsed.invoice_url.is_empty() {
            return Err(PaymentGatewayError::InvalidResponse(
                "missing invoice id or url".to_string(),
            ));
        }

        Ok(Invoice {
            reference: parsed.id,
            url: parsed.invoice_url,
        })
    }

    async fn expire_invoice(&self, invoice_reference: &str) -> Result<(), PaymentGatewayError> {
        let response = self
            .http
            .post(format!(
                "{}/invoices/{}/expire!",
                self.base_url, invoice_reference
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
