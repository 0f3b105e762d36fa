//! Checkout settings.

use chrono::Duration;
use common::OrderId;

/// Default invoice currency.
pub const DEFAULT_CURRENCY: &str = "IDR";

/// Default storefront base URL used for payment redirects.
pub const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:5173";

/// How long a new order waits for payment.
pub const DEFAULT_PAYMENT_WINDOW_HOURS: i64 = 24;

/// Settings the orchestrator needs to build orders and invoices.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// ISO currency code sent to the invoice API.
    pub currency: String,
    /// Storefront base URL; the processor redirects here after payment.
    pub frontend_base_url: String,
    /// Time between creation and `expires_at`.
    pub payment_window: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY.to_string(),
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
            payment_window: Duration::hours(DEFAULT_PAYMENT_WINDOW_HOURS),
        }
    }
}

impl CheckoutConfig {
    pub fn new(currency: impl Into<String>, frontend_base_url: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            frontend_base_url: frontend_base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_payment_window(mut self, payment_window: Duration) -> Self {
        self.payment_window = payment_window;
        self
    }

    /// Page the customer lands on after paying for `order_id`.
    pub fn success_redirect_url(&self, order_id: OrderId) -> String {
        format!(
            "{}/checkout/{}/success",
            self.frontend_base_url.trim_end_matches('/'),
            order_id
        )
    }
}
