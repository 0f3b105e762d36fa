//! Application configuration loaded from environment variables.

use checkout::CheckoutConfig;
use checkout::config::{DEFAULT_CURRENCY, DEFAULT_FRONTEND_BASE_URL};
use checkout::services::xendit::DEFAULT_BASE_URL;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable `fmt` output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `json` for JSON logs, anything else for plain text
/// - `DATABASE_URL` — PostgreSQL URL; unset runs on the in-memory store
/// - `DATABASE_MAX_CONNECTIONS` — pool size (default: `10`)
/// - `INVOICE_API_BASE_URL` — invoice API (default: `"https://api.xendit.co"`)
/// - `INVOICE_SECRET_KEY` — invoice API key; unset uses the in-memory client
/// - `INVOICE_CALLBACK_TOKEN` — expected `x-callback-token` on webhooks
/// - `INVOICE_CURRENCY` — invoice currency (default: `"IDR"`)
/// - `FRONTEND_BASE_URL` — payment redirect base (default: `"http://localhost:5173"`)
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub invoice_api_base_url: String,
    pub invoice_secret_key: Option<String>,
    pub invoice_callback_token: Option<String>,
    pub invoice_currency: String,
    pub frontend_base_url: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: var("LOG_FORMAT")
                .map(|f| LogFormat::parse(&f))
                .unwrap_or_default(),
            database_url: var("DATABASE_URL"),
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.database_max_connections),
            invoice_api_base_url: var("INVOICE_API_BASE_URL")
                .unwrap_or(defaults.invoice_api_base_url),
            invoice_secret_key: var("INVOICE_SECRET_KEY"),
            invoice_callback_token: var("INVOICE_CALLBACK_TOKEN"),
            invoice_currency: var("INVOICE_CURRENCY").unwrap_or(defaults.invoice_currency),
            frontend_base_url: var("FRONTEND_BASE_URL").unwrap_or(defaults.frontend_base_url),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checkout settings derived from this configuration.
    pub fn checkout(&self) -> CheckoutConfig {
        CheckoutConfig::new(&self.invoice_currency, &self.frontend_base_url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            database_url: None,
            database_max_connections: 10,
            invoice_api_base_url: DEFAULT_BASE_URL.to_string(),
            invoice_secret_key: None,
            invoice_callback_token: None,
            invoice_currency: DEFAULT_CURRENCY.to_string(),
            frontend_base_url: DEFAULT_FRONTEND_BASE_URL.to_string(),
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("database_max_connections", &self.database_max_connections)
            .field("invoice_api_base_url", &self.invoice_api_base_url)
            .field("invoice_secret_key", &self.invoice_secret_key.as_ref().map(|_| "<set>"))
            .field(
                "invoice_callback_token",
                &self.invoice_callback_token.as_ref().map(|_| "<set>"),
            )
            .field("invoice_currency", &self.invoice_currency)
            .field("frontend_base_url", &self.frontend_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = from_map(&[]);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.database_url.is_none());
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.invoice_api_base_url, "https://api.xendit.co");
        assert!(config.invoice_secret_key.is_none());
        assert_eq!(config.invoice_currency, "IDR");
        assert_eq!(config.frontend_base_url, "http://localhost:5173");
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("DATABASE_MAX_CONNECTIONS", "25"),
            ("INVOICE_SECRET_KEY", "xnd_secret"),
            ("INVOICE_CALLBACK_TOKEN", "cb"),
            ("INVOICE_CURRENCY", "PHP"),
            ("FRONTEND_BASE_URL", "https://shop.example"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/orders"));
        assert_eq!(config.database_max_connections, 25);
        assert_eq!(config.invoice_secret_key.as_deref(), Some("xnd_secret"));
        assert_eq!(config.invoice_callback_token.as_deref(), Some("cb"));

        let checkout = config.checkout();
        assert_eq!(checkout.currency, "PHP");
        assert_eq!(checkout.frontend_base_url, "https://shop.example");
    }

    #[test]
    fn test_invalid_and_blank_values_fall_back() {
        let config = from_map(&[("PORT", "not-a-port"), ("DATABASE_URL", "  ")]);
        assert_eq!(config.port, 3000);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = from_map(&[("INVOICE_SECRET_KEY", "xnd_secret")]);
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("xnd_secret"));
        assert!(rendered.contains("<set>"));
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
