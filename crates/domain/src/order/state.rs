//! Order status machine.

use serde::{Deserialize, Serialize};

/// The payment status of an order.
///
/// State transitions:
/// ```text
/// Unpaid ──┬──► Paid
///          ├──► Expired
///          └──► Cancelled
/// ```
///
/// Only `Unpaid → Paid` is driven by this service (the completion
/// reconciler). Expiry and cancellation belong to other processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Created, invoice issued, awaiting payment.
    #[default]
    Unpaid,

    /// Payment confirmed by the processor (terminal state).
    Paid,

    /// Payment window elapsed (terminal state).
    Expired,

    /// Cancelled before payment (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if a payment-completion notification changes this status.
    pub fn awaits_payment(&self) -> bool {
        !matches!(self, OrderStatus::Paid)
    }

    /// Returns the status code as stored and reported.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Unpaid => "UNPAID",
            OrderStatus::Paid => "PAID",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Parses a stored status code.
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "UNPAID" => Some(OrderStatus::Unpaid),
            "PAID" => Some(OrderStatus::Paid),
            "EXPIRED" => Some(OrderStatus::Expired),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_unpaid() {
        assert_eq!(OrderStatus::default(), OrderStatus::Unpaid);
    }

    #[test]
    fn test_only_paid_ignores_completion() {
        assert!(OrderStatus::Unpaid.awaits_payment());
        assert!(!OrderStatus::Paid.awaits_payment());
        assert!(OrderStatus::Expired.awaits_payment());
        assert!(OrderStatus::Cancelled.awaits_payment());
    }

    #[test]
    fn test_parse_matches_as_str() {
        for status in [
            OrderStatus::Unpaid,
            OrderStatus::Paid,
            OrderStatus::Expired,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("unpaid"), None);
    }

    #[test]
    fn test_serialization_uses_status_code() {
        let json = serde_json::to_string(&OrderStatus::Paid).unwrap();
        assert_eq!(json, "\"PAID\"");
    }
}
