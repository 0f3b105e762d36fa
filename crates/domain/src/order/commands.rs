//! Order commands.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProductId;

/// A requested product/quantity pair, exactly as the caller sent it.
///
/// The quantity is kept signed so that non-positive values reach the
/// orchestrator and are rejected there instead of being silently clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl RequestedLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Command to place a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    /// Delivery address.
    pub address: String,

    /// Recipient phone number.
    pub phone_number: String,

    /// Free-form notes for the seller.
    pub notes: Option<String>,

    /// Requested lines, in caller order.
    pub lines: Vec<RequestedLine>,
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command.
    pub fn new(
        address: impl Into<String>,
        phone_number: impl Into<String>,
        notes: Option<String>,
        lines: Vec<RequestedLine>,
    ) -> Self {
        Self {
            address: address.into(),
            phone_number: phone_number.into(),
            notes,
            lines,
        }
    }

    /// Distinct product ids in first-seen order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut seen = HashSet::new();
        self.lines
            .iter()
            .filter(|line| seen.insert(&line.product_id))
            .map(|line| line.product_id.clone())
            .collect()
    }
}

/// Notification that the processor has collected payment for an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteInvoice {
    /// The external reference the invoice was created with (the order id).
    pub external_reference: String,

    /// When the processor reports the payment as settled.
    pub paid_at: DateTime<Utc>,
}

impl CompleteInvoice {
    pub fn new(external_reference: impl Into<String>, paid_at: DateTime<Utc>) -> Self {
        Self {
            external_reference: external_reference.into(),
            paid_at,
        }
    }
}
