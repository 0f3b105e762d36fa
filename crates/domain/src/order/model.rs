//! Persisted order header, order lines and catalog snapshots.

use chrono::{DateTime, Duration, Utc};
use common::{LineId, OrderId};
use serde::{Deserialize, Serialize};

use crate::identity::CallerIdentity;

use super::{CustomerId, Money, OrderNumber, OrderStatus, PlaceOrder, ProductId, Quantity};

/// Hosted invoice issued by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Opaque processor-side invoice id.
    pub reference: String,
    /// Redirect URL of the hosted payment page.
    pub url: String,
}

/// Name and price of a catalog product at the moment it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
}

impl ProductSnapshot {
    pub fn new(product_id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Order header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub number: OrderNumber,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub recipient_name: String,
    pub address: String,
    pub phone: String,
    pub notes: Option<String>,
    /// Sum of the line snapshots, frozen at creation.
    pub total: Money,
    /// Set once during creation, never afterwards.
    pub invoice: Option<Invoice>,
    pub expires_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl Order {
    /// Builds a fresh `UNPAID` header with no invoice attached.
    pub fn unpaid(
        id: OrderId,
        number: OrderNumber,
        caller: &CallerIdentity,
        command: &PlaceOrder,
        total: Money,
        created_at: DateTime<Utc>,
        payment_window: Duration,
    ) -> Self {
        Self {
            id,
            number,
            customer_id: caller.subject_id.clone(),
            status: OrderStatus::Unpaid,
            recipient_name: caller.display_name.clone(),
            address: command.address.clone(),
            phone: command.phone_number.clone(),
            notes: command.notes.clone(),
            total,
            invoice: None,
            expires_at: created_at + payment_window,
            paid_at: None,
            created_at,
            created_by: caller.display_name.clone(),
            updated_at: None,
            updated_by: None,
        }
    }

    /// Attaches the processor invoice. Returns false if one is already set.
    pub fn attach_invoice(&mut self, invoice: Invoice) -> bool {
        if self.invoice.is_some() {
            return false;
        }
        self.invoice = Some(invoice);
        true
    }

    /// Records a confirmed payment.
    pub fn mark_paid(&mut self, paid_at: DateTime<Utc>, updated_by: &str, now: DateTime<Utc>) {
        self.status = OrderStatus::Paid;
        self.paid_at = Some(paid_at);
        self.updated_at = Some(now);
        self.updated_by = Some(updated_by.to_string());
    }

    pub fn is_owned_by(&self, customer_id: &CustomerId) -> bool {
        &self.customer_id == customer_id
    }
}

/// Immutable order line carrying its own price/name snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: LineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl OrderLine {
    /// `unit_price * quantity`, `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}
