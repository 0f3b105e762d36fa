//! Order model, pricing and related types.

mod commands;
mod model;
mod number;
mod pricing;
mod state;
mod value_objects;

pub use commands::{CompleteInvoice, PlaceOrder, RequestedLine};
pub use model::{Invoice, Order, OrderLine, ProductSnapshot};
pub use number::OrderNumber;
pub use pricing::{PricedLine, PricedOrder, price_order};
pub use state::OrderStatus;
pub use value_objects::{CustomerId, Money, ProductId, Quantity};

use thiserror::Error;

/// Business-rule rejections raised while placing an order.
///
/// These are the caller's fault and never retried; everything else that can go
/// wrong during order creation is a system or payment gateway failure.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A requested product is not in the catalog, or is soft-deleted.
    #[error("Product {product_id} not found")]
    ProductNotFound { product_id: ProductId },

    /// Invalid quantity.
    #[error("Invalid quantity for product {product_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// Order has no lines.
    #[error("Order has no items")]
    NoLines,

    /// The order total does not fit the money representation.
    #[error("Order total is too large")]
    AmountOverflow,
}
