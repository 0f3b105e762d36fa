//! Domain layer for the order placement service.
//!
//! This crate provides the storage-independent pieces of order placement:
//! - Value objects (money, quantities, product and customer ids)
//! - The order header and line model with its status machine
//! - Order number formatting
//! - Pricing of requested lines against catalog snapshots

pub mod identity;
pub mod order;

pub use identity::CallerIdentity;
pub use order::{
    CompleteInvoice, CustomerId, Invoice, Money, Order, OrderError, OrderLine, OrderNumber,
    OrderStatus, PlaceOrder, PricedLine, PricedOrder, ProductId, ProductSnapshot, Quantity,
    RequestedLine, price_order,
};
