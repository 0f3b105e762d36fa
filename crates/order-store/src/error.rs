use common::OrderId;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
///
/// None of these are caller mistakes: every variant is a system fault from
/// the point of view of order placement.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The numbering module has no counter row. Counters must be pre-seeded.
    #[error("Numbering module '{module}' is not seeded")]
    NumberingNotSeeded { module: String },

    /// An order header with this id already exists.
    #[error("Order {0} already exists")]
    DuplicateOrder(OrderId),

    /// The order is missing or already carries an invoice.
    #[error("Cannot attach invoice to order {0}: order missing or invoice already set")]
    InvoiceNotAttachable(OrderId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// A stored row could not be mapped back to the domain model.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
