//! Transactional storage for order placement.
//!
//! Exposes the three stores an order creation touches (the numbering
//! counters, the product catalog and the order tables) as one
//! [`OrderTransaction`] so that every write commits or rolls back together.
//! Two backends are provided: PostgreSQL for production and an in-memory
//! store for tests and local runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryOrderStore, InMemoryOrderTransaction};
pub use postgres::{PostgresOrderStore, PostgresOrderTransaction};
pub use store::{
    NumberingSequencer, OrderGateway, OrderStore, OrderTransaction, ProductSnapshotResolver,
};
