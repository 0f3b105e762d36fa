//! Shared identifier types for the order placement service.

mod types;

pub use types::{LineId, OrderId};
