//! Human-facing order numbers.

use serde::{Deserialize, Serialize};

/// Display-only order number, `ORD-<year><8-digit sequence>`.
///
/// Built from the numbering counter value allocated inside the creating
/// transaction. Sequence values wider than eight digits are printed in full.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub const PREFIX: &'static str = "ORD-";

    pub fn new(year: i32, sequence: i64) -> Self {
        Self(format!("{}{year}{sequence:08}", Self::PREFIX))
    }

    /// Wraps a number read back from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
