//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

use crate::order::CustomerId;

/// Role granted full read access to every order.
pub const ADMIN_ROLE: &str = "admin";

/// Identity of an already-authenticated caller.
///
/// Passed explicitly into every operation that needs it; nothing in the order
/// path reads identity from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub subject_id: CustomerId,
    pub display_name: String,
    pub role: String,
}

impl CallerIdentity {
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            subject_id: CustomerId::new(subject_id),
            display_name: display_name.into(),
            role: role.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case(ADMIN_ROLE)
    }
}
