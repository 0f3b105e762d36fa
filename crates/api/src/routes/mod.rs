//! HTTP route handlers.

pub mod orders;
pub mod system;
pub mod webhooks;

use checkout::{CompletionReconciler, OrderOrchestrator};
use order_store::OrderStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub orchestrator: OrderOrchestrator<S>,
    pub reconciler: CompletionReconciler<S>,
    pub store: S,
    /// Expected `x-callback-token` on processor webhooks, if enforced.
    pub callback_token: Option<String>,
}
