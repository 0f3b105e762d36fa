//! Payment completion reconciler.

use common::OrderId;
use domain::CompleteInvoice;
use order_store::{OrderGateway, OrderStore, OrderTransaction};

use crate::error::ReconcileError;

/// Actor recorded in `updated_by` for processor-driven updates.
pub const SYSTEM_ACTOR: &str = "System";

/// What a completion notification did to the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The order moved to `PAID`.
    Paid,
    /// The order was already `PAID`; nothing was written.
    AlreadyPaid,
}

impl CompletionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionOutcome::Paid => "paid",
            CompletionOutcome::AlreadyPaid => "already_paid",
        }
    }
}

/// Applies processor payment notifications to orders.
///
/// Processors deliver notifications at least once, so applying the same
/// notification twice must leave the order unchanged.
pub struct CompletionReconciler<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> CompletionReconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Marks the order behind `command.external_reference` as paid.
    #[tracing::instrument(skip_all, fields(external_reference = %command.external_reference))]
    pub async fn complete_invoice(
        &self,
        command: CompleteInvoice,
    ) -> Result<CompletionOutcome, ReconcileError> {
        let result = self.run(&command).await;

        let outcome = match &result {
            Ok(outcome) => outcome.as_str(),
            Err(ReconcileError::NotFound { .. }) => "not_found",
            Err(ReconcileError::Store(_)) => "error",
        };
        metrics::counter!("invoice_completions_total", "outcome" => outcome).increment(1);

        match &result {
            Ok(outcome) => tracing::info!(outcome = outcome.as_str(), "invoice completion applied"),
            Err(e @ ReconcileError::NotFound { .. }) => {
                tracing::warn!(error = %e, "invoice completion for unknown order")
            }
            Err(e) => tracing::error!(error = %e, "invoice completion failed"),
        }

        result
    }

    async fn run(&self, command: &CompleteInvoice) -> Result<CompletionOutcome, ReconcileError> {
        let not_found = || ReconcileError::NotFound {
            reference: command.external_reference.clone(),
        };

        // External references are order ids; anything else cannot match.
        let order_id = OrderId::parse(&command.external_reference).ok_or_else(not_found)?;

        let mut tx = self.store.begin().await?;
        let order = tx
            .find_order_by_external_reference(order_id)
            .await?
            .ok_or_else(not_found)?;

        if !order.status.awaits_payment() {
            tx.rollback().await?;
            return Ok(CompletionOutcome::AlreadyPaid);
        }

        tx.mark_order_paid(order.id, command.paid_at, SYSTEM_ACTOR)
            .await?;
        tx.commit().await?;
        Ok(CompletionOutcome::Paid)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use order_store::InMemoryOrderStore;

    #[tokio::test]
    async fn test_malformed_reference_is_not_found() {
        let store = InMemoryOrderStore::new();
        let reconciler = CompletionReconciler::new(store.clone());

        let result = reconciler
            .complete_invoice(CompleteInvoice::new("not-a-uuid", Utc::now()))
            .await;

        match result {
            Err(ReconcileError::NotFound { reference }) => assert_eq!(reference, "not-a-uuid"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expired_order_is_still_marked_paid() {
        use domain::{
            CallerIdentity, Money, Order, OrderNumber, OrderStatus, PlaceOrder, RequestedLine,
        };

        let store = InMemoryOrderStore::new();
        let command = PlaceOrder::new("addr", "0812", None, vec![RequestedLine::new("P1", 1)]);
        let mut order = Order::unpaid(
            OrderId::new(),
            OrderNumber::new(2026, 1),
            &CallerIdentity::new("U1", "Jane", "customer"),
            &command,
            Money::from_minor(100),
            Utc::now(),
            chrono::Duration::hours(24),
        );
        order.status = OrderStatus::Expired;
        let mut tx = store.begin().await.unwrap();
        tx.insert_order_header(&order).await.unwrap();
        tx.commit().await.unwrap();

        let reconciler = CompletionReconciler::new(store.clone());
        let first = reconciler
            .complete_invoice(CompleteInvoice::new(order.id.to_string(), Utc::now()))
            .await
            .unwrap();
        let second = reconciler
            .complete_invoice(CompleteInvoice::new(order.id.to_string(), Utc::now()))
            .await
            .unwrap();

        assert_eq!(first, CompletionOutcome::Paid);
        assert_eq!(second, CompletionOutcome::AlreadyPaid);
        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(CompletionOutcome::Paid.as_str(), "paid");
        assert_eq!(CompletionOutcome::AlreadyPaid.as_str(), "already_paid");
    }
}
