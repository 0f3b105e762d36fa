//! Pricing of requested lines against catalog snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{LineId, OrderId};

use super::{Money, OrderError, OrderLine, ProductId, ProductSnapshot, Quantity, RequestedLine};

/// A requested line bound to its price/name snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: Quantity,
}

impl PricedLine {
    /// Turns the priced line into the row persisted for `order_id`.
    pub fn into_order_line(
        self,
        order_id: OrderId,
        created_at: DateTime<Utc>,
        created_by: &str,
    ) -> OrderLine {
        OrderLine {
            id: LineId::new(),
            order_id,
            product_id: self.product_id,
            product_name: self.product_name,
            unit_price: self.unit_price,
            quantity: self.quantity,
            created_at,
            created_by: created_by.to_string(),
        }
    }
}

/// Requested lines with their snapshots and the frozen order total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Prices the requested lines.
///
/// Every requested product must be present in `snapshots`; the first missing
/// one (in request order) is reported. Quantities are checked after product
/// existence, then the total is accumulated with overflow checks.
pub fn price_order(
    requested: &[RequestedLine],
    snapshots: &HashMap<ProductId, ProductSnapshot>,
) -> Result<PricedOrder, OrderError> {
    if requested.is_empty() {
        return Err(OrderError::NoLines);
    }

    if let Some(missing) = requested
        .iter()
        .find(|line| !snapshots.contains_key(&line.product_id))
    {
        return Err(OrderError::ProductNotFound {
            product_id: missing.product_id.clone(),
        });
    }

    let mut total = Money::zero();
    let mut lines = Vec::with_capacity(requested.len());
    for line in requested {
        let quantity = Quantity::new(line.quantity).ok_or_else(|| OrderError::InvalidQuantity {
            product_id: line.product_id.clone(),
            quantity: line.quantity,
        })?;
        let snapshot = &snapshots[&line.product_id];
        let line_total = snapshot
            .price
            .checked_multiply(quantity)
            .ok_or(OrderError::AmountOverflow)?;
        total = total
            .checked_add(line_total)
            .ok_or(OrderError::AmountOverflow)?;

        lines.push(PricedLine {
            product_id: line.product_id.clone(),
            product_name: snapshot.name.clone(),
            unit_price: snapshot.price,
            quantity,
        });
    }

    Ok(PricedOrder { lines, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> HashMap<ProductId, ProductSnapshot> {
        [
            ProductSnapshot::new("P1", "Kopi", Money::from_minor(100)),
            ProductSnapshot::new("P2", "Teh", Money::from_minor(250)),
        ]
        .into_iter()
        .map(|s| (s.product_id.clone(), s))
        .collect()
    }

    #[test]
    fn test_total_is_sum_of_line_totals() {
        let priced = price_order(
            &[RequestedLine::new("P1", 2), RequestedLine::new("P2", 1)],
            &catalog(),
        )
        .unwrap();

        assert_eq!(priced.total, Money::from_minor(450));
        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines[0].product_name, "Kopi");
        assert_eq!(priced.lines[0].quantity.get(), 2);
        assert_eq!(priced.lines[1].unit_price, Money::from_minor(250));
    }

    #[test]
    fn test_missing_product_is_named() {
        let err = price_order(
            &[RequestedLine::new("P1", 1), RequestedLine::new("P9", 1)],
            &catalog(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            OrderError::ProductNotFound { ref product_id } if product_id.as_str() == "P9"
        ));
    }

    #[test]
    fn test_missing_product_wins_over_bad_quantity() {
        let err = price_order(
            &[RequestedLine::new("P1", 0), RequestedLine::new("P9", 1)],
            &catalog(),
        )
        .unwrap_err();

        assert!(matches!(err, OrderError::ProductNotFound { .. }));
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        for quantity in [0, -1] {
            let err = price_order(&[RequestedLine::new("P1", quantity)], &catalog()).unwrap_err();
            assert!(matches!(
                err,
                OrderError::InvalidQuantity { quantity: q, .. } if q == quantity
            ));
        }
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let err = price_order(&[], &catalog()).unwrap_err();
        assert!(matches!(err, OrderError::NoLines));
    }

    #[test]
    fn test_overflow_is_rejected() {
        let mut snapshots = catalog();
        snapshots.insert(
            ProductId::new("BIG"),
            ProductSnapshot::new("BIG", "Gold bar", Money::from_minor(i64::MAX)),
        );

        let err = price_order(&[RequestedLine::new("BIG", 2)], &snapshots).unwrap_err();
        assert!(matches!(err, OrderError::AmountOverflow));
    }

    #[test]
    fn test_priced_line_becomes_order_line() {
        let priced = price_order(&[RequestedLine::new("P2", 3)], &catalog()).unwrap();
        let order_id = OrderId::new();
        let line = priced
            .lines
            .into_iter()
            .next()
            .unwrap()
            .into_order_line(order_id, Utc::now(), "Jane");

        assert_eq!(line.order_id, order_id);
        assert_eq!(line.product_name, "Teh");
        assert_eq!(line.line_total(), Some(Money::from_minor(750)));
        assert_eq!(line.created_by, "Jane");
    }
}
