use super::order::OrderStatus;
use crate::error::OrderError;
use std::collections::HashSet;

/// Table of order status transitions that administrative updates and
/// cancellations may perform.
///
/// Payment reconciliation does not consult this table; it only ever moves a
/// pending order to `processing` or `failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPolicy {
    allowed: Option<HashSet<(OrderStatus, OrderStatus)>>,
}

impl TransitionPolicy {
    /// Any status may move to any other.
    pub fn permissive() -> Self {
        Self { allowed: None }
    }

    /// Orders only move forward through fulfilment; delivered, cancelled and
    /// failed orders are final.
    pub fn strict() -> Self {
        use OrderStatus::*;
        Self::from_pairs([
            (Pending, Processing),
            (Pending, Cancelled),
            (Processing, Shipped),
            (Processing, Cancelled),
            (Shipped, Delivered),
        ])
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (OrderStatus, OrderStatus)>) -> Self {
        Self {
            allowed: Some(pairs.into_iter().collect()),
        }
    }

    pub fn allows(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match &self.allowed {
            None => true,
            Some(pairs) => from == to || pairs.contains(&(from, to)),
        }
    }

    pub fn check(&self, from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(OrderError::InvalidStatus(format!(
                "cannot move order from {from} to {to}"
            )))
        }
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}
