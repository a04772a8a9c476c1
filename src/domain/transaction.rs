use super::ids::{OrderId, TransactionId, UserId};
use super::money::Currency;
use super::order::{LineItem, Order, OrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Successful,
    Failed,
}

impl TransactionStatus {
    /// Terminal statuses never change again through reconciliation.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// The order status a terminal payment outcome implies.
    pub fn implied_order_status(&self) -> Option<OrderStatus> {
        match self {
            TransactionStatus::Pending => None,
            TransactionStatus::Successful => Some(OrderStatus::Processing),
            TransactionStatus::Failed => Some(OrderStatus::Failed),
        }
    }

    /// Order statuses this outcome may move an order out of. A success also
    /// recovers an order failed by an earlier attempt; anything further
    /// along belongs to fulfilment and is left alone.
    pub fn settles_from(&self) -> &'static [OrderStatus] {
        match self {
            TransactionStatus::Pending => &[],
            TransactionStatus::Successful => &[OrderStatus::Pending, OrderStatus::Failed],
            TransactionStatus::Failed => &[OrderStatus::Pending],
        }
    }
}

/// The gateway's determination for a charge.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    #[serde(alias = "successful")]
    Success,
    #[serde(alias = "failed")]
    Failure,
}

impl Verdict {
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            Verdict::Success => TransactionStatus::Successful,
            Verdict::Failure => TransactionStatus::Failed,
        }
    }
}

/// Locally generated token correlating one payment attempt with the
/// gateway's charge.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
#[serde(transparent)]
pub struct GatewayReference(String);

impl GatewayReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A verdict for one payment attempt, as delivered by a verification call,
/// a webhook, or a replayed event log.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct GatewayVerdict {
    pub reference: GatewayReference,
    pub verdict: Verdict,
}

/// A single payment attempt against an order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentTransaction {
    pub id: TransactionId,
    pub order: OrderId,
    pub owner: UserId,
    pub reference: GatewayReference,
    pub amount: Decimal,
    pub currency: Currency,
    pub items: Vec<LineItem>,
    pub payment_method: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Opens a pending attempt for the full order total.
    pub fn pending_for(order: &Order, reference: GatewayReference, currency: Currency) -> Self {
        Self {
            id: TransactionId::new(),
            order: order.id,
            owner: order.owner,
            reference,
            amount: order.total(),
            currency,
            items: order.items.clone(),
            payment_method: "gateway".to_string(),
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
