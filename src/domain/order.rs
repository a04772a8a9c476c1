use super::ids::{OrderId, ProductId, UserId};
use super::money::Amount;
use crate::error::OrderError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
        }
    }

    /// Statuses an administrator may set by hand. `failed` is reserved for
    /// payment reconciliation.
    pub fn is_administrable(&self) -> bool {
        !matches!(self, OrderStatus::Failed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::InvalidStatus(s.to_string()))
    }
}

/// A product line frozen at the price it had when the order was placed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LineItem {
    pub product: ProductId,
    pub quantity: u32,
    pub unit_price: Amount,
}

impl LineItem {
    pub fn subtotal(&self) -> Result<Decimal, OrderError> {
        self.unit_price.times(self.quantity)
    }
}

/// A customer order.
///
/// The total is computed once from the line items at construction and has
/// no setter; only the status changes afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: OrderId,
    pub owner: UserId,
    pub items: Vec<LineItem>,
    total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a pending order. Fails with `EmptyCart` when there are no items.
    pub fn new(owner: UserId, items: Vec<LineItem>) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        let total = items.iter().try_fold(Decimal::ZERO, |total, item| {
            total
                .checked_add(item.subtotal()?)
                .ok_or_else(|| OrderError::ValidationError("Order total is too large".to_string()))
        })?;
        Ok(Self {
            id: OrderId::new(),
            owner,
            items,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        })
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl FromStr for Role {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(OrderError::ValidationError(format!("Unknown role '{other}'"))),
        }
    }
}

/// The caller on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn customer(id: UserId) -> Self {
        Self {
            id,
            role: Role::Customer,
        }
    }

    pub fn admin(id: UserId) -> Self {
        Self {
            id,
            role: Role::Admin,
        }
    }

    pub fn is_privileged(&self) -> bool {
        self.role == Role::Admin
    }
}
