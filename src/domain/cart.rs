use super::ids::{ProductId, UserId};
use super::money::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct CartItem {
    pub product: ProductId,
    pub quantity: u32,
}

/// Read-only view of a customer's cart at checkout time.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct CartSnapshot {
    pub owner: UserId,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl CartSnapshot {
    pub fn empty(owner: UserId) -> Self {
        Self {
            owner,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(|item| item.quantity == 0)
    }
}

/// Catalog entry used to resolve the current unit price of a cart item.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Amount,
    #[serde(default)]
    pub stock: u32,
}
