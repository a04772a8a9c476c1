use super::cart::{CartSnapshot, Product};
use super::ids::{OrderId, ProductId, UserId};
use super::money::Currency;
use super::order::{Order, OrderStatus};
use super::transaction::{GatewayReference, PaymentTransaction, TransactionStatus, Verdict};
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: Order) -> Result<()>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;
    /// Overwrites the status field only. Returns the updated order, or
    /// `None` when the order does not exist.
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>>;
    /// Sets `new` only if the stored status is one of `from`, checking and
    /// writing atomically. Returns `None` when the order does not exist.
    async fn transition_status(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        new: OrderStatus,
    ) -> Result<Option<StatusChange>>;
    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Order>>;
    async fn list_all(&self) -> Result<Vec<Order>>;
}

/// Result of a conditional order status write.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    /// The order as stored after the call.
    pub order: Order,
    pub applied: bool,
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, txn: PaymentTransaction) -> Result<()>;
    async fn get(&self, reference: &GatewayReference) -> Result<Option<PaymentTransaction>>;
    /// Atomically sets `new` if the stored status equals `expected`.
    ///
    /// Returns `false` when the status did not match or the transaction is
    /// unknown. Exactly one of several concurrent callers with the same
    /// `expected` value observes `true`.
    ///
    /// Setting `Successful` also returns `false` while another transaction
    /// of the same order is already successful, so an order is paid at most
    /// once.
    async fn compare_and_set_status(
        &self,
        reference: &GatewayReference,
        expected: TransactionStatus,
        new: TransactionStatus,
    ) -> Result<bool>;
    async fn list_for_order(&self, order: OrderId) -> Result<Vec<PaymentTransaction>>;
    async fn list_all(&self) -> Result<Vec<PaymentTransaction>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_snapshot(&self, owner: UserId) -> Result<Option<CartSnapshot>>;
    async fn put(&self, snapshot: CartSnapshot) -> Result<()>;
    async fn clear(&self, owner: UserId) -> Result<()>;
}

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get(&self, id: ProductId) -> Result<Option<Product>>;
    async fn put(&self, product: Product) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub reference: GatewayReference,
    pub amount: Decimal,
    pub currency: Currency,
    pub redirect_url: String,
    pub customer: Customer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charge {
    /// Where the payer completes the charge; `None` if the gateway omitted it.
    pub redirect_url: Option<String>,
}

/// External payment processor. Both calls are fallible network requests.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge>;
    async fn verify_charge(&self, charge_id: &str) -> Result<Verdict>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type CartStoreBox = Box<dyn CartStore>;
pub type CatalogBox = Box<dyn Catalog>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
