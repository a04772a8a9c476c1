use crate::domain::cart::{CartSnapshot, Product};
use crate::domain::ids::{OrderId, ProductId, UserId};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{CartStore, Catalog, OrderStore, StatusChange, TransactionStore};
use crate::domain::transaction::{GatewayReference, PaymentTransaction, TransactionStatus};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for orders.
///
/// Uses `Arc<RwLock<HashMap<OrderId, Order>>>` to allow shared concurrent access.
/// Clones share the same underlying map.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(OrderError::Conflict(format!("order {} already exists", order.id)));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(&id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        new: OrderStatus,
    ) -> Result<Option<StatusChange>> {
        let mut orders = self.orders.write().await;
        Ok(orders.get_mut(&id).map(|order| {
            let applied = from.contains(&order.status);
            if applied {
                order.status = new;
            }
            StatusChange {
                order: order.clone(),
                applied,
            }
        }))
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|order| order.owner == owner)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.values().cloned().collect())
    }
}

/// A thread-safe in-memory store for payment attempts, keyed by gateway reference.
///
/// `compare_and_set_status` performs its checks and write under a single
/// write guard, so racing reconcilers are serialized per store.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<GatewayReference, PaymentTransaction>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, txn: PaymentTransaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(&txn.reference) {
            return Err(OrderError::Conflict(format!(
                "gateway reference {} already in use",
                txn.reference
            )));
        }
        transactions.insert(txn.reference.clone(), txn);
        Ok(())
    }

    async fn get(&self, reference: &GatewayReference) -> Result<Option<PaymentTransaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(reference).cloned())
    }

    async fn compare_and_set_status(
        &self,
        reference: &GatewayReference,
        expected: TransactionStatus,
        new: TransactionStatus,
    ) -> Result<bool> {
        let mut transactions = self.transactions.write().await;
        let Some(order) = transactions
            .get(reference)
            .filter(|txn| txn.status == expected)
            .map(|txn| txn.order)
        else {
            return Ok(false);
        };
        if new == TransactionStatus::Successful
            && transactions.values().any(|txn| {
                txn.order == order
                    && txn.reference != *reference
                    && txn.status == TransactionStatus::Successful
            })
        {
            return Ok(false);
        }
        if let Some(txn) = transactions.get_mut(reference) {
            txn.status = new;
        }
        Ok(true)
    }

    async fn list_for_order(&self, order: OrderId) -> Result<Vec<PaymentTransaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .filter(|txn| txn.order == order)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<PaymentTransaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.values().cloned().collect())
    }
}

/// In-memory carts keyed by owner.
#[derive(Default, Clone)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, CartSnapshot>>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_snapshot(&self, owner: UserId) -> Result<Option<CartSnapshot>> {
        Ok(self.carts.read().await.get(&owner).cloned())
    }

    async fn put(&self, snapshot: CartSnapshot) -> Result<()> {
        self.carts.write().await.insert(snapshot.owner, snapshot);
        Ok(())
    }

    async fn clear(&self, owner: UserId) -> Result<()> {
        self.carts.write().await.remove(&owner);
        Ok(())
    }
}

/// In-memory product catalog.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn get(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn put(&self, product: Product) -> Result<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Amount, Currency};
    use crate::domain::order::LineItem;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::new(
            UserId::new(),
            vec![LineItem {
                product: ProductId::new(),
                quantity: 1,
                unit_price: Amount::new(dec!(100.0)).unwrap(),
            }],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_order_store() {
        let store = InMemoryOrderStore::new();
        let order = order();

        store.create(order.clone()).await.unwrap();
        let retrieved = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(retrieved, order);

        assert!(store.get(OrderId::new()).await.unwrap().is_none());
        assert!(matches!(
            store.create(order.clone()).await,
            Err(OrderError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_in_memory_order_store_update_status() {
        let store = InMemoryOrderStore::new();
        let order = order();
        store.create(order.clone()).await.unwrap();

        let updated = store
            .update_status(order.id, OrderStatus::Shipped)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.total(), order.total());

        assert!(store
            .update_status(OrderId::new(), OrderStatus::Shipped)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_in_memory_order_store_transition_status() {
        let store = InMemoryOrderStore::new();
        let order = order();
        store.create(order.clone()).await.unwrap();

        let moved = store
            .transition_status(order.id, &[OrderStatus::Pending], OrderStatus::Processing)
            .await
            .unwrap()
            .unwrap();
        assert!(moved.applied);
        assert_eq!(moved.order.status, OrderStatus::Processing);

        let again = store
            .transition_status(order.id, &[OrderStatus::Pending], OrderStatus::Failed)
            .await
            .unwrap()
            .unwrap();
        assert!(!again.applied);
        assert_eq!(again.order.status, OrderStatus::Processing);

        assert!(store
            .transition_status(OrderId::new(), &[OrderStatus::Pending], OrderStatus::Failed)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_in_memory_order_store_list_for_owner() {
        let store = InMemoryOrderStore::new();
        let mine = order();
        let theirs = order();
        store.create(mine.clone()).await.unwrap();
        store.create(theirs).await.unwrap();

        let listed = store.list_for_owner(mine.owner).await.unwrap();
        assert_eq!(listed, vec![mine]);
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_transaction_store_cas() {
        let store = InMemoryTransactionStore::new();
        let order = order();
        let reference = GatewayReference::new("TX-1");
        let txn = PaymentTransaction::pending_for(&order, reference.clone(), Currency::default());

        store.create(txn.clone()).await.unwrap();
        assert_eq!(store.get(&reference).await.unwrap().unwrap(), txn);

        let first = store
            .compare_and_set_status(
                &reference,
                TransactionStatus::Pending,
                TransactionStatus::Successful,
            )
            .await
            .unwrap();
        let second = store
            .compare_and_set_status(
                &reference,
                TransactionStatus::Pending,
                TransactionStatus::Failed,
            )
            .await
            .unwrap();
        assert!(first);
        assert!(!second);
        assert_eq!(
            store.get(&reference).await.unwrap().unwrap().status,
            TransactionStatus::Successful
        );

        let unknown = GatewayReference::new("TX-unknown");
        assert!(!store
            .compare_and_set_status(
                &unknown,
                TransactionStatus::Pending,
                TransactionStatus::Failed
            )
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_in_memory_transaction_store_one_success_per_order() {
        let store = InMemoryTransactionStore::new();
        let order = order();
        let first = GatewayReference::new("TX-a");
        let second = GatewayReference::new("TX-b");
        for reference in [&first, &second] {
            store
                .create(PaymentTransaction::pending_for(&order, reference.clone(), Currency::default()))
                .await
                .unwrap();
        }

        assert!(store
            .compare_and_set_status(&first, TransactionStatus::Pending, TransactionStatus::Successful)
            .await
            .unwrap());
        assert!(!store
            .compare_and_set_status(&second, TransactionStatus::Pending, TransactionStatus::Successful)
            .await
            .unwrap());
        assert_eq!(
            store.get(&second).await.unwrap().unwrap().status,
            TransactionStatus::Pending
        );

        // Failing the sibling is still allowed.
        assert!(store
            .compare_and_set_status(&second, TransactionStatus::Pending, TransactionStatus::Failed)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_in_memory_transaction_store_rejects_duplicate_reference() {
        let store = InMemoryTransactionStore::new();
        let order = order();
        let reference = GatewayReference::new("TX-dup");
        let txn = PaymentTransaction::pending_for(&order, reference.clone(), Currency::default());
        store.create(txn.clone()).await.unwrap();

        let mut again = txn;
        again.id = crate::domain::ids::TransactionId::new();
        assert!(matches!(store.create(again).await, Err(OrderError::Conflict(_))));
        assert_eq!(store.list_for_order(order.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_cart_store() {
        let store = InMemoryCartStore::new();
        let owner = UserId::new();
        assert!(store.get_snapshot(owner).await.unwrap().is_none());

        let mut cart = CartSnapshot::empty(owner);
        cart.items.push(crate::domain::cart::CartItem {
            product: ProductId::new(),
            quantity: 2,
        });
        store.put(cart.clone()).await.unwrap();
        assert_eq!(store.get_snapshot(owner).await.unwrap(), Some(cart));

        store.clear(owner).await.unwrap();
        assert!(store.get_snapshot(owner).await.unwrap().is_none());
    }
}
