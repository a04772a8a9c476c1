use crate::domain::cart::{CartSnapshot, Product};
use crate::domain::ids::{OrderId, ProductId, UserId};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{CartStore, Catalog, OrderStore, StatusChange, TransactionStore};
use crate::domain::transaction::{GatewayReference, PaymentTransaction, TransactionStatus};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for storing payment attempts, keyed by gateway reference.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for storing cart snapshots, keyed by owner.
pub const CF_CARTS: &str = "carts";
/// Column Family for storing catalog products.
pub const CF_PRODUCTS: &str = "products";

/// A persistent store implementation using RocksDB.
///
/// Handles storage for orders, transactions, carts and products using
/// separate Column Families. Values are JSON encoded.
///
/// Read-check-write sequences (status updates, compare-and-set, unique
/// inserts) run under a shared mutex, which makes them atomic for every
/// handle cloned from the same `open` call.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that all required column families exist.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ORDERS, CF_TRANSACTIONS, CF_CARTS, CF_PRODUCTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| OrderError::internal(format!("{name} column family not found")))
    }

    fn put_json<T: Serialize>(&self, cf: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key, bytes)?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_pinned_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn exists(&self, cf: &str, key: &[u8]) -> Result<bool> {
        Ok(self.db.get_pinned_cf(self.cf(cf)?, key)?.is_some())
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn create(&self, order: Order) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = order.id.as_uuid().as_bytes();
        if self.exists(CF_ORDERS, key)? {
            return Err(OrderError::Conflict(format!("order {} already exists", order.id)));
        }
        self.put_json(CF_ORDERS, key, &order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.get_json(CF_ORDERS, id.as_uuid().as_bytes())
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let _guard = self.write_lock.lock().await;
        let key = id.as_uuid().as_bytes();
        let Some(mut order) = self.get_json::<Order>(CF_ORDERS, key)? else {
            return Ok(None);
        };
        order.status = status;
        self.put_json(CF_ORDERS, key, &order)?;
        Ok(Some(order))
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        new: OrderStatus,
    ) -> Result<Option<StatusChange>> {
        let _guard = self.write_lock.lock().await;
        let key = id.as_uuid().as_bytes();
        let Some(mut order) = self.get_json::<Order>(CF_ORDERS, key)? else {
            return Ok(None);
        };
        let applied = from.contains(&order.status);
        if applied {
            order.status = new;
            self.put_json(CF_ORDERS, key, &order)?;
        }
        Ok(Some(StatusChange { order, applied }))
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Order>> {
        Ok(self
            .scan_json::<Order>(CF_ORDERS)?
            .into_iter()
            .filter(|order| order.owner == owner)
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        self.scan_json(CF_ORDERS)
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn create(&self, txn: PaymentTransaction) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let key = txn.reference.as_str().as_bytes();
        if self.exists(CF_TRANSACTIONS, key)? {
            return Err(OrderError::Conflict(format!(
                "gateway reference {} already in use",
                txn.reference
            )));
        }
        self.put_json(CF_TRANSACTIONS, key, &txn)
    }

    async fn get(&self, reference: &GatewayReference) -> Result<Option<PaymentTransaction>> {
        self.get_json(CF_TRANSACTIONS, reference.as_str().as_bytes())
    }

    async fn compare_and_set_status(
        &self,
        reference: &GatewayReference,
        expected: TransactionStatus,
        new: TransactionStatus,
    ) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = reference.as_str().as_bytes();
        let Some(mut txn) = self
            .get_json::<PaymentTransaction>(CF_TRANSACTIONS, key)?
            .filter(|txn| txn.status == expected)
        else {
            return Ok(false);
        };
        if new == TransactionStatus::Successful {
            let paid = self
                .scan_json::<PaymentTransaction>(CF_TRANSACTIONS)?
                .into_iter()
                .any(|other| {
                    other.order == txn.order
                        && other.reference != txn.reference
                        && other.status == TransactionStatus::Successful
                });
            if paid {
                return Ok(false);
            }
        }
        txn.status = new;
        self.put_json(CF_TRANSACTIONS, key, &txn)?;
        Ok(true)
    }

    async fn list_for_order(&self, order: OrderId) -> Result<Vec<PaymentTransaction>> {
        Ok(self
            .scan_json::<PaymentTransaction>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|txn| txn.order == order)
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<PaymentTransaction>> {
        self.scan_json(CF_TRANSACTIONS)
    }
}

#[async_trait]
impl CartStore for RocksDBStore {
    async fn get_snapshot(&self, owner: UserId) -> Result<Option<CartSnapshot>> {
        self.get_json(CF_CARTS, owner.as_uuid().as_bytes())
    }

    async fn put(&self, snapshot: CartSnapshot) -> Result<()> {
        self.put_json(CF_CARTS, snapshot.owner.as_uuid().as_bytes(), &snapshot)
    }

    async fn clear(&self, owner: UserId) -> Result<()> {
        self.db
            .delete_cf(self.cf(CF_CARTS)?, owner.as_uuid().as_bytes())?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for RocksDBStore {
    async fn get(&self, id: ProductId) -> Result<Option<Product>> {
        self.get_json(CF_PRODUCTS, id.as_uuid().as_bytes())
    }

    async fn put(&self, product: Product) -> Result<()> {
        self.put_json(CF_PRODUCTS, product.id.as_uuid().as_bytes(), &product)
    }
}
