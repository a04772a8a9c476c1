#![allow(dead_code)]

use async_trait::async_trait;
use orderflow::application::coordinator::{CoordinatorSettings, OrderCoordinator};
use orderflow::domain::cart::{CartItem, CartSnapshot, Product};
use orderflow::domain::ids::{OrderId, ProductId, UserId};
use orderflow::domain::money::Amount;
use orderflow::domain::order::{Order, OrderStatus};
use orderflow::domain::ports::{
    CartStore, Catalog, Charge, ChargeRequest, OrderStore, PaymentGateway, StatusChange,
};
use orderflow::domain::transaction::Verdict;
use orderflow::error::{OrderError, Result};
use orderflow::infrastructure::in_memory::{
    InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryTransactionStore,
};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the scripted gateway answers `create_charge`.
#[derive(Debug, Clone)]
pub enum ChargeScript {
    Link,
    NoLink,
    Fail(String),
    Hang,
}

#[derive(Debug)]
struct Script {
    charge: ChargeScript,
    verdict: Verdict,
    requests: Vec<ChargeRequest>,
}

/// Test double for the payment gateway whose answers are set by the test.
#[derive(Clone)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                charge: ChargeScript::Link,
                verdict: Verdict::Success,
                requests: Vec::new(),
            })),
        }
    }
}

impl ScriptedGateway {
    pub fn set_charge(&self, charge: ChargeScript) {
        self.script.lock().unwrap().charge = charge;
    }

    pub fn set_verdict(&self, verdict: Verdict) {
        self.script.lock().unwrap().verdict = verdict;
    }

    pub fn requests(&self) -> Vec<ChargeRequest> {
        self.script.lock().unwrap().requests.clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge> {
        let charge = {
            let mut script = self.script.lock().unwrap();
            script.requests.push(request.clone());
            script.charge.clone()
        };
        match charge {
            ChargeScript::Link => Ok(Charge {
                redirect_url: Some(format!("https://pay.test/{}", request.reference)),
            }),
            ChargeScript::NoLink => Ok(Charge { redirect_url: None }),
            ChargeScript::Fail(message) => Err(OrderError::Gateway(message)),
            ChargeScript::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Charge { redirect_url: None })
            }
        }
    }

    async fn verify_charge(&self, _charge_id: &str) -> Result<Verdict> {
        Ok(self.script.lock().unwrap().verdict)
    }
}

/// In-memory order store that counts the status writes that landed.
#[derive(Clone, Default)]
pub struct CountingOrderStore {
    inner: InMemoryOrderStore,
    writes: Arc<AtomicUsize>,
}

impl CountingOrderStore {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderStore for CountingOrderStore {
    async fn create(&self, order: Order) -> Result<()> {
        self.inner.create(order).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.inner.get(id).await
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        let updated = self.inner.update_status(id, status).await?;
        if updated.is_some() {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(updated)
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: &[OrderStatus],
        new: OrderStatus,
    ) -> Result<Option<StatusChange>> {
        let change = self.inner.transition_status(id, from, new).await?;
        if change.as_ref().is_some_and(|c| c.applied) {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(change)
    }

    async fn list_for_owner(&self, owner: UserId) -> Result<Vec<Order>> {
        self.inner.list_for_owner(owner).await
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        self.inner.list_all().await
    }
}

/// A coordinator over in-memory stores, with handles to every collaborator.
pub struct Fixture {
    pub coordinator: Arc<OrderCoordinator>,
    pub orders: CountingOrderStore,
    pub transactions: InMemoryTransactionStore,
    pub carts: InMemoryCartStore,
    pub catalog: InMemoryCatalog,
    pub gateway: ScriptedGateway,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_settings(CoordinatorSettings {
            gateway_timeout: Duration::from_millis(200),
            ..CoordinatorSettings::default()
        })
    }

    pub fn with_settings(settings: CoordinatorSettings) -> Self {
        let orders = CountingOrderStore::default();
        let transactions = InMemoryTransactionStore::new();
        let carts = InMemoryCartStore::new();
        let catalog = InMemoryCatalog::new();
        let gateway = ScriptedGateway::default();

        let coordinator = OrderCoordinator::new(
            Box::new(orders.clone()),
            Box::new(transactions.clone()),
            Box::new(carts.clone()),
            Box::new(catalog.clone()),
            Box::new(gateway.clone()),
        )
        .with_settings(settings);

        Self {
            coordinator: Arc::new(coordinator),
            orders,
            transactions,
            carts,
            catalog,
            gateway,
        }
    }

    pub async fn product(&self, name: &str, price: Decimal) -> ProductId {
        let id = ProductId::new();
        self.catalog
            .put(Product {
                id,
                name: name.to_string(),
                price: Amount::new(price).unwrap(),
                stock: 10,
            })
            .await
            .unwrap();
        id
    }

    /// Stores and returns a cart for `owner` holding `lines` of (product, quantity).
    pub async fn cart(&self, owner: UserId, lines: &[(ProductId, u32)]) -> CartSnapshot {
        let snapshot = CartSnapshot {
            owner,
            items: lines
                .iter()
                .map(|&(product, quantity)| CartItem { product, quantity })
                .collect(),
        };
        self.carts.put(snapshot.clone()).await.unwrap();
        snapshot
    }

    /// The reference scenario: 2 × 10.00 + 1 × 5.00 = 25.00.
    pub async fn scenario_cart(&self, owner: UserId) -> CartSnapshot {
        let mug = self.product("Mug", Decimal::new(1000, 2)).await;
        let pen = self.product("Pen", Decimal::new(500, 2)).await;
        self.cart(owner, &[(mug, 2), (pen, 1)]).await
    }
}
