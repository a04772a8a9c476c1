use super::reference;
use super::webhook::{WebhookEvent, WebhookOutcome};
use crate::domain::cart::CartSnapshot;
use crate::domain::ids::{OrderId, ProductId, UserId};
use crate::domain::lifecycle::TransitionPolicy;
use crate::domain::money::Currency;
use crate::domain::order::{Actor, LineItem, Order, OrderStatus};
use crate::domain::ports::{
    CartStoreBox, CatalogBox, ChargeRequest, Customer, OrderStoreBox, PaymentGatewayBox,
    TransactionStoreBox,
};
use crate::domain::transaction::{
    GatewayReference, GatewayVerdict, PaymentTransaction, TransactionStatus, Verdict,
};
use crate::error::{OrderError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Knobs that change coordinator behaviour without changing its contract.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub currency: Currency,
    /// Where the gateway sends the payer after the charge page.
    pub redirect_url: String,
    pub gateway_timeout: Duration,
    pub clear_cart_on_checkout: bool,
    pub transitions: TransitionPolicy,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            redirect_url: "http://127.0.0.1:8080/payment/verify".to_string(),
            gateway_timeout: Duration::from_secs(10),
            clear_cart_on_checkout: false,
            transitions: TransitionPolicy::permissive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentInitiation {
    pub gateway_reference: GatewayReference,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPurchases {
    pub product: ProductId,
    pub quantity: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub failed: usize,
}

/// Drives orders and payment attempts through their lifecycle.
///
/// Every collaborator is injected, so the stores and the gateway can be
/// swapped for persistent backends or test doubles. The coordinator holds no
/// mutable state of its own; concurrent reconciliations are resolved by the
/// transaction store's compare-and-set.
pub struct OrderCoordinator {
    orders: OrderStoreBox,
    transactions: TransactionStoreBox,
    carts: CartStoreBox,
    catalog: CatalogBox,
    gateway: PaymentGatewayBox,
    settings: CoordinatorSettings,
}

impl OrderCoordinator {
    pub fn new(
        orders: OrderStoreBox,
        transactions: TransactionStoreBox,
        carts: CartStoreBox,
        catalog: CatalogBox,
        gateway: PaymentGatewayBox,
    ) -> Self {
        Self {
            orders,
            transactions,
            carts,
            catalog,
            gateway,
            settings: CoordinatorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: CoordinatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Creates a pending order from a cart snapshot, pricing every line at
    /// the catalog's current price.
    ///
    /// The cart itself is left untouched.
    #[instrument(skip_all, fields(owner = %owner, lines = snapshot.items.len()))]
    pub async fn create_order(&self, snapshot: &CartSnapshot, owner: UserId) -> Result<Order> {
        if snapshot.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let mut items = Vec::with_capacity(snapshot.items.len());
        for item in snapshot.items.iter().filter(|item| item.quantity > 0) {
            let product = self
                .catalog
                .get(item.product)
                .await?
                .ok_or_else(|| OrderError::NotFound(format!("Product {}", item.product)))?;
            items.push(LineItem {
                product: product.id,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let order = Order::new(owner, items)?;
        self.orders.create(order.clone()).await?;
        info!(order_id = %order.id, total = %order.total(), "Order placed");
        Ok(order)
    }

    /// Places an order from the owner's stored cart.
    ///
    /// The cart is cleared afterwards only when `clear_cart_on_checkout` is set.
    pub async fn checkout(&self, owner: UserId) -> Result<Order> {
        let snapshot = self
            .carts
            .get_snapshot(owner)
            .await?
            .unwrap_or_else(|| CartSnapshot::empty(owner));
        let order = self.create_order(&snapshot, owner).await?;
        if self.settings.clear_cart_on_checkout {
            self.carts.clear(owner).await?;
            debug!(owner = %owner, "Cart cleared after checkout");
        }
        Ok(order)
    }

    pub async fn initiate_payment(
        &self,
        order_id: OrderId,
        requester: UserId,
    ) -> Result<PaymentInitiation> {
        let customer = Customer {
            id: requester,
            email: None,
            name: None,
        };
        self.initiate_payment_as(order_id, customer).await
    }

    /// Opens a payment attempt for an order and asks the gateway for a charge.
    ///
    /// The pending transaction is persisted before the gateway is contacted.
    /// If the gateway call fails or times out the transaction stays pending
    /// and the caller receives `Gateway`; nothing is retried here.
    #[instrument(skip_all, fields(order_id = %order_id, requester = %customer.id))]
    pub async fn initiate_payment_as(
        &self,
        order_id: OrderId,
        customer: Customer,
    ) -> Result<PaymentInitiation> {
        let order = self.load_order(order_id).await?;
        if !order.is_owned_by(customer.id) {
            return Err(OrderError::Forbidden(
                "order belongs to another user".to_string(),
            ));
        }

        let attempts = self.transactions.list_for_order(order.id).await?;
        if attempts
            .iter()
            .any(|t| t.status == TransactionStatus::Successful)
        {
            return Err(OrderError::Conflict(format!(
                "order {order_id} has already been paid"
            )));
        }

        let reference = reference::generate();
        let txn = PaymentTransaction::pending_for(
            &order,
            reference.clone(),
            self.settings.currency.clone(),
        );
        self.transactions.create(txn).await?;
        debug!(reference = %reference, "Pending transaction recorded");

        let request = ChargeRequest {
            reference: reference.clone(),
            amount: order.total(),
            currency: self.settings.currency.clone(),
            redirect_url: self.settings.redirect_url.clone(),
            customer,
        };
        let charge = self
            .with_gateway_timeout("create charge", self.gateway.create_charge(request))
            .await?;

        let redirect_url = charge
            .redirect_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                OrderError::Gateway("gateway returned no redirect target".to_string())
            })?;

        info!(reference = %reference, amount = %order.total(), "Payment initiated");
        Ok(PaymentInitiation {
            gateway_reference: reference,
            redirect_url,
        })
    }

    /// Applies a gateway verdict to the attempt identified by `reference`
    /// and to its order.
    ///
    /// Safe to call any number of times, from any number of tasks: only the
    /// caller whose compare-and-set moves the transaction out of `pending`
    /// performs the transition. Everyone else gets the order as it currently
    /// stands. A terminal transaction never changes again.
    ///
    /// A success for an order another attempt already paid is refused with
    /// `Conflict` and the attempt stays pending for an operator to refund.
    #[instrument(skip_all, fields(reference = %reference, verdict = ?verdict))]
    pub async fn reconcile(&self, reference: &GatewayReference, verdict: Verdict) -> Result<Order> {
        let txn = self.load_transaction(reference).await?;

        if txn.status.is_terminal() {
            debug!(status = ?txn.status, "Transaction already settled");
            return self.settle_order(&txn, txn.status, true).await;
        }

        let target = verdict.target_status();
        let won = self
            .transactions
            .compare_and_set_status(reference, TransactionStatus::Pending, target)
            .await?;

        if !won {
            let current = self.load_transaction(reference).await?;
            if current.status == TransactionStatus::Pending {
                warn!(order_id = %txn.order, "Successful charge on an order already paid by another attempt");
                return Err(OrderError::Conflict(format!(
                    "order {} has already been paid by another attempt",
                    txn.order
                )));
            }
            debug!(status = ?current.status, "Lost reconciliation race");
            return self.load_order(txn.order).await;
        }

        info!(status = ?target, order_id = %txn.order, "Transaction settled");
        self.settle_order(&txn, target, false).await
    }

    /// Moves the order to the status implied by a settled transaction.
    ///
    /// The write only lands while the order is in one of the statuses the
    /// outcome settles from, so the settling call and any later repair
    /// change the order at most once and never pull back fulfilment.
    /// Repairs use the recorded status, never the incoming verdict.
    async fn settle_order(
        &self,
        txn: &PaymentTransaction,
        settled: TransactionStatus,
        repair: bool,
    ) -> Result<Order> {
        let Some(target) = settled.implied_order_status() else {
            return self.load_order(txn.order).await;
        };

        if settled == TransactionStatus::Failed && self.has_other_success(txn).await? {
            debug!(order_id = %txn.order, "Order already paid by another attempt");
            return self.load_order(txn.order).await;
        }

        let change = self
            .orders
            .transition_status(txn.order, settled.settles_from(), target)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order {}", txn.order)))?;
        if change.applied && repair {
            warn!(order_id = %txn.order, status = %target, "Repaired order left behind its settled transaction");
        }
        Ok(change.order)
    }

    async fn has_other_success(&self, txn: &PaymentTransaction) -> Result<bool> {
        Ok(self
            .transactions
            .list_for_order(txn.order)
            .await?
            .iter()
            .any(|t| t.reference != txn.reference && t.status == TransactionStatus::Successful))
    }

    /// Client-initiated verification: asks the gateway for the verdict on
    /// `charge_id` and reconciles it against `reference`.
    ///
    /// Returns the order when the attempt ends up successful, and
    /// `PaymentDeclined` when it ends up failed.
    #[instrument(skip_all, fields(reference = %reference, charge_id = %charge_id))]
    pub async fn verify_payment(
        &self,
        reference: &GatewayReference,
        charge_id: &str,
    ) -> Result<Order> {
        self.load_transaction(reference).await?;

        let verdict = self
            .with_gateway_timeout("verify charge", self.gateway.verify_charge(charge_id))
            .await?;
        let order = self.reconcile(reference, verdict).await?;

        let settled = self.load_transaction(reference).await?;
        match settled.status {
            TransactionStatus::Failed => Err(OrderError::PaymentDeclined(
                "Payment verification failed".to_string(),
            )),
            _ => Ok(order),
        }
    }

    /// Gateway-initiated notification. Never fails: errors are logged and
    /// reported as `WebhookOutcome::Failed` so the caller can still
    /// acknowledge the delivery.
    #[instrument(skip_all, fields(event = %event.event))]
    pub async fn handle_webhook(&self, event: &WebhookEvent) -> WebhookOutcome {
        let Some(GatewayVerdict { reference, verdict }) = event.verdict() else {
            debug!("Webhook event carries no final verdict");
            return WebhookOutcome::Ignored;
        };

        match self.reconcile(&reference, verdict).await {
            Ok(order) => {
                info!(reference = %reference, order_status = %order.status, "Webhook reconciled");
                WebhookOutcome::Reconciled
            }
            Err(e) => {
                warn!(reference = %reference, error = %e, "Webhook reconciliation failed");
                WebhookOutcome::Failed
            }
        }
    }

    /// Operator sweep: applies a sequence of recorded verdicts. A bad row is
    /// logged and counted but does not stop the sweep.
    pub async fn replay<I>(&self, verdicts: I) -> ReplaySummary
    where
        I: IntoIterator<Item = Result<GatewayVerdict>>,
    {
        let mut summary = ReplaySummary::default();
        for record in verdicts {
            let outcome = match record {
                Ok(v) => self.reconcile(&v.reference, v.verdict).await.map(|_| ()),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => summary.applied += 1,
                Err(e) => {
                    warn!(error = %e, "Error replaying verdict");
                    summary.failed += 1;
                }
            }
        }
        info!(applied = summary.applied, failed = summary.failed, "Replay finished");
        summary
    }

    /// Administrative status change. Any of pending, processing, shipped,
    /// delivered or cancelled may be set, subject to the configured
    /// transition policy.
    #[instrument(skip_all, fields(order_id = %order_id, status = %new_status, actor = %actor.id))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        actor: Actor,
    ) -> Result<Order> {
        if !actor.is_privileged() {
            return Err(OrderError::Forbidden(
                "only administrators may change order status".to_string(),
            ));
        }
        if !new_status.is_administrable() {
            return Err(OrderError::InvalidStatus(new_status.to_string()));
        }

        let order = self.load_order(order_id).await?;
        self.settings.transitions.check(order.status, new_status)?;
        let updated = self.set_order_status(order_id, new_status).await?;
        info!(from = %order.status, "Order status updated");
        Ok(updated)
    }

    /// Cancels an order on behalf of its owner or an administrator.
    #[instrument(skip_all, fields(order_id = %order_id, actor = %actor.id))]
    pub async fn cancel_order(&self, order_id: OrderId, actor: Actor) -> Result<Order> {
        let order = self.load_order(order_id).await?;
        if !order.is_owned_by(actor.id) && !actor.is_privileged() {
            return Err(OrderError::Forbidden("Unauthorized".to_string()));
        }
        self.settings
            .transitions
            .check(order.status, OrderStatus::Cancelled)?;
        let updated = self.set_order_status(order_id, OrderStatus::Cancelled).await?;
        info!(from = %order.status, "Order cancelled");
        Ok(updated)
    }

    /// Orders placed by `owner`, newest first.
    pub async fn list_orders(&self, owner: UserId) -> Result<Vec<Order>> {
        let mut orders = self.orders.list_for_owner(owner).await?;
        newest_first(&mut orders);
        Ok(orders)
    }

    /// Every order in the store, newest first. Administrators only.
    pub async fn list_all_orders(&self, actor: Actor) -> Result<Vec<Order>> {
        if !actor.is_privileged() {
            return Err(OrderError::Forbidden(
                "only administrators may list all orders".to_string(),
            ));
        }
        let mut orders = self.orders.list_all().await?;
        newest_first(&mut orders);
        Ok(orders)
    }

    /// Products ranked by quantity bought through successful payments.
    pub async fn top_purchased_products(&self, limit: usize) -> Result<Vec<ProductPurchases>> {
        let mut counts: HashMap<ProductId, u64> = HashMap::new();
        for txn in self.transactions.list_all().await? {
            if txn.status != TransactionStatus::Successful {
                continue;
            }
            for item in &txn.items {
                *counts.entry(item.product).or_default() += u64::from(item.quantity);
            }
        }

        let mut ranking: Vec<ProductPurchases> = counts
            .into_iter()
            .map(|(product, quantity)| ProductPurchases { product, quantity })
            .collect();
        ranking.sort_by(|a, b| b.quantity.cmp(&a.quantity).then(a.product.cmp(&b.product)));
        ranking.truncate(limit);
        Ok(ranking)
    }

    async fn load_order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order {id}")))
    }

    async fn load_transaction(&self, reference: &GatewayReference) -> Result<PaymentTransaction> {
        self.transactions
            .get(reference)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Transaction {reference}")))
    }

    async fn set_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        self.orders
            .update_status(id, status)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order {id}")))
    }

    async fn with_gateway_timeout<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.settings.gateway_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(OrderError::Gateway(msg))) => {
                warn!(operation, error = %msg, "Gateway call failed");
                Err(OrderError::Gateway(msg))
            }
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Gateway call failed");
                Err(OrderError::Gateway("payment gateway unavailable".to_string()))
            }
            Err(_) => {
                warn!(operation, timeout = ?self.settings.gateway_timeout, "Gateway call timed out");
                Err(OrderError::Gateway(format!("{operation} timed out")))
            }
        }
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
