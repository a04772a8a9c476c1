#![cfg(feature = "storage-rocksdb")]

mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::ScriptedGateway;
use orderflow::application::coordinator::OrderCoordinator;
use orderflow::domain::cart::{CartItem, CartSnapshot, Product};
use orderflow::domain::ids::{ProductId, UserId};
use orderflow::domain::money::Amount;
use orderflow::domain::order::OrderStatus;
use orderflow::domain::ports::{CartStore, Catalog, OrderStore, TransactionStore};
use orderflow::domain::transaction::TransactionStatus;
use orderflow::infrastructure::rocksdb::RocksDBStore;
use predicates::prelude::*;
use rust_decimal_macros::dec;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

fn coordinator(store: &RocksDBStore) -> OrderCoordinator {
    OrderCoordinator::new(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(ScriptedGateway::default()),
    )
}

#[tokio::test]
async fn test_replay_settles_attempts_recorded_by_earlier_run() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let owner = UserId::new();

    // 1. First process: place an order and open a payment attempt.
    let (order_id, reference) = {
        let store = RocksDBStore::open(&db_path).unwrap();
        let product = ProductId::new();
        Catalog::put(
            &store,
            Product {
                id: product,
                name: "Mug".to_string(),
                price: Amount::new(dec!(12.50)).unwrap(),
                stock: 3,
            },
        )
        .await
        .unwrap();
        CartStore::put(
            &store,
            CartSnapshot {
                owner,
                items: vec![CartItem {
                    product,
                    quantity: 2,
                }],
            },
        )
        .await
        .unwrap();

        let coordinator = coordinator(&store);
        let order = coordinator.checkout(owner).await.unwrap();
        assert_eq!(order.total(), dec!(25.00));
        let payment = coordinator.initiate_payment(order.id, owner).await.unwrap();
        (order.id, payment.gateway_reference)
    };

    // 2. Second process: the operator replays the gateway's verdict.
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "reference, verdict").unwrap();
    writeln!(csv, "{reference}, success").unwrap();

    let mut cmd = Command::new(cargo_bin!("orderflow"));
    cmd.arg("replay").arg(csv.path()).arg("--db-path").arg(&db_path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,0"));

    // 3. The settlement is visible after reopening.
    let store = RocksDBStore::open(&db_path).unwrap();
    let txn = TransactionStore::get(&store, &reference).await.unwrap().unwrap();
    assert_eq!(txn.status, TransactionStatus::Successful);
    assert_eq!(txn.amount, dec!(25.00));
    let order = OrderStore::get(&store, order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    assert!(store.get_snapshot(owner).await.unwrap().is_some());
}
