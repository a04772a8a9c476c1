use clap::Parser;
use miette::{IntoDiagnostic, Result};
use orderflow::application::coordinator::OrderCoordinator;
use orderflow::config::{Cli, Command, Settings};
use orderflow::domain::ports::{
    CartStoreBox, CatalogBox, OrderStoreBox, PaymentGatewayBox, TransactionStoreBox,
};
use orderflow::infrastructure::gateway::{HttpPaymentGateway, SimulatedGateway};
use orderflow::infrastructure::in_memory::{
    InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryTransactionStore,
};
use orderflow::interfaces::csv::verdict_reader::VerdictReader;
use orderflow::interfaces::http::{AppState, router};
use orderflow::interfaces::seed::SeedData;
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

struct Stores {
    orders: OrderStoreBox,
    transactions: TransactionStoreBox,
    carts: CartStoreBox,
    catalog: CatalogBox,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();

    let stores = open_stores(cli.settings.db_path.as_deref())?;

    match cli.command {
        Command::Serve { bind } => {
            let coordinator = build_coordinator(&cli.settings, stores).await?;
            let state = AppState::new(Arc::new(coordinator), cli.settings.diagnostics);

            let listener = tokio::net::TcpListener::bind(bind)
                .await
                .into_diagnostic()?;
            info!(%bind, "Listening");
            axum::serve(listener, router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .into_diagnostic()?;
        }
        Command::Replay { input } => {
            let coordinator = build_coordinator(&cli.settings, stores).await?;
            let file = File::open(input).into_diagnostic()?;
            let summary = coordinator
                .replay(VerdictReader::new(file).verdicts())
                .await;
            println!("applied,failed");
            println!("{},{}", summary.applied, summary.failed);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("orderflow=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn in_memory_stores() -> Stores {
    Stores {
        orders: Box::new(InMemoryOrderStore::new()),
        transactions: Box::new(InMemoryTransactionStore::new()),
        carts: Box::new(InMemoryCartStore::new()),
        catalog: Box::new(InMemoryCatalog::new()),
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    use orderflow::infrastructure::rocksdb::RocksDBStore;

    let Some(db_path) = db_path else {
        return Ok(in_memory_stores());
    };
    let store = RocksDBStore::open(db_path).into_diagnostic()?;
    info!(path = %db_path.display(), "Using RocksDB storage");
    Ok(Stores {
        orders: Box::new(store.clone()),
        transactions: Box::new(store.clone()),
        carts: Box::new(store.clone()),
        catalog: Box::new(store),
    })
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<&Path>) -> Result<Stores> {
    if db_path.is_some() {
        warn!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

async fn build_coordinator(settings: &Settings, stores: Stores) -> Result<OrderCoordinator> {
    if let Some(seed) = &settings.seed {
        let file = File::open(seed).into_diagnostic()?;
        SeedData::from_reader(file)
            .into_diagnostic()?
            .load_into(stores.catalog.as_ref(), stores.carts.as_ref())
            .await
            .into_diagnostic()?;
    }

    let gateway: PaymentGatewayBox = match settings.gateway_config().into_diagnostic()? {
        Some(config) => {
            info!(base_url = %config.base_url, "Using hosted payment gateway");
            Box::new(HttpPaymentGateway::new(&config).into_diagnostic()?)
        }
        None => {
            warn!("No payment gateway configured, using the simulated gateway");
            Box::new(SimulatedGateway::new())
        }
    };

    Ok(OrderCoordinator::new(
        stores.orders,
        stores.transactions,
        stores.carts,
        stores.catalog,
        gateway,
    )
    .with_settings(settings.coordinator_settings().into_diagnostic()?))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
