//! Command line and environment configuration.
//!
//! Every option can also be supplied through the environment (or a `.env`
//! file loaded at startup); explicit flags win.

use crate::application::coordinator::CoordinatorSettings;
use crate::domain::lifecycle::TransitionPolicy;
use crate::domain::money::Currency;
use crate::error::{OrderError, Result};
use crate::infrastructure::gateway::GatewayConfig;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, env = "APP_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Apply recorded gateway verdicts from a CSV file (`reference, verdict`)
    Replay {
        /// Input verdicts CSV file
        input: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "APP_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Base URL of the payment gateway API. Without it a simulated gateway is used.
    #[arg(long, env = "GATEWAY_BASE_URL", global = true)]
    pub gateway_url: Option<String>,

    #[arg(long, env = "GATEWAY_SECRET_KEY", global = true, hide_env_values = true)]
    pub gateway_secret: Option<String>,

    /// Seconds to wait for any gateway call
    #[arg(long, env = "GATEWAY_TIMEOUT_SECS", global = true, default_value_t = 10)]
    pub gateway_timeout_secs: u64,

    #[arg(long, env = "APP_CURRENCY", global = true, default_value = "NGN")]
    pub currency: String,

    /// Where the gateway sends the payer back after the charge page
    #[arg(
        long,
        env = "PAYMENT_REDIRECT_URL",
        global = true,
        default_value = "http://127.0.0.1:8080/payment/verify"
    )]
    pub redirect_url: String,

    /// Empty the customer's cart once an order is placed from it
    #[arg(long, env = "CLEAR_CART_ON_CHECKOUT", global = true)]
    pub clear_cart_on_checkout: bool,

    /// Only allow forward order status transitions
    #[arg(long, env = "STRICT_TRANSITIONS", global = true)]
    pub strict_transitions: bool,

    /// Include internal error detail in HTTP error responses
    #[arg(long, env = "APP_DIAGNOSTICS", global = true)]
    pub diagnostics: bool,

    /// JSON file with products and carts to load at startup
    #[arg(long, env = "APP_SEED", global = true)]
    pub seed: Option<PathBuf>,
}

impl Settings {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn coordinator_settings(&self) -> Result<CoordinatorSettings> {
        let transitions = if self.strict_transitions {
            TransitionPolicy::strict()
        } else {
            TransitionPolicy::permissive()
        };
        Ok(CoordinatorSettings {
            currency: Currency::new(&self.currency)?,
            redirect_url: self.redirect_url.clone(),
            gateway_timeout: self.gateway_timeout(),
            clear_cart_on_checkout: self.clear_cart_on_checkout,
            transitions,
        })
    }

    /// The hosted gateway configuration, or `None` when no gateway URL is set.
    pub fn gateway_config(&self) -> Result<Option<GatewayConfig>> {
        let Some(base_url) = self.gateway_url.clone() else {
            return Ok(None);
        };
        let secret_key = self
            .gateway_secret
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                OrderError::ValidationError(
                    "a gateway secret key is required when a gateway URL is set".to_string(),
                )
            })?;
        Ok(Some(GatewayConfig {
            base_url,
            secret_key,
            timeout: self.gateway_timeout(),
        }))
    }
}
