//! HTTP adapter over the order coordinator.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//!
//! # Orders (caller identity required)
//! POST /orders                      - Place an order from the caller's cart
//! GET  /orders                      - The caller's orders
//! GET  /admin/orders                - All orders (admin)
//! PUT  /orders/{id}/status          - Set order status (admin)
//! PUT  /orders/{id}/cancel          - Cancel an order (owner or admin)
//!
//! # Payments
//! POST /orders/{id}/payment         - Start a payment attempt (owner)
//! GET  /payment/verify              - Gateway redirect target, verifies the charge
//! POST /payment/webhook             - Gateway event push, always acknowledged
//!
//! # Statistics
//! GET  /products/top                - Most purchased products
//! ```

pub mod error;
pub mod identity;
pub mod orders;
pub mod payments;

use crate::application::coordinator::OrderCoordinator;
use crate::error::OrderError;
use axum::Router;
use axum::routing::{get, post, put};
use error::ApiError;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<OrderCoordinator>,
    /// Attach internal error detail to error responses.
    pub diagnostics: bool,
}

impl AppState {
    pub fn new(coordinator: Arc<OrderCoordinator>, diagnostics: bool) -> Self {
        Self {
            coordinator,
            diagnostics,
        }
    }

    /// Wraps a domain error for the response, honouring diagnostic mode.
    pub fn fail(&self, error: OrderError) -> ApiError {
        ApiError::new(error, self.diagnostics)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/orders", post(orders::place_order).get(orders::my_orders))
        .route("/admin/orders", get(orders::all_orders))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/orders/{id}/cancel", put(orders::cancel))
        .route("/orders/{id}/payment", post(payments::initiate))
        .route("/payment/verify", get(payments::verify))
        .route("/payment/webhook", post(payments::webhook))
        .route("/products/top", get(orders::top_products))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
