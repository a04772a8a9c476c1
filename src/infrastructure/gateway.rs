//! Payment gateway adapters.
//!
//! `HttpPaymentGateway` speaks a hosted-checkout JSON API: a charge is
//! created with `POST {base}/payments` and returns a payment link; a charge
//! is verified with `GET {base}/transactions/{id}/verify`.
//! `SimulatedGateway` is used when no gateway is configured.

use crate::domain::ports::{Charge, ChargeRequest, PaymentGateway};
use crate::domain::transaction::Verdict;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub secret_key: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct PaymentLink {
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifiedCharge {
    status: String,
    #[serde(default)]
    tx_ref: Option<String>,
}

/// HTTP client for the hosted payment gateway.
#[derive(Clone)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl HttpPaymentGateway {
    /// Builds a client whose every request is bounded by `config.timeout`.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OrderError::Gateway(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn read<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<ApiResponse<T>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "Gateway rejected request");
            return Err(OrderError::Gateway(format!(
                "payment gateway returned HTTP {}",
                status.as_u16()
            )));
        }
        response.json::<ApiResponse<T>>().await.map_err(|e| {
            warn!(error = %e, "Malformed gateway response");
            OrderError::Gateway("malformed payment gateway response".to_string())
        })
    }
}

/// Transport errors carry the request URL, so only the log sees them.
fn transport_error(e: reqwest::Error) -> OrderError {
    warn!(error = %e, "Payment gateway request failed");
    OrderError::Gateway("payment gateway unavailable".to_string())
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge> {
        let body = serde_json::json!({
            "tx_ref": request.reference.as_str(),
            "amount": request.amount,
            "currency": request.currency.as_str(),
            "redirect_url": request.redirect_url,
            "payment_options": "card",
            "customer": {
                "id": request.customer.id,
                "email": request.customer.email,
                "name": request.customer.name,
            },
            "customizations": {
                "title": "Order Payment",
                "description": "Payment for items in cart",
            },
        });

        let response = self
            .client
            .post(format!("{}/payments", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let api: ApiResponse<PaymentLink> = Self::read(response).await?;
        debug!(status = %api.status, message = ?api.message, "Charge created");
        Ok(Charge {
            redirect_url: api.data.and_then(|d| d.link),
        })
    }

    async fn verify_charge(&self, charge_id: &str) -> Result<Verdict> {
        let response = self
            .client
            .get(format!("{}/transactions/{}/verify", self.base_url, charge_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport_error)?;

        let api: ApiResponse<VerifiedCharge> = Self::read(response).await?;
        let verdict = match api.data {
            Some(ref charge) if api.status == "success" && charge.status == "successful" => {
                Verdict::Success
            }
            _ => Verdict::Failure,
        };
        debug!(
            charge_id,
            tx_ref = ?api.data.as_ref().and_then(|c| c.tx_ref.as_deref()),
            ?verdict,
            "Charge verified"
        );
        Ok(verdict)
    }
}

/// Offline stand-in for the hosted gateway.
///
/// Charges "complete" instantly: the payer is sent straight back to the
/// request's redirect URL with the reference and a simulated charge id.
/// Verification fails for charge ids starting with `fail`, succeeds otherwise.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway;

impl SimulatedGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn create_charge(&self, request: ChargeRequest) -> Result<Charge> {
        if request.amount <= rust_decimal::Decimal::ZERO {
            return Err(OrderError::Gateway(
                "Amount must be greater than zero".to_string(),
            ));
        }
        info!(reference = %request.reference, amount = %request.amount, "Simulating charge creation");
        let separator = if request.redirect_url.contains('?') { '&' } else { '?' };
        Ok(Charge {
            redirect_url: Some(format!(
                "{}{}tx_ref={}&transaction_id=sim-{}",
                request.redirect_url, separator, request.reference, request.reference
            )),
        })
    }

    async fn verify_charge(&self, charge_id: &str) -> Result<Verdict> {
        let verdict = if charge_id.starts_with("fail") {
            Verdict::Failure
        } else {
            Verdict::Success
        };
        info!(charge_id, ?verdict, "Simulating charge verification");
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::UserId;
    use crate::domain::money::Currency;
    use crate::domain::ports::Customer;
    use crate::domain::transaction::GatewayReference;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    fn request() -> ChargeRequest {
        ChargeRequest {
            reference: GatewayReference::new("TX-42"),
            amount: dec!(25.00),
            currency: Currency::default(),
            redirect_url: "http://shop.test/payment/verify".to_string(),
            customer: Customer {
                id: UserId::new(),
                email: Some("ada@example.com".to_string()),
                name: None,
            },
        }
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn gateway(base_url: String, timeout: Duration) -> HttpPaymentGateway {
        HttpPaymentGateway::new(&GatewayConfig {
            base_url,
            secret_key: "sk_test".to_string(),
            timeout,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_charge_returns_link() {
        let router = Router::new().route(
            "/payments",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk_test");
                assert_eq!(body["tx_ref"], "TX-42");
                assert_eq!(body["currency"], "NGN");
                Json(json!({
                    "status": "success",
                    "message": "Hosted Link",
                    "data": { "link": "https://pay.test/abc" }
                }))
            }),
        );
        let gw = gateway(spawn(router).await, Duration::from_secs(5));

        let charge = gw.create_charge(request()).await.unwrap();
        assert_eq!(charge.redirect_url.as_deref(), Some("https://pay.test/abc"));
    }

    #[tokio::test]
    async fn test_create_charge_http_error_is_gateway_error() {
        let router = Router::new().route(
            "/payments",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        );
        let gw = gateway(spawn(router).await, Duration::from_secs(5));

        let err = gw.create_charge(request()).await.unwrap_err();
        assert!(matches!(err, OrderError::Gateway(ref m) if m.contains("401")));
        assert!(!err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn test_create_charge_without_link() {
        let router = Router::new().route(
            "/payments",
            post(|| async { Json(json!({ "status": "error", "data": null })) }),
        );
        let gw = gateway(spawn(router).await, Duration::from_secs(5));

        let charge = gw.create_charge(request()).await.unwrap();
        assert_eq!(charge.redirect_url, None);
    }

    #[tokio::test]
    async fn test_verify_charge_verdicts() {
        let router = Router::new().route(
            "/transactions/{id}/verify",
            get(|Path(id): Path<String>| async move {
                let status = if id == "100" { "successful" } else { "failed" };
                Json(json!({
                    "status": "success",
                    "data": { "status": status, "tx_ref": "TX-42" }
                }))
            }),
        );
        let gw = gateway(spawn(router).await, Duration::from_secs(5));

        assert_eq!(gw.verify_charge("100").await.unwrap(), Verdict::Success);
        assert_eq!(gw.verify_charge("200").await.unwrap(), Verdict::Failure);
    }

    #[tokio::test]
    async fn test_request_timeout_is_gateway_error() {
        let router = Router::new().route(
            "/payments",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({ "status": "success", "data": { "link": "late" } }))
            }),
        );
        let gw = gateway(spawn(router).await, Duration::from_millis(100));

        assert!(matches!(
            gw.create_charge(request()).await,
            Err(OrderError::Gateway(ref m)) if m == "payment gateway unavailable"
        ));
    }

    #[tokio::test]
    async fn test_simulated_gateway() {
        let gw = SimulatedGateway::new();
        let charge = gw.create_charge(request()).await.unwrap();
        assert_eq!(
            charge.redirect_url.as_deref(),
            Some("http://shop.test/payment/verify?tx_ref=TX-42&transaction_id=sim-TX-42")
        );
        assert_eq!(gw.verify_charge("12345").await.unwrap(), Verdict::Success);
        assert_eq!(gw.verify_charge("fail-1").await.unwrap(), Verdict::Failure);
    }
}
