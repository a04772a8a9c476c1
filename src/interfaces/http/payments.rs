use super::AppState;
use super::error::ApiResult;
use super::identity::Caller;
use super::orders::order_id;
use crate::application::webhook::{WebhookEvent, WebhookOutcome};
use crate::domain::ids::OrderId;
use crate::domain::transaction::GatewayReference;
use crate::error::OrderError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

/// Query string the gateway appends when redirecting the payer back.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(alias = "tx_ref")]
    pub reference: Option<String>,
    #[serde(alias = "transaction_id")]
    pub charge_id: Option<String>,
}

pub async fn initiate(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = order_id(&state, path)?;
    let initiation = state
        .coordinator
        .initiate_payment_as(id, caller.customer())
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Payment initiated",
        "gateway_reference": initiation.gateway_reference,
        "redirect_url": initiation.redirect_url,
    })))
}

pub async fn verify(
    State(state): State<AppState>,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| state.fail(OrderError::ValidationError(e.body_text())))?;
    let (Some(reference), Some(charge_id)) = (
        query.reference.filter(|r| !r.is_empty()),
        query.charge_id.filter(|c| !c.is_empty()),
    ) else {
        return Err(state.fail(OrderError::ValidationError(
            "reference and charge_id are required".to_string(),
        )));
    };

    let order = state
        .coordinator
        .verify_payment(&GatewayReference::new(reference), &charge_id)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Payment verified successfully",
        "order": order,
    })))
}

/// Gateway push notifications are acknowledged with 200 whatever the outcome.
pub async fn webhook(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let outcome = match serde_json::from_slice::<WebhookEvent>(&body) {
        Ok(event) => state.coordinator.handle_webhook(&event).await,
        Err(e) => {
            warn!(error = %e, "Unreadable webhook payload");
            WebhookOutcome::Failed
        }
    };

    let status = match outcome {
        WebhookOutcome::Failed => "error",
        WebhookOutcome::Reconciled | WebhookOutcome::Ignored => "success",
    };
    (StatusCode::OK, Json(json!({ "status": status })))
}
