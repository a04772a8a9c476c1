use super::AppState;
use super::error::ApiResult;
use super::identity::Caller;
use crate::domain::ids::OrderId;
use crate::domain::order::OrderStatus;
use crate::error::OrderError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_TOP_LIMIT: usize = 3;
const MAX_TOP_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

/// Extracts a path order id, turning a malformed id into a validation error.
pub(super) fn order_id(
    state: &AppState,
    path: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<OrderId> {
    path.map(|Path(id)| id)
        .map_err(|e| state.fail(OrderError::ValidationError(e.body_text())))
}

pub async fn place_order(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let order = state
        .coordinator
        .checkout(caller.actor.id)
        .await
        .map_err(|e| state.fail(e))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Order created successfully",
            "order_id": order.id,
            "order": order,
        })),
    ))
}

pub async fn my_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let orders = state
        .coordinator
        .list_orders(caller.actor.id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(json!({ "status": "success", "orders": orders })))
}

pub async fn all_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<impl IntoResponse> {
    let orders = state
        .coordinator
        .list_all_orders(caller.actor)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(json!({ "status": "success", "orders": orders })))
}

pub async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<OrderId>, PathRejection>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = order_id(&state, path)?;
    if !caller.actor.is_privileged() {
        return Err(state.fail(OrderError::Forbidden(
            "only administrators may change order status".to_string(),
        )));
    }
    let Json(update) =
        body.map_err(|e| state.fail(OrderError::ValidationError(e.body_text())))?;
    let status: OrderStatus = update.status.parse().map_err(|e| state.fail(e))?;

    let order = state
        .coordinator
        .update_order_status(id, status, caller.actor)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Order status updated successfully",
        "order": order,
    })))
}

pub async fn cancel(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<OrderId>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = order_id(&state, path)?;
    let order = state
        .coordinator
        .cancel_order(id, caller.actor)
        .await
        .map_err(|e| state.fail(e))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Order cancelled successfully",
        "order": order,
    })))
}

pub async fn top_products(
    State(state): State<AppState>,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| state.fail(OrderError::ValidationError(e.body_text())))?;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT).min(MAX_TOP_LIMIT);

    let products = state
        .coordinator
        .top_purchased_products(limit)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(json!({ "status": "success", "products": products })))
}
