//! JSON error responses.
//!
//! Every error carries a machine-readable `kind` and a human-readable
//! `message`. The underlying error text is attached as `detail` only when
//! the server runs in diagnostic mode.

use crate::error::OrderError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Domain {
        error: OrderError,
        diagnostics: bool,
    },
    Unauthenticated(String),
}

impl ApiError {
    pub fn new(error: OrderError, diagnostics: bool) -> Self {
        Self::Domain { error, diagnostics }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Domain { error, .. } => match error {
                OrderError::EmptyCart
                | OrderError::InvalidStatus(_)
                | OrderError::PaymentDeclined(_)
                | OrderError::ValidationError(_)
                | OrderError::CsvError(_) => StatusCode::BAD_REQUEST,
                OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::Forbidden(_) => StatusCode::FORBIDDEN,
                OrderError::Conflict(_) => StatusCode::CONFLICT,
                OrderError::Gateway(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(error: OrderError) -> Self {
        Self::new(error, false)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Unauthenticated(message) => json!({
                "status": "error",
                "kind": "unauthenticated",
                "message": message,
            }),
            Self::Domain { error, diagnostics } => {
                let message = if error.is_internal() {
                    tracing::error!(error = %error, "Request failed");
                    "An error occurred".to_string()
                } else {
                    error.to_string()
                };
                let mut body = json!({
                    "status": "error",
                    "kind": error.kind(),
                    "message": message,
                });
                if *diagnostics {
                    body["detail"] = json!(format!("{error:?}"));
                }
                body
            }
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
