//! Caller identity taken from headers set by the upstream authenticator.

use super::error::ApiError;
use crate::domain::ids::UserId;
use crate::domain::order::{Actor, Role};
use crate::domain::ports::Customer;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub actor: Actor,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Caller {
    pub fn customer(&self) -> Customer {
        Customer {
            id: self.actor.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id: UserId = header(parts, USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated("missing caller identity".to_string()))?
            .parse()
            .map_err(|_| ApiError::Unauthenticated("malformed caller identity".to_string()))?;

        let role = match header(parts, USER_ROLE_HEADER) {
            Some(raw) => raw
                .parse::<Role>()
                .map_err(|_| ApiError::Unauthenticated(format!("unknown role '{raw}'")))?,
            None => Role::Customer,
        };

        Ok(Self {
            actor: Actor { id, role },
            email: header(parts, USER_EMAIL_HEADER).map(String::from),
            name: header(parts, USER_NAME_HEADER).map(String::from),
        })
    }
}
