use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_HEADER: &str = "x-user-id";

/// Owner of every row a request touches. Identity is asserted by the caller
/// through the `X-User-Id` header; verifying it is left to the fronting proxy.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?;

        Ok(Self { id: id.to_string() })
    }
}
