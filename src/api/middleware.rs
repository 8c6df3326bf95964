/// Bearer token authentication
use crate::{context::AppContext, error::HoaxError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

/// Account resolved from a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub account_id: i64,
    pub token: String,
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolve the bearer token, if any, and attach the account to the request
///
/// Requests with a missing or unknown token continue unauthenticated; routes
/// that need an account reject them through the `AuthenticatedUser` extractor.
pub async fn authenticate(
    State(ctx): State<AppContext>,
    mut req: Request,
    next: Next,
) -> Result<Response, HoaxError> {
    if let Some(token) = extract_bearer_token(req.headers()) {
        match ctx.sessions.verify(&token).await {
            Ok(account_id) => {
                req.extensions_mut()
                    .insert(AuthenticatedUser { account_id, token });
            }
            Err(HoaxError::AuthenticationFailure) => {
                tracing::debug!("Ignoring unknown bearer token");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = HoaxError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(HoaxError::AuthenticationFailure)
    }
}
