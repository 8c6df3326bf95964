/// Login and logout endpoints
use crate::{
    account::{LoginRequest, LoginResponse, MessageResponse},
    api::middleware::extract_bearer_token,
    context::AppContext,
    error::HoaxResult,
};
use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};

/// Build authentication routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/1.0/auth", post(login))
        .route("/api/1.0/logout", post(logout))
}

async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> HoaxResult<Json<LoginResponse>> {
    let response = ctx.account_manager.login(&req.email, &req.password).await?;

    Ok(Json(response))
}

/// Always succeeds; the presented token is revoked if it exists
async fn logout(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
) -> HoaxResult<Json<MessageResponse>> {
    let token = extract_bearer_token(&headers);
    ctx.account_manager.logout(token.as_deref()).await?;

    Ok(Json(MessageResponse::new("Logout success")))
}
