/// Registration, activation and password reset endpoints
use crate::{
    account::{MessageResponse, PasswordResetRequest, PasswordUpdateRequest, RegisterRequest},
    context::AppContext,
    error::HoaxResult,
};
use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/1.0/users", post(register))
        .route("/api/1.0/users/token/:token", post(activate))
        .route(
            "/api/1.0/user/password",
            post(request_password_reset).put(confirm_password_reset),
        )
}

async fn register(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterRequest>,
) -> HoaxResult<Json<MessageResponse>> {
    ctx.activation
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok(Json(MessageResponse::new("User created")))
}

async fn activate(
    State(ctx): State<AppContext>,
    Path(token): Path<String>,
) -> HoaxResult<Json<MessageResponse>> {
    ctx.activation.activate(&token).await?;

    Ok(Json(MessageResponse::new("Account is activated")))
}

async fn request_password_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<PasswordResetRequest>,
) -> HoaxResult<Json<MessageResponse>> {
    ctx.password_reset.request(&req.email).await?;

    Ok(Json(MessageResponse::new(
        "Check your email for resetting your password",
    )))
}

async fn confirm_password_reset(
    State(ctx): State<AppContext>,
    Json(req): Json<PasswordUpdateRequest>,
) -> HoaxResult<Json<MessageResponse>> {
    ctx.password_reset
        .confirm(&req.password_reset_token, &req.password)
        .await?;

    Ok(Json(MessageResponse::new("Password updated")))
}
