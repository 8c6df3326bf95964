/// Attachment upload endpoint
use crate::{
    api::middleware::AuthenticatedUser,
    attachment::AttachmentUploadResponse,
    context::AppContext,
    error::{HoaxError, HoaxResult},
};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

/// Build attachment routes
///
/// The body limit sits one byte above the attachment limit so an oversized
/// upload reaches the service and is reported as `TooLarge`.
pub fn routes(max_bytes: usize) -> Router<AppContext> {
    Router::new()
        .route("/api/1.0/hoaxes/attachments", post(upload_attachment))
        .layer(DefaultBodyLimit::max(max_bytes.saturating_add(1)))
}

/// Upload raw attachment bytes
///
/// Authentication is optional; the uploader is only recorded in the logs.
async fn upload_attachment(
    State(ctx): State<AppContext>,
    user: Option<AuthenticatedUser>,
    body: Result<Bytes, BytesRejection>,
) -> HoaxResult<Json<AttachmentUploadResponse>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HoaxError::TooLarge {
                limit: ctx.config.attachments.max_bytes,
            }
        } else {
            HoaxError::Validation(rejection.body_text())
        }
    })?;

    let attachment = ctx.attachments.upload(&body).await?;

    tracing::info!(
        attachment_id = attachment.id,
        uploader = user.map(|u| u.account_id),
        "Attachment uploaded"
    );

    Ok(Json(AttachmentUploadResponse { id: attachment.id }))
}
