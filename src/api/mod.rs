/// API routes and handlers
pub mod attachments;
pub mod auth;
pub mod middleware;
pub mod users;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes(max_attachment_bytes: usize) -> Router<AppContext> {
    Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(attachments::routes(max_attachment_bytes))
}
