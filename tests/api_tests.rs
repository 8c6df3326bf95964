/// HTTP API tests driven through the router without a listening socket
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use hoaxify::{
    config::ServerConfig,
    context::AppContext,
    db,
    server::build_router,
    testing::{self, MemoryFileStore, RecordingMailer},
};
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

struct TestApp {
    router: Router,
    ctx: AppContext,
    mailer: Arc<RecordingMailer>,
}

async fn create_test_app_with(config: ServerConfig) -> TestApp {
    let mailer = Arc::new(RecordingMailer::new());
    let ctx = AppContext::with_components(
        config,
        db::memory_pool().await.unwrap(),
        mailer.clone(),
        Arc::new(MemoryFileStore::new()),
    );

    TestApp {
        router: build_router(ctx.clone()),
        ctx,
        mailer,
    }
}

async fn create_test_app() -> TestApp {
    create_test_app_with(ServerConfig::for_data_directory(PathBuf::from("unused"))).await
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    async fn send_json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send_json(
            Method::POST,
            "/api/1.0/auth",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn register(&self, username: &str, email: &str) -> (StatusCode, Value) {
        self.send_json(
            Method::POST,
            "/api/1.0/users",
            json!({ "username": username, "email": email, "password": "P4ssword" }),
        )
        .await
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;

    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = create_test_app().await;

    let request = Request::get("/api/1.0/nothing").body(Body::empty()).unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_register_activate_login() {
    let app = create_test_app().await;

    let (status, body) = app.register("user1", "user1@mail.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User created");

    let (status, body) = app.login("user1@mail.com", "P4ssword").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "AccountInactive");

    let token = app.mailer.last_activation_token("user1@mail.com").unwrap();
    let request = Request::post(format!("/api/1.0/users/token/{}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.login("user1@mail.com", "P4ssword").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "user1");
    assert_eq!(body["token"].as_str().unwrap().len(), 32);
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = create_test_app().await;

    app.register("user1", "user1@mail.com").await;
    let (status, body) = app.register("user2", "user1@mail.com").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "AlreadyInUse");
}

#[tokio::test]
async fn test_register_email_failure_is_bad_gateway() {
    let app = create_test_app().await;
    app.mailer.set_failing(true);

    let (status, body) = app.register("user1", "user1@mail.com").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "EmailDeliveryFailure");
    assert_eq!(body["message"], "Email delivery failure");
}

#[tokio::test]
async fn test_activate_invalid_token() {
    let app = create_test_app().await;

    let request = Request::post("/api/1.0/users/token/abcdefg")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidToken");
}

#[tokio::test]
async fn test_login_failure_is_unauthorized() {
    let app = create_test_app().await;
    testing::seed_account(&app.ctx.account_db, "user1", "user1@mail.com", false)
        .await
        .unwrap();

    let (status, body) = app.login("user1@mail.com", "incorrectPwd").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AuthenticationFailure");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = create_test_app().await;
    testing::seed_account(&app.ctx.account_db, "user1", "user1@mail.com", false)
        .await
        .unwrap();
    let (_, body) = app.login("user1@mail.com", testing::SEED_PASSWORD).await;
    let token = body["token"].as_str().unwrap().to_string();

    let request = Request::post("/api/1.0/logout")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.ctx.sessions.verify(&token).await.is_err());

    // Logging out again, or without a token, still succeeds
    let request = Request::post("/api/1.0/logout")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.0, StatusCode::OK);

    let request = Request::post("/api/1.0/logout").body(Body::empty()).unwrap();
    assert_eq!(app.send(request).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = create_test_app().await;
    testing::seed_account(&app.ctx.account_db, "user1", "user1@mail.com", false)
        .await
        .unwrap();
    let (_, body) = app.login("user1@mail.com", testing::SEED_PASSWORD).await;
    let old_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .send_json(
            Method::POST,
            "/api/1.0/user/password",
            json!({ "email": "nobody@mail.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "UnknownEmail");

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/1.0/user/password",
            json!({ "email": "user1@mail.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let reset_token = app.mailer.last_reset_token("user1@mail.com").unwrap();

    let (status, body) = app
        .send_json(
            Method::PUT,
            "/api/1.0/user/password",
            json!({ "passwordResetToken": "wrong", "password": "N3wP4ssword" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "InvalidResetToken");

    let (status, _) = app
        .send_json(
            Method::PUT,
            "/api/1.0/user/password",
            json!({ "passwordResetToken": reset_token, "password": "N3wP4ssword" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(app.ctx.sessions.verify(&old_token).await.is_err());
    assert_eq!(app.login("user1@mail.com", testing::SEED_PASSWORD).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(app.login("user1@mail.com", "N3wP4ssword").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_upload_attachment() {
    let app = create_test_app().await;

    let request = Request::post("/api/1.0/hoaxes/attachments")
        .body(Body::from(PNG))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["id"].as_i64().is_some());
}

#[tokio::test]
async fn test_upload_unsupported_type() {
    let app = create_test_app().await;

    let request = Request::post("/api/1.0/hoaxes/attachments")
        .body(Body::from("plain text"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UnsupportedType");
}

#[tokio::test]
async fn test_upload_too_large() {
    let mut config = ServerConfig::for_data_directory(PathBuf::from("unused"));
    config.attachments.max_bytes = 16;
    let app = create_test_app_with(config).await;

    let mut payload = PNG.to_vec();
    payload.resize(64, 0);
    let request = Request::post("/api/1.0/hoaxes/attachments")
        .body(Body::from(payload))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "TooLarge");
}
