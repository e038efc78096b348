use axum::body::Body;
use axum::Router;
use flock_server::config::{AppState, ServerConfig};
use flock_server::token::TokenService;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn setup() -> (Router, AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig::with_base_dir(dir.path());
    let state = flock_server::init(config).await.unwrap();
    let app = flock_server::router(state.clone());
    (app, state, dir)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("jwt={token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn request_without_token_is_unauthorized() {
    let (app, _state, _dir) = setup().await;

    let response = app
        .oneshot(Request::builder().uri("/api/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_token_is_unauthorized() {
    let (app, _state, _dir) = setup().await;

    let response = app
        .oneshot(get_with_cookie("/api/auth/me", "not-a-real-token"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let (app, state, _dir) = setup().await;

    let user = state
        .auth
        .signup("alice", "Alice", "alice@example.com", "password123")
        .await
        .unwrap();

    let stale = TokenService::new(state.config.jwt_secret.as_bytes(), -1);
    let token = stale.issue(&user.id).unwrap();

    let response = app
        .oneshot(get_with_cookie("/api/auth/me", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_for_missing_user_is_not_found() {
    let (app, state, _dir) = setup().await;

    let token = state.tokens.issue("deleted-user-id").unwrap();

    let response = app
        .oneshot(get_with_cookie("/api/auth/me", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn valid_token_attaches_identity() {
    let (app, state, _dir) = setup().await;

    let user = state
        .auth
        .signup("alice", "Alice", "alice@example.com", "password123")
        .await
        .unwrap();
    let token = state.tokens.issue(&user.id).unwrap();

    let response = app
        .oneshot(get_with_cookie("/api/auth/me", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], json!(user.id));
    assert_eq!(body["username"], json!("alice"));
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn signup_sets_session_cookie() {
    let (app, _state, _dir) = setup().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            json!({
                "username": "alice",
                "full_name": "Alice",
                "email": "alice@example.com",
                "password": "password123"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn login_roundtrip_and_bad_credentials() {
    let (app, _state, _dir) = setup().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/signup",
            json!({
                "username": "alice",
                "full_name": "Alice",
                "email": "alice@example.com",
                "password": "password123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": "alice", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(header::SET_COOKIE));

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "username": "alice", "password": "wrong-password" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_cookie() {
    let (app, _state, _dir) = setup().await;

    let response = app
        .oneshot(json_request("POST", "/api/auth/logout", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("jwt=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn follow_toggle_over_http() {
    let (app, state, _dir) = setup().await;

    let alice = state
        .auth
        .signup("alice", "Alice", "alice@example.com", "password123")
        .await
        .unwrap();
    let bob = state
        .auth
        .signup("bob", "Bob", "bob@example.com", "password123")
        .await
        .unwrap();
    let token = state.tokens.issue(&alice.id).unwrap();

    let follow = |token: String, id: String| {
        Request::builder()
            .method("POST")
            .uri(format!("/api/users/follow/{id}"))
            .header(header::COOKIE, format!("jwt={token}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app
        .clone()
        .oneshot(follow(token.clone(), bob.id.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], json!("User followed successfully"));

    let response = app
        .clone()
        .oneshot(follow(token.clone(), bob.id.clone()))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["message"], json!("User unfollowed successfully"));

    // Self-follow over HTTP is a 400.
    let response = app
        .oneshot(follow(token, alice.id.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let (app, _state, _dir) = setup().await;

    let signup = json!({
        "username": "alice",
        "full_name": "Alice",
        "email": "alice@example.com",
        "password": "password123"
    });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/signup", signup.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request("POST", "/api/auth/signup", signup))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
