//! Auth handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::AppendHeaders,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::middleware::SESSION_COOKIE;
use crate::auth::UserInfo;
use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::Result;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

type SetCookie = AppendHeaders<[(header::HeaderName, String); 1]>;

fn session_cookie(token: &str, max_age: i64) -> SetCookie {
    AppendHeaders([(
        header::SET_COOKIE,
        format!("{SESSION_COOKIE}={token}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Strict"),
    )])
}

fn clear_session_cookie() -> SetCookie {
    AppendHeaders([(
        header::SET_COOKIE,
        format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict"),
    )])
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, SetCookie, Json<UserInfo>)> {
    info!("POST /api/auth/signup - {}", req.username);

    let user = state
        .auth
        .signup(&req.username, &req.full_name, &req.email, &req.password)
        .await?;
    let token = state.tokens.issue(&user.id)?;

    Ok((
        StatusCode::CREATED,
        session_cookie(&token, state.tokens.ttl_seconds()),
        Json(user),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(SetCookie, Json<UserInfo>)> {
    info!("POST /api/auth/login - {}", req.username);

    let user = state.auth.login(&req.username, &req.password).await?;
    let token = state.tokens.issue(&user.id)?;

    Ok((session_cookie(&token, state.tokens.ttl_seconds()), Json(user)))
}

/// POST /api/auth/logout
///
/// Tokens cannot be revoked server-side; logging out just clears the
/// cookie.
pub async fn logout() -> (SetCookie, Json<Value>) {
    info!("POST /api/auth/logout");

    (
        clear_session_cookie(),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

/// GET /api/auth/me
pub async fn me(ctx: Ctx) -> Json<UserInfo> {
    Json(ctx.user().clone())
}
