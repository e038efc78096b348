//! User & follow graph handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::UserInfo;
use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::Result;
use crate::users::{FollowChange, UpdateUser, UserProfile};

/// GET /api/users/profile/{username}
pub async fn get_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserProfile>> {
    info!("GET /api/users/profile/{}", username);

    let profile = state.users.get_profile(&username).await?;
    Ok(Json(profile))
}

/// POST /api/users/follow/{id}
pub async fn follow_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Ctx,
) -> Result<Json<Value>> {
    info!("POST /api/users/follow/{} - actor {}", id, ctx.user_id());

    let change = state.users.toggle_follow(ctx.user_id(), &id).await?;
    let message = match change {
        FollowChange::Followed => "User followed successfully",
        FollowChange::Unfollowed => "User unfollowed successfully",
    };

    Ok(Json(json!({ "message": message })))
}

/// GET /api/users/suggested
pub async fn suggested_users(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Vec<UserInfo>>> {
    info!("GET /api/users/suggested - actor {}", ctx.user_id());

    let suggested = state.users.suggest_users(ctx.user_id()).await?;
    Ok(Json(suggested))
}

/// POST /api/users/update
pub async fn update_user(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(changes): Json<UpdateUser>,
) -> Result<Json<UserInfo>> {
    info!("POST /api/users/update - actor {}", ctx.user_id());

    let user = state.users.update_user(ctx.user_id(), changes).await?;
    Ok(Json(user))
}
