//! Post & engagement handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::Result;
use crate::posts::{LikeChange, Post};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub text: Option<String>,
    /// base64 / data-URI image payload
    pub img: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// POST /api/posts/create
pub async fn create_post(
    State(state): State<AppState>,
    ctx: Ctx,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    info!("POST /api/posts/create - actor {}", ctx.user_id());

    let post = state
        .posts
        .create_post(ctx.user_id(), req.text, req.img)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Ctx,
) -> Result<Json<Value>> {
    info!("DELETE /api/posts/{} - actor {}", id, ctx.user_id());

    state.posts.delete_post(ctx.user_id(), &id).await?;
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

/// POST /api/posts/like/{id}
pub async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Ctx,
) -> Result<Json<LikeChange>> {
    info!("POST /api/posts/like/{} - actor {}", id, ctx.user_id());

    let change = state.posts.toggle_like(ctx.user_id(), &id).await?;
    Ok(Json(change))
}

/// POST /api/posts/comment/{id}
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ctx: Ctx,
    Json(req): Json<CommentRequest>,
) -> Result<Json<Post>> {
    info!("POST /api/posts/comment/{} - actor {}", id, ctx.user_id());

    let post = state.posts.add_comment(ctx.user_id(), &id, &req.text).await?;
    Ok(Json(post))
}

/// GET /api/posts/all
pub async fn all_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>> {
    info!("GET /api/posts/all");

    let posts = state.posts.all_posts().await?;
    Ok(Json(posts))
}

/// GET /api/posts/following
pub async fn following_posts(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Vec<Post>>> {
    info!("GET /api/posts/following - actor {}", ctx.user_id());

    let posts = state.posts.following_posts(ctx.user_id()).await?;
    Ok(Json(posts))
}

/// GET /api/posts/user/{username}
pub async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<Post>>> {
    info!("GET /api/posts/user/{}", username);

    let posts = state.posts.user_posts(&username).await?;
    Ok(Json(posts))
}

/// GET /api/posts/likes/{id}
pub async fn liked_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Post>>> {
    info!("GET /api/posts/likes/{}", id);

    let posts = state.posts.liked_posts(&id).await?;
    Ok(Json(posts))
}
