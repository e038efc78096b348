//! Notification handlers

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::Result;
use crate::notifications::Notification;

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Vec<Notification>>> {
    info!("GET /api/notifications - actor {}", ctx.user_id());

    let notifications = state.notifications.list_for(ctx.user_id()).await?;
    Ok(Json(notifications))
}

/// DELETE /api/notifications
pub async fn clear_notifications(
    State(state): State<AppState>,
    ctx: Ctx,
) -> Result<Json<Value>> {
    info!("DELETE /api/notifications - actor {}", ctx.user_id());

    state.notifications.clear_for(ctx.user_id()).await?;
    Ok(Json(json!({ "message": "Notifications deleted successfully" })))
}
