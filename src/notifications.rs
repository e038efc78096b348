//! Notification Module
//!
//! Records directed (actor, recipient, kind) events for follow and like
//! actions. `emit` takes a connection so the mutators can write the
//! notification inside the same transaction as the edge change. There is no
//! de-duplication: every like after an intervening unlike produces a fresh
//! notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::auth::{fetch_user_info, UserInfo};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationKind {
    Follow,
    Like,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: String,
    pub from: UserInfo,
    pub to: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

pub struct NotificationManager {
    pool: SqlitePool,
}

impl NotificationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Single policy point deciding whether an action notifies its
    /// recipient. Self-actions never do, regardless of kind.
    pub fn should_notify(_kind: NotificationKind, actor_id: &str, recipient_id: &str) -> bool {
        actor_id != recipient_id
    }

    /// Record a notification. Runs on the caller's connection so it can
    /// participate in the mutator's transaction.
    pub async fn emit(
        &self,
        conn: &mut SqliteConnection,
        from_id: &str,
        to_id: &str,
        kind: NotificationKind,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, from_id, to_id, kind, read, created_at) \
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(from_id)
        .bind(to_id)
        .bind(kind)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        info!("[Notifications] {:?}: {} -> {}", kind, from_id, to_id);
        Ok(())
    }

    /// Notifications addressed to a user, newest first. Fetching marks them
    /// all read.
    pub async fn list_for(&self, user_id: &str) -> Result<Vec<Notification>> {
        let rows: Vec<(String, String, String, NotificationKind, bool, DateTime<Utc>)> =
            sqlx::query_as(
                "SELECT id, from_id, to_id, kind, read, created_at FROM notifications \
                 WHERE to_id = ? ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for (id, from_id, to_id, kind, read, created_at) in rows {
            // Skip events whose actor has since disappeared.
            let Some(from) = fetch_user_info(&self.pool, &from_id).await? else {
                continue;
            };
            notifications.push(Notification {
                id,
                from,
                to: to_id,
                kind,
                read,
                created_at,
            });
        }

        sqlx::query("UPDATE notifications SET read = 1 WHERE to_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(notifications)
    }

    /// Delete all notifications addressed to a user
    pub async fn clear_for(&self, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM notifications WHERE to_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        info!("[Notifications] Cleared for {}", user_id);
        Ok(())
    }
}
