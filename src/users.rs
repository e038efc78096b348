//! User & Follow Graph Module
//!
//! Profile reads, profile updates, the follow/unfollow toggle, and follow
//! suggestions. A follow is a single `follows` row (actor -> target); both
//! the `following` and `followers` views are queries over that table, so the
//! two sides of the relationship cannot drift apart. Each toggle runs in one
//! transaction together with its notification.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::{fetch_user_info, user_from_row, UserInfo, UserRow, USER_COLUMNS};
use crate::error::{Error, Result};
use crate::media::MediaStore;
use crate::notifications::{NotificationKind, NotificationManager};

/// How many users the random sample draws before filtering.
const SUGGESTION_SAMPLE: i64 = 10;
/// How many suggestions are returned at most.
const SUGGESTION_LIMIT: usize = 4;

/// Which branch a follow toggle took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowChange {
    Followed,
    Unfollowed,
}

/// Public profile: user info plus both sides of the follow graph
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: UserInfo,
    pub following: Vec<String>,
    pub followers: Vec<String>,
}

/// Partial profile update; absent fields keep their current value
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub link: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    /// base64 / data-URI image payloads, not URLs
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
}

pub struct UserManager {
    pool: SqlitePool,
    notifications: Arc<NotificationManager>,
    media: Arc<MediaStore>,
}

impl UserManager {
    pub fn new(
        pool: SqlitePool,
        notifications: Arc<NotificationManager>,
        media: Arc<MediaStore>,
    ) -> Self {
        Self {
            pool,
            notifications,
            media,
        }
    }

    /// Follow or unfollow `target_id` depending on the current edge state.
    /// The edge change and the follow notification commit atomically.
    pub async fn toggle_follow(&self, actor_id: &str, target_id: &str) -> Result<FollowChange> {
        if actor_id == target_id {
            return Err(Error::InvalidOperation(
                "You can't follow/unfollow yourself".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        for id in [actor_id, target_id] {
            let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(Error::NotFound("User"));
            }
        }

        let edge: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?")
                .bind(actor_id)
                .bind(target_id)
                .fetch_optional(&mut *tx)
                .await?;

        if edge.is_some() {
            sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
                .bind(actor_id)
                .bind(target_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            info!("[Users] {} unfollowed {}", actor_id, target_id);
            Ok(FollowChange::Unfollowed)
        } else {
            sqlx::query("INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?)")
                .bind(actor_id)
                .bind(target_id)
                .bind(chrono::Utc::now())
                .execute(&mut *tx)
                .await?;

            if NotificationManager::should_notify(NotificationKind::Follow, actor_id, target_id) {
                self.notifications
                    .emit(&mut *tx, actor_id, target_id, NotificationKind::Follow)
                    .await?;
            }
            tx.commit().await?;

            info!("[Users] {} followed {}", actor_id, target_id);
            Ok(FollowChange::Followed)
        }
    }

    /// Ids of the users `user_id` follows
    pub async fn following_of(&self, user_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT followee_id FROM follows WHERE follower_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Ids of the users following `user_id`
    pub async fn followers_of(&self, user_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT follower_id FROM follows WHERE followee_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Random follow suggestions: a bounded sample excluding the actor,
    /// minus already-followed users, truncated to [`SUGGESTION_LIMIT`].
    pub async fn suggest_users(&self, actor_id: &str) -> Result<Vec<UserInfo>> {
        let following: HashSet<String> = self.following_of(actor_id).await?.into_iter().collect();

        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id != ? ORDER BY RANDOM() LIMIT ?"
        ))
        .bind(actor_id)
        .bind(SUGGESTION_SAMPLE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(user_from_row)
            .filter(|user| !following.contains(&user.id))
            .take(SUGGESTION_LIMIT)
            .map(UserInfo::from)
            .collect())
    }

    /// Public profile by username
    pub async fn get_profile(&self, username: &str) -> Result<UserProfile> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        let user = UserInfo::from(user_from_row(row.ok_or(Error::NotFound("User"))?));
        let following = self.following_of(&user.id).await?;
        let followers = self.followers_of(&user.id).await?;

        Ok(UserProfile {
            user,
            following,
            followers,
        })
    }

    /// Apply a partial profile update to the acting user
    pub async fn update_user(&self, actor_id: &str, changes: UpdateUser) -> Result<UserInfo> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(actor_id)
                .fetch_optional(&self.pool)
                .await?;
        let mut user = row.map(user_from_row).ok_or(Error::NotFound("User"))?;

        match (&changes.current_password, &changes.new_password) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::InvalidOperation(
                    "Please provide both current password and new password".to_string(),
                ));
            }
            (Some(current), Some(new)) => {
                if !bcrypt::verify(current, &user.password_hash)? {
                    return Err(Error::InvalidOperation(
                        "Current password is incorrect".to_string(),
                    ));
                }
                if new.len() < 6 {
                    return Err(Error::InvalidOperation(
                        "Password must be at least 6 characters long".to_string(),
                    ));
                }
                user.password_hash = bcrypt::hash(new, bcrypt::DEFAULT_COST)?;
            }
            (None, None) => {}
        }

        if let Some(username) = changes.username {
            let taken: Option<(String,)> =
                sqlx::query_as("SELECT id FROM users WHERE username = ? AND id != ?")
                    .bind(&username)
                    .bind(actor_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if taken.is_some() {
                return Err(Error::Conflict("Username is already taken".to_string()));
            }
            user.username = username;
        }
        if let Some(email) = changes.email {
            let taken: Option<(String,)> =
                sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
                    .bind(&email)
                    .bind(actor_id)
                    .fetch_optional(&self.pool)
                    .await?;
            if taken.is_some() {
                return Err(Error::Conflict("Email is already taken".to_string()));
            }
            user.email = email;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(bio) = changes.bio {
            user.bio = bio;
        }
        if let Some(link) = changes.link {
            user.link = link;
        }

        // Image replacement destroys the previous asset first; the stored
        // URL is the only reference to it.
        if let Some(payload) = changes.profile_img {
            if let Some(old) = &user.profile_img {
                self.media.destroy(MediaStore::asset_id(old)).await?;
            }
            user.profile_img = Some(self.media.upload(&payload).await?);
        }
        if let Some(payload) = changes.cover_img {
            if let Some(old) = &user.cover_img {
                self.media.destroy(MediaStore::asset_id(old)).await?;
            }
            user.cover_img = Some(self.media.upload(&payload).await?);
        }

        sqlx::query(
            "UPDATE users SET username = ?, email = ?, password_hash = ?, full_name = ?, \
             bio = ?, link = ?, profile_img = ?, cover_img = ? WHERE id = ?",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.bio)
        .bind(&user.link)
        .bind(&user.profile_img)
        .bind(&user.cover_img)
        .bind(actor_id)
        .execute(&self.pool)
        .await?;

        info!("[Users] Profile updated: {}", user.username);
        Ok(user.into())
    }

    /// Public user info by id
    pub async fn get_user(&self, user_id: &str) -> Result<UserInfo> {
        fetch_user_info(&self.pool, user_id)
            .await?
            .ok_or(Error::NotFound("User"))
    }
}
