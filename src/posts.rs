//! Post & Engagement Module
//!
//! Post creation/deletion, the like/unlike toggle, comments, and feed
//! queries. A like is a single `post_likes` row; the like set returned by
//! the toggle is re-queried after commit so the response always matches the
//! persisted state. Like toggles and their notifications commit in one
//! transaction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{fetch_user_info, UserInfo};
use crate::error::{Error, Result};
use crate::media::MediaStore;
use crate::notifications::{NotificationKind, NotificationManager};

/// Hydrated post as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub user: UserInfo,
    pub text: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<String>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub id: String,
    pub user: UserInfo,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a like toggle: which way it flipped and the persisted like set
#[derive(Debug, Clone, Serialize)]
pub struct LikeChange {
    pub liked: bool,
    pub likes: Vec<String>,
}

type PostRow = (String, String, Option<String>, Option<String>, DateTime<Utc>);

pub struct PostManager {
    pool: SqlitePool,
    notifications: Arc<NotificationManager>,
    media: Arc<MediaStore>,
}

impl PostManager {
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

    /// Create a post with text, an image payload (base64 / data-URI), or
    /// both.
    pub async fn create_post(
        &self,
        actor_id: &str,
        text: Option<String>,
        img: Option<String>,
    ) -> Result<Post> {
        let author = fetch_user_info(&self.pool, actor_id)
            .await?
            .ok_or(Error::NotFound("User"))?;

        let text = text.filter(|t| !t.trim().is_empty());
        let img = img.filter(|i| !i.trim().is_empty());
        if text.is_none() && img.is_none() {
            return Err(Error::InvalidOperation(
                "Post must have text or image".to_string(),
            ));
        }

        let img_url = match img {
            Some(payload) => Some(self.media.upload(&payload).await?),
            None => None,
        };

        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        sqlx::query("INSERT INTO posts (id, user_id, text, img, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&id)
            .bind(actor_id)
            .bind(&text)
            .bind(&img_url)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        info!("[Posts] Post created by {}: {}", author.username, id);

        Ok(Post {
            id,
            user: author,
            text,
            img: img_url,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at,
        })
    }

    /// Delete a post owned by the actor, destroying its image asset and
    /// removing likes and comments with it.
    pub async fn delete_post(&self, actor_id: &str, post_id: &str) -> Result<()> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, user_id, text, img, created_at FROM posts WHERE id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        let (_, owner_id, _, img, _) = row.ok_or(Error::NotFound("Post"))?;

        if owner_id != actor_id {
            return Err(Error::Forbidden(
                "You are not authorized to delete this post".to_string(),
            ));
        }

        if let Some(img) = &img {
            self.media.destroy(MediaStore::asset_id(img)).await?;
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM post_likes WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("[Posts] Post deleted: {}", post_id);
        Ok(())
    }

    /// Like or unlike a post depending on the current edge state. The
    /// returned like set is freshly queried after the change commits.
    pub async fn toggle_like(&self, actor_id: &str, post_id: &str) -> Result<LikeChange> {
        let mut tx = self.pool.begin().await?;

        let post: Option<(String,)> = sqlx::query_as("SELECT user_id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        let (owner_id,) = post.ok_or(Error::NotFound("Post"))?;

        let edge: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM post_likes WHERE post_id = ? AND user_id = ?")
                .bind(post_id)
                .bind(actor_id)
                .fetch_optional(&mut *tx)
                .await?;

        let liked = if edge.is_some() {
            sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
                .bind(post_id)
                .bind(actor_id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            info!("[Posts] {} unliked {}", actor_id, post_id);
            false
        } else {
            sqlx::query("INSERT INTO post_likes (post_id, user_id, created_at) VALUES (?, ?, ?)")
                .bind(post_id)
                .bind(actor_id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;

            if NotificationManager::should_notify(NotificationKind::Like, actor_id, &owner_id) {
                self.notifications
                    .emit(&mut *tx, actor_id, &owner_id, NotificationKind::Like)
                    .await?;
            }
            tx.commit().await?;

            info!("[Posts] {} liked {}", actor_id, post_id);
            true
        };

        Ok(LikeChange {
            liked,
            likes: self.likes_of(post_id).await?,
        })
    }

    /// User ids that currently like a post
    pub async fn likes_of(&self, post_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT user_id FROM post_likes WHERE post_id = ?")
                .bind(post_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Post ids a user currently likes
    pub async fn liked_post_ids(&self, user_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT post_id FROM post_likes WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Append a comment to a post. Emits no notification.
    pub async fn add_comment(&self, actor_id: &str, post_id: &str, text: &str) -> Result<Post> {
        if text.trim().is_empty() {
            return Err(Error::InvalidOperation(
                "Text field is required".to_string(),
            ));
        }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound("Post"));
        }

        sqlx::query(
            "INSERT INTO comments (id, post_id, user_id, text, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(post_id)
        .bind(actor_id)
        .bind(text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!("[Posts] {} commented on {}", actor_id, post_id);
        self.get_post(post_id).await
    }

    /// Hydrated post by id
    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        let row: Option<PostRow> = sqlx::query_as(
            "SELECT id, user_id, text, img, created_at FROM posts WHERE id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(Error::NotFound("Post"))?;
        self.hydrate(row).await
    }

    /// All posts, newest first
    pub async fn all_posts(&self) -> Result<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(
            "SELECT id, user_id, text, img, created_at FROM posts ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    /// Posts by users the actor follows, newest first
    pub async fn following_posts(&self, actor_id: &str) -> Result<Vec<Post>> {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
            .bind(actor_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound("User"));
        }

        let rows: Vec<PostRow> = sqlx::query_as(
            "SELECT id, user_id, text, img, created_at FROM posts \
             WHERE user_id IN (SELECT followee_id FROM follows WHERE follower_id = ?) \
             ORDER BY created_at DESC",
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    /// Posts authored by a user, looked up by username, newest first
    pub async fn user_posts(&self, username: &str) -> Result<Vec<Post>> {
        let user: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        let (user_id,) = user.ok_or(Error::NotFound("User"))?;

        let rows: Vec<PostRow> = sqlx::query_as(
            "SELECT id, user_id, text, img, created_at FROM posts WHERE user_id = ? \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    /// Posts liked by a user, newest first
    pub async fn liked_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound("User"));
        }

        let rows: Vec<PostRow> = sqlx::query_as(
            "SELECT p.id, p.user_id, p.text, p.img, p.created_at FROM posts p \
             JOIN post_likes l ON l.post_id = p.id WHERE l.user_id = ? \
             ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_all(rows).await
    }

    async fn hydrate_all(&self, rows: Vec<PostRow>) -> Result<Vec<Post>> {
        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(self.hydrate(row).await?);
        }
        Ok(posts)
    }

    async fn hydrate(&self, row: PostRow) -> Result<Post> {
        let (id, user_id, text, img, created_at) = row;

        let user = fetch_user_info(&self.pool, &user_id)
            .await?
            .ok_or(Error::NotFound("User"))?;
        let likes = self.likes_of(&id).await?;

        let comment_rows: Vec<(String, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, user_id, text, created_at FROM comments WHERE post_id = ? \
             ORDER BY created_at ASC",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let mut comments = Vec::with_capacity(comment_rows.len());
        for (comment_id, commenter_id, comment_text, commented_at) in comment_rows {
            let Some(commenter) = fetch_user_info(&self.pool, &commenter_id).await? else {
                continue;
            };
            comments.push(Comment {
                id: comment_id,
                user: commenter,
                text: comment_text,
                created_at: commented_at,
            });
        }

        Ok(Post {
            id,
            user,
            text,
            img,
            likes,
            comments,
            created_at,
        })
    }
}
