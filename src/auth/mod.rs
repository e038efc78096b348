//! Authentication Module
//!
//! Handles user registration, login, and user lookup. Passwords are
//! bcrypt-hashed; proof of identity after login is a signed session token
//! (see [`crate::token`]), so there is no server-side session table.

pub mod middleware;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

const MIN_PASSWORD_LEN: usize = 6;

/// User record stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub bio: String,
    pub link: String,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public user info (no credential fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: String,
    pub link: String,
    pub profile_img: Option<String>,
    pub cover_img: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            bio: user.bio,
            link: user.link,
            profile_img: user.profile_img,
            cover_img: user.cover_img,
            created_at: user.created_at,
        }
    }
}

pub(crate) const USER_COLUMNS: &str =
    "id, username, email, password_hash, full_name, bio, link, profile_img, cover_img, created_at";

pub(crate) type UserRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
);

pub(crate) fn user_from_row(row: UserRow) -> User {
    let (id, username, email, password_hash, full_name, bio, link, profile_img, cover_img, created_at) =
        row;
    User {
        id,
        username,
        email,
        password_hash,
        full_name,
        bio,
        link,
        profile_img,
        cover_img,
        created_at,
    }
}

/// Fetch the public info of a user by id, `None` when absent.
pub(crate) async fn fetch_user_info(pool: &SqlitePool, user_id: &str) -> Result<Option<UserInfo>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|r| UserInfo::from(user_from_row(r))))
}

/// Auth manager handles registration and credential checks
pub struct AuthManager {
    pool: SqlitePool,
}

impl AuthManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new user
    pub async fn signup(
        &self,
        username: &str,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserInfo> {
        if username.trim().is_empty() || email.trim().is_empty() {
            return Err(Error::InvalidOperation(
                "Username and email are required".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(Error::InvalidOperation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }

        let taken: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(Error::Conflict("Username is already taken".to_string()));
        }

        let taken: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        if taken.is_some() {
            return Err(Error::Conflict("Email is already taken".to_string()));
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            full_name: full_name.to_string(),
            bio: String::new(),
            link: String::new(),
            profile_img: None,
            cover_img: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, full_name, bio, link, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.bio)
        .bind(&user.link)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        info!("[Auth] User registered: {} ({})", username, email);

        Ok(user.into())
    }

    /// Verify credentials; failures are uniform so the caller cannot tell a
    /// missing user from a wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserInfo> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        let Some(user) = row.map(user_from_row) else {
            warn!("[Auth] Failed login attempt for unknown user {}", username);
            return Err(Error::LoginFail);
        };

        if !bcrypt::verify(password, &user.password_hash)? {
            warn!("[Auth] Failed login attempt for {}", username);
            return Err(Error::LoginFail);
        }

        info!("[Auth] User logged in: {}", user.username);
        Ok(user.into())
    }

    /// Get public user info by id
    pub async fn get_user(&self, user_id: &str) -> Result<UserInfo> {
        fetch_user_info(&self.pool, user_id)
            .await?
            .ok_or(Error::NotFound("User"))
    }
}
