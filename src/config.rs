//! Server configuration and shared application state

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use crate::auth::AuthManager;
use crate::media::MediaStore;
use crate::notifications::NotificationManager;
use crate::posts::PostManager;
use crate::token::{TokenService, SESSION_TTL_DAYS};
use crate::users::UserManager;

/// Configuration for the Flock server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Root directory for the database and media files
    pub base_dir: PathBuf,
    /// Directory for uploaded image assets
    pub media_dir: PathBuf,
    /// Signing secret for session tokens
    pub jwt_secret: String,
    /// Listen port
    pub port: u16,
    /// Session token lifetime in days
    pub session_ttl_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let base_dir = std::env::var("FLOCK_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("flock_data"));

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using an insecure development secret");
            "flock-dev-secret".to_string()
        });

        Self {
            media_dir: base_dir.join("media"),
            base_dir,
            jwt_secret,
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            session_ttl_days: SESSION_TTL_DAYS,
        }
    }
}

impl ServerConfig {
    /// Create config with a custom base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        let base = base_dir.into();
        config.media_dir = base.join("media");
        config.base_dir = base;
        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.base_dir.join("flock.sqlite")
    }

    /// Ensure all directories exist
    pub async fn ensure_dirs(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;
        tokio::fs::create_dir_all(&self.media_dir).await?;
        Ok(())
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub tokens: TokenService,
    pub auth: Arc<AuthManager>,
    pub users: Arc<UserManager>,
    pub posts: Arc<PostManager>,
    pub notifications: Arc<NotificationManager>,
    pub media: Arc<MediaStore>,
}
