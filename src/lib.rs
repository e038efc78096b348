//! Flock Server Library
//!
//! Social-networking backend: cookie-token auth, follow graph, posts with
//! likes and comments, and follow/like notifications over SQLite.

pub mod auth;
pub mod config;
pub mod ctx;
pub mod error;
pub mod handlers;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod store;
pub mod token;
pub mod users;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tracing::info;

use auth::middleware::mw_require_auth;
use auth::AuthManager;
use config::{AppState, ServerConfig};
use handlers::{
    add_comment, all_posts, clear_notifications, create_post, delete_post, follow_user,
    following_posts, get_profile, like_post, liked_posts, list_notifications, login, logout, me,
    signup, suggested_users, update_user, user_posts,
};
use media::{serve_media, MediaStore};
use notifications::NotificationManager;
use posts::PostManager;
use token::TokenService;
use users::UserManager;

/// Initialize storage and managers for the given configuration.
pub async fn init(config: ServerConfig) -> anyhow::Result<AppState> {
    config.ensure_dirs().await?;

    let pool = store::connect(&config.db_path()).await?;
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), config.session_ttl_days);
    let media = Arc::new(MediaStore::new(config.media_dir.clone()));
    let notifications = Arc::new(NotificationManager::new(pool.clone()));
    let auth = Arc::new(AuthManager::new(pool.clone()));
    let users = Arc::new(UserManager::new(
        pool.clone(),
        notifications.clone(),
        media.clone(),
    ));
    let posts = Arc::new(PostManager::new(pool, notifications.clone(), media.clone()));

    Ok(AppState {
        config,
        tokens,
        auth,
        users,
        posts,
        notifications,
        media,
    })
}

/// Build the router. Everything under `/api` except signup/login/logout
/// sits behind the auth gate.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/users/profile/{username}", get(get_profile))
        .route("/api/users/suggested", get(suggested_users))
        .route("/api/users/follow/{id}", post(follow_user))
        .route("/api/users/update", post(update_user))
        .route("/api/posts/all", get(all_posts))
        .route("/api/posts/following", get(following_posts))
        .route("/api/posts/user/{username}", get(user_posts))
        .route("/api/posts/likes/{id}", get(liked_posts))
        .route("/api/posts/create", post(create_post))
        .route("/api/posts/like/{id}", post(like_post))
        .route("/api/posts/comment/{id}", post(add_comment))
        .route("/api/posts/{id}", delete(delete_post))
        .route(
            "/api/notifications",
            get(list_notifications).delete(clear_notifications),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw_require_auth,
        ));

    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/media/{file}", get(serve_media))
        .route("/health", get(health_check))
        .merge(protected)
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

pub async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    // A second call (tests, embedding) leaves the existing subscriber in place.
    let _ = tracing::subscriber::set_global_default(subscriber);

    info!("=== Flock Server ===");
    info!("Features: Auth | Follow Graph | Posts | Likes | Notifications");

    let config = ServerConfig::default();
    info!("Storage directory: {:?}", config.base_dir);
    info!("Database: {:?}", config.db_path());

    let port = config.port;
    let state = init(config).await?;
    info!("Managers initialized");

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Flock server running on http://localhost:{}", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK - Flock Server"
}
