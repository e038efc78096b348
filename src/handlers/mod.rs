//! HTTP handlers
//!
//! Thin axum adapters: decode the request, call the managers, encode the
//! response. All routes behind the auth middleware receive the caller
//! through the [`crate::ctx::Ctx`] extractor.

pub mod auth;
pub mod notifications;
pub mod posts;
pub mod users;

// Auth handlers
pub use auth::{login, logout, me, signup};

// User & follow graph handlers
pub use users::{follow_user, get_profile, suggested_users, update_user};

// Post & engagement handlers
pub use posts::{
    add_comment, all_posts, create_post, delete_post, following_posts, like_post, liked_posts,
    user_posts,
};

// Notification handlers
pub use notifications::{clear_notifications, list_notifications};
