use flock_server::auth::UserInfo;
use flock_server::config::{AppState, ServerConfig};
use flock_server::error::Error;
use flock_server::notifications::NotificationKind;
use flock_server::users::{FollowChange, UpdateUser};
use tempfile::TempDir;

async fn setup() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig::with_base_dir(dir.path());
    let state = flock_server::init(config).await.unwrap();
    (state, dir)
}

async fn register(state: &AppState, username: &str) -> UserInfo {
    state
        .auth
        .signup(
            username,
            &format!("{username} Example"),
            &format!("{username}@example.com"),
            "password123",
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn follow_then_unfollow_restores_both_sides() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;

    let change = state.users.toggle_follow(&alice.id, &bob.id).await.unwrap();
    assert_eq!(change, FollowChange::Followed);
    assert_eq!(state.users.following_of(&alice.id).await.unwrap(), vec![bob.id.clone()]);
    assert_eq!(state.users.followers_of(&bob.id).await.unwrap(), vec![alice.id.clone()]);

    let change = state.users.toggle_follow(&alice.id, &bob.id).await.unwrap();
    assert_eq!(change, FollowChange::Unfollowed);
    assert!(state.users.following_of(&alice.id).await.unwrap().is_empty());
    assert!(state.users.followers_of(&bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn self_follow_rejected_without_state_change() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;

    let result = state.users.toggle_follow(&alice.id, &alice.id).await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    assert!(state.users.following_of(&alice.id).await.unwrap().is_empty());
    assert!(state.users.followers_of(&alice.id).await.unwrap().is_empty());
    assert!(state.notifications.list_for(&alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn follow_emits_exactly_one_notification_and_unfollow_none() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;

    state.users.toggle_follow(&alice.id, &bob.id).await.unwrap();

    let notifications = state.notifications.list_for(&bob.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].from.id, alice.id);
    assert_eq!(notifications[0].to, bob.id);
    assert_eq!(notifications[0].kind, NotificationKind::Follow);

    // Unfollow must not add another notification.
    state.users.toggle_follow(&alice.id, &bob.id).await.unwrap();
    let notifications = state.notifications.list_for(&bob.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn follow_missing_user_is_not_found() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;

    let result = state.users.toggle_follow(&alice.id, "no-such-user").await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(state.users.following_of(&alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn suggestions_exclude_self_and_already_followed() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    for name in ["carol", "dave", "erin", "frank", "grace"] {
        register(&state, name).await;
    }

    state.users.toggle_follow(&alice.id, &bob.id).await.unwrap();

    let suggested = state.users.suggest_users(&alice.id).await.unwrap();
    assert!(suggested.len() <= 4);
    assert!(!suggested.is_empty());
    assert!(suggested.iter().all(|u| u.id != alice.id));
    assert!(suggested.iter().all(|u| u.id != bob.id));
}

#[tokio::test]
async fn notifications_marked_read_on_fetch_and_cleared_on_demand() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;

    state.users.toggle_follow(&alice.id, &bob.id).await.unwrap();

    let first = state.notifications.list_for(&bob.id).await.unwrap();
    assert!(!first[0].read);

    let second = state.notifications.list_for(&bob.id).await.unwrap();
    assert!(second[0].read);

    state.notifications.clear_for(&bob.id).await.unwrap();
    assert!(state.notifications.list_for(&bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn password_change_requires_both_fields_and_a_valid_current() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;

    // New password without the current one is rejected.
    let result = state
        .users
        .update_user(
            &alice.id,
            UpdateUser {
                new_password: Some("newpassword".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    // Wrong current password is rejected.
    let result = state
        .users
        .update_user(
            &alice.id,
            UpdateUser {
                current_password: Some("wrong-password".to_string()),
                new_password: Some("newpassword".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    // Too-short new password is rejected.
    let result = state
        .users
        .update_user(
            &alice.id,
            UpdateUser {
                current_password: Some("password123".to_string()),
                new_password: Some("short".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(Error::InvalidOperation(_))));

    // None of the failed attempts changed the stored hash.
    state.auth.login("alice", "password123").await.unwrap();

    state
        .users
        .update_user(
            &alice.id,
            UpdateUser {
                current_password: Some("password123".to_string()),
                new_password: Some("newpassword".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(
        state.auth.login("alice", "password123").await,
        Err(Error::LoginFail)
    ));
    state.auth.login("alice", "newpassword").await.unwrap();
}

#[tokio::test]
async fn profile_image_replacement_destroys_previous_asset() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;

    // 1x1 transparent png payload
    let payload = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    let updated = state
        .users
        .update_user(
            &alice.id,
            UpdateUser {
                profile_img: Some(payload.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let first = updated.profile_img.clone().unwrap();
    let first_file = state
        .config
        .media_dir
        .join(first.strip_prefix("/media/").unwrap());
    assert!(first_file.exists());

    let updated = state
        .users
        .update_user(
            &alice.id,
            UpdateUser {
                profile_img: Some(payload.to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second = updated.profile_img.clone().unwrap();
    assert_ne!(first, second);

    assert!(!first_file.exists());
    let second_file = state
        .config
        .media_dir
        .join(second.strip_prefix("/media/").unwrap());
    assert!(second_file.exists());
}

#[tokio::test]
async fn profile_reflects_follow_graph() {
    let (state, _dir) = setup().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;

    state.users.toggle_follow(&alice.id, &bob.id).await.unwrap();

    let profile = state.users.get_profile("bob").await.unwrap();
    assert_eq!(profile.user.id, bob.id);
    assert_eq!(profile.followers, vec![alice.id.clone()]);
    assert!(profile.following.is_empty());

    let missing = state.users.get_profile("nobody").await;
    assert!(matches!(missing, Err(Error::NotFound(_))));
}
