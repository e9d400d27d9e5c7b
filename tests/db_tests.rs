//! Store integration tests against in-memory libsql.

use chrono::{Duration, Utc};
use gatehouse::db::{AuthStore, LibsqlStore};
use gatehouse::types::{AuditInfo, RefreshToken, User};
use uuid::Uuid;

async fn create_test_store() -> LibsqlStore {
    LibsqlStore::new_memory()
        .await
        .expect("Failed to create in-memory database")
}

fn sample_user(username: &str, email: &str) -> User {
    User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: "phc-hash-placeholder".to_string(),
        enabled: true,
        account_non_locked: true,
        audit: AuditInfo::now(),
    }
}

fn sample_refresh_token(user_id: &str, revoked: bool, ttl_secs: i64) -> RefreshToken {
    RefreshToken {
        id: Uuid::new_v4().to_string(),
        token: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        expires_at: Utc::now() + Duration::seconds(ttl_secs),
        revoked,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_roles_seeded_on_init() {
    let store = create_test_store().await;

    let user_role = store.find_role_by_name("ROLE_USER").await.unwrap();
    let admin_role = store.find_role_by_name("ROLE_ADMIN").await.unwrap();
    assert!(user_role.is_some());
    assert!(admin_role.is_some());
    assert!(store.find_role_by_name("ROLE_NOBODY").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_and_find_user() {
    let store = create_test_store().await;
    let user = sample_user("alice", "alice@example.com");

    store.create_user(&user, "ROLE_USER").await.unwrap();

    let by_username = store
        .find_user_by_username("alice")
        .await
        .unwrap()
        .expect("user by username");
    assert_eq!(by_username.id, user.id);
    assert_eq!(by_username.email, "alice@example.com");
    assert!(by_username.enabled);
    assert!(by_username.account_non_locked);

    let by_email = store
        .find_user_by_email("alice@example.com")
        .await
        .unwrap()
        .expect("user by email");
    assert_eq!(by_email.id, user.id);

    let by_id = store.find_user_by_id(&user.id).await.unwrap().expect("user by id");
    assert_eq!(by_id.username, "alice");

    let roles = store.roles_for_user(&user.id).await.unwrap();
    let names: Vec<_> = roles.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["ROLE_USER"]);
}

#[tokio::test]
async fn test_existence_checks() {
    let store = create_test_store().await;
    let user = sample_user("alice", "alice@example.com");
    store.create_user(&user, "ROLE_USER").await.unwrap();

    assert!(store.username_exists("alice").await.unwrap());
    assert!(!store.username_exists("bob").await.unwrap());
    assert!(store.email_exists("alice@example.com").await.unwrap());
    assert!(!store.email_exists("bob@example.com").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_username_rejected_by_constraint() {
    let store = create_test_store().await;
    store
        .create_user(&sample_user("alice", "alice@example.com"), "ROLE_USER")
        .await
        .unwrap();

    let result = store
        .create_user(&sample_user("alice", "other@example.com"), "ROLE_USER")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_create_user_with_missing_role_fails() {
    let store = create_test_store().await;
    let result = store
        .create_user(&sample_user("alice", "alice@example.com"), "ROLE_MISSING")
        .await;
    assert!(result.is_err());

    // The transaction never committed, so the user row is absent too.
    assert!(!store.username_exists("alice").await.unwrap());
}

#[tokio::test]
async fn test_role_grant_is_idempotent() {
    let store = create_test_store().await;
    let user = sample_user("alice", "alice@example.com");
    store.create_user(&user, "ROLE_USER").await.unwrap();

    store.add_role_to_user(&user.id, "ROLE_ADMIN").await.unwrap();
    store.add_role_to_user(&user.id, "ROLE_ADMIN").await.unwrap();

    let names: Vec<_> = store
        .roles_for_user(&user.id)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["ROLE_ADMIN", "ROLE_USER"]);
}

#[tokio::test]
async fn test_grant_of_unknown_role_fails() {
    let store = create_test_store().await;
    let user = sample_user("alice", "alice@example.com");
    store.create_user(&user, "ROLE_USER").await.unwrap();

    assert!(store.add_role_to_user(&user.id, "ROLE_MISSING").await.is_err());
}

#[tokio::test]
async fn test_refresh_token_roundtrip() {
    let store = create_test_store().await;
    let user = sample_user("alice", "alice@example.com");
    store.create_user(&user, "ROLE_USER").await.unwrap();

    let credential = sample_refresh_token(&user.id, false, 3600);
    store.insert_refresh_token(&credential).await.unwrap();

    let found = store
        .find_refresh_token(&credential.token)
        .await
        .unwrap()
        .expect("stored credential");
    assert_eq!(found.id, credential.id);
    assert_eq!(found.user_id, user.id);
    assert!(!found.revoked);
    // Stored at second precision.
    assert_eq!(found.expires_at.timestamp(), credential.expires_at.timestamp());
    assert!(!found.is_expired());

    assert!(store.find_refresh_token("unknown-token").await.unwrap().is_none());
}

#[tokio::test]
async fn test_revoked_flag_persisted() {
    let store = create_test_store().await;
    let user = sample_user("alice", "alice@example.com");
    store.create_user(&user, "ROLE_USER").await.unwrap();

    let credential = sample_refresh_token(&user.id, true, 3600);
    store.insert_refresh_token(&credential).await.unwrap();

    let found = store
        .find_refresh_token(&credential.token)
        .await
        .unwrap()
        .expect("stored credential");
    assert!(found.revoked);
}

#[tokio::test]
async fn test_delete_refresh_token() {
    let store = create_test_store().await;
    let user = sample_user("alice", "alice@example.com");
    store.create_user(&user, "ROLE_USER").await.unwrap();

    let credential = sample_refresh_token(&user.id, false, 3600);
    store.insert_refresh_token(&credential).await.unwrap();

    store.delete_refresh_token(&credential.id).await.unwrap();
    assert!(store
        .find_refresh_token(&credential.token)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_all_refresh_tokens_for_user() {
    let store = create_test_store().await;
    let user = sample_user("alice", "alice@example.com");
    store.create_user(&user, "ROLE_USER").await.unwrap();

    let first = sample_refresh_token(&user.id, false, 3600);
    let second = sample_refresh_token(&user.id, false, 3600);
    store.insert_refresh_token(&first).await.unwrap();
    store.insert_refresh_token(&second).await.unwrap();

    let deleted = store.delete_refresh_tokens_for_user(&user.id).await.unwrap();
    assert_eq!(deleted, 2);
    assert!(store.find_refresh_token(&first.token).await.unwrap().is_none());
    assert!(store.find_refresh_token(&second.token).await.unwrap().is_none());

    // Idempotent: a second sweep removes nothing and still succeeds.
    let deleted_again = store.delete_refresh_tokens_for_user(&user.id).await.unwrap();
    assert_eq!(deleted_again, 0);
}

#[tokio::test]
async fn test_file_backed_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gatehouse-test.db");
    let path = path.to_str().unwrap();

    let user = sample_user("alice", "alice@example.com");
    {
        let store = LibsqlStore::new_local(path).await.unwrap();
        store.create_user(&user, "ROLE_USER").await.unwrap();
    }

    let reopened = LibsqlStore::new_local(path).await.unwrap();
    let found = reopened
        .find_user_by_username("alice")
        .await
        .unwrap()
        .expect("persisted user");
    assert_eq!(found.id, user.id);
}
