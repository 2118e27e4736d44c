mod common;

use friendmap::db::profiles::{ExternalIdentity, ProfileUpdate};
use friendmap::db::{FriendRepository, ProfileRepository};

#[tokio::test]
async fn missing_profile_reads_as_placeholder() {
    let pool = common::test_pool().await;

    let profile = ProfileRepository::get_or_placeholder(&pool, "user-abc123").await.unwrap();

    assert_eq!(profile.username, "User_abc123");
    assert_eq!(profile.bio.as_deref(), Some(""));
    assert!(ProfileRepository::get_by_id(&pool, "user-abc123").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_creates_then_updates_only_given_fields() {
    let pool = common::test_pool().await;

    let created = ProfileRepository::upsert(
        &pool,
        "alice",
        ProfileUpdate {
            bio: Some("hiker".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(created.username, "User_alice");
    assert_eq!(created.status.as_deref(), Some(""));

    let updated = ProfileRepository::upsert(
        &pool,
        "alice",
        ProfileUpdate {
            username: Some("Alice".into()),
            status: Some("out".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.username, "Alice");
    assert_eq!(updated.bio.as_deref(), Some("hiker"));
    assert_eq!(updated.status.as_deref(), Some("out"));
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn search_is_case_insensitive_excludes_self_and_marks_friends() {
    let pool = common::test_pool().await;
    for (id, name) in [("u1", "Alice"), ("u2", "alicia"), ("u3", "Bob"), ("u4", "MALICE")] {
        ProfileRepository::upsert(
            &pool,
            id,
            ProfileUpdate {
                username: Some(name.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }
    FriendRepository::add_friendship(&pool, "u1", "u4").await.unwrap();

    let results = ProfileRepository::search(&pool, "ALI", "u1").await.unwrap();
    let names: Vec<_> = results.iter().map(|r| r.username.as_str()).collect();

    assert_eq!(names, vec!["MALICE", "alicia"]);
    assert!(results.iter().find(|r| r.user_id == "u4").unwrap().is_friend);
    assert!(!results.iter().find(|r| r.user_id == "u2").unwrap().is_friend);
}

#[tokio::test]
async fn external_identity_links_to_one_profile() {
    let pool = common::test_pool().await;
    let identity = ExternalIdentity {
        provider: "google".into(),
        external_id: "sub-1".into(),
        email: Some("a@example.com".into()),
        display_name: Some("Alice G".into()),
        avatar_url: None,
    };

    let first = ProfileRepository::link_external(&pool, &identity).await.unwrap();
    let second = ProfileRepository::link_external(
        &pool,
        &ExternalIdentity {
            email: Some("new@example.com".into()),
            ..identity.clone()
        },
    )
    .await
    .unwrap();

    assert_eq!(first.user_id, second.user_id);
    assert_eq!(first.username, "Alice G");
    assert_eq!(second.email.as_deref(), Some("new@example.com"));
}
