mod common;

use friendmap::db::FriendRepository;
use friendmap::error::AppError;

#[tokio::test]
async fn add_friendship_is_symmetric() {
    let pool = common::test_pool().await;

    FriendRepository::add_friendship(&pool, "alice", "bob").await.unwrap();

    assert!(FriendRepository::are_friends(&pool, "alice", "bob").await.unwrap());
    assert!(FriendRepository::are_friends(&pool, "bob", "alice").await.unwrap());
    assert!(FriendRepository::friends_of(&pool, "bob").await.unwrap().contains("alice"));
}

#[tokio::test]
async fn remove_friendship_clears_both_directions() {
    let pool = common::test_pool().await;
    FriendRepository::add_friendship(&pool, "alice", "bob").await.unwrap();

    FriendRepository::remove_friendship(&pool, "bob", "alice").await.unwrap();

    assert!(!FriendRepository::are_friends(&pool, "alice", "bob").await.unwrap());
    assert!(!FriendRepository::are_friends(&pool, "bob", "alice").await.unwrap());
}

#[tokio::test]
async fn removing_absent_friendship_is_a_no_op() {
    let pool = common::test_pool().await;
    FriendRepository::remove_friendship(&pool, "alice", "nobody").await.unwrap();
}

#[tokio::test]
async fn self_friendship_is_rejected() {
    let pool = common::test_pool().await;

    let err = FriendRepository::add_friendship(&pool, "alice", "alice").await.unwrap_err();

    assert!(matches!(err, AppError::SelfFriendship));
    assert!(FriendRepository::friends_of(&pool, "alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_friendship_is_rejected_in_either_order() {
    let pool = common::test_pool().await;
    FriendRepository::add_friendship(&pool, "alice", "bob").await.unwrap();

    let same = FriendRepository::add_friendship(&pool, "alice", "bob").await.unwrap_err();
    let mirrored = FriendRepository::add_friendship(&pool, "bob", "alice").await.unwrap_err();

    assert!(matches!(same, AppError::AlreadyFriends));
    assert!(matches!(mirrored, AppError::AlreadyFriends));
    assert_eq!(FriendRepository::list(&pool, "alice").await.unwrap(), vec!["bob"]);
}

#[tokio::test]
async fn friends_of_lists_only_direct_friends() {
    let pool = common::test_pool().await;
    FriendRepository::add_friendship(&pool, "alice", "bob").await.unwrap();
    FriendRepository::add_friendship(&pool, "alice", "carol").await.unwrap();
    FriendRepository::add_friendship(&pool, "carol", "dave").await.unwrap();

    let friends = FriendRepository::friends_of(&pool, "alice").await.unwrap();

    assert_eq!(friends.len(), 2);
    assert!(friends.contains("bob") && friends.contains("carol"));
    assert!(!friends.contains("dave"));
}
