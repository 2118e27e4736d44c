mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use friendmap::api::{create_router, AppState};
use friendmap::db::{FriendRepository, LocationRepository, MessageRepository, MessageStatus, NewMessage};
use friendmap::realtime::ServerEvent;

async fn start_server(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind server");
    let addr = listener.local_addr().expect("server addr");
    let app = create_router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

async fn body(response: reqwest::Response) -> Value {
    response.json().await.expect("json body")
}

#[tokio::test]
async fn health_reports_database() {
    let base = start_server(common::test_state().await).await;

    let response = reqwest::get(format!("{}/api/health", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health = body(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"], "connected");
}

#[tokio::test]
async fn unknown_profile_reads_as_placeholder() {
    let base = start_server(common::test_state().await).await;

    let response = reqwest::get(format!("{}/api/users/user-abc123456/profile", base))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let profile = body(response).await;
    assert_eq!(profile["user_id"], "user-abc123456");
    assert_eq!(profile["username"], "User_123456");
    assert_eq!(profile["bio"], "");
    assert!(profile.get("email").is_none());
}

#[tokio::test]
async fn self_and_duplicate_friend_requests_are_rejected() {
    let base = start_server(common::test_state().await).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/users/alice/friends", base);

    let response = client
        .post(&url)
        .json(&json!({"friend_user_id": "alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body(response).await["error"].is_string());

    let response = client
        .post(&url)
        .json(&json!({"friend_user_id": "bob"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["friends"], json!(["bob"]));

    // The reverse direction is the same friendship.
    let response = client
        .post(format!("{}/api/users/bob/friends", base))
        .json(&json!({"friend_user_id": "alice"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_between_non_friends_is_forbidden() {
    let state = common::test_state().await;
    let db = state.db.clone();
    let base = start_server(state).await;

    let url = format!("{}/api/users/alice/messages/mallory", base);
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body(response).await["error"].is_string());

    FriendRepository::add_friendship(&db, "alice", "mallory").await.unwrap();
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["messages"], json!([]));
}

#[tokio::test]
async fn read_ack_over_http_notifies_sender() {
    let state = common::test_state().await;
    let db = state.db.clone();
    let hub = state.hub.clone();
    let base = start_server(state).await;

    FriendRepository::add_friendship(&db, "alice", "bob").await.unwrap();
    let draft = NewMessage {
        receiver_id: "bob".into(),
        content: Some("hi".into()),
        sticker: None,
    };
    let message = MessageRepository::create(&db, "alice", &draft).await.unwrap();
    let (_, mut alice) = hub.registry.connect("alice").await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/users/bob/messages/status", base))
        .json(&json!({"message_ids": [message.id, 9999], "status": "read"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response).await["updated"], json!([message.id]));

    assert_eq!(
        common::drain(&mut alice),
        vec![ServerEvent::MessagesRead {
            message_ids: vec![message.id],
            reader_id: "bob".into(),
        }]
    );
    let stored = MessageRepository::get_by_id(&db, message.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MessageStatus::Read);
}

#[tokio::test]
async fn locations_endpoint_is_friend_scoped() {
    let state = common::test_state().await;
    let db = state.db.clone();
    let base = start_server(state).await;

    FriendRepository::add_friendship(&db, "alice", "bob").await.unwrap();
    LocationRepository::upsert(&db, "bob", 1.0, 2.0, None).await.unwrap();
    LocationRepository::upsert(&db, "mallory", 3.0, 4.0, None).await.unwrap();

    let response = reqwest::get(format!("{}/api/users/alice/locations", base))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let locations = body(response).await;
    let users: Vec<&str> = locations["locations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["user_id"].as_str().unwrap())
        .collect();
    assert_eq!(users, vec!["bob"]);
}
