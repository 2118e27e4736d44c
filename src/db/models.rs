use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub status: Option<String>,
    #[serde(skip_serializing)]
    pub auth_provider: Option<String>,
    #[serde(skip_serializing)]
    pub external_id: Option<String>,
    #[serde(skip_serializing)]
    pub email: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserProfile {
    /// Display name used for users who never wrote a profile.
    pub fn default_username(user_id: &str) -> String {
        let chars: Vec<char> = user_id.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(6)..].iter().collect();
        format!("User_{}", tail)
    }

    /// Synthetic profile returned for reads of a user with no stored row.
    pub fn placeholder(user_id: &str) -> Self {
        UserProfile {
            user_id: user_id.to_string(),
            username: Self::default_username(user_id),
            avatar: None,
            bio: Some(String::new()),
            status: Some(String::new()),
            auth_provider: None,
            external_id: None,
            email: None,
            created_at: 0,
            updated_at: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: Option<String>,
    pub sticker: Option<String>,
    pub status: MessageStatus,
    pub created_at: i64,
    pub delivered_at: Option<i64>,
    pub read_at: Option<i64>,
}

/// A chat message before it has been persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub receiver_id: String,
    pub content: Option<String>,
    pub sticker: Option<String>,
}
