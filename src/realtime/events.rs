//! Wire format of the persistent connection.
//!
//! Both directions are JSON objects tagged by a `type` field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::locations::LocationView;
use crate::db::models::Message;

/// Events a client sends over its connection.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    LocationUpdate {
        lat: f64,
        lng: f64,
        #[serde(default)]
        accuracy: Option<f64>,
    },
    Message {
        receiver_id: String,
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        sticker: Option<String>,
    },
    TypingStart {
        receiver_id: String,
    },
    TypingStop {
        receiver_id: String,
    },
    MarkDelivered {
        message_ids: Vec<i64>,
    },
    MarkRead {
        message_ids: Vec<i64>,
    },
    JoinRoom {
        room_id: String,
    },
    WebrtcOffer {
        target_id: String,
        #[serde(alias = "offer", default)]
        payload: Value,
    },
    WebrtcAnswer {
        target_id: String,
        #[serde(alias = "answer", default)]
        payload: Value,
    },
    WebrtcIceCandidate {
        target_id: String,
        #[serde(alias = "candidate", default)]
        payload: Value,
    },
}

impl ClientEvent {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Events pushed to a client.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    InitialLocations {
        locations: Vec<LocationView>,
    },
    LocationUpdate {
        user_id: String,
        location: LocationView,
    },
    Message(Message),
    TypingStatus {
        sender_id: String,
        is_typing: bool,
    },
    MessagesRead {
        message_ids: Vec<i64>,
        reader_id: String,
    },
    UserJoined {
        user_id: String,
        room_id: String,
    },
    WebrtcOffer {
        sender_id: String,
        offer: Value,
    },
    WebrtcAnswer {
        sender_id: String,
        answer: Value,
    },
    WebrtcIceCandidate {
        sender_id: String,
        candidate: Value,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
