use serde_json::Value;
use sqlx::{Pool, Sqlite};

use crate::db::FriendRepository;
use crate::error::AppError;
use crate::realtime::events::ServerEvent;
use crate::realtime::registry::ConnectionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    fn into_event(self, sender_id: String, payload: Value) -> ServerEvent {
        match self {
            SignalKind::Offer => ServerEvent::WebrtcOffer {
                sender_id,
                offer: payload,
            },
            SignalKind::Answer => ServerEvent::WebrtcAnswer {
                sender_id,
                answer: payload,
            },
            SignalKind::IceCandidate => ServerEvent::WebrtcIceCandidate {
                sender_id,
                candidate: payload,
            },
        }
    }
}

/// Forwards an opaque call-setup payload to `target_id` if they are online.
///
/// Nothing is stored. When `require_friendship` is set, signals between
/// non-friends are dropped the same way chat messages are.
pub async fn relay_signal(
    pool: &Pool<Sqlite>,
    registry: &ConnectionRegistry,
    require_friendship: bool,
    kind: SignalKind,
    sender_id: &str,
    target_id: &str,
    payload: Value,
) -> Result<bool, AppError> {
    if require_friendship && !FriendRepository::are_friends(pool, sender_id, target_id).await? {
        tracing::debug!("Dropping {:?} from {} to non-friend {}", kind, sender_id, target_id);
        return Ok(false);
    }

    let forwarded = registry
        .send(target_id, kind.into_event(sender_id.to_string(), payload))
        .await;

    Ok(forwarded)
}
