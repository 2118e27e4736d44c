//! Chat relay and the sent → delivered → read lifecycle.

use std::collections::BTreeMap;

use serde::Deserialize;
use sqlx::{Pool, Sqlite};

use crate::db::models::{Message, NewMessage};
use crate::db::{now_millis, FriendRepository, MessageRepository};
use crate::error::AppError;
use crate::realtime::events::ServerEvent;
use crate::realtime::registry::ConnectionRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckKind {
    Delivered,
    Read,
}

/// Persists a message from `sender_id` and pushes it to both ends.
///
/// Returns `Ok(None)` without persisting anything when the two users are not
/// friends. If the receiver's channel accepts the push, the message is
/// advanced to delivered before the sender's echo goes out.
pub async fn relay_message(
    pool: &Pool<Sqlite>,
    registry: &ConnectionRegistry,
    sender_id: &str,
    draft: NewMessage,
) -> Result<Option<Message>, AppError> {
    let has_content = draft.content.as_deref().is_some_and(|c| !c.trim().is_empty());
    let has_sticker = draft.sticker.as_deref().is_some_and(|s| !s.trim().is_empty());
    if !has_content && !has_sticker {
        return Err(AppError::Validation(
            "Message needs content or a sticker".to_string(),
        ));
    }

    if !FriendRepository::are_friends(pool, sender_id, &draft.receiver_id).await? {
        tracing::debug!(
            "Dropping message from {} to non-friend {}",
            sender_id,
            draft.receiver_id
        );
        return Ok(None);
    }

    let mut message = MessageRepository::create(pool, sender_id, &draft).await?;

    if registry
        .send(&message.receiver_id, ServerEvent::Message(message.clone()))
        .await
    {
        if let Some(delivered) =
            MessageRepository::mark_delivered(pool, message.id, &message.receiver_id, now_millis())
                .await?
        {
            message = delivered;
        }
    }

    if sender_id != message.receiver_id {
        registry
            .send(sender_id, ServerEvent::Message(message.clone()))
            .await;
    }

    Ok(Some(message))
}

/// Applies a receiver's acknowledgement to each id in `message_ids`.
///
/// Ids that do not exist, belong to another receiver or are already past the
/// requested state are skipped. For read acks, each sender that is online is
/// told which of their messages were newly read.
///
/// Returns the ids whose state changed.
pub async fn acknowledge(
    pool: &Pool<Sqlite>,
    registry: &ConnectionRegistry,
    user_id: &str,
    message_ids: &[i64],
    kind: AckKind,
) -> Result<Vec<i64>, AppError> {
    let now = now_millis();
    let mut advanced = Vec::new();
    let mut read_by_sender: BTreeMap<String, Vec<i64>> = BTreeMap::new();

    for &id in message_ids {
        let updated = match kind {
            AckKind::Delivered => MessageRepository::mark_delivered(pool, id, user_id, now).await?,
            AckKind::Read => MessageRepository::mark_read(pool, id, user_id, now).await?,
        };

        let Some(message) = updated else {
            continue;
        };

        advanced.push(message.id);
        if kind == AckKind::Read && message.sender_id != user_id {
            read_by_sender
                .entry(message.sender_id)
                .or_default()
                .push(message.id);
        }
    }

    for (sender_id, ids) in read_by_sender {
        registry
            .send(
                &sender_id,
                ServerEvent::MessagesRead {
                    message_ids: ids,
                    reader_id: user_id.to_string(),
                },
            )
            .await;
    }

    Ok(advanced)
}

/// Conversation between `user_id` and `peer_id` created after `since`.
pub async fn history(
    pool: &Pool<Sqlite>,
    user_id: &str,
    peer_id: &str,
    since: i64,
) -> Result<Vec<Message>, AppError> {
    if !FriendRepository::are_friends(pool, user_id, peer_id).await? {
        return Err(AppError::NotFriends);
    }

    MessageRepository::between(pool, user_id, peer_id, since).await
}
