//! Real-time fan-out engine: connection registry, presence, chat delivery,
//! typing indicators, rooms and call signalling.

pub mod delivery;
pub mod events;
pub mod presence;
pub mod registry;
pub mod rooms;
pub mod signaling;
pub mod typing;

pub use delivery::AckKind;
pub use events::{ClientEvent, ServerEvent};
pub use registry::{ConnectionId, ConnectionRegistry};

use std::collections::HashMap;

use sqlx::{Pool, Sqlite};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::Config;
use crate::db::models::NewMessage;
use crate::db::FriendRepository;
use crate::error::AppError;
use presence::Coordinates;
use rooms::RoomDirectory;
use signaling::SignalKind;
use typing::TypingTracker;

/// Everything a connection handler needs, constructed once per process.
#[derive(Clone)]
pub struct Hub {
    pub db: Pool<Sqlite>,
    pub registry: ConnectionRegistry,
    pub typing: TypingTracker,
    pub rooms: RoomDirectory,
    signaling_requires_friendship: bool,
}

/// A registered connection: its id and the channel its pushes arrive on.
pub struct Session {
    pub user_id: String,
    pub id: ConnectionId,
    pub outbound: UnboundedReceiver<ServerEvent>,
    initial: Option<ServerEvent>,
    // Newest location timestamp handed to the client, per user.
    seen_locations: HashMap<String, i64>,
}

impl Session {
    /// Next event for the client. The location snapshot always comes first;
    /// after it, location updates older than what the client already holds
    /// are skipped, so a late push never rolls a position back.
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        if let Some(initial) = self.initial.take() {
            return Some(initial);
        }

        loop {
            let event = self.outbound.recv().await?;
            if let ServerEvent::LocationUpdate { user_id, location } = &event {
                let stale = self
                    .seen_locations
                    .get(user_id)
                    .is_some_and(|&seen| location.timestamp < seen);
                if stale {
                    tracing::debug!("Skipping stale location of {} for {}", user_id, self.user_id);
                    continue;
                }
                self.seen_locations.insert(user_id.clone(), location.timestamp);
            }
            return Some(event);
        }
    }
}

impl Hub {
    pub fn new(db: Pool<Sqlite>, config: &Config) -> Self {
        let registry = ConnectionRegistry::new();
        Self {
            typing: TypingTracker::new(registry.clone(), config.typing_timeout()),
            rooms: RoomDirectory::new(),
            registry,
            db,
            signaling_requires_friendship: config.signaling_requires_friendship,
        }
    }

    /// Registers `user_id` and loads the location snapshot the session hands
    /// out before any pushed event. Registering first means no update that
    /// lands during the snapshot read is lost.
    pub async fn connect(&self, user_id: &str) -> Session {
        let (id, outbound) = self.registry.connect(user_id).await;

        let locations = match presence::snapshot(&self.db, user_id).await {
            Ok(locations) => locations,
            Err(e) => {
                tracing::error!("Error loading initial locations for {}: {}", user_id, e);
                Vec::new()
            }
        };
        let seen_locations = locations
            .iter()
            .map(|view| (view.user_id.clone(), view.timestamp))
            .collect();

        Session {
            user_id: user_id.to_string(),
            id,
            outbound,
            initial: Some(ServerEvent::InitialLocations { locations }),
            seen_locations,
        }
    }

    /// Tears down a connection. Typing state and room membership are dropped
    /// only if this connection was still the user's current one.
    pub async fn disconnect(&self, session: &Session) {
        if self.registry.unregister(&session.user_id, session.id).await {
            self.typing.clear_sender(&session.user_id).await;
            self.rooms.leave_all(&session.user_id).await;
        }
    }

    /// Processes one inbound event from `user_id`.
    pub async fn handle(&self, user_id: &str, event: ClientEvent) -> Result<(), AppError> {
        match event {
            ClientEvent::LocationUpdate { lat, lng, accuracy } => {
                let coords = Coordinates::new(lat, lng, accuracy)?;
                presence::broadcast_location(&self.db, &self.registry, user_id, coords).await?;
            }
            ClientEvent::Message {
                receiver_id,
                content,
                sticker,
            } => {
                let draft = NewMessage {
                    receiver_id,
                    content,
                    sticker,
                };
                delivery::relay_message(&self.db, &self.registry, user_id, draft).await?;
            }
            ClientEvent::TypingStart { receiver_id } => {
                self.set_typing(user_id, &receiver_id, true).await?;
            }
            ClientEvent::TypingStop { receiver_id } => {
                self.set_typing(user_id, &receiver_id, false).await?;
            }
            ClientEvent::MarkDelivered { message_ids } => {
                delivery::acknowledge(
                    &self.db,
                    &self.registry,
                    user_id,
                    &message_ids,
                    AckKind::Delivered,
                )
                .await?;
            }
            ClientEvent::MarkRead { message_ids } => {
                delivery::acknowledge(&self.db, &self.registry, user_id, &message_ids, AckKind::Read)
                    .await?;
            }
            ClientEvent::JoinRoom { room_id } => {
                if room_id.trim().is_empty() {
                    return Err(AppError::Validation("room_id must not be empty".to_string()));
                }
                self.rooms.join(&self.registry, &room_id, user_id).await;
            }
            ClientEvent::WebrtcOffer { target_id, payload } => {
                self.signal(SignalKind::Offer, user_id, &target_id, payload).await?;
            }
            ClientEvent::WebrtcAnswer { target_id, payload } => {
                self.signal(SignalKind::Answer, user_id, &target_id, payload).await?;
            }
            ClientEvent::WebrtcIceCandidate { target_id, payload } => {
                self.signal(SignalKind::IceCandidate, user_id, &target_id, payload)
                    .await?;
            }
        }

        Ok(())
    }

    async fn set_typing(
        &self,
        user_id: &str,
        receiver_id: &str,
        is_typing: bool,
    ) -> Result<(), AppError> {
        if !FriendRepository::are_friends(&self.db, user_id, receiver_id).await? {
            return Ok(());
        }
        self.typing.set(user_id, receiver_id, is_typing).await;
        Ok(())
    }

    async fn signal(
        &self,
        kind: SignalKind,
        user_id: &str,
        target_id: &str,
        payload: serde_json::Value,
    ) -> Result<(), AppError> {
        signaling::relay_signal(
            &self.db,
            &self.registry,
            self.signaling_requires_friendship,
            kind,
            user_id,
            target_id,
            payload,
        )
        .await?;
        Ok(())
    }
}
