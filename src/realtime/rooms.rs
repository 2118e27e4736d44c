use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::realtime::events::ServerEvent;
use crate::realtime::registry::ConnectionRegistry;

/// Ephemeral named rooms; membership lasts until the member disconnects.
#[derive(Default, Clone)]
pub struct RoomDirectory {
    rooms: Arc<Mutex<HashMap<String, BTreeSet<String>>>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `user_id` to `room_id` and announces it to every online member.
    pub async fn join(&self, registry: &ConnectionRegistry, room_id: &str, user_id: &str) -> usize {
        let members: Vec<String> = {
            let mut rooms = self.rooms.lock().await;
            let members = rooms.entry(room_id.to_string()).or_default();
            members.insert(user_id.to_string());
            members.iter().cloned().collect()
        };

        let event = ServerEvent::UserJoined {
            user_id: user_id.to_string(),
            room_id: room_id.to_string(),
        };
        registry.send_many(&members, &event).await
    }

    pub async fn members(&self, room_id: &str) -> Vec<String> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes `user_id` from every room, dropping rooms left empty.
    pub async fn leave_all(&self, user_id: &str) {
        let mut rooms = self.rooms.lock().await;
        rooms.retain(|_, members| {
            members.remove(user_id);
            !members.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_announces_to_online_members() {
        let registry = ConnectionRegistry::new();
        let rooms = RoomDirectory::new();
        let (_, mut alice) = registry.connect("alice").await;
        let (_, mut bob) = registry.connect("bob").await;

        assert_eq!(rooms.join(&registry, "hike", "alice").await, 1);
        assert_eq!(rooms.join(&registry, "hike", "bob").await, 2);

        let joined_bob = ServerEvent::UserJoined {
            user_id: "bob".into(),
            room_id: "hike".into(),
        };
        assert!(matches!(alice.recv().await, Some(ServerEvent::UserJoined { user_id, .. }) if user_id == "alice"));
        assert_eq!(alice.recv().await, Some(joined_bob.clone()));
        assert_eq!(bob.recv().await, Some(joined_bob));
    }

    #[tokio::test]
    async fn leave_all_drops_empty_rooms() {
        let registry = ConnectionRegistry::new();
        let rooms = RoomDirectory::new();
        rooms.join(&registry, "hike", "alice").await;
        rooms.join(&registry, "hike", "bob").await;
        rooms.join(&registry, "solo", "alice").await;

        rooms.leave_all("alice").await;

        assert_eq!(rooms.members("hike").await, vec!["bob".to_string()]);
        assert!(rooms.members("solo").await.is_empty());
    }
}
