use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::realtime::events::ServerEvent;

/// Identifies one physical connection, so a stale disconnect handler can
/// tell its own registration apart from a newer one for the same user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

struct Connection {
    id: ConnectionId,
    sender: UnboundedSender<ServerEvent>,
}

/// Process-wide map of user id to that user's live outbound channel.
///
/// Holds at most one entry per user; registering again replaces the previous
/// entry without closing it. Cloning shares the same underlying map.
#[derive(Default, Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<String, Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `sender` as the channel for `user_id`, superseding any previous one.
    pub async fn register(&self, user_id: &str, sender: UnboundedSender<ServerEvent>) -> ConnectionId {
        let id = ConnectionId::new();
        let mut guard = self.inner.write().await;
        let replaced = guard
            .insert(user_id.to_string(), Connection { id, sender })
            .is_some();

        tracing::debug!(
            "Registered connection {:?} for {} (replaced previous: {}), online: {}",
            id,
            user_id,
            replaced,
            guard.len()
        );

        id
    }

    /// Creates a channel, registers its sending half and hands back the receiver.
    pub async fn connect(&self, user_id: &str) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = unbounded_channel();
        let id = self.register(user_id, tx).await;
        (id, rx)
    }

    /// Removes the entry for `user_id` only if it is still connection `id`.
    pub async fn unregister(&self, user_id: &str, id: ConnectionId) -> bool {
        let mut guard = self.inner.write().await;
        match guard.get(user_id) {
            Some(current) if current.id == id => {
                guard.remove(user_id);
                tracing::debug!("Unregistered connection {:?} for {}", id, user_id);
                true
            }
            _ => false,
        }
    }

    /// Best-effort push. A closed channel is treated as dead and evicted.
    pub async fn send(&self, user_id: &str, event: ServerEvent) -> bool {
        let dead = {
            let guard = self.inner.read().await;
            let Some(connection) = guard.get(user_id) else {
                return false;
            };
            match connection.sender.send(event) {
                Ok(()) => return true,
                Err(_) => connection.id,
            }
        };

        tracing::debug!("Channel for {} is closed, evicting", user_id);
        self.unregister(user_id, dead).await;
        false
    }

    /// Pushes `event` to each listed user that is online; returns how many got it.
    pub async fn send_many<'a, I>(&self, user_ids: I, event: &ServerEvent) -> usize
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut delivered = 0;
        for user_id in user_ids {
            if self.send(user_id, event.clone()).await {
                delivered += 1;
            }
        }
        delivered
    }

    pub async fn is_online(&self, user_id: &str) -> bool {
        let guard = self.inner.read().await;
        guard
            .get(user_id)
            .is_some_and(|connection| !connection.sender.is_closed())
    }

    pub async fn online_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping() -> ServerEvent {
        ServerEvent::Error {
            message: "ping".into(),
        }
    }

    #[tokio::test]
    async fn send_reaches_registered_channel() {
        let registry = ConnectionRegistry::new();
        let (_, mut rx) = registry.connect("alice").await;

        assert!(registry.is_online("alice").await);
        assert!(registry.send("alice", ping()).await);
        assert_eq!(rx.recv().await, Some(ping()));
        assert!(!registry.send("bob", ping()).await);
    }

    #[tokio::test]
    async fn stale_unregister_keeps_newer_connection() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = registry.connect("alice").await;
        let (second, mut rx2) = registry.connect("alice").await;

        assert!(!registry.unregister("alice", first).await);
        assert!(registry.send("alice", ping()).await);
        assert_eq!(rx2.recv().await, Some(ping()));

        assert!(registry.unregister("alice", second).await);
        assert!(!registry.is_online("alice").await);
    }

    #[tokio::test]
    async fn dead_channel_is_evicted_on_send() {
        let registry = ConnectionRegistry::new();
        let (_, rx) = registry.connect("alice").await;
        drop(rx);

        assert!(!registry.send("alice", ping()).await);
        assert_eq!(registry.online_count().await, 0);
    }

    #[tokio::test]
    async fn send_many_counts_only_online_users() {
        let registry = ConnectionRegistry::new();
        let (_, _alice) = registry.connect("alice").await;
        let (_, _bob) = registry.connect("bob").await;

        let targets = vec!["alice".to_string(), "carol".to_string(), "bob".to_string()];
        assert_eq!(registry.send_many(&targets, &ping()).await, 2);
    }
}
