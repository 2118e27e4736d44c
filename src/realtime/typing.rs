use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::realtime::events::ServerEvent;
use crate::realtime::registry::ConnectionRegistry;

type PairKey = (String, String);

struct TypingEntry {
    // Unique across the tracker; a timer only clears the entry it was spawned for.
    generation: u64,
    timer: JoinHandle<()>,
}

/// Only pairs that are currently typing have an entry.
#[derive(Default)]
struct TypingState {
    entries: HashMap<PairKey, TypingEntry>,
    next_generation: u64,
}

/// Per (sender, receiver) typing state with automatic expiry.
///
/// A `typing_start` schedules a clear after the timeout. Any later event for
/// the same pair cancels that clear, so a stale "stopped typing" never
/// follows a newer "started typing".
#[derive(Clone)]
pub struct TypingTracker {
    inner: Arc<Mutex<TypingState>>,
    registry: ConnectionRegistry,
    timeout: Duration,
}

impl TypingTracker {
    pub fn new(registry: ConnectionRegistry, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TypingState::default())),
            registry,
            timeout,
        }
    }

    /// Records the state and pushes it to `receiver_id`. Ignored when the
    /// receiver is offline; returns whether the push happened.
    pub async fn set(&self, sender_id: &str, receiver_id: &str, is_typing: bool) -> bool {
        if !self.registry.is_online(receiver_id).await {
            return false;
        }

        {
            let key = (sender_id.to_string(), receiver_id.to_string());
            let mut state = self.inner.lock().await;
            if let Some(previous) = state.entries.remove(&key) {
                previous.timer.abort();
            }
            if is_typing {
                state.next_generation += 1;
                let generation = state.next_generation;
                let timer = self.spawn_clear(key.clone(), generation);
                state.entries.insert(key, TypingEntry { generation, timer });
            }
        }

        self.registry
            .send(
                receiver_id,
                ServerEvent::TypingStatus {
                    sender_id: sender_id.to_string(),
                    is_typing,
                },
            )
            .await
    }

    fn spawn_clear(&self, key: PairKey, generation: u64) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let registry = self.registry.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;

            {
                let mut state = inner.lock().await;
                let current = state
                    .entries
                    .get(&key)
                    .is_some_and(|entry| entry.generation == generation);
                if !current {
                    return;
                }
                state.entries.remove(&key);
            }

            let (sender_id, receiver_id) = key;
            registry
                .send(
                    &receiver_id,
                    ServerEvent::TypingStatus {
                        sender_id,
                        is_typing: false,
                    },
                )
                .await;
        })
    }

    pub async fn is_typing(&self, sender_id: &str, receiver_id: &str) -> bool {
        let state = self.inner.lock().await;
        state
            .entries
            .contains_key(&(sender_id.to_string(), receiver_id.to_string()))
    }

    /// Number of (sender, receiver) pairs currently typing.
    pub async fn active_pairs(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Drops all state for a disconnecting sender. Receivers still shown as
    /// being typed to are told it stopped.
    pub async fn clear_sender(&self, sender_id: &str) {
        let stopped: Vec<String> = {
            let mut state = self.inner.lock().await;
            let keys: Vec<PairKey> = state
                .entries
                .keys()
                .filter(|(sender, _)| sender == sender_id)
                .cloned()
                .collect();

            let mut stopped = Vec::with_capacity(keys.len());
            for key in keys {
                if let Some(entry) = state.entries.remove(&key) {
                    entry.timer.abort();
                    stopped.push(key.1);
                }
            }
            stopped
        };

        for receiver_id in stopped {
            self.registry
                .send(
                    &receiver_id,
                    ServerEvent::TypingStatus {
                        sender_id: sender_id.to_string(),
                        is_typing: false,
                    },
                )
                .await;
        }
    }
}
