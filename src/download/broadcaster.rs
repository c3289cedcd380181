//! Fan-out of progress events to every connected subscriber.
//!
//! Each subscriber owns a bounded queue. `publish` serializes an event once
//! and offers it to every queue without waiting; a subscriber whose queue is
//! full or closed is dropped from the registry in the same critical section,
//! so it never sees another publish attempt.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::core::config;
use crate::download::events::ProgressEvent;

/// Identifier handed out by `subscribe`.
pub type SubscriberId = u64;

/// Receiving side of one subscription.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Arc<str>>,
}

/// Registry of live subscribers.
#[derive(Debug)]
pub struct Broadcaster {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<Arc<str>>>>,
    next_id: AtomicU64,
    buffer: usize,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::with_buffer(config::broadcast::SUBSCRIBER_BUFFER)
    }

    /// `buffer` is the per-subscriber queue depth (minimum 1).
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer: buffer.max(1),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().insert(id, tx);
        log::debug!("Subscriber {} connected ({} total)", id, self.subscriber_count());
        Subscription { id, receiver: rx }
    }

    /// Removes a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        if self.subscribers.lock().remove(&id).is_some() {
            log::debug!("Subscriber {} disconnected", id);
        }
    }

    /// Sends an event to every subscriber, dropping those that cannot take it.
    ///
    /// Returns the number of subscribers the event was delivered to.
    pub fn publish(&self, event: &ProgressEvent) -> usize {
        let payload: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => Arc::from(json),
            Err(e) => {
                log::error!("Failed to serialize {} event: {}", event.kind(), e);
                return 0;
            }
        };

        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|id, tx| match tx.try_send(Arc::clone(&payload)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("Subscriber {} is not keeping up, dropping it", id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                log::debug!("Subscriber {} closed, removing", id);
                false
            }
        });
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
