//! Subscriber registry
//!
//! Each subscriber owns a bounded queue. `publish` never awaits: a closed or
//! full queue gets that subscriber evicted and delivery continues with the
//! rest.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::constants::SUBSCRIBER_QUEUE_CAPACITY;
use super::messages::ServerMessage;

pub type SubscriberId = Uuid;

/// Receiving end handed to a connection task
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<Arc<ServerMessage>>,
}

pub struct BroadcastHub {
    subscribers: Mutex<Vec<(SubscriberId, mpsc::Sender<Arc<ServerMessage>>)>>,
    capacity: usize,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(SUBSCRIBER_QUEUE_CAPACITY)
    }
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = Uuid::new_v4();
        let mut subscribers = self.subscribers.lock();
        subscribers.push((id, tx));
        log::info!("Subscriber {} connected ({} total)", id, subscribers.len());
        Subscription { id, receiver: rx }
    }

    /// Remove a subscriber. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        let removed = subscribers.len() != before;
        if removed {
            log::info!("Subscriber {} disconnected ({} left)", id, subscribers.len());
        }
        removed
    }

    /// Deliver to every subscriber; returns how many accepted the message
    pub fn publish(&self, message: ServerMessage) -> usize {
        let message = Arc::new(message);
        let mut subscribers = self.subscribers.lock();
        let mut delivered = 0;

        subscribers.retain(|(id, tx)| match tx.try_send(Arc::clone(&message)) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(e) => {
                log::warn!("Evicting subscriber {}: {}", id, e);
                false
            }
        });

        delivered
    }

    /// Deliver to one subscriber only (replies such as `pong`)
    pub fn send_to(&self, id: SubscriberId, message: ServerMessage) -> bool {
        let mut subscribers = self.subscribers.lock();
        let Some(pos) = subscribers.iter().position(|(sid, _)| *sid == id) else {
            return false;
        };

        if subscribers[pos].1.try_send(Arc::new(message)).is_ok() {
            true
        } else {
            log::warn!("Evicting subscriber {}: queue closed or full", id);
            subscribers.remove(pos);
            false
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }
}
