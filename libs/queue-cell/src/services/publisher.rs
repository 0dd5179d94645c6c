use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, warn};

use crate::models::{QueueEvent, QueueScope};

pub type QueueEventSender = broadcast::Sender<String>;
pub type QueueEventReceiver = broadcast::Receiver<String>;

/// Fan-out point for queue changes.
///
/// Delivery is fire-and-forget: a send with no listeners is logged and
/// otherwise ignored, and never reaches the mutating operation. Retry and
/// delivery guarantees belong to whatever transport sits on the receiving
/// end. Events are published under the scope lock, so per-scope order
/// matches commit order.
pub struct QueueEventPublisher {
    channels: Arc<RwLock<HashMap<QueueScope, QueueEventSender>>>,
    global_sender: QueueEventSender,
    capacity: usize,
}

impl QueueEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (global_sender, _) = broadcast::channel(capacity);

        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            global_sender,
            capacity,
        }
    }

    /// Listen to one provider/day queue.
    pub async fn subscribe_scope(&self, scope: QueueScope) -> QueueEventReceiver {
        let mut channels = self.channels.write().await;
        channels
            .entry(scope)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Listen to every queue, e.g. for a monitoring display.
    pub fn subscribe_global(&self) -> QueueEventReceiver {
        self.global_sender.subscribe()
    }

    pub async fn publish(&self, scope: QueueScope, event: &QueueEvent) {
        let message = match serde_json::to_string(event) {
            Ok(message) => message,
            Err(e) => {
                warn!("Failed to serialize queue event for scope {}: {}", scope, e);
                return;
            }
        };

        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(&scope) {
                if let Err(e) = sender.send(message.clone()) {
                    debug!("No listeners for scope {}: {}", scope, e);
                }
            }
        }

        if let Err(e) = self.global_sender.send(message) {
            debug!("No global listeners: {}", e);
        }
    }
}

impl Default for QueueEventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Clone for QueueEventPublisher {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            global_sender: self.global_sender.clone(),
            capacity: self.capacity,
        }
    }
}
