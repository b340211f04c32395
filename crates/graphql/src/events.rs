//! Broadcast event bus backing GraphQL subscriptions.
//!
//! Every event is a `(topic, payload)` pair on a single tokio broadcast
//! channel. Scene and generation topics embed the identifier they concern,
//! so subscribers for one document or request never wake for another's
//! events; the remaining collaboration topics are global and filtered per
//! subscription.

use serde_json::Value;
use tokio::sync::broadcast;

pub const DOCUMENT_UPDATED: &str = "DOCUMENT_UPDATED";
pub const CHARACTER_UPDATED: &str = "CHARACTER_UPDATED";
pub const PLOT_UPDATED: &str = "PLOT_UPDATED";
pub const COLLABORATOR_JOINED: &str = "COLLABORATOR_JOINED";
pub const COLLABORATOR_LEFT: &str = "COLLABORATOR_LEFT";
pub const CURSOR_MOVED: &str = "CURSOR_MOVED";

/// Topic carrying scene content changes for a single document.
pub fn scene_updated(document_id: &str) -> String {
    format!("SCENE_UPDATED_{document_id}")
}

/// Topic carrying progress events for a single generation request.
pub fn generation_progress(request_id: &str) -> String {
    format!("GENERATION_PROGRESS_{request_id}")
}

/// Handle to the gateway's broadcast channel.
///
/// Cloning is cheap; all clones publish into and subscribe to the same
/// channel. Publishing never blocks and ignores the no-subscriber case.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<(String, Value)>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, topic: impl Into<String>, payload: Value) {
        let topic = topic.into();
        tracing::debug!(%topic, "publish event");
        let _ = self.tx.send((topic, payload));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<(String, Value)> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(scene_updated("doc-1"), json!({ "content": "dawn" }));

        let (topic, payload) = rx.recv().await.unwrap();
        assert_eq!(topic, "SCENE_UPDATED_doc-1");
        assert_eq!(payload["content"], "dawn");
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(CURSOR_MOVED, json!({ "userId": "u1" }));
    }
}
