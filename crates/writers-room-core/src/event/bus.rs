//! In-process scene event bus.
//!
//! One bus is shared by every director of a production run, its agents and
//! any progress display. Delivery is best effort: publishing with nobody
//! listening drops the event, and a receiver that falls more than
//! `capacity` events behind skips ahead.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use writers_room_types::event::SceneEvent;

/// Default capacity; enough for a few scenes' worth of line notifications.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SceneEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Every event published from now on, for all scenes.
    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.sender.subscribe()
    }

    /// Events published from now on that belong to `scene`.
    pub fn scene(&self, scene: impl Into<String>) -> SceneEvents {
        SceneEvents {
            scene: scene.into(),
            rx: self.sender.subscribe(),
        }
    }

    pub fn publish(&self, event: SceneEvent) {
        // Err only means no receivers.
        let _ = self.sender.send(event);
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

/// Receiver scoped to one scene. Lag is logged and skipped.
#[derive(Debug)]
pub struct SceneEvents {
    scene: String,
    rx: broadcast::Receiver<SceneEvent>,
}

impl SceneEvents {
    /// Next event for this scene, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<SceneEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.scene() == self.scene => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(scene = %self.scene, skipped, "Scene event receiver lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
