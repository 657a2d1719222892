//! In-process broker built on tokio broadcast channels.
//!
//! Each named channel is a `broadcast` sender created on first use. Used by
//! tests and by single-process runs where no external broker is wanted.

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use writers_room_types::dialog::ChannelEvent;

use super::broker::{validate_channel, Broker, BrokerError, Subscription};

/// Buffer size for each broadcast channel.
const BROADCAST_BUFFER: usize = 1024;

/// Broadcast broker living entirely in this process.
pub struct InMemoryBroker {
    /// Per-channel broadcast senders (channel_name -> broadcast sender).
    channels: DashMap<String, broadcast::Sender<ChannelEvent>>,
    capacity: usize,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_capacity(BROADCAST_BUFFER)
    }

    /// Broker whose channels buffer `capacity` events per slow subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Number of live subscriptions on a channel.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    fn receiver(&self, channel: &str) -> broadcast::Receiver<ChannelEvent> {
        let capacity = self.capacity;
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| {
                let (tx, _) = broadcast::channel(capacity);
                tx
            })
            .subscribe()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker for InMemoryBroker {
    fn name(&self) -> &str {
        "memory"
    }

    async fn publish(&self, channel: &str, event: &ChannelEvent) -> Result<usize, BrokerError> {
        validate_channel(channel)?;

        let Some(sender) = self.channels.get(channel) else {
            debug!(%channel, "channel does not exist, event dropped");
            return Ok(0);
        };

        match sender.send(event.clone()) {
            Ok(count) => {
                debug!(%channel, count, "published event to channel");
                Ok(count)
            }
            Err(_) => {
                debug!(%channel, "no active subscribers on channel");
                Ok(0)
            }
        }
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BrokerError> {
        validate_channel(channel)?;

        let mut rx = self.receiver(channel);
        let label = channel.to_string();
        let stream = async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(event) => yield event,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(channel = %label, skipped, "subscriber lagged, events skipped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        };

        Ok(Subscription::new(channel, stream))
    }
}

impl std::fmt::Debug for InMemoryBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBroker")
            .field("channels", &self.channels.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::envelope;
    use crate::channel::BoxBroker;

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let broker = InMemoryBroker::new();
        let mut sub1 = broker.subscribe("room").await.unwrap();
        let mut sub2 = broker.subscribe("room").await.unwrap();

        let event = envelope::dialog("Alice", "s1", "Hello", None, None);
        let count = broker.publish("room", &event).await.unwrap();
        assert_eq!(count, 2);

        assert_eq!(sub1.next().await, Some(event.clone()));
        assert_eq!(sub2.next().await, Some(event));
    }

    #[tokio::test]
    async fn subscribers_see_same_order() {
        let broker = InMemoryBroker::new();
        let mut sub1 = broker.subscribe("room").await.unwrap();
        let mut sub2 = broker.subscribe("room").await.unwrap();

        let events: Vec<_> = (0..20)
            .map(|i| envelope::dialog("Alice", "s1", format!("line {i}"), None, None))
            .collect();
        for event in &events {
            broker.publish("room", event).await.unwrap();
        }

        for expected in &events {
            assert_eq!(sub1.next().await.as_ref(), Some(expected));
            assert_eq!(sub2.next().await.as_ref(), Some(expected));
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_returns_zero() {
        let broker = InMemoryBroker::new();
        let event = envelope::stop("s1");
        assert_eq!(broker.publish("nobody-home", &event).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let broker = InMemoryBroker::new();
        let _early = broker.subscribe("room").await.unwrap();
        broker
            .publish("room", &envelope::dialog("Alice", "s1", "first", None, None))
            .await
            .unwrap();

        let mut late = broker.subscribe("room").await.unwrap();
        let second = envelope::dialog("Alice", "s1", "second", None, None);
        broker.publish("room", &second).await.unwrap();

        assert_eq!(late.next().await, Some(second));
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let broker = InMemoryBroker::new();
        let mut a = broker.subscribe("a").await.unwrap();
        let _b = broker.subscribe("b").await.unwrap();

        broker
            .publish("b", &envelope::dialog("Bob", "s1", "wrong room", None, None))
            .await
            .unwrap();
        let right = envelope::dialog("Alice", "s1", "right room", None, None);
        broker.publish("a", &right).await.unwrap();

        assert_eq!(a.next().await, Some(right));
    }

    #[tokio::test]
    async fn lagged_subscriber_keeps_receiving() {
        let broker = InMemoryBroker::with_capacity(2);
        let mut sub = broker.subscribe("room").await.unwrap();

        for i in 0..6 {
            broker
                .publish("room", &envelope::dialog("Alice", "s1", format!("{i}"), None, None))
                .await
                .unwrap();
        }

        // The oldest events were overwritten; the newest are still delivered.
        let received = sub.next().await.unwrap();
        match received {
            writers_room_types::dialog::ChannelEvent::Dialog(d) => assert_eq!(d.content, "4"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_channel_is_rejected() {
        let broker = InMemoryBroker::new();
        assert!(matches!(
            broker.subscribe("").await,
            Err(BrokerError::InvalidChannel(_))
        ));
    }

    #[tokio::test]
    async fn boxed_broker_delegates() {
        let inner = InMemoryBroker::new();
        let broker = BoxBroker::new(inner);
        assert_eq!(broker.name(), "memory");

        let mut sub = broker.subscribe("room").await.unwrap();
        let event = envelope::start("s1");
        assert_eq!(broker.publish("room", &event).await.unwrap(), 1);
        assert_eq!(sub.next().await, Some(event));
    }

    #[tokio::test]
    async fn subscriber_count_tracks_drops() {
        let broker = InMemoryBroker::new();
        let sub = broker.subscribe("room").await.unwrap();
        assert_eq!(broker.subscriber_count("room"), 1);
        drop(sub);
        assert_eq!(broker.subscriber_count("room"), 0);
    }
}
