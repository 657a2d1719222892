//! Broker abstraction for the dialog channel.
//!
//! A broker carries `ChannelEvent`s over named broadcast channels. Delivery
//! is fire-and-forget: every subscriber receives every event published after
//! it subscribed, in publish order, with no acknowledgement.
//!
//! Follows the same blanket-impl pattern as `BoxLlmProvider`:
//! 1. `Broker` uses native async fn in traits for implementors
//! 2. Object-safe `BrokerDyn` with boxed futures, blanket-impl'd for all `T: Broker`
//! 3. `BoxBroker` wraps `Box<dyn BrokerDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tracing::warn;

use writers_room_types::dialog::ChannelEvent;

/// Errors that can occur during broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("invalid channel name: '{0}'")]
    InvalidChannel(String),

    #[error("broker connection failed: {0}")]
    Connection(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("cannot encode event: {0}")]
    Encode(String),
}

/// Reject channel names no broker can carry.
pub fn validate_channel(channel: &str) -> Result<(), BrokerError> {
    if channel.trim().is_empty() {
        return Err(BrokerError::InvalidChannel(channel.to_string()));
    }
    Ok(())
}

/// Stream of events from one channel, established at subscribe time.
///
/// Events that fail protocol validation are dropped here with a warning, so
/// consumers only ever see well-formed events.
pub struct Subscription {
    channel: String,
    inner: Pin<Box<dyn Stream<Item = ChannelEvent> + Send + 'static>>,
}

impl Subscription {
    pub fn new<S>(channel: impl Into<String>, stream: S) -> Self
    where
        S: Stream<Item = ChannelEvent> + Send + 'static,
    {
        let channel = channel.into();
        let label = channel.clone();
        let inner = stream.filter(move |event| {
            let keep = match event.validate() {
                Ok(()) => true,
                Err(reason) => {
                    warn!(channel = %label, %reason, "discarding malformed channel event");
                    false
                }
            };
            std::future::ready(keep)
        });

        Self {
            channel,
            inner: Box::pin(inner),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next event, or `None` once the channel is gone.
    pub async fn next(&mut self) -> Option<ChannelEvent> {
        self.inner.next().await
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .finish()
    }
}

/// Trait for dialog channel backends (in-memory, Redis).
pub trait Broker: Send + Sync {
    /// Human-readable backend name (e.g., "memory", "redis").
    fn name(&self) -> &str;

    /// Publish an event to every current subscriber of `channel`.
    ///
    /// Returns the number of receivers reached when the backend knows it.
    /// Publishing to a channel with no subscribers is not an error.
    fn publish(
        &self,
        channel: &str,
        event: &ChannelEvent,
    ) -> impl Future<Output = Result<usize, BrokerError>> + Send;

    /// Subscribe to `channel`. Only events published after this resolves
    /// are delivered.
    fn subscribe(
        &self,
        channel: &str,
    ) -> impl Future<Output = Result<Subscription, BrokerError>> + Send;
}

/// Object-safe version of [`Broker`] with boxed futures.
pub trait BrokerDyn: Send + Sync {
    fn name(&self) -> &str;

    fn publish_boxed<'a>(
        &'a self,
        channel: &'a str,
        event: &'a ChannelEvent,
    ) -> Pin<Box<dyn Future<Output = Result<usize, BrokerError>> + Send + 'a>>;

    fn subscribe_boxed<'a>(
        &'a self,
        channel: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Subscription, BrokerError>> + Send + 'a>>;
}

impl<T: Broker> BrokerDyn for T {
    fn name(&self) -> &str {
        Broker::name(self)
    }

    fn publish_boxed<'a>(
        &'a self,
        channel: &'a str,
        event: &'a ChannelEvent,
    ) -> Pin<Box<dyn Future<Output = Result<usize, BrokerError>> + Send + 'a>> {
        Box::pin(self.publish(channel, event))
    }

    fn subscribe_boxed<'a>(
        &'a self,
        channel: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Subscription, BrokerError>> + Send + 'a>> {
        Box::pin(self.subscribe(channel))
    }
}

/// Type-erased broker for runtime backend selection.
///
/// Since `Broker` uses native async fn in traits it cannot be a trait object
/// directly; `BoxBroker` offers the same methods over `BrokerDyn`.
pub struct BoxBroker {
    inner: Box<dyn BrokerDyn + Send + Sync>,
}

impl BoxBroker {
    pub fn new<T: Broker + 'static>(broker: T) -> Self {
        Self {
            inner: Box::new(broker),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn publish(&self, channel: &str, event: &ChannelEvent) -> Result<usize, BrokerError> {
        self.inner.publish_boxed(channel, event).await
    }

    pub async fn subscribe(&self, channel: &str) -> Result<Subscription, BrokerError> {
        self.inner.subscribe_boxed(channel).await
    }
}

impl std::fmt::Debug for BoxBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxBroker")
            .field("name", &self.inner.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::envelope;
    use futures_util::stream;

    #[tokio::test]
    async fn subscription_drops_malformed_events() {
        let good = envelope::dialog("Alice", "s1", "Hello", None, None);
        let blank_speaker = envelope::dialog("", "s1", "Hello", None, None);
        let blank_content = envelope::dialog("Bob", "s1", "   ", None, None);

        let mut sub = Subscription::new(
            "room",
            stream::iter(vec![blank_speaker, good.clone(), blank_content]),
        );

        assert_eq!(sub.next().await, Some(good));
        assert_eq!(sub.next().await, None);
        assert_eq!(sub.channel(), "room");
    }

    #[test]
    fn validate_channel_rejects_blank() {
        assert!(validate_channel("writers_room:dialog").is_ok());
        assert!(matches!(
            validate_channel("  "),
            Err(BrokerError::InvalidChannel(_))
        ));
    }
}
