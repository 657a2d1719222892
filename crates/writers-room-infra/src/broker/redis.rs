//! Redis pub/sub broker.
//!
//! Events travel as JSON text on plain Redis channels. Publishing goes over a
//! shared multiplexed connection; every subscription opens its own pub/sub
//! connection since a connection in subscribe mode cannot issue commands.

use futures_util::StreamExt;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::{debug, warn};

use writers_room_core::channel::broker::validate_channel;
use writers_room_core::channel::{Broker, BrokerError, Subscription};
use writers_room_types::dialog::ChannelEvent;

pub struct RedisBroker {
    client: redis::Client,
    publisher: MultiplexedConnection,
    url: String,
}

impl RedisBroker {
    /// Open a client for `url` and establish the publishing connection.
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client =
            redis::Client::open(url).map_err(|e| BrokerError::Connection(e.to_string()))?;
        let publisher = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        debug!(%url, "connected to redis");

        Ok(Self {
            client,
            publisher,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker").field("url", &self.url).finish()
    }
}

fn encode(event: &ChannelEvent) -> Result<String, BrokerError> {
    serde_json::to_string(event).map_err(|e| BrokerError::Encode(e.to_string()))
}

/// Decode one payload, or `None` when it is not a channel event.
fn decode(channel: &str, payload: &str) -> Option<ChannelEvent> {
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(%channel, error = %e, "discarding undecodable payload");
            None
        }
    }
}

impl Broker for RedisBroker {
    fn name(&self) -> &str {
        "redis"
    }

    async fn publish(&self, channel: &str, event: &ChannelEvent) -> Result<usize, BrokerError> {
        validate_channel(channel)?;
        let payload = encode(event)?;

        let mut conn = self.publisher.clone();
        let receivers: usize = conn
            .publish(channel, payload)
            .await
            .map_err(|e| BrokerError::Publish(e.to_string()))?;
        debug!(%channel, receivers, "published event to redis");
        Ok(receivers)
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, BrokerError> {
        validate_channel(channel)?;

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()))?;

        let label = channel.to_string();
        let stream = pubsub.into_on_message().filter_map(move |msg| {
            let event = match msg.get_payload::<String>() {
                Ok(payload) => decode(&label, &payload),
                Err(e) => {
                    warn!(channel = %label, error = %e, "discarding non-text payload");
                    None
                }
            };
            std::future::ready(event)
        });

        Ok(Subscription::new(channel, stream))
    }
}
