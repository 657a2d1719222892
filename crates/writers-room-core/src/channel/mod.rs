//! Dialog channel plumbing.
//!
//! - `broker` -- `Broker` trait, object-safe `BoxBroker` wrapper and `Subscription`
//! - `memory` -- `InMemoryBroker` built on tokio broadcast channels
//! - `envelope` -- Helper constructors for `ChannelEvent`

pub mod broker;
pub mod envelope;
pub mod memory;

pub use broker::{BoxBroker, Broker, BrokerError, Subscription};
pub use memory::InMemoryBroker;
