//! Network broker backends for the dialog channel.

pub mod redis;

pub use self::redis::RedisBroker;
