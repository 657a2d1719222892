//! Infrastructure layer for the Writers' Room.
//!
//! Implements the ports defined in `writers-room-core`: the Redis dialog
//! broker, text-generation providers, YAML character/scene loaders, the
//! filesystem transcript store, and the TOML configuration loader.

pub mod broker;
pub mod config;
pub mod filesystem;
pub mod llm;
