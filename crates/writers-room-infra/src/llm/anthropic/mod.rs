//! Anthropic Claude provider.
//!
//! [`AnthropicProvider`] implements the
//! [`LlmProvider`](writers_room_core::llm::provider::LlmProvider) trait for
//! the Anthropic Messages API.

pub mod client;
pub mod types;

pub use client::AnthropicProvider;
