//! Text-generation provider abstractions.
//!
//! - `LlmProvider`: native async trait for concrete provider implementations
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//!
//! Every provider-specific response shape is unwrapped inside the adapter;
//! callers only ever see `CompletionResponse::content` as plain text.

pub mod box_provider;
pub mod provider;

pub use box_provider::BoxLlmProvider;
pub use provider::LlmProvider;
