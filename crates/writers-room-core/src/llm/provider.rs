//! LlmProvider trait definition.
//!
//! This is the single adapter contract every text-generation backend
//! implements: a prompt goes in, plain text comes out.

use writers_room_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for text-generation backends (Anthropic, OpenAI-compatible, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition). Implementations
/// live in writers-room-infra (e.g., `AnthropicProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic", "openai").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
