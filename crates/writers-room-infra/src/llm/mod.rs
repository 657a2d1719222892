//! Text-generation provider implementations.
//!
//! Concrete [`LlmProvider`](writers_room_core::llm::provider::LlmProvider)
//! implementations plus a factory ([`create_provider`]) that builds the
//! right one from a [`ProviderConfig`].

pub mod anthropic;
pub mod openai_compat;

use secrecy::SecretString;
use tracing::debug;

use writers_room_core::llm::box_provider::BoxLlmProvider;
use writers_room_types::llm::{LlmError, ProviderConfig, ProviderType};

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{OpenAiCompatConfig, defaults_for};

/// Read the API key named by `config.api_key_env` from the environment.
pub fn resolve_api_key(config: &ProviderConfig) -> Result<SecretString, LlmError> {
    resolve_api_key_with(config, |name| std::env::var(name).ok())
}

fn resolve_api_key_with(
    config: &ProviderConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, LlmError> {
    match lookup(&config.api_key_env) {
        Some(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim().to_string())),
        _ => {
            debug!(env = %config.api_key_env, "API key environment variable missing or empty");
            Err(LlmError::AuthenticationFailed)
        }
    }
}

/// Build a [`BoxLlmProvider`] from a [`ProviderConfig`] and a resolved key.
pub fn create_provider(
    config: &ProviderConfig,
    api_key: SecretString,
) -> Result<BoxLlmProvider, LlmError> {
    match config.provider_type {
        ProviderType::Anthropic => {
            let mut provider = AnthropicProvider::new(api_key, config.model.clone())?;
            if let Some(base_url) = config.base_url.as_deref() {
                provider = provider.with_base_url(base_url);
            }
            Ok(BoxLlmProvider::new(provider))
        }
        ProviderType::OpenAiCompatible => {
            let name = config.name.as_deref().unwrap_or("openai");
            let oai_config = match config.base_url.as_deref() {
                Some(base_url) => OpenAiCompatConfig {
                    provider_name: name.to_string(),
                    base_url: base_url.to_string(),
                    api_key,
                    model: config.model.clone(),
                },
                None => defaults_for(name, api_key, &config.model),
            };
            Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(oai_config)))
        }
    }
}
