//! Base URLs for well-known OpenAI-compatible backends.
//!
//! Each backend that speaks the OpenAI chat completions protocol gets a
//! factory returning an [`OpenAiCompatConfig`] with the right base URL.

use secrecy::SecretString;

/// Configuration for an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Provider name reported in logs and spans (e.g. "openai", "gemini").
    pub provider_name: String,
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when a request leaves `model` empty.
    pub model: String,
}

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

fn defaults(name: &str, base_url: &str, api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: name.into(),
        base_url: base_url.into(),
        api_key,
        model: model.into(),
    }
}

pub fn openai_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    defaults("openai", OPENAI_BASE_URL, api_key, model)
}

pub fn gemini_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    defaults("gemini", GEMINI_BASE_URL, api_key, model)
}

pub fn mistral_defaults(api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    defaults("mistral", MISTRAL_BASE_URL, api_key, model)
}

/// Defaults for a provider name; unknown names get the OpenAI endpoint.
pub fn defaults_for(name: &str, api_key: SecretString, model: &str) -> OpenAiCompatConfig {
    match name {
        "gemini" => gemini_defaults(api_key, model),
        "mistral" => mistral_defaults(api_key, model),
        _ => openai_defaults(api_key, model),
    }
}
