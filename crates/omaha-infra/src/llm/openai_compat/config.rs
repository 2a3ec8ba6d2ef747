//! Configuration for the OpenAI-compatible provider.

use secrecy::SecretString;

/// Default chat completions endpoint.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for an [`super::OpenAiCompatibleProvider`].
///
/// Not `Debug`: the API key must not end up in logs.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name used in log lines.
    pub provider_name: String,
    /// Base URL of the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
}

/// OpenAI default configuration.
pub fn openai_defaults(api_key: SecretString) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: OPENAI_BASE_URL.into(),
        api_key,
    }
}

/// Configuration for any other endpoint speaking the same protocol.
pub fn custom_endpoint(api_key: SecretString, base_url: &str) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai-compatible".into(),
        base_url: base_url.trim_end_matches('/').into(),
        api_key,
    }
}
