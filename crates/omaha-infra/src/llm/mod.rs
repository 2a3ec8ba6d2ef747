//! LLM provider implementations.
//!
//! Contains the concrete implementation of the [`LlmProvider`] trait defined
//! in `omaha-core`, and a factory ([`create_provider`]) that builds it from
//! server configuration.

pub mod openai_compat;

use std::sync::Arc;

use secrecy::SecretString;

use omaha_core::llm::provider::LlmProvider;
use omaha_types::config::ServerConfig;

use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config::{custom_endpoint, openai_defaults};

/// Create the upstream provider for a server.
///
/// Returns `None` when no API key is available; the server still starts and
/// answers `/ask` with a 500 until one is configured.
pub fn create_provider(
    config: &ServerConfig,
    api_key: Option<SecretString>,
) -> Option<Arc<dyn LlmProvider>> {
    let Some(api_key) = api_key else {
        tracing::warn!("No upstream API key configured (set OPEN_AI_KEY); /ask will fail");
        return None;
    };

    let oai_config = match config.base_url.as_deref() {
        Some(base_url) => custom_endpoint(api_key, base_url),
        None => openai_defaults(api_key),
    };
    tracing::info!(
        provider = %oai_config.provider_name,
        base_url = %oai_config.base_url,
        model = %config.generation.model,
        "Upstream provider configured"
    );

    Some(Arc::new(OpenAiCompatibleProvider::new(oai_config)))
}
