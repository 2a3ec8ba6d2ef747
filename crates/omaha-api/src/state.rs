//! Application state shared by the HTTP handlers.

use std::sync::Arc;

use omaha_core::llm::provider::LlmProvider;
use omaha_core::persona::PersonaCache;
use omaha_infra::llm::create_provider;
use omaha_infra::persona::FilePersonaSource;
use omaha_infra::secret::resolve_api_key;
use omaha_types::config::ServerConfig;

/// Shared relay state.
///
/// The persona cache lives here so every request in the process shares one
/// load. `provider` is `None` when no API key was found.
#[derive(Clone)]
pub struct AppState {
    pub persona: Arc<PersonaCache<FilePersonaSource>>,
    pub provider: Option<Arc<dyn LlmProvider>>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        let persona = PersonaCache::new(FilePersonaSource::new(&config.persona_path));
        Self {
            persona: Arc::new(persona),
            provider,
            config: Arc::new(config),
        }
    }

    /// Wire the production provider from the environment credential.
    pub fn init(config: ServerConfig) -> Self {
        let provider = create_provider(&config, resolve_api_key());
        Self::new(config, provider)
    }
}
