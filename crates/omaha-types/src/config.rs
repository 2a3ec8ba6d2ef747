//! Server configuration types for Omaha.
//!
//! `ServerConfig` represents `omaha.toml`. Every field has a default, so an
//! empty or missing file yields a working server.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the relay server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Location of the persona document.
    #[serde(default = "default_persona_path")]
    pub persona_path: String,

    /// Maximum number of non-system history entries forwarded upstream.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Seconds of upstream silence before a relay session gives up.
    #[serde(default = "default_upstream_idle_timeout_secs")]
    pub upstream_idle_timeout_secs: u64,

    /// Override for the OpenAI-compatible API base URL.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Generation parameters applied to every upstream call.
    #[serde(default)]
    pub generation: GenerationPolicy,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_persona_path() -> String {
    "public/buffet.md".to_string()
}

fn default_history_limit() -> usize {
    20
}

fn default_upstream_idle_timeout_secs() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            persona_path: default_persona_path(),
            history_limit: default_history_limit(),
            upstream_idle_timeout_secs: default_upstream_idle_timeout_secs(),
            base_url: None,
            generation: GenerationPolicy::default(),
        }
    }
}

/// Model parameters for upstream calls.
///
/// Set by the operator, never by the requesting client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPolicy {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "gpt-4.1-2025-04-14".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

impl Default for GenerationPolicy {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}
