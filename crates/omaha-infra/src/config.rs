//! Server configuration loader.
//!
//! Reads `omaha.toml` and deserializes it into [`ServerConfig`]. Falls back
//! to defaults when the file is missing or malformed, so a bare checkout can
//! always start a server.

use std::path::Path;

use omaha_types::config::ServerConfig;
use omaha_types::error::ConfigError;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "omaha.toml";

/// Read and parse a configuration file strictly.
pub async fn read_server_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

    toml::from_str::<ServerConfig>(&content).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// Load server configuration from `path`.
///
/// - If the file does not exist, returns [`ServerConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_server_config(path: &Path) -> ServerConfig {
    match read_server_config(path).await {
        Ok(config) => {
            tracing::debug!("Loaded configuration from {}", path.display());
            config
        }
        Err(ConfigError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            ServerConfig::default()
        }
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            ServerConfig::default()
        }
    }
}
