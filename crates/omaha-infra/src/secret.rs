//! Upstream credential lookup.
//!
//! The API key is read from the environment only. `OPEN_AI_KEY` is checked
//! first, then the conventional `OPENAI_API_KEY`. The value is wrapped in a
//! [`SecretString`] immediately and never logged.

use secrecy::SecretString;

/// Environment variables consulted for the API key, in priority order.
pub const API_KEY_VARS: [&str; 2] = ["OPEN_AI_KEY", "OPENAI_API_KEY"];

/// Resolve the upstream API key from the process environment.
pub fn resolve_api_key() -> Option<SecretString> {
    resolve_with(|name| std::env::var(name).ok())
}

/// Resolve the API key through an arbitrary lookup.
///
/// Blank values are treated as unset.
pub fn resolve_with<F>(lookup: F) -> Option<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS.iter().find_map(|&name| {
        lookup(name)
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                tracing::debug!(source = name, "Resolved upstream API key");
                SecretString::from(value)
            })
    })
}
