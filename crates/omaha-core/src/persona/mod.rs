//! Persona document cache.
//!
//! The persona is the system-role text that frames every exchange. It is read
//! from a [`PersonaSource`] at most once per [`PersonaCache`]; concurrent first
//! callers share one in-flight load. A failed load is recovered with
//! [`FALLBACK_PERSONA`] and never retried.

use std::future::Future;

use tokio::sync::OnceCell;

use omaha_types::error::PersonaLoadError;

/// Persona used when the configured source cannot be read.
pub const FALLBACK_PERSONA: &str = "You are Warren Buffett, the legendary investor known as \
the Oracle of Omaha. Respond with investment wisdom, business insights, and your characteristic \
folksy but brilliant approach to analyzing companies and markets.";

/// Where the persona document comes from.
///
/// Implementations live in omaha-infra (e.g., `FilePersonaSource`).
pub trait PersonaSource: Send + Sync {
    /// Human-readable location used in log lines.
    fn describe(&self) -> String;

    /// Read the full persona text.
    fn load(&self) -> impl Future<Output = Result<String, PersonaLoadError>> + Send;
}

/// Where the cached persona text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaOrigin {
    Source,
    Fallback,
}

struct CachedPersona {
    text: String,
    origin: PersonaOrigin,
}

/// Load-once cache over a [`PersonaSource`].
pub struct PersonaCache<S> {
    source: S,
    cell: OnceCell<CachedPersona>,
}

impl<S: PersonaSource> PersonaCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Return the persona text, loading it on first use.
    ///
    /// Never fails: a load error is logged and replaced by the fallback,
    /// which then stays cached for the lifetime of the cache.
    pub async fn get(&self) -> &str {
        let cached = self
            .cell
            .get_or_init(|| async {
                match self.load_checked().await {
                    Ok(text) => {
                        tracing::info!(
                            source = %self.source.describe(),
                            size_kb = text.len().div_ceil(1024),
                            "Persona loaded and cached"
                        );
                        CachedPersona {
                            text,
                            origin: PersonaOrigin::Source,
                        }
                    }
                    Err(err) => {
                        tracing::error!(
                            source = %self.source.describe(),
                            error = %err,
                            "Failed to load persona, using fallback"
                        );
                        CachedPersona {
                            text: FALLBACK_PERSONA.to_string(),
                            origin: PersonaOrigin::Fallback,
                        }
                    }
                }
            })
            .await;
        &cached.text
    }

    /// Origin of the cached text, or `None` before the first `get`.
    pub fn origin(&self) -> Option<PersonaOrigin> {
        self.cell.get().map(|cached| cached.origin)
    }

    async fn load_checked(&self) -> Result<String, PersonaLoadError> {
        let text = self.source.load().await?;
        if text.trim().is_empty() {
            return Err(PersonaLoadError::Empty);
        }
        Ok(text)
    }
}
