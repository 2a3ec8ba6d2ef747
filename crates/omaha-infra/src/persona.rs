//! File-backed persona source.

use std::path::PathBuf;

use omaha_core::persona::PersonaSource;
use omaha_types::error::PersonaLoadError;

/// Reads the persona document from a file on disk.
#[derive(Debug, Clone)]
pub struct FilePersonaSource {
    path: PathBuf,
}

impl FilePersonaSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PersonaSource for FilePersonaSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<String, PersonaLoadError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        Ok(text)
    }
}
