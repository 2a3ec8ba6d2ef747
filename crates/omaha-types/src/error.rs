use thiserror::Error;

/// Errors from building the outbound prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("question is required")]
    EmptyQuestion,
}

/// Failure to read the persona document. Always recovered by the cache.
#[derive(Debug, Error)]
pub enum PersonaLoadError {
    #[error("persona source unreadable: {0}")]
    Io(#[from] std::io::Error),

    #[error("persona document is empty")]
    Empty,
}

/// Errors surfaced while reading a relay response body.
#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("transport error: {0}")]
    Transport(String),

    /// The relay answered with a non-success status instead of a stream.
    #[error("relay returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Errors from mutating the client-side transcript.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("an exchange is already in flight")]
    Busy,

    #[error("question is required")]
    EmptyQuestion,
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_error_display() {
        assert_eq!(ComposeError::EmptyQuestion.to_string(), "question is required");
    }

    #[test]
    fn test_persona_load_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PersonaLoadError = io.into();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Parse {
            path: "omaha.toml".to_string(),
            message: "expected `=`".to_string(),
        };
        assert_eq!(err.to_string(), "failed to parse omaha.toml: expected `=`");
    }
}
