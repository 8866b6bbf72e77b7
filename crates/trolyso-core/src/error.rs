//! Error types shared by all TroLySo crates.

/// Top-level error for every fallible TroLySo operation.
#[derive(Debug, thiserror::Error)]
pub enum TroLySoError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reference document could not be loaded or indexed.
    #[error("knowledge error: {0}")]
    Knowledge(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    #[error("API key missing for provider: {0}")]
    ApiKeyMissing(String),

    #[error("HTTP error: {0}")]
    Http(String),

    /// Backend call exceeded its time budget.
    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error("channel error: {0}")]
    Channel(String),

    /// History store read/write failure.
    #[error("memory error: {0}")]
    Memory(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, TroLySoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TroLySoError::Timeout(30);
        assert_eq!(err.to_string(), "timed out after 30s");
        let err = TroLySoError::Memory("disk full".into());
        assert_eq!(err.to_string(), "memory error: disk full");
    }

    #[test]
    fn test_io_conversion() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here.txt")?)
        }
        assert!(matches!(read(), Err(TroLySoError::Io(_))));
    }
}
