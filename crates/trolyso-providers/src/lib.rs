//! # TroLySo Providers
//!
//! Generative-text backends behind the [`Provider`] trait. Only Google
//! Gemini is wired today; the name in `[llm] provider` selects the backend.

pub mod gemini;

use trolyso_core::config::TroLySoConfig;
use trolyso_core::error::{Result, TroLySoError};
use trolyso_core::traits::Provider;

/// Create the configured provider.
pub fn create_provider(config: &TroLySoConfig) -> Result<Box<dyn Provider>> {
    match config.llm.provider.as_str() {
        "gemini" | "google" => Ok(Box::new(gemini::GeminiProvider::from_config(&config.llm)?)),
        other => Err(TroLySoError::ProviderNotFound(other.into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_default_provider() {
        let provider = create_provider(&TroLySoConfig::default()).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_unknown_provider() {
        let mut config = TroLySoConfig::default();
        config.llm.provider = "openai".into();
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, TroLySoError::ProviderNotFound(name) if name == "openai"));
    }

    #[test]
    fn test_google_alias() {
        let mut config = TroLySoConfig::default();
        config.llm.provider = "google".into();
        assert_eq!(create_provider(&config).unwrap().name(), "gemini");
    }
}
