// Translation backends
//
// The pipeline only sees the `Translator` trait; backends are picked by the
// factory from configuration:
// - Azure: Azure Translator REST API (cloud, needs credentials)
// - Ollama: local LLM server

pub mod azure;
pub mod ollama;

use async_trait::async_trait;

pub use azure::AzureTranslator;
pub use ollama::{OllamaTranslator, check_ollama_availability};

use crate::config::{Credentials, TranslateConfig, TranslationBackend};
use crate::error::{Result, TransdocError};

/// Machine translation of one piece of text
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_language` into `target_language`.
    /// Language codes are passed through unvalidated; the backend rejects
    /// codes it does not know.
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the configured backend. Cloud backends require credentials.
    pub fn create_translator(
        config: &TranslateConfig,
        credentials: Option<Credentials>,
    ) -> Result<Box<dyn Translator>> {
        match config.backend {
            TranslationBackend::Azure => {
                let credentials = credentials
                    .ok_or_else(|| TransdocError::MissingCredential(config.key_env.clone()))?;
                Ok(Box::new(AzureTranslator::new(config, credentials)?))
            }
            TranslationBackend::Ollama => Ok(Box::new(OllamaTranslator::new(config)?)),
        }
    }
}
