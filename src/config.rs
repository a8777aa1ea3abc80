use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, TransdocError};
use crate::language::{self, DEFAULT_SOURCE_LANGUAGE, DEFAULT_TARGET_LANGUAGE};

/// Default chunk budget in characters. Matches the request size limit of the
/// common cloud translation APIs.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 5000;

pub const AZURE_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";
pub const OLLAMA_ENDPOINT: &str = "http://localhost:11434";

fn default_timeout_secs() -> u64 {
    300
}

fn default_include_language() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Translation backend
    pub backend: TranslationBackend,
    /// ISO 639-1 source language code
    pub source_language: String,
    /// ISO 639-1 target language code
    pub target_language: String,
    /// Maximum characters per translation request
    pub max_chunk_size: usize,
    /// Backend endpoint URL; the backend's public default when unset
    pub endpoint: Option<String>,
    /// Environment variable holding the subscription key
    pub key_env: String,
    /// Environment variable holding the resource region
    pub region_env: String,
    /// LLM model (Ollama backend only)
    pub model: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationBackend {
    /// Azure Translator REST API (requires credentials)
    Azure,
    /// Local Ollama server
    Ollama,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// PDF to DOCX conversion backend
    pub backend: ConvertBackend,
    /// Path to the converter binary
    pub binary_path: String,
    /// Argument template for the Command backend.
    /// Placeholders: {input}, {output}, {outdir}
    pub args: Vec<String>,
    /// Kill the converter after this many seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvertBackend {
    /// Headless LibreOffice (`soffice --convert-to docx`)
    Office,
    /// Any external program driven by the argument template
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory; defaults to the input file's directory
    pub directory: Option<PathBuf>,
    /// Append `_<target>` to output file names
    pub include_language: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackend::Azure,
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            endpoint: None,
            key_env: "TRANSLATOR_KEY".to_string(),
            region_env: "TRANSLATOR_REGION".to_string(),
            model: "llama3.2:3b".to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranslateConfig {
    /// Endpoint to talk to for the selected backend
    pub fn endpoint_url(&self) -> &str {
        match (&self.endpoint, self.backend) {
            (Some(endpoint), _) => endpoint,
            (None, TranslationBackend::Azure) => AZURE_ENDPOINT,
            (None, TranslationBackend::Ollama) => OLLAMA_ENDPOINT,
        }
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            backend: ConvertBackend::Office,
            binary_path: "soffice".to_string(),
            args: vec![
                // Example template for the Command backend:
                // "convert".to_string(), "{input}".to_string(), "{output}".to_string(),
            ],
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            include_language: default_include_language(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TransdocError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TransdocError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TransdocError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject settings that would make every run fail
    pub fn validate(&self) -> Result<()> {
        let translate = &self.translate;
        if translate.max_chunk_size == 0 {
            return Err(TransdocError::Config("max_chunk_size must be greater than 0".to_string()));
        }
        if translate.source_language.trim().is_empty() {
            return Err(TransdocError::Config("source_language must not be empty".to_string()));
        }
        if !language::is_supported_target(&translate.target_language) {
            return Err(TransdocError::Config(format!(
                "Unsupported target language '{}'. Supported: {}",
                translate.target_language,
                language::SUPPORTED_TARGET_LANGUAGES.join(", ")
            )));
        }
        if self.convert.backend == ConvertBackend::Command && self.convert.args.is_empty() {
            return Err(TransdocError::Config(
                "convert.args must be set for the Command backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// Subscription key and region for the cloud backend.
#[derive(Clone)]
pub struct Credentials {
    pub key: String,
    pub region: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl Credentials {
    /// Read both values from the process environment
    pub fn from_env(config: &TranslateConfig) -> Result<Self> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Resolve both values through `lookup`. Missing or blank values are fatal.
    pub fn from_lookup<F>(config: &TranslateConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| TransdocError::MissingCredential(name.to_string()))
        };

        Ok(Self {
            key: fetch(&config.key_env)?,
            region: fetch(&config.region_env)?,
        })
    }
}
