use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::config::TranslateConfig;
use crate::error::{Result, TransdocError};
use crate::language::language_name;
use super::Translator;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TranslationPayload {
    text: String,
}

/// Translation through a local Ollama model
pub struct OllamaTranslator {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaTranslator {
    pub fn new(config: &TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url().trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Build the translation prompt, asking for a JSON answer
    fn build_prompt(&self, text: &str, source_language: &str, target_language: &str) -> String {
        let source_name = language_name(source_language);
        let target_name = language_name(target_language);

        format!(
            "You are a professional translator.\n\
             \n\
             Translate the text below from {} to {} ONLY. Do not translate to any other language.\n\
             The target language is: {} (language code: {})\n\
             \n\
             Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
             Do not include any explanations, alternatives, or text in other languages.\n\
             \n\
             [Text to translate]\n\
             {}\n",
            source_name, target_name, target_name, target_language, target_name, text
        )
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: self.build_prompt(text, source_language, target_language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TransdocError::Translation(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let generated: GenerateResponse = response.json().await?;

        extract_translation(&generated.response)
    }
}

/// Pull the translation out of the model output. Models do not always honour
/// the JSON format, so free text is cleaned up as a fallback.
fn extract_translation(raw: &str) -> Result<String> {
    let raw = raw.trim();
    debug!("Raw Ollama response: {}", raw);

    if raw.is_empty() {
        return Err(TransdocError::Translation("Empty translation received".to_string()));
    }

    if let Ok(payload) = serde_json::from_str::<TranslationPayload>(raw) {
        return Ok(payload.text.trim().to_string());
    }

    Ok(clean_translation_response(raw))
}

/// Clean up free-form model output to extract just the translation
fn clean_translation_response(response: &str) -> String {
    let lines: Vec<&str> = response.lines().collect();

    for &line in &lines {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("Here is")
            || trimmed.starts_with("Here are")
            || trimmed.starts_with("Option")
            || trimmed.starts_with("**Option")
            || trimmed.starts_with("Translation:")
            || trimmed.starts_with("- ")
            || trimmed.starts_with("* ")
        {
            continue;
        }

        if trimmed.starts_with("**") && trimmed.ends_with("**") {
            continue;
        }

        if trimmed.chars().count() > 3 {
            return trimmed.to_string();
        }
    }

    lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .unwrap_or(response)
        .to_string()
}

/// Check if Ollama is available and the model is loaded
pub async fn check_ollama_availability(endpoint: &str, model: &str) -> Result<()> {
    let client = Client::new();
    let url = format!("{}/api/show", endpoint.trim_end_matches('/'));

    let response = client
        .post(&url)
        .json(&json!({ "name": model }))
        .send()
        .await
        .map_err(|e| TransdocError::Config(format!("Failed to connect to Ollama: {}", e)))?;

    if response.status().is_success() {
        info!("Ollama model '{}' is available", model);
        Ok(())
    } else {
        Err(TransdocError::Config(format!(
            "Ollama model '{}' not found. Please pull the model first: ollama pull {}",
            model, model
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslationBackend;

    fn translator() -> OllamaTranslator {
        let config = TranslateConfig {
            backend: TranslationBackend::Ollama,
            endpoint: Some("http://localhost:11434/".to_string()),
            ..TranslateConfig::default()
        };
        OllamaTranslator::new(&config).unwrap()
    }

    #[test]
    fn test_prompt_names_both_languages() {
        let prompt = translator().build_prompt("Good morning.", "en", "ja");
        assert!(prompt.contains("from English to Japanese"));
        assert!(prompt.contains("language code: ja"));
        assert!(prompt.ends_with("Good morning.\n"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let config = TranslateConfig {
            backend: TranslationBackend::Ollama,
            endpoint: Some("http://127.0.0.1:9".to_string()),
            timeout_secs: 5,
            ..TranslateConfig::default()
        };
        let result = OllamaTranslator::new(&config)
            .unwrap()
            .translate("Hello.", "en", "fr")
            .await;
        assert!(matches!(result, Err(TransdocError::Http(_))));
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        assert_eq!(translator().endpoint, "http://localhost:11434");
    }

    #[test]
    fn test_extract_json_translation() {
        assert_eq!(extract_translation(r#" {"text":" Bonjour. "} "#).unwrap(), "Bonjour.");
        assert!(extract_translation("   ").is_err());
    }

    #[test]
    fn test_extract_free_text_translation() {
        let raw = "Here is the translation:\n\n**French**\nBonjour tout le monde.\n- alternative";
        assert_eq!(extract_translation(raw).unwrap(), "Bonjour tout le monde.");
        assert_eq!(clean_translation_response("Oui"), "Oui");
    }
}
