use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Credentials, TranslateConfig};
use crate::error::{Result, TransdocError};
use super::Translator;

const API_VERSION: &str = "3.0";

#[derive(Debug, Serialize)]
struct TranslateItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponseItem {
    translations: Vec<TranslationEntry>,
}

#[derive(Debug, Deserialize)]
struct TranslationEntry {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Azure Translator (Cognitive Services) text translation
pub struct AzureTranslator {
    client: Client,
    endpoint: String,
    credentials: Credentials,
}

impl AzureTranslator {
    pub fn new(config: &TranslateConfig, credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url().trim_end_matches('/').to_string(),
            credentials,
        })
    }
}

#[async_trait]
impl Translator for AzureTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String> {
        let url = format!("{}/translate", self.endpoint);
        debug!("Sending {} characters to {}", text.chars().count(), url);

        let response = self
            .client
            .post(&url)
            .query(&[
                ("api-version", API_VERSION),
                ("from", source_language),
                ("to", target_language),
            ])
            .header("Ocp-Apim-Subscription-Key", &self.credentials.key)
            .header("Ocp-Apim-Subscription-Region", &self.credentials.region)
            .json(&[TranslateItem { text }])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(TransdocError::Translation(format!(
                "Azure Translator error {}: {}",
                status,
                error_message(&body)
            )));
        }

        parse_response(&body)
    }
}

/// Extract the first translation from a successful response body
fn parse_response(body: &str) -> Result<String> {
    let items: Vec<TranslateResponseItem> = serde_json::from_str(body)?;

    items
        .into_iter()
        .next()
        .and_then(|item| item.translations.into_iter().next())
        .map(|t| t.text)
        .ok_or_else(|| TransdocError::Translation("Empty translation received".to_string()))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let body = r#"[{"translations":[{"text":"Bonjour le monde.","to":"fr"}]}]"#;
        assert_eq!(parse_response(body).unwrap(), "Bonjour le monde.");
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_response("[]").is_err());
        assert!(parse_response(r#"[{"translations":[]}]"#).is_err());
        assert!(matches!(parse_response("<html>"), Err(TransdocError::Json(_))));
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error":{"code":400036,"message":"The target language is not valid."}}"#;
        assert_eq!(error_message(body), "The target language is not valid.");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_string(&[TranslateItem { text: "Hi" }]).unwrap();
        assert_eq!(body, r#"[{"Text":"Hi"}]"#);
    }
}
