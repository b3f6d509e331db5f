//! Image title extraction via Gemini
//!
//! Sends a photo (a shelf of DVDs, a list on a whiteboard) to Gemini's
//! `generateContent` endpoint and asks for the movie titles it can read.
//! Models are tried in configured order; the next model is only tried when
//! the previous one failed outright.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1/models";

/// Image uploads can be large; allow the model time to read them
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const EXTRACTION_PROMPT: &str = "What are the titles of all the movies in this image? \
Return the titles only, with no other text, separated by line breaks.";

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

/// Turns image bytes into candidate movie titles
///
/// An empty result means the extraction failed or found nothing; callers
/// cannot tell the two apart.
#[async_trait]
pub trait TitleExtractor: Send + Sync {
    async fn extract_titles(&self, image: &[u8]) -> Vec<String>;
}

/// Extractor used when no Gemini key is configured
pub struct DisabledExtractor;

#[async_trait]
impl TitleExtractor for DisabledExtractor {
    async fn extract_titles(&self, _image: &[u8]) -> Vec<String> {
        warn!("Image title extraction requested but no Gemini API key is configured");
        Vec::new()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
    models: Vec<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, models: Vec<String>) -> Result<Self, ExtractorError> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ExtractorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            models,
        })
    }

    async fn generate(&self, model: &str, image: &[u8]) -> Result<String, ExtractorError> {
        let url = format!("{}/{}:generateContent", GEMINI_API_URL, model);
        let body = json!({
            "contents": [{
                "parts": [
                    {
                        "inline_data": {
                            "mime_type": "image/jpeg",
                            "data": base64::engine::general_purpose::STANDARD.encode(image),
                        }
                    },
                    { "text": EXTRACTION_PROMPT }
                ]
            }]
        });

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ExtractorError::Api(status.as_u16(), text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ExtractorError::Parse(e.to_string()))?;

        response_text(parsed).ok_or(ExtractorError::EmptyResponse)
    }
}

#[async_trait]
impl TitleExtractor for GeminiClient {
    async fn extract_titles(&self, image: &[u8]) -> Vec<String> {
        for model in &self.models {
            match self.generate(model, image).await {
                Ok(text) => {
                    let titles = split_titles(&text);
                    info!(model = %model, count = titles.len(), "Gemini extracted titles");
                    return titles;
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Gemini model failed");
                }
            }
        }

        warn!(models = ?self.models, "All Gemini models failed");
        Vec::new()
    }
}

fn response_text(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// One title per non-blank line, trimmed
pub fn split_titles(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_titles_drops_blank_lines() {
        let titles = split_titles("The Matrix\n\n  Speed  \r\nHeat\n");
        assert_eq!(titles, vec!["The Matrix", "Speed", "Heat"]);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"The Matrix\n"},{"text":"Speed"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(response).as_deref(), Some("The Matrix\nSpeed"));
    }

    #[test]
    fn test_response_without_text_is_empty() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(response_text(response).is_none());
    }

    #[tokio::test]
    async fn test_disabled_extractor_returns_nothing() {
        assert!(DisabledExtractor.extract_titles(b"jpeg").await.is_empty());
    }
}
