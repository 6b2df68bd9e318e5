use crate::{config::GeminiSettings, utils::AppError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Produces the assistant's reply to a user message.
/// `Ok(None)` means the model answered with no text.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, AppError>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}

/// Google Generative Language API client.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Self {
        if settings.api_key.is_none() {
            log::warn!("⚠️  GOOGLE_API_KEY not set, assistant replies will fail");
        }
        Self {
            client: reqwest::Client::new(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("GOOGLE_API_KEY is not configured".to_string()))?;

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_BASE,
            urlencoding::encode(&self.model),
            urlencoding::encode(api_key)
        );

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        log::debug!("🤖 Requesting reply from {}", self.model);
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(AppError::External(format!("Gemini API error: {}", response.status())));
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.first_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_extraction() {
        let raw = serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "Try a short walk." } ], "role": "model" } }
            ]
        });
        let parsed: GenerateResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.first_text().as_deref(), Some("Try a short walk."));
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        let parsed: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(parsed.first_text(), None);

        let blank: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [ { "content": { "parts": [ { "text": "  " } ] } } ]
        }))
        .unwrap();
        assert_eq!(blank.first_text(), None);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let client = GeminiClient::new(&GeminiSettings {
            api_key: None,
            model: "gemini-2.0-flash".into(),
        });
        assert!(matches!(client.generate("hello there").await, Err(AppError::Config(_))));
    }
}
