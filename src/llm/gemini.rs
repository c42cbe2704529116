//! Gemini `generateContent` client.
//!
//! Requests JSON output constrained by a response schema and returns the text
//! of the first candidate.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ContentGenerator, GenerateError};
use crate::config::AiConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiGenerator {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        let api_key = Some(config.api_key.trim().to_string()).filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::debug!("no AI API key configured, content generation disabled");
        }
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate_content(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, GenerateError> {
        let api_key = self.api_key.as_deref().ok_or(GenerateError::Disabled)?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| e.without_url())?;
        let parts = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        if parts.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }

        let text: String = parts.into_iter().map(|p| p.text).collect();
        if text.trim().is_empty() {
            return Err(GenerateError::EmptyResponse);
        }
        Ok(text)
    }
}
