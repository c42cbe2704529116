//! Content-generation service used by AI grouping.
//!
//! Provides the [`ContentGenerator`] trait and a Gemini implementation. The
//! generator is created via [`create_generator`] from configuration.

pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

/// Why a generation request produced no usable text.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("content generation is disabled: no API key provided")]
    Disabled,
    #[error("request to content service failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("content service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no content returned from content service")]
    EmptyResponse,
}

/// Trait for structured text generation.
///
/// `schema` describes the JSON object the caller expects back; implementations
/// forward it to the service and return the raw JSON text unparsed.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, GenerateError>;
}

/// Create a content generator from config.
///
/// An empty API key yields a generator whose every call fails with
/// [`GenerateError::Disabled`], so callers fall back instead of erroring at startup.
pub fn create_generator(config: &crate::config::AiConfig) -> anyhow::Result<Box<dyn ContentGenerator>> {
    let generator = gemini::GeminiGenerator::new(config)?;
    Ok(Box::new(generator))
}
