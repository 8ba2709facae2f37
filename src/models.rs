//! Data models and structures
//!
//! Defines the core data structures for generation outcomes, persisted
//! records, and process-wide configuration.

use crate::encoding::VisualInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resolution of a single generation invocation.
///
/// Exactly one variant is populated per invocation; consumers pattern-match
/// exhaustively over all three.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// The backend returned an inline image artifact.
    Image(VisualInput),
    /// The backend declined to synthesize an image and explained why in text.
    TextFallback(String),
    /// The response carried neither an image nor an explanation.
    Failure(String),
}

/// Structured prompt/response metadata persisted with every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMetadata {
    /// The full instruction text sent to the backend.
    pub instruction: String,
    /// Explanation returned by the backend when the degraded path ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_text: Option<String>,
}

/// Row payload for a completed workflow run. Written once, never updated.
#[derive(Debug, Clone, Serialize)]
pub struct NewGenerationRecord {
    pub drawing_url: String,
    pub result_url: String,
    pub photo_url: String,
    pub prompts_used: PromptMetadata,
    pub stage: String,
}

/// Persisted generation record as returned by the record store.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRecord {
    pub id: i64,
    pub drawing_url: String,
    pub result_url: String,
    pub photo_url: String,
    pub prompts_used: PromptMetadata,
    pub stage: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Process-wide configuration, initialized once at startup and read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub image_model: String,
    pub storage_access_key_id: String,
    pub storage_secret_access_key: String,
    pub storage_endpoint: String,
    pub storage_bucket: String,
    pub storage_base_url: String,
    pub record_api_url: String,
    pub record_api_key: String,
    pub record_table: String,
    pub scene_base_url: String,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let storage_base_url = std::env::var("STORAGE_BASE_URL")
            .unwrap_or_else(|_| "https://stageme.nyc3.cdn.digitaloceanspaces.com".to_string());

        Ok(Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .map_err(|_| crate::Error::Config("GEMINI_API_KEY not set".to_string()))?,
            image_model: std::env::var("GEMINI_IMAGE_MODEL")
                .unwrap_or_else(|_| "gemini-3-pro-image-preview".to_string()),
            storage_access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .map_err(|_| crate::Error::Config("STORAGE_ACCESS_KEY_ID not set".to_string()))?,
            storage_secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY").map_err(
                |_| crate::Error::Config("STORAGE_SECRET_ACCESS_KEY not set".to_string()),
            )?,
            storage_endpoint: std::env::var("STORAGE_ENDPOINT")
                .unwrap_or_else(|_| "https://nyc3.digitaloceanspaces.com".to_string()),
            storage_bucket: std::env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "stageme".to_string()),
            record_api_url: std::env::var("RECORD_API_URL")
                .map_err(|_| crate::Error::Config("RECORD_API_URL not set".to_string()))?,
            record_api_key: std::env::var("RECORD_API_KEY")
                .map_err(|_| crate::Error::Config("RECORD_API_KEY not set".to_string()))?,
            record_table: std::env::var("RECORD_TABLE")
                .unwrap_or_else(|_| "stage_generations".to_string()),
            // Scene reference images are served from the CDN by default.
            scene_base_url: std::env::var("SCENE_BASE_URL")
                .unwrap_or_else(|_| storage_base_url.clone()),
            storage_base_url,
        })
    }
}
