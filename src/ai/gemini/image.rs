use super::client::GeminiHttpClient;
use super::types::{Candidate, Content, GenerateContentResponse, InlineData, Part};
use crate::ai::StageImageService;
use crate::encoding::VisualInput;
use crate::models::GenerationOutcome;
use crate::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use std::time::Duration;

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const BLOCK_NONE: &str = "BLOCK_NONE";

#[derive(Debug, Serialize)]
struct StageImageRequest {
    contents: Vec<Content>,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
    image_size: String,
}

/// Maximally permissive thresholds across all harm categories; the booth
/// inputs are curated upstream.
fn permissive_safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: BLOCK_NONE,
        })
        .collect()
}

fn inline_part(input: &VisualInput) -> Part {
    Part::InlineData {
        inline_data: InlineData {
            mime_type: input.mime_type.clone(),
            data: BASE64.encode(&input.data),
        },
    }
}

/// Assemble the ordered request parts.
///
/// Ordering is fixed and significant: instruction text, sketch, photo, then
/// the scene reference when present. A missing scene removes the part
/// entirely and leaves the preceding parts untouched.
pub(crate) fn build_contents(
    instruction: &str,
    sketch: &VisualInput,
    photo: &VisualInput,
    scene: Option<&VisualInput>,
) -> Vec<Content> {
    let mut parts = vec![
        Part::Text {
            text: instruction.to_string(),
        },
        inline_part(sketch),
        inline_part(photo),
    ];
    if let Some(scene) = scene {
        parts.push(inline_part(scene));
    }

    vec![Content { role: None, parts }]
}

/// Resolve a raw response into exactly one outcome.
///
/// Only the first candidate is inspected. The first inline image part wins
/// and later image parts are ignored; a text part counts only when no image
/// part exists anywhere in the candidate.
pub(crate) fn resolve_outcome(response: GenerateContentResponse) -> GenerationOutcome {
    let Some(Candidate { content }) = response.candidates.into_iter().next() else {
        return GenerationOutcome::Failure("no candidates".to_string());
    };
    let Some(content) = content else {
        return GenerationOutcome::Failure("empty candidate content".to_string());
    };

    let mut fallback_text = None;
    for part in content.parts {
        match part {
            Part::InlineData { inline_data } => {
                return match BASE64.decode(&inline_data.data) {
                    Ok(bytes) => {
                        GenerationOutcome::Image(VisualInput::new(inline_data.mime_type, bytes))
                    }
                    Err(e) => {
                        GenerationOutcome::Failure(format!("invalid base64 image payload: {}", e))
                    }
                };
            }
            Part::Text { text } => {
                if fallback_text.is_none() {
                    fallback_text = Some(text);
                }
            }
        }
    }

    match fallback_text {
        Some(text) => GenerationOutcome::TextFallback(text),
        None => GenerationOutcome::Failure("empty candidate content".to_string()),
    }
}

pub struct GeminiStageClient {
    http: GeminiHttpClient,
}

impl GeminiStageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(
                api_key,
                model,
                Duration::from_secs(120),
                client,
            ),
        }
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiStageClient);

#[async_trait]
impl StageImageService for GeminiStageClient {
    async fn generate_stage_image(
        &self,
        sketch: &VisualInput,
        photo: &VisualInput,
        scene: Option<&VisualInput>,
        instruction: &str,
    ) -> Result<GenerationOutcome> {
        let request = StageImageRequest {
            contents: build_contents(instruction, sketch, photo, scene),
            safety_settings: permissive_safety_settings(),
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: "1:1".to_string(),
                    image_size: "2K".to_string(),
                },
            },
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        let outcome = resolve_outcome(response);
        match &outcome {
            GenerationOutcome::Image(image) => {
                tracing::debug!(
                    "Gemini returned image ({} bytes, {})",
                    image.data.len(),
                    image.mime_type
                );
            }
            GenerationOutcome::TextFallback(text) => {
                tracing::warn!("Gemini declined to synthesize an image: {}", text);
            }
            GenerationOutcome::Failure(reason) => {
                tracing::warn!("Gemini response unusable: {}", reason);
            }
        }
        Ok(outcome)
    }
}
