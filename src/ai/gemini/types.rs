//! Gemini wire types shared between request construction and response
//! interpretation.

use serde::{Deserialize, Serialize};

/// Gemini content container used in both requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Untagged union of text and inline media content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// Base64 inline payload carrying an image in transport form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Format tag. Responses may omit it; PNG is assumed then.
    #[serde(default = "default_image_mime")]
    pub mime_type: String,
    pub data: String,
}

fn default_image_mime() -> String {
    "image/png".to_string()
}

/// Top-level `generateContent` response envelope.
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// Candidate completion item returned by Gemini.
///
/// `content` can be absent when generation stops before producing parts.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_data_mime_defaults_to_png() {
        let data: InlineData = serde_json::from_str(r#"{ "data": "AAAA" }"#).unwrap();
        assert_eq!(data.mime_type, "image/png");
    }

    #[test]
    fn test_candidate_without_content_parses() {
        let candidate: Candidate = serde_json::from_str(r#"{ "finishReason": "SAFETY" }"#).unwrap();
        assert!(candidate.content.is_none());
    }

    #[test]
    fn test_part_round_trip() {
        let part = Part::InlineData {
            inline_data: InlineData {
                mime_type: "image/jpeg".to_string(),
                data: "AAAA".to_string(),
            },
        };

        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains("inlineData"));
        assert!(json.contains("mimeType"));

        let parsed: Part = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed, Part::InlineData { .. }));
    }
}
