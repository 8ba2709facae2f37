//! Image payload normalization between the encoded (data URL) form and the
//! transport form (bare bytes plus MIME tag).
//!
//! The capture and drawing collaborators exchange images as base64 data URLs;
//! the generative backend and object storage want raw bytes with the format
//! tag carried alongside. Conversion is lossless in both directions.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Transport form of an image payload.
///
/// The MIME tag always travels with the bytes; the two are never split up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualInput {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl VisualInput {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Parse the self-describing `data:<mime>;base64,<payload>` form.
    pub fn from_data_url(encoded: &str) -> Result<Self> {
        let rest = encoded.strip_prefix("data:").ok_or_else(|| {
            Error::MalformedImage("missing data URL prefix".to_string())
        })?;

        let (mime_type, payload) = rest.split_once(";base64,").ok_or_else(|| {
            Error::MalformedImage("missing base64 marker in data URL".to_string())
        })?;

        if mime_type.is_empty() {
            return Err(Error::MalformedImage("empty MIME tag".to_string()));
        }

        let data = BASE64
            .decode(payload)
            .map_err(|e| Error::MalformedImage(format!("invalid base64 payload: {}", e)))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            data,
        })
    }

    /// Re-attach the data URL prefix. Total for any well-formed MIME tag.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.data))
    }
}

/// Sniff an image MIME type from magic bytes, falling back to PNG.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}
