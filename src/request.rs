//! Wire types for the edit pipeline.

use crate::error::{EditError, Result};
use serde::{Deserialize, Serialize};

/// Supported input image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Inbound request body: the room photo to plant up.
#[derive(Debug, Clone, Deserialize)]
pub struct EditRequest {
    /// The image, either as a `data:` URI or raw base64.
    pub image: String,
    /// Declared MIME type of the image.
    #[serde(rename = "imageType")]
    pub image_type: String,
}

impl EditRequest {
    /// Decodes the request body into raw image bytes.
    ///
    /// Accepts both `data:<mime>;base64,<payload>` and bare base64. The
    /// declared MIME type travels along but decoding never trusts it; the
    /// normalizer sniffs the actual format from the bytes.
    pub fn into_raw_input(self) -> Result<RawImageInput> {
        use base64::Engine;

        let encoded = match self.image.split_once(";base64,") {
            Some((prefix, payload)) if prefix.starts_with("data:") => payload,
            _ => self.image.as_str(),
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| EditError::Decode(format!("invalid base64 payload: {e}")))?;

        if bytes.is_empty() {
            return Err(EditError::Decode("empty image payload".into()));
        }

        Ok(RawImageInput {
            bytes,
            declared_mime: self.image_type,
        })
    }
}

/// Decoded inbound image, owned by a single request.
#[derive(Debug, Clone)]
pub struct RawImageInput {
    /// Raw image bytes as uploaded.
    pub bytes: Vec<u8>,
    /// MIME type the client declared. Informational only.
    pub declared_mime: String,
}

impl RawImageInput {
    /// Returns the format detected from the payload's magic bytes, if any.
    pub fn detected_format(&self) -> Option<ImageFormat> {
        ImageFormat::from_magic_bytes(&self.bytes)
    }
}

/// Opaque locator for an edit result held by the external service.
///
/// Valid only for a short, service-defined window; consumed exactly once by
/// the fetcher and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResultReference(
    /// The locator string, an `https` URL or inline `data:` URI.
    pub String,
);

impl EditResultReference {
    /// Returns the locator string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The final embeddable result image.
#[derive(Debug, Clone)]
#[must_use = "the edited image should be returned to the caller"]
pub struct EditResponsePayload {
    /// Raw PNG bytes of the edited image.
    pub data: Vec<u8>,
}

impl EditResponsePayload {
    /// Encodes the payload as a `data:image/png;base64,...` URL.
    pub fn to_data_url(&self) -> String {
        use base64::Engine;
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }

    /// Size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Renders the success response body.
    pub fn into_response(self) -> EditResponse {
        EditResponse {
            image_url: self.to_data_url(),
        }
    }
}

/// Success response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResponse {
    /// `data:image/png;base64,...` payload of the edited room photo.
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Failure response body, paired with [`EditError::http_status`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

impl From<&EditError> for ErrorResponse {
    fn from(err: &EditError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}
