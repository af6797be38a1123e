//! OpenAI image edits client (images/edits endpoint).

use crate::error::{sanitize_error_message, EditError, Result};
use crate::normalize::TARGET_EDGE;
use crate::request::EditResultReference;
use crate::service::EditService;
use crate::staging::StagedArtifact;
use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "dall-e-2";

/// Fixed instruction sent with every edit. Static configuration, never
/// templated per request.
pub const PLANT_PROMPT: &str = "Add houseplants to the marked area of this room photo. \
Only change the masked region and keep everything else exactly as it is: same walls, \
same furniture, same lighting, same perspective. Place a few potted plants of varying \
sizes, such as a monstera, a fiddle-leaf fig, a snake plant, or a pothos, standing \
naturally on the floor and matching the room's perspective.";

/// Builder for [`OpenAiEditClient`].
#[derive(Debug, Clone, Default)]
pub struct OpenAiEditClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
}

impl OpenAiEditClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to the `OPENAI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the API base URL. Intended for proxies and tests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Overrides the edit model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<OpenAiEditClient> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                EditError::Auth("OPENAI_API_KEY not set and no API key provided".into())
            })?;

        Ok(OpenAiEditClient {
            client: reqwest::Client::new(),
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }
}

/// Client for the OpenAI masked image edits endpoint.
pub struct OpenAiEditClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEditClient {
    /// Creates a new `OpenAiEditClientBuilder`.
    pub fn builder() -> OpenAiEditClientBuilder {
        OpenAiEditClientBuilder::new()
    }

    fn parse_error(&self, status: u16, text: &str) -> EditError {
        let text = sanitize_error_message(text);
        if status == 402 {
            return EditError::QuotaExceeded(text);
        }
        if status == 429
            && (text.contains("insufficient_quota")
                || text.contains("exceeded your current quota")
                || text.contains("billing"))
        {
            return EditError::QuotaExceeded(text);
        }
        EditError::Service {
            status,
            message: text,
        }
    }
}

#[async_trait]
impl EditService for OpenAiEditClient {
    async fn edit(
        &self,
        image: &StagedArtifact,
        mask: &StagedArtifact,
    ) -> Result<EditResultReference> {
        let image_bytes = std::fs::read(image.path())?;
        let mask_bytes = std::fs::read(mask.path())?;

        let image_part = reqwest::multipart::Part::bytes(image_bytes)
            .file_name("image.png")
            .mime_str("image/png")
            .map_err(|e| EditError::Service {
                status: 500,
                message: e.to_string(),
            })?;
        let mask_part = reqwest::multipart::Part::bytes(mask_bytes)
            .file_name("mask.png")
            .mime_str("image/png")
            .map_err(|e| EditError::Service {
                status: 500,
                message: e.to_string(),
            })?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("prompt", PLANT_PROMPT)
            .text("n", "1")
            .text("size", format!("{TARGET_EDGE}x{TARGET_EDGE}"))
            .text("response_format", "url")
            .part("image", image_part)
            .part("mask", mask_part);

        let response = self
            .client
            .post(format!("{}/images/edits", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| EditError::Service {
                status: e.status().map(|s| s.as_u16()).unwrap_or(500),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text));
        }

        let body: EditApiResponse = response.json().await.map_err(|e| EditError::Service {
            status: 500,
            message: format!("unparseable edit response: {e}"),
        })?;

        let url = body
            .data
            .into_iter()
            .next()
            .and_then(|entry| entry.url)
            .filter(|url| !url.is_empty())
            .ok_or(EditError::EmptyResult)?;

        Ok(EditResultReference(url))
    }
}

#[derive(Debug, Deserialize)]
struct EditApiResponse {
    #[serde(default)]
    data: Vec<EditApiImage>,
}

#[derive(Debug, Deserialize)]
struct EditApiImage {
    #[serde(default)]
    url: Option<String>,
}
