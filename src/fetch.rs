//! Result retrieval and validation.

use crate::error::{EditError, Result};
use crate::request::{EditResponsePayload, EditResultReference};

/// Minimum plausible byte length for a returned image. Anything smaller is
/// treated as a truncated or corrupt transfer.
pub const MIN_RESULT_BYTES: usize = 100;

/// Dereferences an [`EditResultReference`] into the final payload.
#[derive(Debug, Clone, Default)]
pub struct ResultFetcher {
    client: reqwest::Client,
}

impl ResultFetcher {
    /// Creates a fetcher with a fresh HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves the referenced image and validates it.
    ///
    /// `data:` URIs are decoded inline; anything else is fetched over HTTP.
    /// Fails with [`EditError::Fetch`] when retrieval fails and with
    /// [`EditError::Validation`] when the payload is empty or implausibly
    /// small.
    pub async fn fetch(&self, reference: &EditResultReference) -> Result<EditResponsePayload> {
        let data = if let Some(inline) = reference.as_str().strip_prefix("data:") {
            decode_inline(inline)?
        } else {
            self.download(reference.as_str()).await?
        };

        validate(&data)?;
        Ok(EditResponsePayload { data })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EditError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EditError::Fetch(format!(
                "result download failed with status {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EditError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn decode_inline(inline: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    let payload = inline
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| EditError::Fetch("data reference is not base64-encoded".into()))?;
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| EditError::Fetch(format!("invalid base64 in data reference: {e}")))
}

fn validate(data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(EditError::Validation("result image is empty".into()));
    }
    if data.len() < MIN_RESULT_BYTES {
        return Err(EditError::Validation(format!(
            "result image suspiciously small: {} bytes",
            data.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    fn data_reference(bytes: &[u8]) -> EditResultReference {
        EditResultReference(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }

    fn minimal_png() -> Vec<u8> {
        // Per-pixel gradient so the compressed stream clears the size
        // threshold.
        let img = image::RgbImage::from_fn(32, 32, |x, y| {
            image::Rgb([(x * 8) as u8, (y * 8) as u8, ((x + y) * 4) as u8])
        });
        let mut buffer = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[tokio::test]
    async fn test_accepts_well_formed_png() {
        let png = minimal_png();
        assert!(png.len() >= MIN_RESULT_BYTES, "fixture too small");

        let payload = ResultFetcher::new()
            .fetch(&data_reference(&png))
            .await
            .unwrap();
        assert_eq!(payload.data, png);
        assert!(payload.to_data_url().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_rejects_empty_payload() {
        let result = ResultFetcher::new().fetch(&data_reference(&[])).await;
        assert!(matches!(result, Err(EditError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_sub_threshold_payload() {
        let result = ResultFetcher::new()
            .fetch(&data_reference(&[0u8; MIN_RESULT_BYTES - 1]))
            .await;
        assert!(matches!(result, Err(EditError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rejects_malformed_data_reference() {
        let reference = EditResultReference("data:image/png,not-base64".into());
        let result = ResultFetcher::new().fetch(&reference).await;
        assert!(matches!(result, Err(EditError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_unreachable_url_is_fetch_error() {
        // Port 1 on loopback refuses the connection immediately.
        let reference = EditResultReference("http://127.0.0.1:1/result.png".into());
        let result = ResultFetcher::new().fetch(&reference).await;
        assert!(matches!(result, Err(EditError::Fetch(_))));
    }
}
