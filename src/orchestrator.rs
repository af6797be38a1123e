//! Request orchestration.
//!
//! One linear pass per request: decode, normalize, build the mask, stage
//! both artifacts, submit the edit, fetch and validate the result. The
//! staged pair is released on every exit path; a failed release is logged
//! and never overrides the request's outcome. There is no retry loop here,
//! retrying is the caller's concern.

use crate::error::Result;
use crate::fetch::ResultFetcher;
use crate::mask;
use crate::normalize;
use crate::request::{EditRequest, EditResponse};
use crate::service::EditService;
use crate::staging::ArtifactStore;

/// Sequences one masked-edit request end to end.
pub struct Orchestrator<S: EditService> {
    store: ArtifactStore,
    service: S,
    fetcher: ResultFetcher,
}

impl<S: EditService> Orchestrator<S> {
    /// Creates an orchestrator staging artifacts under the OS temp dir.
    pub fn new(service: S) -> Self {
        Self::with_store(service, ArtifactStore::new())
    }

    /// Creates an orchestrator with an explicit artifact store.
    pub fn with_store(service: S, store: ArtifactStore) -> Self {
        Self {
            store,
            service,
            fetcher: ResultFetcher::new(),
        }
    }

    /// Runs the full pipeline for one request.
    ///
    /// On failure the returned error carries the human-readable message and
    /// [`http_status`](crate::EditError::http_status) the caller should
    /// surface as `{error, status}`.
    pub async fn handle(&self, request: EditRequest) -> Result<EditResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(%request_id, "handling edit request");

        let raw = request.into_raw_input()?;
        tracing::debug!(
            %request_id,
            declared = %raw.declared_mime,
            detected = raw.detected_format().map(|f| f.mime_type()),
            size = raw.bytes.len(),
            "decoded input payload"
        );
        let normalized = normalize::normalize(&raw)?;
        let edit_mask = mask::synthesize(normalized.width(), normalized.height());
        tracing::debug!(
            %request_id,
            width = normalized.width(),
            height = normalized.height(),
            band_start = edit_mask.band_start(),
            "normalized input and built mask"
        );

        let mut image_artifact = self
            .store
            .stage(&request_id, "image", &normalized.to_png()?)?;
        let mut mask_artifact = self.store.stage(&request_id, "mask", &edit_mask.to_png()?)?;

        // Drop guards on the artifacts cover unwinding; the explicit
        // releases below run on both the success and the error path before
        // the outcome is propagated.
        let outcome = async {
            let reference = self.service.edit(&image_artifact, &mask_artifact).await?;
            tracing::debug!(%request_id, reference = reference.as_str(), "edit submitted");
            self.fetcher.fetch(&reference).await
        }
        .await;

        image_artifact.release();
        mask_artifact.release();

        match outcome {
            Ok(payload) => {
                tracing::info!(%request_id, size = payload.size(), "edit complete");
                Ok(payload.into_response())
            }
            Err(e) => {
                tracing::warn!(%request_id, error = %e, status = e.http_status(), "edit failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditError;
    use crate::request::EditResultReference;
    use crate::staging::StagedArtifact;
    use async_trait::async_trait;
    use base64::Engine;

    /// Echoes the staged normalized image back as an inline data reference.
    struct EchoService;

    #[async_trait]
    impl EditService for EchoService {
        async fn edit(
            &self,
            image: &StagedArtifact,
            _mask: &StagedArtifact,
        ) -> crate::Result<EditResultReference> {
            let bytes = std::fs::read(image.path())?;
            Ok(EditResultReference(format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(bytes)
            )))
        }
    }

    /// Fails every edit with a configurable error.
    struct FailingService(fn() -> EditError);

    #[async_trait]
    impl EditService for FailingService {
        async fn edit(
            &self,
            _image: &StagedArtifact,
            _mask: &StagedArtifact,
        ) -> crate::Result<EditResultReference> {
            Err((self.0)())
        }
    }

    fn jpeg_request(width: u32, height: u32) -> EditRequest {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([180, 160, 140]));
        let mut buffer = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, image::ImageFormat::Jpeg)
            .unwrap();
        let b64 = base64::engine::general_purpose::STANDARD.encode(buffer.into_inner());
        EditRequest {
            image: format!("data:image/jpeg;base64,{b64}"),
            image_type: "image/jpeg".into(),
        }
    }

    fn staged_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_with_echo_service() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            Orchestrator::with_store(EchoService, ArtifactStore::with_root(dir.path()));

        let response = orchestrator.handle(jpeg_request(300, 400)).await.unwrap();

        let b64 = response
            .image_url
            .strip_prefix("data:image/png;base64,")
            .expect("response should be an embeddable PNG data URL");
        let bytes = base64::engine::general_purpose::STANDARD.decode(b64).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), normalize::TARGET_EDGE);
        assert_eq!(decoded.height(), normalize::TARGET_EDGE);

        // The staged pair is gone after the request resolves.
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_artifacts_released_on_service_failure() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::with_store(
            FailingService(|| EditError::Service {
                status: 503,
                message: "unavailable".into(),
            }),
            ArtifactStore::with_root(dir.path()),
        );

        let err = orchestrator.handle(jpeg_request(64, 64)).await.unwrap_err();
        assert_eq!(err.http_status(), 503);
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_quota_failure_surfaces_as_402() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::with_store(
            FailingService(|| EditError::QuotaExceeded("billing hard limit".into())),
            ArtifactStore::with_root(dir.path()),
        );

        let err = orchestrator.handle(jpeg_request(64, 64)).await.unwrap_err();
        assert_eq!(err.http_status(), 402);
        assert!(err.to_string().contains("try again later"));
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_surfaces_as_500() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::with_store(
            FailingService(|| EditError::EmptyResult),
            ArtifactStore::with_root(dir.path()),
        );

        let err = orchestrator.handle(jpeg_request(64, 64)).await.unwrap_err();
        assert_eq!(err.http_status(), 500);
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_input_fails_before_staging() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            Orchestrator::with_store(EchoService, ArtifactStore::with_root(dir.path()));

        let request = EditRequest {
            image: base64::engine::general_purpose::STANDARD.encode(b"not an image"),
            image_type: "image/png".into(),
        };
        let err = orchestrator.handle(request).await.unwrap_err();
        assert!(matches!(err, EditError::Decode(_)));
        assert_eq!(err.http_status(), 500);
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_interfere() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = std::sync::Arc::new(Orchestrator::with_store(
            EchoService,
            ArtifactStore::with_root(dir.path()),
        ));

        let a = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.handle(jpeg_request(120, 80)).await }
        });
        let b = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move { orchestrator.handle(jpeg_request(80, 120)).await }
        });

        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());
        assert!(staged_files(dir.path()).is_empty());
    }

    #[test]
    fn test_error_response_body() {
        let err = EditError::QuotaExceeded("hard limit".into());
        let body = crate::request::ErrorResponse::from(&err);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("error").unwrap().as_str().unwrap().contains("try again later"));
    }
}
