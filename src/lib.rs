#![warn(missing_docs)]
//! Verdure - add plants to room photos via a generative masked edit.
//!
//! This crate implements the normalization and masked-edit orchestration
//! pipeline behind a "plant up my room" feature: a user-supplied photo is
//! normalized to a fixed 1024×1024 square, a mask marks the bottom band of
//! the room as editable, both are staged as ephemeral files, an external
//! edit service paints plants into the masked region, and the result comes
//! back as an embeddable `data:image/png;base64,...` payload.
//!
//! # Quick Start
//!
//! ```no_run
//! use verdure::{EditRequest, OpenAiEditClient, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> verdure::Result<()> {
//!     let client = OpenAiEditClient::builder().build()?;
//!     let orchestrator = Orchestrator::new(client);
//!
//!     let request = EditRequest {
//!         image: std::fs::read_to_string("room.b64")?,
//!         image_type: "image/jpeg".into(),
//!     };
//!     let response = orchestrator.handle(request).await?;
//!     println!("{}", response.image_url);
//!     Ok(())
//! }
//! ```
//!
//! On failure, [`EditError::http_status`] gives the status a web layer
//! should pair with the `{"error": ...}` body: 402 for quota exhaustion,
//! the upstream status for other service errors, 500 otherwise.

mod error;
pub mod fetch;
pub mod mask;
pub mod normalize;
pub mod orchestrator;
pub mod request;
pub mod service;
pub mod staging;

pub use error::{EditError, Result};
pub use fetch::{ResultFetcher, MIN_RESULT_BYTES};
pub use mask::{EditMask, EDITABLE_BAND_FRACTION};
pub use normalize::{NormalizedImage, TARGET_EDGE};
pub use orchestrator::Orchestrator;
pub use request::{
    EditRequest, EditResponse, EditResponsePayload, EditResultReference, ErrorResponse,
    ImageFormat, RawImageInput,
};
pub use service::{EditService, OpenAiEditClient, OpenAiEditClientBuilder, PLANT_PROMPT};
pub use staging::{ArtifactStore, StagedArtifact};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{EditError, Result};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::request::{EditRequest, EditResponse};
    pub use crate::service::{EditService, OpenAiEditClient};
}
