//! The external masked-edit capability.

mod openai;

pub use openai::{OpenAiEditClient, OpenAiEditClientBuilder, PLANT_PROMPT};

use crate::error::Result;
use crate::request::EditResultReference;
use crate::staging::StagedArtifact;
use async_trait::async_trait;

/// A service that, given an image, a mask and a prompt, returns a new image
/// consistent with the unmasked region.
///
/// The pipeline treats this as a black box; [`OpenAiEditClient`] is the real
/// implementation, and tests substitute stubs at this seam.
#[async_trait]
pub trait EditService: Send + Sync {
    /// Submits one masked edit and returns a reference to the result.
    async fn edit(
        &self,
        image: &StagedArtifact,
        mask: &StagedArtifact,
    ) -> Result<EditResultReference>;
}
