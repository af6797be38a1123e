//! Error types for the masked-edit pipeline.

/// Errors that can occur while turning a room photo into its planted version.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    /// The uploaded payload could not be decoded as a raster image.
    #[error("failed to decode input image: {0}")]
    Decode(String),

    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The edit service reported a billing or quota limit.
    #[error("image generation quota exceeded, please try again later: {0}")]
    QuotaExceeded(String),

    /// The edit service failed with any other non-success response or a
    /// transport fault. `status` preserves the upstream code when one was
    /// received and defaults to 500 otherwise.
    #[error("edit service error: {status} - {message}")]
    Service {
        /// Upstream HTTP status, or 500 when none was received.
        status: u16,
        /// Upstream error message, sanitized.
        message: String,
    },

    /// The edit service reported success but returned no usable result.
    #[error("edit service returned no result")]
    EmptyResult,

    /// The result reference could not be retrieved.
    #[error("failed to fetch edit result: {0}")]
    Fetch(String),

    /// The retrieved result failed structural validation.
    #[error("edit result failed validation: {0}")]
    Validation(String),

    /// I/O error while staging or releasing an ephemeral artifact.
    #[error("artifact staging error: {0}")]
    Staging(#[from] std::io::Error),
}

impl EditError {
    /// Suggested HTTP status for surfacing this error to a caller.
    ///
    /// Quota exhaustion maps to 402 so the UI can show distinct retry-later
    /// guidance; service errors keep the upstream status; everything else is
    /// a generic 500.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::QuotaExceeded(_) => 402,
            Self::Service { status, .. } => *status,
            _ => 500,
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EditError>;

/// Truncates and flattens an upstream error body so it is safe to surface.
///
/// Service error bodies can be arbitrarily large HTML or JSON blobs; we keep
/// a single line capped at a sane length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    const MAX_LEN: usize = 500;
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() > MAX_LEN {
        let mut end = MAX_LEN;
        while !flat.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &flat[..end])
    } else {
        flat
    }
}
