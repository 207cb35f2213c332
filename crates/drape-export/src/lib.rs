//! drape-export: Pure serializers (sans-IO)
//!
//! Turns pipeline outputs into exchange formats: PNG data URIs for image
//! parts and tech-pack entries, JSON for placements, and SVG for the
//! developer-mode clip-region overlay.

pub mod datauri;
pub mod placements;
pub mod svg;
pub mod techpack;

pub use datauri::{decode_data_uri, png_bytes, png_data_uri};
pub use placements::{placements_from_json, placements_to_json};
pub use svg::{SvgMetadata, clip_region_svg};
pub use techpack::{TechpackEntry, techpack_json};

/// Errors from export serializers.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// PNG encoding failed.
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),

    /// The string is not a `data:` URI.
    #[error("not a data URI")]
    NotADataUri,

    /// The data URI does not carry base64 content.
    #[error("data URI is not base64 encoded")]
    NotBase64,

    /// The base64 payload is malformed.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
