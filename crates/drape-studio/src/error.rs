//! Errors from the studio layer.

use std::time::Duration;

use drape_export::ExportError;
use drape_pipeline::{GeometryError, PipelineError};

/// Errors from boundary and coordinator operations.
///
/// Unknown boundary names are not errors; lookups return `Option` or
/// `bool` instead.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// Quantization, compositing or synthesis failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The boundary geometry could not be derived.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Serializing an export artifact failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Reading a local image failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Fetching a remote image failed.
    #[cfg(feature = "http")]
    #[error("failed to fetch image: {0}")]
    Http(#[from] reqwest::Error),

    /// No loader handles this URL.
    #[error("unsupported image source: {0}")]
    UnsupportedSource(String),

    /// A newer `add_artwork` call replaced this one before it finished.
    #[error("artwork load superseded by a newer request")]
    Superseded,

    /// The boundary did not settle within the caller's timeout.
    #[error("boundary not ready after {0:?}")]
    ReadinessTimeout(Duration),
}
