//! drape-pipeline: Pure boundary texture pipeline (sans-IO).
//!
//! Takes garment boundary meshes and artwork pixels and produces:
//! UV outline -> clip region -> constrained placement -> palette
//! quantization -> per-color decomposition -> composited layers ->
//! finished surfaces.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! meshes, byte slices and images. Loading, scheduling and scene
//! bookkeeping live in `drape-studio`.

pub mod alpha;
pub mod color;
pub mod composite;
pub mod debug;
pub mod decompose;
pub mod diagnostics;
pub mod finish;
pub mod hull;
pub mod mesh;
pub mod naming;
pub mod placement;
pub mod quantize;
pub mod synth;
pub mod types;
pub mod uv_region;

pub use color::{Lab, Rgb};
pub use decompose::{ImagePart, decompose};
pub use finish::{FinishAssets, FinishAssignments, FinishKind};
pub use hull::{HullBuilder, HullKind, HullOptions};
pub use mesh::MeshData;
pub use placement::{EditOutcome, Placement, PlacementConfig, PlacementEditor};
pub use quantize::{Palette, QuantizeOptions, Quantized, quantize};
pub use types::{Dimensions, GeometryError, PipelineError, Point, Rect, RgbaImage};
pub use uv_region::{BoundaryGeometry, ClipRegion, UvWindow, analyze_boundary};

use diagnostics::{Clock, QuantizeDiagnostics, QuantizeStage};

/// Decode encoded image bytes (PNG, JPEG, BMP, WebP) to straight RGBA.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the format is unrecognized.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Quantized artwork split into per-color layers.
#[derive(Debug, Clone)]
pub struct ArtworkLayers {
    /// The quantized image and its palette.
    pub quantized: Quantized,
    /// One part per palette color, in palette order.
    pub parts: Vec<ImagePart>,
}

/// Quantize artwork and decompose it against the resulting palette.
///
/// # Steps
///
/// 1. Alpha cleanup, clustering and density filtering ([`quantize`])
/// 2. Per-color decomposition ([`decompose`])
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `options.limit` is zero.
pub fn extract_layers(
    image: &RgbaImage,
    options: &QuantizeOptions,
) -> Result<ArtworkLayers, PipelineError> {
    let quantized = quantize(image, options)?;
    let parts = decompose(&quantized.image, &quantized.palette.colors());
    Ok(ArtworkLayers { quantized, parts })
}

/// [`extract_layers`] with per-stage diagnostics.
///
/// # Errors
///
/// Same as [`extract_layers`].
pub fn extract_layers_timed<C: Clock>(
    image: &RgbaImage,
    options: &QuantizeOptions,
    clock: &C,
) -> Result<(ArtworkLayers, QuantizeDiagnostics), PipelineError> {
    let (quantized, mut diagnostics) = quantize::quantize_timed(image, options, clock)?;
    let start = clock.now();
    let parts = decompose(&quantized.image, &quantized.palette.colors());
    diagnostics.push_stage(QuantizeStage::Decomposition, clock.elapsed(&start));
    Ok((ArtworkLayers { quantized, parts }, diagnostics))
}
