//! Split a recolored image into one sparse layer per palette color.

use serde::{Deserialize, Serialize};

use crate::color::{Lab, Rgb, nearest};
use crate::types::RgbaImage;

/// The pixels of one palette color.
#[derive(Debug, Clone)]
pub struct ImagePart {
    /// The palette color this part carries.
    pub color: Rgb,
    /// Same dimensions as the source. Pixels assigned to `color` are
    /// painted with it and keep their source alpha; all others are
    /// `[0, 0, 0, 0]`.
    pub image: RgbaImage,
    /// Number of pixels in this part.
    pub pixel_count: u64,
}

/// Summary of a part without its pixels, for listings and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSummary {
    /// The palette color.
    pub color: Rgb,
    /// Number of pixels in the part.
    pub pixel_count: u64,
}

impl ImagePart {
    /// Pixel-free summary.
    #[must_use]
    pub const fn summary(&self) -> PartSummary {
        PartSummary {
            color: self.color,
            pixel_count: self.pixel_count,
        }
    }
}

/// Decompose `image` against `palette`.
///
/// Every non-transparent pixel goes to exactly one part: the palette entry
/// nearest to it by CIE94 distance (ties to the earlier entry). The palette
/// need not be the one the image was quantized with; a caller-edited palette
/// decomposes just as consistently. Returns one part per palette entry, in
/// palette order, and nothing for an empty palette.
#[must_use]
pub fn decompose(image: &RgbaImage, palette: &[Rgb]) -> Vec<ImagePart> {
    let (width, height) = image.dimensions();
    let mut parts: Vec<ImagePart> = palette
        .iter()
        .map(|&color| ImagePart {
            color,
            image: RgbaImage::new(width, height),
            pixel_count: 0,
        })
        .collect();
    if parts.is_empty() {
        return parts;
    }

    let labs: Vec<Lab> = palette.iter().map(|c| c.to_lab()).collect();
    // Quantized images carry only a few distinct colors, so the per-color
    // lookup amortizes to nothing.
    let mut memo: std::collections::HashMap<u32, usize> = std::collections::HashMap::new();

    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = pixel.0[3];
        if alpha == 0 {
            continue;
        }
        let rgb = Rgb([pixel.0[0], pixel.0[1], pixel.0[2]]);
        let idx = *memo
            .entry(rgb.packed())
            .or_insert_with(|| nearest(rgb.to_lab(), &labs).unwrap_or(0));
        let part = &mut parts[idx];
        let c = part.color;
        part.image.put_pixel(x, y, image::Rgba([c.r(), c.g(), c.b(), alpha]));
        part.pixel_count += 1;
    }

    parts
}
