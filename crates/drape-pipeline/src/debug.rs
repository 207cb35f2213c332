//! Developer-mode overlay: the clip polygon and the artwork frame drawn
//! over a canvas.

use image::Rgba;
use imageproc::drawing::draw_line_segment_mut;

use crate::composite::canvas_side;
use crate::placement::ArtworkTransform;
use crate::types::{Point, RgbaImage};
use crate::uv_region::ClipRegion;

/// Clip outline color.
pub const CLIP_COLOR: Rgba<u8> = Rgba([255, 0, 255, 255]);
/// Artwork frame color.
pub const FRAME_COLOR: Rgba<u8> = Rgba([0, 200, 0, 255]);

#[allow(clippy::cast_possible_truncation)]
fn outline(image: &mut RgbaImage, points: &[Point], color: Rgba<u8>) {
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        draw_line_segment_mut(
            image,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            color,
        );
    }
}

/// Draw the overlay on top of `base` (or a transparent canvas when `None`).
///
/// A `base` of the wrong size is ignored in favor of a blank canvas.
#[must_use]
pub fn debug_overlay(
    region: &ClipRegion,
    transform: Option<&ArtworkTransform>,
    base: Option<&RgbaImage>,
) -> RgbaImage {
    let side = canvas_side(region);
    let mut image = base
        .filter(|b| b.dimensions() == (side, side))
        .cloned()
        .unwrap_or_else(|| RgbaImage::new(side, side));
    outline(&mut image, region.polygon(), CLIP_COLOR);
    if let Some(t) = transform {
        outline(&mut image, &t.corners(), FRAME_COLOR);
        let c = t.center;
        outline(
            &mut image,
            &[Point::new(c.x - 3.0, c.y), Point::new(c.x + 3.0, c.y)],
            FRAME_COLOR,
        );
        outline(
            &mut image,
            &[Point::new(c.x, c.y - 3.0), Point::new(c.x, c.y + 3.0)],
            FRAME_COLOR,
        );
    }
    image
}
