//! Rasterize placed artwork into a clip region's canvas.
//!
//! The artwork is drawn with its [`ArtworkTransform`] under a mask filled
//! from the clip polygon, so nothing lands outside the region. tiny-skia
//! works in premultiplied RGBA; inputs are premultiplied on the way in and
//! outputs converted back to straight RGBA.

use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Mask, PathBuilder, Pixmap, PixmapPaint, Transform,
};

use crate::placement::ArtworkTransform;
use crate::types::{Dimensions, PipelineError, RgbaImage};
use crate::uv_region::ClipRegion;

/// Pixel side of a region's canvas.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn canvas_side(region: &ClipRegion) -> u32 {
    region.side().round().max(1.0) as u32
}

/// Draw `artwork` onto a transparent canvas the size of `region`, clipped
/// to the region's polygon.
///
/// # Errors
///
/// Returns [`PipelineError::Raster`] if a surface cannot be allocated.
pub fn composite(
    artwork: &RgbaImage,
    transform: &ArtworkTransform,
    region: &ClipRegion,
) -> Result<RgbaImage, PipelineError> {
    let side = canvas_side(region);
    let dims = Dimensions {
        width: side,
        height: side,
    };
    let mut canvas = Pixmap::new(side, side).ok_or(PipelineError::Raster(dims))?;
    let mask = clip_mask(region, side).ok_or(PipelineError::Raster(dims))?;
    let source = image_to_pixmap(artwork)?;

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &paint,
        transform.affine().to_skia(),
        Some(&mask),
    );
    Ok(pixmap_to_image(&canvas))
}

/// Anti-aliased coverage mask of the clip polygon.
///
/// Returns `None` for an empty polygon or a zero-sized canvas.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn clip_mask(region: &ClipRegion, side: u32) -> Option<Mask> {
    let mut mask = Mask::new(side, side)?;
    let (first, rest) = region.polygon().split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    let path = pb.finish()?;
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
    Some(mask)
}

/// Copy a straight-alpha image into a premultiplied pixmap.
///
/// # Errors
///
/// Returns [`PipelineError::Raster`] for a zero-sized image.
pub fn image_to_pixmap(image: &RgbaImage) -> Result<Pixmap, PipelineError> {
    let mut pixmap = Pixmap::new(image.width(), image.height())
        .ok_or_else(|| PipelineError::Raster(Dimensions::of(image)))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Convert a premultiplied pixmap back to straight RGBA.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            continue;
        }
        // channel = premultiplied * 255 / alpha
        let un = |c: u8| (u16::from(c) * 255 / u16::from(a)).min(255) as u8;
        pixel.0 = [un(data[off]), un(data[off + 1]), un(data[off + 2]), a];
    }
    img
}

/// Whether every pixel of `image` is fully transparent.
#[must_use]
pub fn is_blank(image: &RgbaImage) -> bool {
    image.pixels().all(|p| p.0[3] == 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use glam::DVec2;
    use image::Rgba;

    use super::*;
    use crate::placement::{CanvasKind, Placement, PlacementConfig, PlacementEditor};
    use crate::types::Point;

    fn triangle_region(side: f64) -> ClipRegion {
        let hull = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ];
        ClipRegion::fit(&hull, 1.0, DVec2::Y, side).unwrap()
    }

    fn editor(region: ClipRegion, art: &RgbaImage) -> PlacementEditor {
        let config = PlacementConfig {
            working_side: 100.0,
            ..PlacementConfig::default()
        };
        PlacementEditor::new(region, &config, art.dimensions(), Placement::centered("a", 1.0), None)
    }

    #[test]
    fn composite_fills_only_the_clip_polygon() {
        let art = RgbaImage::from_pixel(10, 10, Rgba([200, 10, 10, 255]));
        let ed = editor(triangle_region(100.0), &art);
        let out = composite(&art, &ed.transform(CanvasKind::Working), ed.region(CanvasKind::Working)).unwrap();
        assert_eq!(out.dimensions(), (100, 100));
        // UV triangle (0,0),(1,0),(0,1) flips to the canvas' lower-left half.
        assert_eq!(*out.get_pixel(10, 90), Rgba([200, 10, 10, 255]));
        assert_eq!(out.get_pixel(90, 10).0[3], 0);
    }

    #[test]
    fn internal_canvas_is_factor_times_larger() {
        let art = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 255, 255]));
        let ed = editor(triangle_region(100.0), &art);
        let out = composite(&art, &ed.transform(CanvasKind::Internal), ed.region(CanvasKind::Internal)).unwrap();
        assert_eq!(out.dimensions(), (400, 400));
        assert_eq!(*out.get_pixel(40, 360), Rgba([0, 0, 255, 255]));
        assert!(!is_blank(&out));
    }

    #[test]
    fn premultiply_round_trip_keeps_opaque_pixels() {
        let img = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([10, 20, 30, 255]),
            1 => Rgba([0, 0, 0, 0]),
            _ => Rgba([255, 255, 255, 128]),
        });
        let back = pixmap_to_image(&image_to_pixmap(&img).unwrap());
        assert_eq!(*back.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
        assert_eq!(*back.get_pixel(1, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(back.get_pixel(2, 0).0[3], 128);
    }

    #[test]
    fn zero_sized_artwork_is_a_raster_error() {
        assert!(matches!(
            image_to_pixmap(&RgbaImage::new(0, 0)),
            Err(PipelineError::Raster(_))
        ));
    }
}
