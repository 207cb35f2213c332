//! Alpha channel helpers.

use image::Rgba;

use crate::color::Rgb;
use crate::types::{Dimensions, PipelineError, RgbaImage};

/// An image of one flat color.
#[must_use]
pub fn solid(color: Rgb, dims: Dimensions) -> RgbaImage {
    RgbaImage::from_pixel(
        dims.width,
        dims.height,
        Rgba([color.r(), color.g(), color.b(), 255]),
    )
}

/// Take the color channels of `color` and the alpha channel of `alpha`.
///
/// Fully transparent results are normalized to `[0, 0, 0, 0]`.
///
/// # Errors
///
/// Returns [`PipelineError::ResourceMismatch`] if the dimensions differ.
pub fn merge_alpha(color: &RgbaImage, alpha: &RgbaImage) -> Result<RgbaImage, PipelineError> {
    let expected = Dimensions::of(color);
    let actual = Dimensions::of(alpha);
    if expected != actual {
        return Err(PipelineError::ResourceMismatch { expected, actual });
    }
    let mut out = color.clone();
    for (dst, src) in out.pixels_mut().zip(alpha.pixels()) {
        let a = src.0[3];
        dst.0 = if a == 0 {
            [0, 0, 0, 0]
        } else {
            [dst.0[0], dst.0[1], dst.0[2], a]
        };
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_alpha_from_second_image() {
        let base = solid(Rgb::new(10, 20, 30), Dimensions { width: 2, height: 1 });
        let mask = RgbaImage::from_fn(2, 1, |x, _| Rgba([99, 99, 99, if x == 0 { 0 } else { 77 }]));
        let merged = merge_alpha(&base, &mask).unwrap();
        assert_eq!(*merged.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(*merged.get_pixel(1, 0), Rgba([10, 20, 30, 77]));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let a = RgbaImage::new(4, 4);
        let b = RgbaImage::new(4, 5);
        let err = merge_alpha(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ResourceMismatch {
                expected: Dimensions { width: 4, height: 4 },
                actual: Dimensions { width: 4, height: 5 },
            }
        ));
    }
}
