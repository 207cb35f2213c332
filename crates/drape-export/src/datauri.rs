//! PNG encoding and `data:` URIs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use drape_pipeline::RgbaImage;

use crate::ExportError;

/// Prefix of every PNG data URI this crate emits.
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Encode an image as PNG bytes.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn png_bytes(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buf)
}

/// Encode an image as a `data:image/png;base64,...` URI.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn png_data_uri(image: &RgbaImage) -> Result<String, ExportError> {
    let png = png_bytes(image)?;
    Ok(format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(png)))
}

/// Split a base64 `data:` URI into its media type and decoded payload.
///
/// # Errors
///
/// - [`ExportError::NotADataUri`] without a `data:` scheme and comma.
/// - [`ExportError::NotBase64`] for non-base64 URIs.
/// - [`ExportError::Base64`] for a malformed payload.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), ExportError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or(ExportError::NotADataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ExportError::NotADataUri)?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or(ExportError::NotBase64)?;
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((media_type.to_string(), bytes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn png_uri_decodes_back_to_the_image() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 200]));
        let uri = png_data_uri(&img).unwrap();
        assert!(uri.starts_with(PNG_DATA_URI_PREFIX));
        let (media, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(media, "image/png");
        let back = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(back, img);
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(matches!(
            decode_data_uri("https://example.com/a.png"),
            Err(ExportError::NotADataUri)
        ));
        assert!(matches!(
            decode_data_uri("data:text/plain,hello"),
            Err(ExportError::NotBase64)
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@@"),
            Err(ExportError::Base64(_))
        ));
    }
}
