//! Tech-pack export artifact: an ordered list of named PNG data URIs.

use drape_pipeline::RgbaImage;
use drape_pipeline::naming::sanitized;
use serde::{Deserialize, Serialize};

use crate::ExportError;
use crate::datauri::png_data_uri;

/// Name of the whole-garment entry.
pub const WHOLE: &str = "whole";

/// One tech-pack image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechpackEntry {
    /// `"whole"` or a sanitized display name.
    pub name: String,
    /// `data:image/png;base64,...`
    pub image: String,
}

impl TechpackEntry {
    /// The whole-garment render.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Encode`] if PNG encoding fails.
    pub fn whole(image: &RgbaImage) -> Result<Self, ExportError> {
        Ok(Self {
            name: WHOLE.to_string(),
            image: png_data_uri(image)?,
        })
    }

    /// A boundary or layer render, named by its display name.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Encode`] if PNG encoding fails.
    pub fn named(display_name: &str, image: &RgbaImage) -> Result<Self, ExportError> {
        Ok(Self {
            name: sanitized(display_name),
            image: png_data_uri(image)?,
        })
    }
}

/// Serialize entries as a JSON array, preserving order.
///
/// # Errors
///
/// Returns [`ExportError::Json`] on serialization failure.
pub fn techpack_json(entries: &[TechpackEntry]) -> Result<String, ExportError> {
    Ok(serde_json::to_string(entries)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_order_and_sanitize_names() {
        let img = RgbaImage::new(1, 1);
        let entries = vec![
            TechpackEntry::whole(&img).unwrap(),
            TechpackEntry::named("Left sleeve", &img).unwrap(),
        ];
        let json = techpack_json(&entries).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "whole");
        assert_eq!(value[1]["name"], "left_sleeve");
        assert!(
            value[1]["image"]
                .as_str()
                .unwrap()
                .starts_with("data:image/png;base64,")
        );
    }
}
