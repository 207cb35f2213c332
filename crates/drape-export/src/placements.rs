//! Placement export as JSON.
//!
//! The shape is `[{ "boundaryName": ..., "data": { "xRatio", "yRatio",
//! "sizeRatio", "whRatio", "rotation" } | null }]`.

use drape_pipeline::placement::PlacementExport;

use crate::ExportError;

/// Serialize placement exports as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`ExportError::Json`] on serialization failure.
pub fn placements_to_json(exports: &[PlacementExport]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(exports)?)
}

/// Parse placement exports.
///
/// # Errors
///
/// Returns [`ExportError::Json`] for malformed input.
pub fn placements_from_json(json: &str) -> Result<Vec<PlacementExport>, ExportError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use drape_pipeline::placement::PlacementData;

    use super::*;

    #[test]
    fn uses_camel_case_and_null_for_empty_boundaries() {
        let exports = vec![
            PlacementExport {
                boundary_name: "Tee_boundary_front".to_string(),
                data: Some(PlacementData {
                    x_ratio: 0.5,
                    y_ratio: 0.25,
                    size_ratio: 0.75,
                    wh_ratio: 2.0,
                    rotation: 90.0,
                }),
            },
            PlacementExport {
                boundary_name: "Tee_boundary_back".to_string(),
                data: None,
            },
        ];
        let json = placements_to_json(&exports).unwrap();
        assert!(json.contains("\"boundaryName\": \"Tee_boundary_front\""));
        assert!(json.contains("\"xRatio\": 0.5"));
        assert!(json.contains("\"whRatio\": 2.0"));
        assert!(json.contains("\"data\": null"));
        assert_eq!(placements_from_json(&json).unwrap(), exports);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            placements_from_json("{"),
            Err(ExportError::Json(_))
        ));
    }
}
