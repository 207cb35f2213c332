//! Studio configuration.

use std::time::Duration;

use drape_pipeline::diagnostics::duration_serde;
use drape_pipeline::{FinishAssets, HullOptions, PlacementConfig, QuantizeOptions};
use serde::{Deserialize, Serialize};

/// Every tunable of the boundary layer.
///
/// Deserializes from partial JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Canvas sizes, visibility floor and notification window.
    pub placement: PlacementConfig,
    /// UV hull construction.
    pub hull: HullOptions,
    /// Base quantizer options; per-artwork overrides apply on top.
    pub quantize: QuantizeOptions,
    /// Delay before re-compositing after a canvas mutation.
    #[serde(with = "duration_serde")]
    pub composite_window: Duration,
    /// Delay before decomposition and finish materials are rebuilt.
    #[serde(with = "duration_serde")]
    pub decompose_window: Duration,
    /// Quiet time after the final synthesis before a boundary reports ready.
    #[serde(with = "duration_serde")]
    pub settle_delay: Duration,
    /// Readiness timeout used by coordinator-wide operations.
    #[serde(with = "duration_serde")]
    pub readiness_timeout: Duration,
    /// Side of the procedural finish detail maps.
    pub finish_map_size: u32,
}

impl StudioConfig {
    /// Default re-composite window.
    pub const DEFAULT_COMPOSITE_WINDOW: Duration = Duration::from_millis(20);
    /// Default decomposition window.
    pub const DEFAULT_DECOMPOSE_WINDOW: Duration = Duration::from_secs(2);
    /// Default settle delay.
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);
    /// Default readiness timeout.
    pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(30);
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            placement: PlacementConfig::default(),
            hull: HullOptions::default(),
            quantize: QuantizeOptions::default(),
            composite_window: Self::DEFAULT_COMPOSITE_WINDOW,
            decompose_window: Self::DEFAULT_DECOMPOSE_WINDOW,
            settle_delay: Self::DEFAULT_SETTLE_DELAY,
            readiness_timeout: Self::DEFAULT_READINESS_TIMEOUT,
            finish_map_size: FinishAssets::DEFAULT_SIZE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: StudioConfig =
            serde_json::from_str(r#"{"decompose_window": 0.5, "placement": {"working_side": 200.0}}"#)
                .unwrap();
        assert_eq!(config.decompose_window, Duration::from_millis(500));
        assert_eq!(config.composite_window, StudioConfig::DEFAULT_COMPOSITE_WINDOW);
        assert!((config.placement.working_side - 200.0).abs() < f64::EPSILON);
        assert!((config.placement.internal_factor - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.quantize, QuantizeOptions::default());
    }

    #[test]
    fn negative_window_rejected() {
        let result: Result<StudioConfig, _> = serde_json::from_str(r#"{"settle_delay": -1.0}"#);
        assert!(result.is_err());
    }
}
