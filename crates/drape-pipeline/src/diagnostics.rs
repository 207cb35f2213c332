//! Quantizer diagnostics: timing and counts for each stage.
//!
//! These are permanent instrumentation for tuning the palette parameters
//! (`limit`, `min_density`, `merge_distance`). [`quantize_timed`] collects
//! them alongside its result; [`quantize`] runs the same stages with a
//! [`NoopClock`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.
//!
//! [`quantize_timed`]: crate::quantize::quantize_timed
//! [`quantize`]: crate::quantize::quantize

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
pub mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    ///
    /// # Errors
    ///
    /// Fails for negative, non-finite or overflowing values.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
///
/// Kept abstract so the pipeline stays sans-IO: native callers use
/// [`WebClock`] (which is `std::time::Instant` off-wasm and
/// `performance.now()` in the browser), tests use [`NoopClock`].
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Clock that never advances. Every elapsed duration is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopClock;

impl Clock for NoopClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, (): &()) -> Duration {
        Duration::ZERO
    }
}

/// [`Clock`] backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Named quantizer stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantizeStage {
    /// Clearing pixels below the alpha cutoff.
    AlphaCleanup,
    /// Counting distinct colors and cutting out colors to remove.
    Histogram,
    /// Density-weighted seed extraction.
    Clustering,
    /// Nearest-seed assignment.
    Assignment,
    /// Dropping sparse seeds and reassigning their pixels.
    DensityFilter,
    /// Writing palette colors back into the image.
    Recolor,
    /// Splitting the recolored image into per-color parts.
    Decomposition,
}

impl QuantizeStage {
    /// Human-readable stage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AlphaCleanup => "Alpha Cleanup",
            Self::Histogram => "Histogram",
            Self::Clustering => "Clustering",
            Self::Assignment => "Assignment",
            Self::DensityFilter => "Density Filter",
            Self::Recolor => "Recolor",
            Self::Decomposition => "Decomposition",
        }
    }
}

/// Duration of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    /// Which stage.
    pub stage: QuantizeStage,
    /// Wall-clock duration (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl StageTiming {
    /// Pair a stage with its measured duration.
    #[must_use]
    pub const fn new(stage: QuantizeStage, duration: Duration) -> Self {
        Self { stage, duration }
    }
}

/// Diagnostics collected from a single quantizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizeDiagnostics {
    /// Input width in pixels.
    pub width: u32,
    /// Input height in pixels.
    pub height: u32,
    /// Pixels at or above the alpha cutoff, including removed ones.
    pub opaque_pixels: u64,
    /// Partially transparent pixels cleared by the alpha cutoff.
    pub faint_pixels_cleared: u64,
    /// Pixels cut out because they matched a color to remove.
    pub removed_pixels: u64,
    /// Distinct exact colors entering clustering.
    pub distinct_colors: usize,
    /// Seeds produced by clustering (at most `limit`).
    pub seed_count: usize,
    /// Palette size after density filtering.
    pub retained_count: usize,
    /// Minimum density actually applied.
    pub min_density: f64,
    /// Per-stage timings in execution order.
    pub stages: Vec<StageTiming>,
    /// Total wall-clock duration (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

impl QuantizeDiagnostics {
    /// Duration of `stage`, if it ran.
    #[must_use]
    pub fn stage_duration(&self, stage: QuantizeStage) -> Option<Duration> {
        self.stages
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.duration)
    }

    /// Record an extra stage run after quantization (decomposition).
    pub fn push_stage(&mut self, stage: QuantizeStage, duration: Duration) {
        self.stages.push(StageTiming::new(stage, duration));
        self.total_duration += duration;
    }

    /// Format a human-readable multi-line report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Quantize Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} opaque pixels)",
            self.width, self.height, self.opaque_pixels,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!("{:<24} {:>10} {:>10}", "Stage", "Duration", "% Total"));
        lines.push("-".repeat(48));

        let total_ms = duration_ms(self.total_duration);
        for timing in &self.stages {
            let ms = duration_ms(timing.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "{:<24} {ms:>8.3}ms {pct:>9.1}%",
                timing.stage.label()
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Colors: {} distinct -> {} seeds -> {} retained (min density {:.3})",
            self.distinct_colors, self.seed_count, self.retained_count, self.min_density,
        ));
        lines.push(format!(
            "Cleared faint: {}  |  Removed: {}",
            self.faint_pixels_cleared, self.removed_pixels,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to fractional milliseconds.
#[must_use]
pub fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> QuantizeDiagnostics {
        QuantizeDiagnostics {
            width: 100,
            height: 50,
            opaque_pixels: 5000,
            faint_pixels_cleared: 12,
            removed_pixels: 300,
            distinct_colors: 40,
            seed_count: 4,
            retained_count: 3,
            min_density: 0.05,
            stages: vec![
                StageTiming::new(QuantizeStage::AlphaCleanup, Duration::from_millis(2)),
                StageTiming::new(QuantizeStage::Clustering, Duration::from_millis(8)),
            ],
            total_duration: Duration::from_millis(10),
        }
    }

    #[test]
    fn report_lists_every_stage() {
        let report = sample().report();
        assert!(report.contains("Quantize Diagnostics Report"));
        assert!(report.contains("Alpha Cleanup"));
        assert!(report.contains("Clustering"));
        assert!(report.contains("80.0%"));
        assert!(report.contains("40 distinct -> 4 seeds -> 3 retained"));
    }

    #[test]
    fn push_stage_extends_total() {
        let mut diag = sample();
        diag.push_stage(QuantizeStage::Decomposition, Duration::from_millis(5));
        assert_eq!(diag.total_duration, Duration::from_millis(15));
        assert_eq!(
            diag.stage_duration(QuantizeStage::Decomposition),
            Some(Duration::from_millis(5))
        );
        assert_eq!(diag.stage_duration(QuantizeStage::Recolor), None);
    }

    #[test]
    fn json_round_trip_uses_seconds() {
        let diag = sample();
        let json = serde_json::to_value(&diag).unwrap();
        assert!((json["total_duration"].as_f64().unwrap() - 0.01).abs() < 1e-12);
        assert_eq!(json["stages"][0]["stage"], "alpha_cleanup");
        let back: QuantizeDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.stages.len(), 2);
        assert_eq!(back.retained_count, 3);
        let drift = back.total_duration.abs_diff(diag.total_duration);
        assert!(drift < Duration::from_micros(1));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["total_duration"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<QuantizeDiagnostics>(json).is_err());
    }

    #[test]
    fn noop_clock_never_advances() {
        let clock = NoopClock;
        let start = clock.now();
        assert_eq!(clock.elapsed(&start), Duration::ZERO);
    }

    #[test]
    fn web_clock_is_monotonic() {
        let clock = WebClock;
        let start = clock.now();
        let first = clock.elapsed(&start);
        let second = clock.elapsed(&start);
        assert!(second >= first);
    }
}
