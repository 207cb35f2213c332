//! Palette extraction and recoloring.
//!
//! Reduces an artwork image to at most `limit` colors:
//!
//! 1. Faint pixels (alpha below [`ALPHA_CUTOFF`]) become fully transparent.
//! 2. Colors within [`REMOVE_DISTANCE`] of a color-to-remove are cut out.
//! 3. The remaining exact colors are clustered by pixel weight: colors are
//!    visited from most to least frequent and join the nearest existing
//!    cluster founder within `merge_distance` (Lab, via an R-tree), or
//!    found a new cluster. The `limit` heaviest clusters become seeds,
//!    each represented by its founder color.
//! 4. Every pixel is recolored to its nearest seed (CIE94).
//! 5. Seeds whose density over the non-transparent pixels falls below
//!    `min_density` are dropped, and their pixels move to the nearest
//!    retained seed.
//!
//! Work is done per distinct color, not per pixel, so the Lab conversions
//! and nearest-neighbor searches scale with palette complexity rather than
//! image size.
//!
//! Because seeds are always exact colors present in the input and founders
//! are more than `merge_distance` apart, running the quantizer again on its
//! own output with the same options reproduces the same palette and image.

use std::collections::HashMap;

use rstar::RTree;
use rstar::primitives::GeomWithData;
use serde::{Deserialize, Serialize};

use crate::color::{Lab, Rgb, delta_e, nearest};
use crate::diagnostics::{Clock, NoopClock, QuantizeDiagnostics, QuantizeStage, StageTiming};
use crate::types::{PipelineError, RgbaImage};

/// Pixels with alpha below this value are treated as fully transparent.
pub const ALPHA_CUTOFF: u8 = 10;

/// CIE94 distance at or below which a pixel matches a color to remove.
pub const REMOVE_DISTANCE: f64 = 2.0;

/// Options for [`quantize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizeOptions {
    /// Maximum number of palette colors.
    pub limit: usize,

    /// Minimum fraction of non-transparent pixels a color must cover to
    /// stay in the palette. Must lie in `[0, 1)`; anything else is
    /// replaced by [`DEFAULT_MIN_DENSITY`](Self::DEFAULT_MIN_DENSITY)
    /// with a logged warning.
    pub min_density: f64,

    /// Colors cut out of the artwork (made transparent) before clustering.
    pub colors_to_remove: Vec<Rgb>,

    /// Lab distance under which two colors fall into the same cluster.
    /// Higher values merge more aggressively.
    pub merge_distance: f64,
}

impl QuantizeOptions {
    /// Default palette size.
    pub const DEFAULT_LIMIT: usize = 4;
    /// Default minimum density.
    pub const DEFAULT_MIN_DENSITY: f64 = 0.05;
    /// Default cluster merge distance.
    pub const DEFAULT_MERGE_DISTANCE: f64 = 12.0;

    /// Check that `min_density` lies in `[0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] otherwise.
    pub fn validate_min_density(&self) -> Result<(), PipelineError> {
        if (0.0..1.0).contains(&self.min_density) {
            Ok(())
        } else {
            Err(PipelineError::InvalidConfig(format!(
                "min_density must be in [0, 1), got {}",
                self.min_density
            )))
        }
    }

    /// The minimum density actually used, falling back to the default
    /// (and logging) when the configured value is out of range.
    #[must_use]
    pub fn effective_min_density(&self) -> f64 {
        match self.validate_min_density() {
            Ok(()) => self.min_density,
            Err(err) => {
                tracing::warn!(
                    %err,
                    fallback = Self::DEFAULT_MIN_DENSITY,
                    "replacing invalid min_density"
                );
                Self::DEFAULT_MIN_DENSITY
            }
        }
    }
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            min_density: Self::DEFAULT_MIN_DENSITY,
            colors_to_remove: Vec::new(),
            merge_distance: Self::DEFAULT_MERGE_DISTANCE,
        }
    }
}

/// One palette color and the fraction of non-transparent pixels it covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// The color.
    pub color: Rgb,
    /// Fraction of non-transparent pixels, in `[0, 1]`.
    pub density: f64,
}

/// An ordered palette. Order is discovery order: heaviest cluster first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    /// Wrap a list of entries.
    #[must_use]
    pub const fn new(entries: Vec<PaletteEntry>) -> Self {
        Self { entries }
    }

    /// All entries in order.
    #[must_use]
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// The colors in order.
    #[must_use]
    pub fn colors(&self) -> Vec<Rgb> {
        self.entries.iter().map(|e| e.color).collect()
    }

    /// Number of colors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette has no colors.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `color` is in the palette.
    #[must_use]
    pub fn contains(&self, color: Rgb) -> bool {
        self.entries.iter().any(|e| e.color == color)
    }

    /// Density of `color`, if present.
    #[must_use]
    pub fn density_of(&self, color: Rgb) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.color == color)
            .map(|e| e.density)
    }
}

/// Result of [`quantize`].
#[derive(Debug, Clone)]
pub struct Quantized {
    /// The recolored image. Every non-transparent pixel carries exactly
    /// one palette color; transparent pixels are `[0, 0, 0, 0]`.
    pub image: RgbaImage,
    /// The retained palette.
    pub palette: Palette,
}

/// Quantize `image` to a density-filtered palette.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `options.limit` is zero.
pub fn quantize(image: &RgbaImage, options: &QuantizeOptions) -> Result<Quantized, PipelineError> {
    quantize_timed(image, options, &NoopClock).map(|(quantized, _)| quantized)
}

/// Quantize while collecting per-stage timings and counts.
///
/// # Errors
///
/// Same as [`quantize`].
pub fn quantize_timed<C: Clock>(
    image: &RgbaImage,
    options: &QuantizeOptions,
    clock: &C,
) -> Result<(Quantized, QuantizeDiagnostics), PipelineError> {
    if options.limit == 0 {
        return Err(PipelineError::InvalidConfig(
            "palette limit must be at least 1".to_string(),
        ));
    }
    let min_density = options.effective_min_density();
    let run_start = clock.now();
    let mut stages = Vec::with_capacity(5);

    let t = clock.now();
    let mut working = image.clone();
    let cleared = clear_faint_alpha(&mut working);
    stages.push(StageTiming::new(QuantizeStage::AlphaCleanup, clock.elapsed(&t)));

    let t = clock.now();
    let histogram = Histogram::of(&working);
    let (kept, removed_pixels) = histogram.without(&options.colors_to_remove);
    stages.push(StageTiming::new(QuantizeStage::Histogram, clock.elapsed(&t)));

    let t = clock.now();
    let seeds = cluster(&kept, options.merge_distance, options.limit);
    stages.push(StageTiming::new(QuantizeStage::Clustering, clock.elapsed(&t)));

    let t = clock.now();
    let seed_labs: Vec<Lab> = seeds.iter().map(|s| s.lab).collect();
    let assignment = assign(&kept, &seed_labs);
    stages.push(StageTiming::new(QuantizeStage::Assignment, clock.elapsed(&t)));

    let t = clock.now();
    let (palette, final_assignment) = filter_density(&kept, &seeds, &assignment, min_density);
    stages.push(StageTiming::new(
        QuantizeStage::DensityFilter,
        clock.elapsed(&t),
    ));

    let t = clock.now();
    let lookup: HashMap<u32, Rgb> = kept
        .colors
        .iter()
        .zip(&final_assignment)
        .map(|(c, &idx)| (c.color.packed(), palette.entries[idx].color))
        .collect();
    let recolored = recolor(&working, &lookup);
    stages.push(StageTiming::new(QuantizeStage::Recolor, clock.elapsed(&t)));

    let diagnostics = QuantizeDiagnostics {
        width: image.width(),
        height: image.height(),
        opaque_pixels: kept.opaque + removed_pixels,
        faint_pixels_cleared: cleared,
        removed_pixels,
        distinct_colors: kept.colors.len(),
        seed_count: seeds.len(),
        retained_count: palette.len(),
        min_density,
        stages,
        total_duration: clock.elapsed(&run_start),
    };

    Ok((
        Quantized {
            image: recolored,
            palette,
        },
        diagnostics,
    ))
}

/// Zero out every pixel whose alpha is below [`ALPHA_CUTOFF`].
///
/// Returns the number of pixels that were faint but not already zero.
fn clear_faint_alpha(image: &mut RgbaImage) -> u64 {
    let mut cleared = 0;
    for pixel in image.pixels_mut() {
        if pixel.0[3] < ALPHA_CUTOFF {
            if pixel.0[3] > 0 {
                cleared += 1;
            }
            pixel.0 = [0, 0, 0, 0];
        }
    }
    cleared
}

/// One distinct opaque color and how many pixels carry it.
#[derive(Debug, Clone, Copy)]
struct ColorCount {
    color: Rgb,
    lab: Lab,
    count: u64,
}

/// Distinct opaque colors, most frequent first.
#[derive(Debug, Clone, Default)]
struct Histogram {
    colors: Vec<ColorCount>,
    /// Total number of pixels represented.
    opaque: u64,
}

impl Histogram {
    fn of(image: &RgbaImage) -> Self {
        let mut counts: HashMap<u32, u64> = HashMap::new();
        for pixel in image.pixels() {
            if pixel.0[3] == 0 {
                continue;
            }
            let rgb = Rgb([pixel.0[0], pixel.0[1], pixel.0[2]]);
            *counts.entry(rgb.packed()).or_insert(0) += 1;
        }
        let opaque = counts.values().sum();
        let mut colors: Vec<ColorCount> = counts
            .into_iter()
            .map(|(packed, count)| {
                let color = Rgb::from_packed(packed);
                ColorCount {
                    color,
                    lab: color.to_lab(),
                    count,
                }
            })
            .collect();
        // Deterministic order regardless of hash iteration order.
        colors.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.color.packed().cmp(&b.color.packed()))
        });
        Self { colors, opaque }
    }

    /// Split off colors matching any entry of `remove`.
    ///
    /// Returns the kept histogram and the number of removed pixels.
    fn without(self, remove: &[Rgb]) -> (Self, u64) {
        if remove.is_empty() {
            return (self, 0);
        }
        let remove_labs: Vec<Lab> = remove.iter().map(|c| c.to_lab()).collect();
        let mut removed = 0;
        let mut colors = Vec::with_capacity(self.colors.len());
        for entry in self.colors {
            if remove_labs
                .iter()
                .any(|&r| delta_e(entry.lab, r) <= REMOVE_DISTANCE)
            {
                removed += entry.count;
            } else {
                colors.push(entry);
            }
        }
        let opaque = self.opaque - removed;
        (Self { colors, opaque }, removed)
    }
}

/// A palette candidate: a cluster founder and the weight of its cluster.
#[derive(Debug, Clone, Copy)]
struct Seed {
    color: Rgb,
    lab: Lab,
    weight: u64,
}

/// Density-weighted clustering of histogram colors.
///
/// Returns at most `limit` seeds, heaviest first.
fn cluster(histogram: &Histogram, merge_distance: f64, limit: usize) -> Vec<Seed> {
    let mut founders: RTree<GeomWithData<[f64; 3], usize>> = RTree::new();
    let mut clusters: Vec<Seed> = Vec::new();

    for entry in &histogram.colors {
        let point = entry.lab.to_array();
        let joined = founders.nearest_neighbor(&point).and_then(|nearest| {
            let founder = clusters[nearest.data].lab;
            (founder.euclidean(entry.lab) <= merge_distance).then_some(nearest.data)
        });
        match joined {
            Some(idx) => clusters[idx].weight += entry.count,
            None => {
                founders.insert(GeomWithData::new(point, clusters.len()));
                clusters.push(Seed {
                    color: entry.color,
                    lab: entry.lab,
                    weight: entry.count,
                });
            }
        }
    }

    // Stable: equal weights keep founding order.
    clusters.sort_by(|a, b| b.weight.cmp(&a.weight));
    clusters.truncate(limit);
    clusters
}

/// Nearest seed index for every histogram color.
fn assign(histogram: &Histogram, seeds: &[Lab]) -> Vec<usize> {
    histogram
        .colors
        .iter()
        .map(|entry| nearest(entry.lab, seeds).unwrap_or(0))
        .collect()
}

/// Drop seeds below `min_density` and fold their colors into the nearest
/// retained seed.
///
/// Returns the palette and, for every histogram color, its index into it.
#[allow(clippy::cast_precision_loss)]
fn filter_density(
    histogram: &Histogram,
    seeds: &[Seed],
    assignment: &[usize],
    min_density: f64,
) -> (Palette, Vec<usize>) {
    if seeds.is_empty() || histogram.opaque == 0 {
        return (Palette::default(), Vec::new());
    }
    let total = histogram.opaque as f64;

    let mut counts = vec![0u64; seeds.len()];
    for (entry, &idx) in histogram.colors.iter().zip(assignment) {
        counts[idx] += entry.count;
    }

    let mut retained: Vec<usize> = (0..seeds.len())
        .filter(|&i| counts[i] as f64 / total >= min_density)
        .collect();
    if retained.is_empty() {
        // A palette must keep at least one color; keep the densest.
        let densest = (0..seeds.len())
            .max_by(|&a, &b| counts[a].cmp(&counts[b]).then_with(|| b.cmp(&a)))
            .unwrap_or(0);
        retained.push(densest);
    }

    let retained_labs: Vec<Lab> = retained.iter().map(|&i| seeds[i].lab).collect();
    let position_of: HashMap<usize, usize> = retained
        .iter()
        .enumerate()
        .map(|(pos, &seed)| (seed, pos))
        .collect();

    let final_assignment: Vec<usize> = histogram
        .colors
        .iter()
        .zip(assignment)
        .map(|(entry, seed)| {
            position_of
                .get(seed)
                .copied()
                .unwrap_or_else(|| nearest(entry.lab, &retained_labs).unwrap_or(0))
        })
        .collect();

    let mut final_counts = vec![0u64; retained.len()];
    for (entry, &pos) in histogram.colors.iter().zip(&final_assignment) {
        final_counts[pos] += entry.count;
    }

    let entries = retained
        .iter()
        .zip(&final_counts)
        .map(|(&seed, &count)| PaletteEntry {
            color: seeds[seed].color,
            density: count as f64 / total,
        })
        .collect();

    (Palette::new(entries), final_assignment)
}

/// Paint every non-transparent pixel with its palette color, keeping alpha.
fn recolor(image: &RgbaImage, lookup: &HashMap<u32, Rgb>) -> RgbaImage {
    let mut out = RgbaImage::new(image.width(), image.height());
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        let alpha = src.0[3];
        if alpha == 0 {
            continue;
        }
        let packed = Rgb([src.0[0], src.0[1], src.0[2]]).packed();
        if let Some(color) = lookup.get(&packed) {
            dst.0 = [color.r(), color.g(), color.b(), alpha];
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use image::Rgba;
    use proptest::prelude::*;

    use super::*;

    const RED: Rgb = Rgb::new(220, 30, 40);
    const BLUE: Rgb = Rgb::new(53, 133, 201);

    /// 100x100 image: the first `red_rows` rows red, the rest blue.
    fn two_color_image(red_rows: u32) -> RgbaImage {
        RgbaImage::from_fn(100, 100, |_, y| {
            let c = if y < red_rows { RED } else { BLUE };
            Rgba([c.r(), c.g(), c.b(), 255])
        })
    }

    fn opaque_colors(image: &RgbaImage) -> HashSet<Rgb> {
        image
            .pixels()
            .filter(|p| p.0[3] > 0)
            .map(|p| Rgb([p.0[0], p.0[1], p.0[2]]))
            .collect()
    }

    #[test]
    fn two_color_split_keeps_both_densities() {
        let result = quantize(&two_color_image(60), &QuantizeOptions::default()).unwrap();
        assert_eq!(result.palette.len(), 2);
        assert_eq!(result.palette.entries()[0].color, RED);
        assert!((result.palette.density_of(RED).unwrap() - 0.6).abs() < 1e-9);
        assert!((result.palette.density_of(BLUE).unwrap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn invalid_min_density_falls_back_to_default() {
        let options = QuantizeOptions {
            min_density: 1.5,
            ..QuantizeOptions::default()
        };
        assert!(options.validate_min_density().is_err());
        assert!(
            (options.effective_min_density() - QuantizeOptions::DEFAULT_MIN_DENSITY).abs()
                < f64::EPSILON
        );
        // The operation still proceeds.
        let result = quantize(&two_color_image(60), &options).unwrap();
        assert_eq!(result.palette.len(), 2);
    }

    #[test]
    fn nan_min_density_falls_back_to_default() {
        let options = QuantizeOptions {
            min_density: f64::NAN,
            ..QuantizeOptions::default()
        };
        assert!(
            (options.effective_min_density() - QuantizeOptions::DEFAULT_MIN_DENSITY).abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn zero_limit_is_rejected() {
        let options = QuantizeOptions {
            limit: 0,
            ..QuantizeOptions::default()
        };
        assert!(matches!(
            quantize(&two_color_image(50), &options),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn sparse_color_is_merged_not_dropped() {
        // 2% of pixels are a dark red close to RED; below min_density they
        // must be reassigned to RED, not vanish.
        let image = RgbaImage::from_fn(100, 100, |x, y| {
            if y < 2 {
                Rgba([180, 20, 30, 255])
            } else if x < 50 {
                Rgba([RED.r(), RED.g(), RED.b(), 255])
            } else {
                Rgba([BLUE.r(), BLUE.g(), BLUE.b(), 255])
            }
        });
        let options = QuantizeOptions {
            merge_distance: 0.0,
            ..QuantizeOptions::default()
        };
        let result = quantize(&image, &options).unwrap();
        assert_eq!(result.palette.len(), 2);
        assert_eq!(*result.image.get_pixel(0, 0), Rgba([RED.r(), RED.g(), RED.b(), 255]));
        let total: f64 = result.palette.entries().iter().map(|e| e.density).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn limit_caps_palette_size() {
        let image = RgbaImage::from_fn(40, 10, |x, _| match x / 10 {
            0 => Rgba([255, 0, 0, 255]),
            1 => Rgba([0, 255, 0, 255]),
            2 => Rgba([0, 0, 255, 255]),
            _ => Rgba([255, 255, 0, 255]),
        });
        let options = QuantizeOptions {
            limit: 2,
            ..QuantizeOptions::default()
        };
        let result = quantize(&image, &options).unwrap();
        assert_eq!(result.palette.len(), 2);
        assert_eq!(opaque_colors(&result.image).len(), 2);
    }

    #[test]
    fn near_duplicate_colors_cluster_together() {
        // Slight noise around one color collapses into a single seed.
        let image = RgbaImage::from_fn(20, 20, |x, y| {
            let jitter = u8::try_from((x + y) % 3).unwrap();
            Rgba([100 + jitter, 150, 200 - jitter, 255])
        });
        let result = quantize(&image, &QuantizeOptions::default()).unwrap();
        assert_eq!(result.palette.len(), 1);
        assert!((result.palette.entries()[0].density - 1.0).abs() < 1e-9);
    }

    #[test]
    fn faint_alpha_becomes_transparent() {
        let image = RgbaImage::from_fn(10, 10, |x, _| {
            if x == 0 {
                Rgba([0, 255, 0, 9])
            } else {
                Rgba([BLUE.r(), BLUE.g(), BLUE.b(), 255])
            }
        });
        let result = quantize(&image, &QuantizeOptions::default()).unwrap();
        assert_eq!(*result.image.get_pixel(0, 5), Rgba([0, 0, 0, 0]));
        assert_eq!(result.palette.colors(), vec![BLUE]);
    }

    #[test]
    fn partial_alpha_is_preserved() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([BLUE.r(), BLUE.g(), BLUE.b(), 128]));
        let result = quantize(&image, &QuantizeOptions::default()).unwrap();
        assert_eq!(result.image.get_pixel(1, 1).0[3], 128);
    }

    #[test]
    fn colors_to_remove_are_cut_out_and_excluded_from_density() {
        let image = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([BLUE.r(), BLUE.g(), BLUE.b(), 255])
            }
        });
        let options = QuantizeOptions {
            colors_to_remove: vec![Rgb::new(255, 255, 255)],
            ..QuantizeOptions::default()
        };
        let result = quantize(&image, &options).unwrap();
        assert_eq!(*result.image.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(result.palette.colors(), vec![BLUE]);
        assert!((result.palette.entries()[0].density - 1.0).abs() < 1e-9);
    }

    #[test]
    fn fully_transparent_image_yields_empty_palette() {
        let image = RgbaImage::new(8, 8);
        let result = quantize(&image, &QuantizeOptions::default()).unwrap();
        assert!(result.palette.is_empty());
        assert!(result.image.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn densest_color_survives_an_extreme_threshold() {
        let options = QuantizeOptions {
            min_density: 0.9,
            merge_distance: 0.0,
            ..QuantizeOptions::default()
        };
        let result = quantize(&two_color_image(50), &options).unwrap();
        assert_eq!(result.palette.len(), 1);
        assert!((result.palette.entries()[0].density - 1.0).abs() < 1e-9);
    }

    #[test]
    fn diagnostics_count_stages() {
        let (_, diagnostics) = quantize_timed(
            &two_color_image(30),
            &QuantizeOptions::default(),
            &NoopClock,
        )
        .unwrap();
        assert_eq!(diagnostics.opaque_pixels, 10_000);
        assert_eq!(diagnostics.distinct_colors, 2);
        assert_eq!(diagnostics.retained_count, 2);
        assert_eq!(diagnostics.stages.len(), 6);
    }

    fn arb_image() -> impl Strategy<Value = RgbaImage> {
        // A handful of base colors scattered over a small image, with some
        // transparent and faint pixels mixed in.
        let base = prop::collection::vec((any::<u8>(), any::<u8>(), any::<u8>()), 1..6);
        (base, prop::collection::vec((0usize..8, any::<u8>()), 64)).prop_map(|(base, cells)| {
            RgbaImage::from_fn(8, 8, |x, y| {
                let (pick, alpha) = cells[(y * 8 + x) as usize];
                let (r, g, b) = base[pick % base.len()];
                Rgba([r, g, b, if alpha < 40 { alpha / 8 } else { 255 }])
            })
        })
    }

    proptest! {
        #[test]
        fn every_opaque_pixel_is_a_palette_color(image in arb_image()) {
            let result = quantize(&image, &QuantizeOptions::default()).unwrap();
            for color in opaque_colors(&result.image) {
                prop_assert!(result.palette.contains(color), "{color} not in palette");
            }
            for entry in result.palette.entries() {
                prop_assert!(entry.density >= QuantizeOptions::DEFAULT_MIN_DENSITY);
            }
        }

        #[test]
        fn quantize_is_idempotent(image in arb_image()) {
            let options = QuantizeOptions::default();
            let first = quantize(&image, &options).unwrap();
            let second = quantize(&first.image, &options).unwrap();
            let a: HashSet<Rgb> = first.palette.colors().into_iter().collect();
            let b: HashSet<Rgb> = second.palette.colors().into_iter().collect();
            prop_assert_eq!(a, b);
            prop_assert_eq!(first.image, second.image);
        }
    }
}
