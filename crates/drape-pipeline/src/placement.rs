//! Artwork placement inside a clip region and its visibility constraint.
//!
//! A [`Placement`] is resolution independent: ratios within the clip
//! bounds, a size ratio against the dominant clip extent, and a rotation.
//! The [`PlacementEditor`] resolves it against two canvases that share one
//! [`ClipRegion`] at different scales, the small interactive working canvas
//! and the large internal compositing canvas, so both always agree.
//!
//! Interactive edits go through the editor, which keeps at least
//! `min_visibility` of the artwork's bounding box inside the clip polygon.
//! Programmatic placements are accepted as given.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::diagnostics::duration_serde;
use crate::types::{Point, Rect};
use crate::uv_region::ClipRegion;

/// Bisection steps when clamping an edit to the visibility boundary.
const CLAMP_STEPS: u32 = 24;

/// Tolerance when comparing visibility fractions.
const VISIBILITY_EPSILON: f64 = 1e-9;

/// Canvas and constraint parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Side of the square interactive canvas.
    pub working_side: f64,
    /// Internal canvas side as a multiple of the working side.
    pub internal_factor: f64,
    /// Minimum fraction of the artwork bounding box that must stay inside
    /// the clip polygon during interactive edits.
    pub min_visibility: f64,
    /// Default upper bound on `size_ratio`.
    pub size_ratio_limit: f64,
    /// Coalescing window for placement-changed notifications (seconds).
    #[serde(with = "duration_serde")]
    pub notify_window: Duration,
}

impl PlacementConfig {
    /// Default working canvas side.
    pub const DEFAULT_WORKING_SIDE: f64 = 300.0;
    /// Default internal canvas factor.
    pub const DEFAULT_INTERNAL_FACTOR: f64 = 4.0;
    /// Default minimum visibility.
    pub const DEFAULT_MIN_VISIBILITY: f64 = 0.3;
    /// Default size ratio limit.
    pub const DEFAULT_SIZE_RATIO_LIMIT: f64 = 1.0;
    /// Default notification window.
    pub const DEFAULT_NOTIFY_WINDOW: Duration = Duration::from_millis(300);

    /// Internal canvas side.
    #[must_use]
    pub fn internal_side(&self) -> f64 {
        self.working_side * self.internal_factor
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            working_side: Self::DEFAULT_WORKING_SIDE,
            internal_factor: Self::DEFAULT_INTERNAL_FACTOR,
            min_visibility: Self::DEFAULT_MIN_VISIBILITY,
            size_ratio_limit: Self::DEFAULT_SIZE_RATIO_LIMIT,
            notify_window: Self::DEFAULT_NOTIFY_WINDOW,
        }
    }
}

/// Resolution-independent artwork placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Horizontal center within the clip bounds, nominally `[0, 1]`.
    pub x_ratio: f64,
    /// Vertical center within the clip bounds, nominally `[0, 1]`.
    pub y_ratio: f64,
    /// Longer artwork side relative to the dominant clip extent.
    pub size_ratio: f64,
    /// Rotation in degrees, clockwise on the canvas.
    pub rotation: f64,
    /// Where the artwork was loaded from.
    pub source_url: String,
    /// Bypass quantization and composite the artwork as-is.
    pub show_original_artwork: bool,
}

impl Placement {
    /// Centered placement at the given size.
    #[must_use]
    pub fn centered(source_url: impl Into<String>, size_ratio: f64) -> Self {
        Self {
            x_ratio: 0.5,
            y_ratio: 0.5,
            size_ratio,
            rotation: 0.0,
            source_url: source_url.into(),
            show_original_artwork: false,
        }
    }
}

/// Exported placement values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementData {
    /// Horizontal center ratio.
    pub x_ratio: f64,
    /// Vertical center ratio.
    pub y_ratio: f64,
    /// Size ratio.
    pub size_ratio: f64,
    /// Rendered width / height of the artwork.
    pub wh_ratio: f64,
    /// Rotation in degrees.
    pub rotation: f64,
}

/// Placement export for one boundary; `data` is `None` without artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementExport {
    /// Boundary name.
    pub boundary_name: String,
    /// Placement values, if artwork is placed.
    pub data: Option<PlacementData>,
}

/// A 2D affine map `(x, y) -> (sx*x + kx*y + tx, ky*x + sy*y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// X scale.
    pub sx: f64,
    /// Y shear contribution of x.
    pub ky: f64,
    /// X shear contribution of y.
    pub kx: f64,
    /// Y scale.
    pub sy: f64,
    /// X translation.
    pub tx: f64,
    /// Y translation.
    pub ty: f64,
}

impl Affine {
    /// Map a point.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.kx.mul_add(p.y, self.sx.mul_add(p.x, self.tx)),
            self.sy.mul_add(p.y, self.ky.mul_add(p.x, self.ty)),
        )
    }

    /// The same map as a rasterizer transform.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(
            self.sx as f32,
            self.ky as f32,
            self.kx as f32,
            self.sy as f32,
            self.tx as f32,
            self.ty as f32,
        )
    }
}

/// Which of the two canvases a transform is resolved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasKind {
    /// Small interactive canvas.
    Working,
    /// Large compositing canvas.
    Internal,
}

/// A placement resolved on one canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtworkTransform {
    /// Artwork center on the canvas.
    pub center: Point,
    /// Horizontal scale (includes the clip region's stretch).
    pub scale_x: f64,
    /// Vertical scale.
    pub scale_y: f64,
    /// Total rotation in degrees (placement plus base rotation).
    pub rotation: f64,
    /// Artwork width in source pixels.
    pub natural_width: f64,
    /// Artwork height in source pixels.
    pub natural_height: f64,
}

impl ArtworkTransform {
    /// Map from artwork pixel space to canvas space.
    #[must_use]
    pub fn affine(&self) -> Affine {
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        let sx = cos * self.scale_x;
        let ky = sin * self.scale_x;
        let kx = -sin * self.scale_y;
        let sy = cos * self.scale_y;
        let half_w = self.natural_width / 2.0;
        let half_h = self.natural_height / 2.0;
        Affine {
            sx,
            ky,
            kx,
            sy,
            tx: self.center.x - kx.mul_add(half_h, sx * half_w),
            ty: self.center.y - sy.mul_add(half_h, ky * half_w),
        }
    }

    /// The artwork's four corners on the canvas.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        let m = self.affine();
        let (w, h) = (self.natural_width, self.natural_height);
        [
            m.apply(Point::new(0.0, 0.0)),
            m.apply(Point::new(w, 0.0)),
            m.apply(Point::new(w, h)),
            m.apply(Point::new(0.0, h)),
        ]
    }

    /// Axis-aligned bounding box of the rendered artwork.
    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        let corners = self.corners();
        Rect::enclosing(&corners).unwrap_or(Rect {
            left: self.center.x,
            top: self.center.y,
            width: 0.0,
            height: 0.0,
        })
    }
}

/// Result of an interactive edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit was applied as requested.
    Applied,
    /// The edit was applied partially, stopping at the visibility or
    /// bounds limit.
    Clamped,
    /// The edit was refused; the placement is unchanged.
    Rejected,
}

/// Owns one boundary's placement on both canvases.
#[derive(Debug, Clone)]
pub struct PlacementEditor {
    working: ClipRegion,
    internal: ClipRegion,
    natural_width: f64,
    natural_height: f64,
    placement: Placement,
    size_ratio_limit: f64,
    min_visibility: f64,
}

impl PlacementEditor {
    /// Build an editor for artwork of `natural` `(width, height)` pixels.
    ///
    /// `working` must be fitted to `config.working_side`; the internal
    /// region is derived from it. `size_ratio_limit` falls back to the
    /// config default when not positive.
    #[must_use]
    pub fn new(
        working: ClipRegion,
        config: &PlacementConfig,
        natural: (u32, u32),
        placement: Placement,
        size_ratio_limit: Option<f64>,
    ) -> Self {
        let internal = working.scaled(config.internal_factor);
        let size_ratio_limit = size_ratio_limit
            .filter(|limit| *limit > 0.0 && limit.is_finite())
            .unwrap_or(config.size_ratio_limit);
        Self {
            working,
            internal,
            natural_width: f64::from(natural.0.max(1)),
            natural_height: f64::from(natural.1.max(1)),
            placement,
            size_ratio_limit,
            min_visibility: config.min_visibility,
        }
    }

    /// Current placement.
    #[must_use]
    pub const fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Clip region on the requested canvas.
    #[must_use]
    pub const fn region(&self, canvas: CanvasKind) -> &ClipRegion {
        match canvas {
            CanvasKind::Working => &self.working,
            CanvasKind::Internal => &self.internal,
        }
    }

    /// Largest accepted size ratio.
    #[must_use]
    pub const fn max_size_ratio(&self) -> f64 {
        self.size_ratio_limit
    }

    /// Current placement resolved on `canvas`.
    #[must_use]
    pub fn transform(&self, canvas: CanvasKind) -> ArtworkTransform {
        self.resolve(&self.placement, canvas)
    }

    /// Visible fraction of the current placement's bounding box.
    #[must_use]
    pub fn visibility(&self) -> f64 {
        self.visibility_of(&self.placement)
    }

    /// Whether the current placement satisfies the visibility constraint.
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.complies(&self.placement)
    }

    /// Export values.
    #[must_use]
    pub fn data(&self) -> PlacementData {
        let t = self.transform(CanvasKind::Working);
        PlacementData {
            x_ratio: self.placement.x_ratio,
            y_ratio: self.placement.y_ratio,
            size_ratio: self.placement.size_ratio,
            wh_ratio: (t.natural_width * t.scale_x) / (t.natural_height * t.scale_y),
            rotation: self.placement.rotation,
        }
    }

    /// Replace the placement without any constraint.
    pub fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }

    /// Ratios of a working-canvas point within the clip bounds.
    #[must_use]
    pub fn ratios_at(&self, point: Point) -> (f64, f64) {
        let b = self.working.bounds();
        ((point.x - b.left) / b.width, (point.y - b.top) / b.height)
    }

    /// Snap the center horizontally.
    pub fn center_horizontally(&mut self) {
        self.placement.x_ratio = 0.5;
    }

    /// Snap the center vertically.
    pub fn center_vertically(&mut self) {
        self.placement.y_ratio = 0.5;
    }

    /// Interactive resize.
    ///
    /// Sizes above [`max_size_ratio`](Self::max_size_ratio) are rejected.
    /// Below that limit the minimum visibility still holds in both
    /// directions: growing is clamped as well as shrinking. Enlarging
    /// artwork centered near a corner of the clip region spills more of it
    /// outside, so the resize stops at the largest compliant size and
    /// reports [`EditOutcome::Clamped`].
    pub fn scale_to(&mut self, size_ratio: f64) -> EditOutcome {
        if !(size_ratio.is_finite() && size_ratio > 0.0) || size_ratio > self.size_ratio_limit {
            return EditOutcome::Rejected;
        }
        let mut candidate = self.placement.clone();
        candidate.size_ratio = size_ratio;
        if self.accepts(&candidate) {
            self.placement = candidate;
            return EditOutcome::Applied;
        }
        let start = self.placement.size_ratio;
        self.clamp_along(|p, t| p.size_ratio = t.mul_add(size_ratio - start, start))
    }

    /// Interactive move to `(x_ratio, y_ratio)`.
    ///
    /// The target is clamped into the clip bounds, then, if the artwork
    /// would become too hidden, pulled back along the drag to the furthest
    /// compliant position.
    pub fn drag_to(&mut self, x_ratio: f64, y_ratio: f64) -> EditOutcome {
        if !(x_ratio.is_finite() && y_ratio.is_finite()) {
            return EditOutcome::Rejected;
        }
        let (x, y) = (x_ratio.clamp(0.0, 1.0), y_ratio.clamp(0.0, 1.0));
        let bounded = (x - x_ratio).abs() > f64::EPSILON || (y - y_ratio).abs() > f64::EPSILON;
        let mut candidate = self.placement.clone();
        candidate.x_ratio = x;
        candidate.y_ratio = y;
        if self.accepts(&candidate) {
            self.placement = candidate;
            return if bounded {
                EditOutcome::Clamped
            } else {
                EditOutcome::Applied
            };
        }

        let (x0, y0) = (self.placement.x_ratio, self.placement.y_ratio);
        self.clamp_along(|p, t| {
            p.x_ratio = t.mul_add(x - x0, x0);
            p.y_ratio = t.mul_add(y - y0, y0);
        })
    }

    /// Interactive rotation. Rotations that would break visibility are
    /// rejected.
    pub fn rotate_to(&mut self, rotation: f64) -> EditOutcome {
        if !rotation.is_finite() {
            return EditOutcome::Rejected;
        }
        let mut candidate = self.placement.clone();
        candidate.rotation = rotation;
        if self.accepts(&candidate) {
            self.placement = candidate;
            EditOutcome::Applied
        } else {
            EditOutcome::Rejected
        }
    }

    fn resolve(&self, placement: &Placement, canvas: CanvasKind) -> ArtworkTransform {
        let region = self.region(canvas);
        let b = region.bounds();
        let scale_y =
            placement.size_ratio * region.dominant_extent() / self.natural_width.max(self.natural_height);
        ArtworkTransform {
            center: Point::new(
                placement.x_ratio.mul_add(b.width, b.left),
                placement.y_ratio.mul_add(b.height, b.top),
            ),
            scale_x: scale_y * region.x_stretch(),
            scale_y,
            rotation: placement.rotation + region.base_rotation(),
            natural_width: self.natural_width,
            natural_height: self.natural_height,
        }
    }

    fn visibility_of(&self, placement: &Placement) -> f64 {
        let rect = self.resolve(placement, CanvasKind::Working).bounding_rect();
        self.working.visible_fraction(&rect)
    }

    fn complies(&self, placement: &Placement) -> bool {
        self.visibility_of(placement) + VISIBILITY_EPSILON >= self.min_visibility
    }

    /// Compliant, or no worse than an already non-compliant current state.
    fn accepts(&self, candidate: &Placement) -> bool {
        if self.complies(candidate) {
            return true;
        }
        !self.is_compliant()
            && self.visibility_of(candidate) + VISIBILITY_EPSILON >= self.visibility()
    }

    /// Move as far as possible along `edit(t)`, `t` in `[0, 1]`, while the
    /// placement stays compliant. The current placement is `t = 0`.
    fn clamp_along(&mut self, edit: impl Fn(&mut Placement, f64)) -> EditOutcome {
        if !self.is_compliant() {
            return EditOutcome::Rejected;
        }
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        for _ in 0..CLAMP_STEPS {
            let mid = (lo + hi) / 2.0;
            let mut trial = self.placement.clone();
            edit(&mut trial, mid);
            if self.complies(&trial) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        if lo <= 0.0 {
            return EditOutcome::Rejected;
        }
        let mut clamped = self.placement.clone();
        edit(&mut clamped, lo);
        self.placement = clamped;
        EditOutcome::Clamped
    }
}
