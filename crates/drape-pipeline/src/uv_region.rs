//! Working region of a boundary: physical proportions, UV outline, and the
//! square canvas the outline is fitted into.

use geo::{Area, BooleanOps, Coord, LineString, Polygon};
use glam::{DVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::hull::{HullOptions, hull_polygon_uv};
use crate::mesh::MeshData;
use crate::types::{GeometryError, Point, Rect};

/// Geometry constants of one boundary, derived once at model load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryGeometry {
    /// Physical width / height of the usable region.
    pub aspect_ratio: f64,
    /// Outline of the UV unwrap, in UV space.
    pub hull: Vec<Point>,
    /// Center of the boundary mesh's bounding box, for camera framing.
    pub uv_center: Vec3,
    /// Average surface normal.
    pub surface_normal: Vec3,
    /// UV-space direction of world "up" on the surface.
    pub uv_normal: DVec2,
}

/// Width / height of the usable region.
///
/// The boundary mesh only says which axis dominates; the flattened
/// tech-pack mesh supplies the actual proportions. With
/// `estimate = boundary.x / boundary.y`, a wide boundary takes the larger
/// of the tech-pack's in-plane (x, y) extents as its width, a tall one the
/// smaller.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroExtent`] if either mesh is empty or has a
/// zero extent on an axis the ratio divides by.
pub fn aspect_ratio(boundary: &MeshData, techpack: &MeshData) -> Result<f64, GeometryError> {
    let zero = |mesh: &MeshData| GeometryError::ZeroExtent {
        mesh: mesh.name.clone(),
    };
    let b = boundary.bounding_box().ok_or_else(|| zero(boundary))?.size();
    let t = techpack.bounding_box().ok_or_else(|| zero(techpack))?.size();
    if b.y <= 0.0 {
        return Err(zero(boundary));
    }
    if t.x <= 0.0 || t.y <= 0.0 {
        return Err(zero(techpack));
    }
    let estimate = f64::from(b.x) / f64::from(b.y);
    let (long, short) = (f64::from(t.x.max(t.y)), f64::from(t.x.min(t.y)));
    let (width, height) = if estimate > 1.0 {
        (long, short)
    } else {
        (short, long)
    };
    Ok(width / height)
}

/// Derive every geometry constant for a boundary.
///
/// # Errors
///
/// - [`GeometryError::MissingTechpack`] when `techpack` is `None`.
/// - [`GeometryError::MissingUvs`] when the boundary has no UVs.
/// - [`GeometryError::ZeroExtent`] / [`GeometryError::DegenerateHull`] for
///   flat or degenerate geometry.
pub fn analyze_boundary(
    boundary: &MeshData,
    techpack: Option<&MeshData>,
    hull: &HullOptions,
) -> Result<BoundaryGeometry, GeometryError> {
    let techpack = techpack.ok_or_else(|| GeometryError::MissingTechpack {
        boundary: boundary.name.clone(),
    })?;
    let aspect_ratio = aspect_ratio(boundary, techpack)?;
    let uvs: Vec<Point> = boundary
        .require_uvs()?
        .iter()
        .map(|uv| Point::new(f64::from(uv.x), f64::from(uv.y)))
        .collect();
    let hull = hull_polygon_uv(&uvs, hull)?;
    let uv_center = boundary
        .bounding_box()
        .map_or(Vec3::ZERO, |bbox| bbox.center());
    Ok(BoundaryGeometry {
        aspect_ratio,
        hull,
        uv_center,
        surface_normal: boundary.average_normal(),
        uv_normal: boundary.uv_up_direction(),
    })
}

/// Maps a square canvas texture back onto mesh UVs.
///
/// A canvas pixel at `(x, y)` on a `side`-sized canvas lands at texture
/// coordinate `(x / side, 1 - y / side)`; `uv * repeat + offset` gives that
/// texture coordinate for a mesh UV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvWindow {
    /// Texture offset.
    pub offset: DVec2,
    /// Texture repeat.
    pub repeat: DVec2,
}

impl UvWindow {
    /// Identity mapping.
    pub const IDENTITY: Self = Self {
        offset: DVec2::ZERO,
        repeat: DVec2::ONE,
    };

    /// Texture coordinate of a mesh UV.
    #[must_use]
    pub fn apply(&self, uv: DVec2) -> DVec2 {
        uv * self.repeat + self.offset
    }
}

/// The clip polygon fitted into a square canvas.
#[derive(Debug, Clone)]
pub struct ClipRegion {
    side: f64,
    polygon: Vec<Point>,
    shape: Polygon<f64>,
    bounds: Rect,
    uv_window: UvWindow,
    x_stretch: f64,
    base_rotation: f64,
}

impl ClipRegion {
    /// Fit a UV outline into a `side`-sized canvas.
    ///
    /// The dominant UV extent fills the canvas; the other axis is centered.
    /// UV `v` runs up while canvas `y` runs down, so the outline is flipped
    /// vertically. `x_stretch` widens artwork so that, once the canvas is
    /// wrapped onto a region whose UV proportions differ from its physical
    /// `aspect_ratio`, it appears undistorted. A region whose unwrap runs
    /// upside down (`uv_up.y < 0`) gets a 180 degree base rotation.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateHull`] if the outline spans no
    /// area.
    pub fn fit(
        hull: &[Point],
        aspect_ratio: f64,
        uv_up: DVec2,
        side: f64,
    ) -> Result<Self, GeometryError> {
        let degenerate = || GeometryError::DegenerateHull {
            distinct_points: hull.len(),
        };
        let uv_bounds = Rect::enclosing(hull).ok_or_else(degenerate)?;
        let extent = uv_bounds.width.max(uv_bounds.height);
        if hull.len() < 3 || extent <= 0.0 || uv_bounds.width <= 0.0 || uv_bounds.height <= 0.0 {
            return Err(degenerate());
        }
        let scale = side / extent;
        let pad_x = uv_bounds.width.mul_add(-scale, side) / 2.0;
        let pad_y = uv_bounds.height.mul_add(-scale, side) / 2.0;
        let v_max = uv_bounds.bottom();

        let polygon: Vec<Point> = hull
            .iter()
            .map(|p| {
                Point::new(
                    (p.x - uv_bounds.left).mul_add(scale, pad_x),
                    (v_max - p.y).mul_add(scale, pad_y),
                )
            })
            .collect();
        let bounds = Rect::enclosing(&polygon).ok_or_else(degenerate)?;

        let repeat = 1.0 / extent;
        let uv_window = UvWindow {
            offset: DVec2::new(
                uv_bounds.left.mul_add(-scale, pad_x) / side,
                1.0 - v_max.mul_add(scale, pad_y) / side,
            ),
            repeat: DVec2::splat(repeat),
        };

        let x_stretch = if aspect_ratio > 0.0 && aspect_ratio.is_finite() {
            (bounds.width / bounds.height) / aspect_ratio
        } else {
            1.0
        };
        let base_rotation = if uv_up.y < 0.0 { 180.0 } else { 0.0 };

        Ok(Self {
            side,
            shape: to_polygon(&polygon),
            polygon,
            bounds,
            uv_window,
            x_stretch,
            base_rotation,
        })
    }

    /// The same region on a canvas `factor` times larger.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        let polygon: Vec<Point> = self
            .polygon
            .iter()
            .map(|p| Point::new(p.x * factor, p.y * factor))
            .collect();
        Self {
            side: self.side * factor,
            shape: to_polygon(&polygon),
            polygon,
            bounds: Rect {
                left: self.bounds.left * factor,
                top: self.bounds.top * factor,
                width: self.bounds.width * factor,
                height: self.bounds.height * factor,
            },
            uv_window: self.uv_window,
            x_stretch: self.x_stretch,
            base_rotation: self.base_rotation,
        }
    }

    /// Canvas side length.
    #[must_use]
    pub const fn side(&self) -> f64 {
        self.side
    }

    /// Clip polygon in canvas coordinates.
    #[must_use]
    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    /// Bounding box of the clip polygon.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Canvas-to-UV mapping.
    #[must_use]
    pub const fn uv_window(&self) -> UvWindow {
        self.uv_window
    }

    /// Horizontal stretch reconciling UV and physical proportions.
    #[must_use]
    pub const fn x_stretch(&self) -> f64 {
        self.x_stretch
    }

    /// Rotation (degrees) added to every placement.
    #[must_use]
    pub const fn base_rotation(&self) -> f64 {
        self.base_rotation
    }

    /// The longer side of the clip bounds; artwork size ratios refer to it.
    #[must_use]
    pub fn dominant_extent(&self) -> f64 {
        self.bounds.width.max(self.bounds.height)
    }

    /// Area of the clip polygon.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }

    /// Fraction of `rect` that lies inside the clip polygon, in `[0, 1]`.
    ///
    /// A zero-area rectangle counts as fully hidden.
    #[must_use]
    pub fn visible_fraction(&self, rect: &Rect) -> f64 {
        let area = rect.area();
        if !(area.is_finite() && area > 0.0) {
            return 0.0;
        }
        let overlap = self.shape.intersection(&to_polygon(&rect.corners()));
        (overlap.unsigned_area() / area).clamp(0.0, 1.0)
    }
}

fn to_polygon(points: &[Point]) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(LineString::from(ring), Vec::new())
}
