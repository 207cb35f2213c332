//! Shared types for the drape boundary texture pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `RgbaImage` so downstream crates can pass artwork and
/// synthesized textures around without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in canvas or UV coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Linear interpolation towards `other` by `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self::new(
            t.mul_add(other.x - self.x, self.x),
            t.mul_add(other.y - self.y, self.y),
        )
    }
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Smallest rectangle enclosing all `points`.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            left: min_x,
            top: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.width.mul_add(0.5, self.left),
            self.height.mul_add(0.5, self.top),
        )
    }

    /// Area of the rectangle.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// The four corners, clockwise from top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.left, self.top),
            Point::new(self.right(), self.top),
            Point::new(self.right(), self.bottom()),
            Point::new(self.left, self.bottom()),
        ]
    }

    /// Clamp a point into the rectangle.
    #[must_use]
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(
            p.x.clamp(self.left, self.right()),
            p.y.clamp(self.top, self.bottom()),
        )
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// The longer of the two sides.
    #[must_use]
    pub fn max_side(self) -> u32 {
        self.width.max(self.height)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Geometry failures while deriving a boundary's working region.
///
/// Fatal to constructing the one boundary involved; a model load keeps
/// going for every other boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// The boundary has no flattened tech-pack counterpart.
    #[error("could not find flat version of {boundary}")]
    MissingTechpack {
        /// Name of the boundary mesh.
        boundary: String,
    },

    /// The mesh carries no UV attribute.
    #[error("mesh {mesh} has no UV coordinates")]
    MissingUvs {
        /// Name of the offending mesh.
        mesh: String,
    },

    /// Too few distinct UV points, or all of them collinear.
    #[error("degenerate UV hull: {distinct_points} distinct points span no area")]
    DegenerateHull {
        /// Number of distinct UV points after deduplication.
        distinct_points: usize,
    },

    /// A bounding box extent needed for the aspect ratio is zero.
    #[error("mesh {mesh} has a zero-sized bounding box extent")]
    ZeroExtent {
        /// Name of the offending mesh.
        mesh: String,
    },
}

/// Errors that can occur while running the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid and cannot be recovered locally.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// Region geometry could not be derived.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Two images that must share pixel dimensions do not.
    #[error("image dimensions differ: expected {expected}, got {actual}")]
    ResourceMismatch {
        /// Dimensions of the base image.
        expected: Dimensions,
        /// Dimensions of the image being merged in.
        actual: Dimensions,
    },

    /// A raster surface could not be allocated.
    #[error("could not allocate a {0} raster surface")]
    Raster(Dimensions),
}
