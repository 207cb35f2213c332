//! Outline polygon of a UV point set.
//!
//! The UV unwrap of a boundary mesh is a cloud of points in `[0, 1]^2`.
//! Its outline becomes the clip polygon artwork is composited into. The
//! [`HullKind::Concave`] strategy starts from the convex hull and digs long
//! edges in toward interior points, so notched or curved panels are not
//! over-covered; [`HullKind::Convex`] stops at the convex hull.
//!
//! UVs are scaled by [`HullOptions::scale`] before any geometry so the
//! concavity threshold reads in comfortable integer-ish units.

use std::collections::HashSet;

use geo::{Area, ConvexHull, Coord, MultiPoint};
use serde::{Deserialize, Serialize};

use crate::types::{GeometryError, Point};

/// Selects how the outline is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullKind {
    /// Convex hull refined by digging edges longer than the concavity
    /// threshold toward the interior.
    #[default]
    Concave,

    /// Plain convex hull.
    Convex,
}

/// Outline parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HullOptions {
    /// Outline strategy.
    pub kind: HullKind,
    /// Multiplier applied to UVs before computing the outline.
    pub scale: f64,
    /// Edge length (in scaled units) above which a concave refinement
    /// looks for an interior point to dig toward. Smaller values follow
    /// the point cloud more tightly.
    pub concavity: f64,
}

impl HullOptions {
    /// Default UV scale.
    pub const DEFAULT_SCALE: f64 = 1000.0;
    /// Default concavity threshold.
    pub const DEFAULT_CONCAVITY: f64 = 120.0;
}

impl Default for HullOptions {
    fn default() -> Self {
        Self {
            kind: HullKind::default(),
            scale: Self::DEFAULT_SCALE,
            concavity: Self::DEFAULT_CONCAVITY,
        }
    }
}

/// Trait for outline strategies over already-scaled points.
pub trait HullBuilder {
    /// Build a simple polygon (open ring, no repeated closing vertex)
    /// around `points`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateHull`] when the points span no
    /// area.
    fn outline(&self, points: &[Point], concavity: f64) -> Result<Vec<Point>, GeometryError>;
}

impl HullBuilder for HullKind {
    fn outline(&self, points: &[Point], concavity: f64) -> Result<Vec<Point>, GeometryError> {
        let distinct = dedupe(points);
        let ring = convex_ring(&distinct)?;
        match *self {
            Self::Convex => Ok(ring),
            Self::Concave => Ok(dig(ring, &distinct, concavity)),
        }
    }
}

/// Outline of a UV point set, returned in UV space.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateHull`] for fewer than three distinct
/// points or collinear points.
pub fn hull_polygon_uv(uvs: &[Point], options: &HullOptions) -> Result<Vec<Point>, GeometryError> {
    let scale = if options.scale > 0.0 {
        options.scale
    } else {
        HullOptions::DEFAULT_SCALE
    };
    let scaled: Vec<Point> = uvs
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .map(|p| Point::new(p.x * scale, p.y * scale))
        .collect();
    let ring = options.kind.outline(&scaled, options.concavity)?;
    Ok(ring
        .into_iter()
        .map(|p| Point::new(p.x / scale, p.y / scale))
        .collect())
}

/// Shoelace area of an open ring.
#[must_use]
pub fn ring_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let twice: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x.mul_add(b.y, -(b.x * a.y)))
        .sum();
    (twice * 0.5).abs()
}

fn dedupe(points: &[Point]) -> Vec<Point> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .copied()
        .filter(|p| seen.insert((p.x.to_bits(), p.y.to_bits())))
        .collect()
}

fn convex_ring(points: &[Point]) -> Result<Vec<Point>, GeometryError> {
    let degenerate = || GeometryError::DegenerateHull {
        distinct_points: points.len(),
    };
    if points.len() < 3 {
        return Err(degenerate());
    }
    let cloud: MultiPoint<f64> = points
        .iter()
        .map(|p| geo::Point::new(p.x, p.y))
        .collect::<Vec<_>>()
        .into();
    let hull = cloud.convex_hull();
    if hull.unsigned_area() <= f64::EPSILON {
        return Err(degenerate());
    }
    let mut ring: Vec<Point> = hull
        .exterior()
        .coords()
        .map(|c: &Coord<f64>| Point::new(c.x, c.y))
        .collect();
    // geo closes its rings.
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    Ok(ring)
}

/// Dig edges longer than `concavity` toward interior points.
///
/// For each long edge `(a, b)` the candidate interior point with the
/// widest view of the edge (both base angles acute and as small as
/// possible) is inserted between `a` and `b`, provided neither new edge
/// crosses the ring. Inserted points leave the pool, so this terminates.
fn dig(mut ring: Vec<Point>, all: &[Point], concavity: f64) -> Vec<Point> {
    if concavity.is_nan() || concavity <= 0.0 {
        return ring;
    }
    let on_ring: HashSet<(u64, u64)> = ring.iter().map(|p| (p.x.to_bits(), p.y.to_bits())).collect();
    let mut pool: Vec<Point> = all
        .iter()
        .copied()
        .filter(|p| !on_ring.contains(&(p.x.to_bits(), p.y.to_bits())))
        .collect();

    let threshold = concavity * concavity;
    let mut i = 0;
    while i < ring.len() && !pool.is_empty() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        let length_sq = a.distance_squared(b);
        if length_sq <= threshold {
            i += 1;
            continue;
        }
        match best_inner_point(&ring, &pool, a, b, length_sq) {
            Some(idx) => {
                let p = pool.swap_remove(idx);
                ring.insert(i + 1, p);
            }
            None => i += 1,
        }
    }
    ring
}

fn best_inner_point(ring: &[Point], pool: &[Point], a: Point, b: Point, length_sq: f64) -> Option<usize> {
    let mid = a.lerp(b, 0.5);
    let mut best: Option<(usize, f64, f64)> = None;
    for (idx, &p) in pool.iter().enumerate() {
        // Only points near the edge are worth digging toward.
        if p.distance_squared(mid) > length_sq {
            continue;
        }
        let cos_a = cos_angle(a, p, b);
        let cos_b = cos_angle(b, p, a);
        if cos_a <= 0.0 || cos_b <= 0.0 {
            continue;
        }
        let better = best.is_none_or(|(_, best_a, best_b)| cos_a > best_a && cos_b > best_b);
        if better && !crosses_ring(ring, a, p) && !crosses_ring(ring, b, p) {
            best = Some((idx, cos_a, cos_b));
        }
    }
    best.map(|(idx, _, _)| idx)
}

/// Cosine of the angle at `vertex` between `vertex -> p` and `vertex -> q`.
fn cos_angle(vertex: Point, p: Point, q: Point) -> f64 {
    let (ux, uy) = (p.x - vertex.x, p.y - vertex.y);
    let (vx, vy) = (q.x - vertex.x, q.y - vertex.y);
    let norm = (ux.hypot(uy)) * (vx.hypot(vy));
    if norm == 0.0 {
        return -1.0;
    }
    ux.mul_add(vx, uy * vy) / norm
}

fn orientation(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x).mul_add(c.y - a.y, -((b.y - a.y) * (c.x - a.x)))
}

/// Whether segments `pq` and `rs` cross at a point interior to both.
fn properly_cross(p: Point, q: Point, r: Point, s: Point) -> bool {
    let d1 = orientation(r, s, p);
    let d2 = orientation(r, s, q);
    let d3 = orientation(p, q, r);
    let d4 = orientation(p, q, s);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

fn crosses_ring(ring: &[Point], from: Point, to: Point) -> bool {
    let n = ring.len();
    (0..n).any(|i| properly_cross(from, to, ring[i], ring[(i + 1) % n]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn grid(n: u32) -> Vec<Point> {
        let mut pts = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                pts.push(Point::new(f64::from(i) / f64::from(n), f64::from(j) / f64::from(n)));
            }
        }
        pts
    }

    #[test]
    fn square_grid_outline_is_the_unit_square() {
        let hull = hull_polygon_uv(&grid(4), &HullOptions::default()).unwrap();
        assert!((ring_area(&hull) - 1.0).abs() < 1e-9);
        for p in &hull {
            assert!((0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y));
        }
    }

    #[test]
    fn l_shape_is_dug_out() {
        // Dense L: the unit square minus its top-right quadrant.
        let pts: Vec<Point> = grid(20)
            .into_iter()
            .filter(|p| !(p.x > 0.5 && p.y > 0.5))
            .collect();
        let convex = hull_polygon_uv(
            &pts,
            &HullOptions {
                kind: HullKind::Convex,
                ..HullOptions::default()
            },
        )
        .unwrap();
        let concave = hull_polygon_uv(&pts, &HullOptions::default()).unwrap();
        let convex_area = ring_area(&convex);
        let concave_area = ring_area(&concave);
        assert!(concave_area < convex_area - 0.05, "{concave_area} vs {convex_area}");
        assert!(concave_area > 0.7);
    }

    #[test]
    fn duplicates_do_not_count_as_distinct() {
        let pts = vec![Point::new(0.1, 0.1); 10];
        assert_eq!(
            hull_polygon_uv(&pts, &HullOptions::default()).unwrap_err(),
            GeometryError::DegenerateHull { distinct_points: 1 }
        );
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let pts: Vec<Point> = (0..5).map(|i| Point::new(f64::from(i) * 0.1, 0.2)).collect();
        assert!(matches!(
            hull_polygon_uv(&pts, &HullOptions::default()),
            Err(GeometryError::DegenerateHull { distinct_points: 5 })
        ));
    }

    #[test]
    fn two_points_are_degenerate() {
        let pts = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        assert!(hull_polygon_uv(&pts, &HullOptions::default()).is_err());
    }

    #[test]
    fn concave_outline_is_simple() {
        let pts: Vec<Point> = grid(20)
            .into_iter()
            .filter(|p| !(p.x > 0.5 && p.y > 0.5))
            .collect();
        let ring = hull_polygon_uv(&pts, &HullOptions::default()).unwrap();
        let n = ring.len();
        for i in 0..n {
            for j in 0..n {
                if i == j || (i + 1) % n == j || (j + 1) % n == i {
                    continue;
                }
                assert!(!properly_cross(
                    ring[i],
                    ring[(i + 1) % n],
                    ring[j],
                    ring[(j + 1) % n]
                ));
            }
        }
    }

    #[test]
    fn ring_area_of_triangle() {
        let tri = [Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(0.0, 2.0)];
        assert!((ring_area(&tri) - 2.0).abs() < f64::EPSILON);
    }
}
