//! Minimal triangle mesh data consumed by the UV region analysis.
//!
//! The scene graph owns the real geometry; this is the read-only snapshot
//! a boundary needs at construction time.

use glam::{DVec2, DVec3, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::types::GeometryError;

/// Axis-aligned bounding box in mesh-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box containing every point, or `None` when empty.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (min, max) = rest
            .iter()
            .fold((*first, *first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Self { min, max })
    }

    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// A named triangle mesh: positions, optional per-vertex normals and UVs,
/// optional index buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    /// Scene-graph name, e.g. `Tee_boundary_front`.
    pub name: String,
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Per-vertex normals; empty if the mesh has none.
    #[serde(default)]
    pub normals: Vec<Vec3>,
    /// Per-vertex UVs, if the mesh was unwrapped.
    #[serde(default)]
    pub uvs: Option<Vec<Vec2>>,
    /// Triangle indices. `None` means consecutive vertex triples.
    #[serde(default)]
    pub indices: Option<Vec<u32>>,
}

impl MeshData {
    /// A flat rectangular grid in the XY plane, centered on the origin,
    /// facing +Z, with `u` running along +X and `v` along +Y.
    ///
    /// `segments` subdivides each axis (minimum 1).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn plane(name: impl Into<String>, width: f32, height: f32, segments: u32) -> Self {
        let n = segments.max(1);
        let mut positions = Vec::new();
        let mut uvs = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                let u = i as f32 / n as f32;
                let v = j as f32 / n as f32;
                positions.push(Vec3::new((u - 0.5) * width, (v - 0.5) * height, 0.0));
                uvs.push(Vec2::new(u, v));
            }
        }
        let mut indices = Vec::new();
        let row = n + 1;
        for j in 0..n {
            for i in 0..n {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                indices.extend_from_slice(&[a, b, d, a, d, c]);
            }
        }
        let normals = vec![Vec3::Z; positions.len()];
        Self {
            name: name.into(),
            positions,
            normals,
            uvs: Some(uvs),
            indices: Some(indices),
        }
    }

    /// Replace the UVs with `f(uv)`; useful for flipped or packed unwraps.
    #[must_use]
    pub fn map_uvs(mut self, f: impl Fn(Vec2) -> Vec2) -> Self {
        if let Some(uvs) = self.uvs.as_mut() {
            for uv in uvs {
                *uv = f(*uv);
            }
        }
        self
    }

    /// Bounding box of all vertex positions.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }

    /// The UV attribute, or [`GeometryError::MissingUvs`].
    ///
    /// # Errors
    ///
    /// Fails when the mesh has no UVs or the UV count does not match the
    /// vertex count.
    pub fn require_uvs(&self) -> Result<&[Vec2], GeometryError> {
        match &self.uvs {
            Some(uvs) if !uvs.is_empty() && uvs.len() == self.positions.len() => Ok(uvs),
            _ => Err(GeometryError::MissingUvs {
                mesh: self.name.clone(),
            }),
        }
    }

    /// Vertex index triples. Out-of-range indices are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let count = self.positions.len();
        let flat: Vec<usize> = match &self.indices {
            Some(indices) => indices.iter().map(|&i| i as usize).collect(),
            None => (0..count - count % 3).collect(),
        };
        flat.chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .filter(|t| t.iter().all(|&i| i < count))
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Mean of the vertex normals, normalized. Falls back to face normals
    /// when the mesh has no normal attribute, and to +Z when degenerate.
    #[must_use]
    pub fn average_normal(&self) -> Vec3 {
        let sum = if self.normals.len() == self.positions.len() && !self.normals.is_empty() {
            self.normals.iter().copied().sum::<Vec3>()
        } else {
            self.triangles()
                .map(|[a, b, c]| {
                    let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
                    (pb - pa).cross(pc - pa)
                })
                .sum::<Vec3>()
        };
        sum.try_normalize().unwrap_or(Vec3::Z)
    }

    /// Direction in UV space along which the surface runs "up" (world +Y).
    ///
    /// Each triangle's tangent frame maps a UV step to a surface step; the
    /// UV direction whose surface step best aligns with +Y is accumulated,
    /// weighted by the triangle's UV area. A texture whose `v` axis runs
    /// downward on the garment yields a negative `y` component.
    #[must_use]
    pub fn uv_up_direction(&self) -> DVec2 {
        let Some(uvs) = self.uvs.as_deref() else {
            return DVec2::Y;
        };
        let mut sum = DVec2::ZERO;
        for [a, b, c] in self.triangles() {
            let (Some(ta), Some(tb), Some(tc)) = (uvs.get(a), uvs.get(b), uvs.get(c)) else {
                continue;
            };
            let p0 = self.positions[a].as_dvec3();
            let e1 = self.positions[b].as_dvec3() - p0;
            let e2 = self.positions[c].as_dvec3() - p0;
            let d1 = (*tb - *ta).as_dvec2();
            let d2 = (*tc - *ta).as_dvec2();
            let det = d1.x.mul_add(d2.y, -(d2.x * d1.y));
            if det.abs() < f64::EPSILON {
                continue;
            }
            // dP/du and dP/dv, both scaled by det.
            let tangent = e1 * d2.y - e2 * d1.y;
            let bitangent = e2 * d1.x - e1 * d2.x;
            let dir = DVec2::new(tangent.dot(DVec3::Y), bitangent.dot(DVec3::Y)) * det.signum();
            sum += dir.normalize_or_zero() * (det.abs() * 0.5);
        }
        sum.try_normalize().unwrap_or(DVec2::Y)
    }
}
