//! Finish kinds, per-color finish assignments, and the shared detail maps
//! used by textured finishes.

use std::collections::BTreeMap;
use std::hash::Hasher;
use std::sync::Arc;

use image::Rgba;
use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

use crate::color::{ColorParseError, Rgb};
use crate::types::RgbaImage;

/// Material policy applied to one palette color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FinishKind {
    /// Flat color, alpha-tested.
    #[default]
    Matte,
    /// High metalness, low roughness, emissive tint.
    Metallic,
    /// Sparkle detail over a white base.
    Glitter,
    /// Faceted detail over a color-tinted base.
    Crystals,
}

impl FinishKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Matte, Self::Metallic, Self::Glitter, Self::Crystals];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Matte => "Matte",
            Self::Metallic => "Metallic",
            Self::Glitter => "Glitter",
            Self::Crystals => "Crystals",
        }
    }

    /// Whether this kind carries tiled normal and bump detail.
    #[must_use]
    pub const fn is_textured(self) -> bool {
        matches!(self, Self::Glitter | Self::Crystals)
    }
}

impl std::fmt::Display for FinishKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown finish name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown finish kind: {0:?}")]
pub struct UnknownFinish(pub String);

impl std::str::FromStr for FinishKind {
    type Err = UnknownFinish;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownFinish(s.to_string()))
    }
}

/// Palette color to finish mapping. Colors without an entry are Matte.
///
/// Keys are parsed colors, so hex lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishAssignments {
    entries: BTreeMap<Rgb, FinishKind>,
}

impl FinishAssignments {
    /// Finish for `color`.
    #[must_use]
    pub fn get(&self, color: Rgb) -> FinishKind {
        self.entries.get(&color).copied().unwrap_or_default()
    }

    /// Upsert an entry.
    pub fn set(&mut self, color: Rgb, kind: FinishKind) {
        self.entries.insert(color, kind);
    }

    /// Upsert an entry by hex string.
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError`] for malformed hex.
    pub fn set_hex(&mut self, hex: &str, kind: FinishKind) -> Result<(), ColorParseError> {
        self.set(Rgb::from_hex(hex)?, kind);
        Ok(())
    }

    /// Replace every entry.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = (Rgb, FinishKind)>) {
        self.entries = entries.into_iter().collect();
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether no color has an explicit finish.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Explicit entries, ordered by color.
    pub fn iter(&self) -> impl Iterator<Item = (Rgb, FinishKind)> + '_ {
        self.entries.iter().map(|(c, k)| (*c, *k))
    }
}

/// A detail texture and how often it tiles across the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TiledMap {
    /// Shared pixels.
    pub image: Arc<RgbaImage>,
    /// Tiles per texture unit.
    pub repeat: f64,
}

/// Normal and bump maps for one textured finish.
#[derive(Debug, Clone)]
pub struct DetailMaps {
    /// Tangent-space normal map.
    pub normal: Arc<RgbaImage>,
    /// Grayscale height map.
    pub bump: Arc<RgbaImage>,
}

/// Process-wide pool of finish detail maps.
///
/// Built once and shared (via `Arc`) by every synthesis pass, so repeated
/// edits reuse the same pixels instead of regenerating them.
#[derive(Debug, Clone)]
pub struct FinishAssets {
    glitter: DetailMaps,
    crystals: DetailMaps,
}

impl FinishAssets {
    /// Default side of the generated maps.
    pub const DEFAULT_SIZE: u32 = 128;
    /// Tiling applied to detail maps.
    pub const DETAIL_REPEAT: f64 = 6.0;

    /// Use externally supplied maps.
    #[must_use]
    pub const fn new(glitter: DetailMaps, crystals: DetailMaps) -> Self {
        Self { glitter, crystals }
    }

    /// Generate deterministic detail maps of `size` pixels square.
    ///
    /// Glitter is a field of small flakes, crystals a grid of larger
    /// facets; each cell gets a hashed tilt and height.
    #[must_use]
    pub fn procedural(size: u32) -> Self {
        let size = size.max(1);
        Self {
            glitter: detail_maps(size, 2, 0x6c69_7474),
            crystals: detail_maps(size, 8, 0x6372_7973),
        }
    }

    /// Maps for a textured finish, `None` for Matte and Metallic.
    #[must_use]
    pub const fn maps(&self, kind: FinishKind) -> Option<&DetailMaps> {
        match kind {
            FinishKind::Glitter => Some(&self.glitter),
            FinishKind::Crystals => Some(&self.crystals),
            FinishKind::Matte | FinishKind::Metallic => None,
        }
    }
}

impl Default for FinishAssets {
    fn default() -> Self {
        Self::procedural(Self::DEFAULT_SIZE)
    }
}

fn cell_hash(seed: u64, cx: u32, cy: u32) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(seed, !seed);
    hasher.write_u32(cx);
    hasher.write_u32(cy);
    hasher.finish()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn detail_maps(size: u32, cell: u32, seed: u64) -> DetailMaps {
    let normal = RgbaImage::from_fn(size, size, |x, y| {
        let h = cell_hash(seed, x / cell, y / cell);
        let tilt_x = f64::from((h & 0xff) as u8) / 255.0 - 0.5;
        let tilt_y = f64::from(((h >> 8) & 0xff) as u8) / 255.0 - 0.5;
        let z = (1.0 - tilt_x.mul_add(tilt_x, tilt_y * tilt_y)).max(0.0).sqrt();
        let encode = |n: f64| (n.mul_add(0.5, 0.5) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgba([encode(tilt_x), encode(tilt_y), encode(z), 255])
    });
    let bump = RgbaImage::from_fn(size, size, |x, y| {
        let v = ((cell_hash(seed, x / cell, y / cell) >> 16) & 0xff) as u8;
        Rgba([v, v, v, 255])
    });
    DetailMaps {
        normal: Arc::new(normal),
        bump: Arc::new(bump),
    }
}
