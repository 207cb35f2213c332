//! Texture synthesis: turn composited layers into renderable surfaces.
//!
//! A synthesis pass produces immutable [`Material`] descriptors. Each
//! [`Surface`] is mirrored onto the tech-pack mesh by sharing the very same
//! `Arc<Material>`, so documentation renders can never drift from the live
//! garment. Surfaces live in a [`SurfaceArena`]; replacing a boundary's
//! surfaces releases the previous ones before the new ones are inserted.

use std::sync::Arc;

use crate::alpha::{merge_alpha, solid};
use crate::color::Rgb;
use crate::decompose::ImagePart;
use crate::finish::{FinishAssets, FinishAssignments, FinishKind, TiledMap};
use crate::types::{Dimensions, PipelineError, RgbaImage};
use crate::uv_region::UvWindow;

/// Alpha below which a fragment is discarded.
pub const ALPHA_TEST: f32 = 0.5;

/// Metalness of the Metallic finish.
pub const METALLIC_METALNESS: f32 = 0.9;
/// Roughness of the Metallic finish.
pub const METALLIC_ROUGHNESS: f32 = 0.2;
/// Emissive strength used by tinted finishes.
pub const EMISSIVE_INTENSITY: f32 = 0.25;

const WHITE: Rgb = Rgb::new(255, 255, 255);
const BLACK: Rgb = Rgb::new(0, 0, 0);

/// Immutable material descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Finish policy that produced this material.
    pub finish: FinishKind,
    /// Palette color, or `None` for original artwork.
    pub color: Option<Rgb>,
    /// Albedo multiplier.
    pub base_color: Rgb,
    /// Color texture on the compositing canvas.
    pub map: Arc<RgbaImage>,
    /// Alpha-test threshold, if alpha testing is on.
    pub alpha_test: Option<f32>,
    /// Whether the material blends.
    pub transparent: bool,
    /// PBR metalness.
    pub metalness: f32,
    /// PBR roughness.
    pub roughness: f32,
    /// Emissive tint.
    pub emissive: Rgb,
    /// Emissive strength.
    pub emissive_intensity: f32,
    /// Tiled normal detail.
    pub normal_map: Option<TiledMap>,
    /// Tiled height detail.
    pub bump_map: Option<TiledMap>,
    /// Canvas-to-mesh UV mapping.
    pub uv: UvWindow,
}

/// One renderable layer of a boundary.
#[derive(Debug, Clone)]
pub struct Surface {
    /// Palette color, `None` when showing original artwork.
    pub color: Option<Rgb>,
    /// Shared material.
    pub material: Arc<Material>,
}

impl Surface {
    /// Finish of the material.
    #[must_use]
    pub fn finish(&self) -> FinishKind {
        self.material.finish
    }

    /// The tech-pack counterpart, sharing this surface's material.
    #[must_use]
    pub fn mirror(&self) -> Self {
        Self {
            color: self.color,
            material: Arc::clone(&self.material),
        }
    }
}

/// Composited input to a synthesis pass.
#[derive(Debug, Clone)]
pub enum Layers {
    /// The placed artwork as-is.
    Original(RgbaImage),
    /// One composited canvas per palette color.
    Parts(Vec<ImagePart>),
}

/// Build the material for one palette color.
///
/// # Errors
///
/// Returns [`PipelineError::ResourceMismatch`] if the alpha merge for a
/// Matte layer sees mismatched dimensions.
pub fn material_for(
    kind: FinishKind,
    color: Rgb,
    layer: &RgbaImage,
    assets: &FinishAssets,
    uv: UvWindow,
) -> Result<Material, PipelineError> {
    let mut material = Material {
        finish: kind,
        color: Some(color),
        base_color: WHITE,
        map: Arc::new(layer.clone()),
        alpha_test: Some(ALPHA_TEST),
        transparent: true,
        metalness: 0.0,
        roughness: 1.0,
        emissive: BLACK,
        emissive_intensity: 0.0,
        normal_map: None,
        bump_map: None,
        uv,
    };
    match kind {
        FinishKind::Matte => {
            let flat = solid(color, Dimensions::of(layer));
            material.map = Arc::new(merge_alpha(&flat, layer)?);
            // Opaque; the cutout comes from the alpha test alone.
            material.transparent = false;
        }
        FinishKind::Metallic => {
            material.metalness = METALLIC_METALNESS;
            material.roughness = METALLIC_ROUGHNESS;
            material.emissive = color;
            material.emissive_intensity = EMISSIVE_INTENSITY;
        }
        FinishKind::Glitter | FinishKind::Crystals => {
            if let Some(maps) = assets.maps(kind) {
                let tiled = |image: &Arc<RgbaImage>| TiledMap {
                    image: Arc::clone(image),
                    repeat: FinishAssets::DETAIL_REPEAT,
                };
                material.normal_map = Some(tiled(&maps.normal));
                material.bump_map = Some(tiled(&maps.bump));
            }
            material.emissive = color;
            material.emissive_intensity = EMISSIVE_INTENSITY;
            if kind == FinishKind::Crystals {
                material.base_color = color;
            }
        }
    }
    Ok(material)
}

/// Run one synthesis pass.
///
/// Original artwork yields exactly one surface; parts yield one surface
/// per part, finished per `assignments`.
///
/// # Errors
///
/// Propagates [`material_for`] failures.
pub fn synthesize(
    layers: &Layers,
    assignments: &FinishAssignments,
    assets: &FinishAssets,
    uv: UvWindow,
) -> Result<Vec<Surface>, PipelineError> {
    match layers {
        Layers::Original(canvas) => Ok(vec![Surface {
            color: None,
            material: Arc::new(Material {
                finish: FinishKind::Matte,
                color: None,
                base_color: WHITE,
                map: Arc::new(canvas.clone()),
                alpha_test: None,
                transparent: true,
                metalness: 0.0,
                roughness: 1.0,
                emissive: BLACK,
                emissive_intensity: 0.0,
                normal_map: None,
                bump_map: None,
                uv,
            }),
        }]),
        Layers::Parts(parts) => parts
            .iter()
            .map(|part| {
                let kind = assignments.get(part.color);
                let material = material_for(kind, part.color, &part.image, assets, uv)?;
                Ok(Surface {
                    color: Some(part.color),
                    material: Arc::new(material),
                })
            })
            .collect(),
    }
}

// ───── Arena ─────────────────────────────────────────────────────────

/// Handle to a surface in a [`SurfaceArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceKey {
    index: usize,
    generation: u64,
}

/// A live surface and its tech-pack mirror.
#[derive(Debug, Clone)]
pub struct MirroredSurface {
    /// Surface on the garment mesh.
    pub live: Surface,
    /// Surface on the tech-pack mesh; same material.
    pub techpack: Surface,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    value: Option<MirroredSurface>,
}

/// Owner of every synthesized surface.
///
/// Keys are generational: a key whose surface was released never resolves
/// again, even after its slot is reused.
#[derive(Debug, Default)]
pub struct SurfaceArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
}

impl SurfaceArena {
    /// Empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a surface and its tech-pack mirror.
    pub fn insert(&mut self, surface: Surface) -> SurfaceKey {
        let value = MirroredSurface {
            techpack: surface.mirror(),
            live: surface,
        };
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.value = Some(value);
            return SurfaceKey {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        SurfaceKey {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Look up a surface.
    #[must_use]
    pub fn get(&self, key: SurfaceKey) -> Option<&MirroredSurface> {
        self.slots
            .get(key.index)
            .filter(|slot| slot.generation == key.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    /// Release a surface. Returns it if the key was live.
    pub fn remove(&mut self, key: SurfaceKey) -> Option<MirroredSurface> {
        let slot = self
            .slots
            .get_mut(key.index)
            .filter(|slot| slot.generation == key.generation)?;
        let value = slot.value.take()?;
        slot.generation += 1;
        self.free.push(key.index);
        self.live -= 1;
        Some(value)
    }

    /// Release every key in `keys`, then insert `surfaces`, updating `keys`
    /// to the new handles.
    pub fn replace(&mut self, keys: &mut Vec<SurfaceKey>, surfaces: Vec<Surface>) {
        for key in keys.drain(..) {
            self.remove(key);
        }
        keys.extend(surfaces.into_iter().map(|s| self.insert(s)));
    }

    /// Number of live surfaces.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Whether the arena holds no surfaces.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }
}
