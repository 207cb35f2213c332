//! One placement region of a garment and everything it owns.
//!
//! A [`Boundary`] owns its placement, palette, finish assignments and
//! synthesized surfaces behind a mutex that is never held across an
//! `.await`. Interactive edits schedule three throttled passes: a quick
//! re-composite of the preview canvas, a slower decomposition and finish
//! synthesis, and a coalesced placement-changed notification. Readiness
//! settles only after the synthesis pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use drape_export::{SvgMetadata, clip_region_svg, png_data_uri};
use drape_pipeline::composite::composite;
use drape_pipeline::debug::debug_overlay;
use drape_pipeline::naming::{self, display_name_if_boundary};
use drape_pipeline::placement::{CanvasKind, PlacementData, PlacementExport};
use drape_pipeline::synth::{
    Layers, MirroredSurface, Surface, SurfaceArena, SurfaceKey, synthesize,
};
use drape_pipeline::{
    ArtworkLayers, BoundaryGeometry, ClipRegion, EditOutcome, FinishAssets, FinishAssignments,
    FinishKind, GeometryError, ImagePart, MeshData, Palette, PipelineError, Placement,
    PlacementEditor, QuantizeOptions, Rgb, RgbaImage, analyze_boundary, extract_layers,
};
use futures_util::FutureExt;
use glam::{DVec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::StudioError;
use crate::config::StudioConfig;
use crate::loader::{ImageLoader, loggable};
use crate::readiness::Readiness;
use crate::scene::SceneHooks;
use crate::throttle::Throttle;

/// Where a boundary's placement is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPhase {
    /// No artwork.
    Empty,
    /// An artwork load is in flight.
    Loading,
    /// Artwork placed; interactive edits allowed.
    Editable,
    /// Artwork placed; interactive edits refused.
    Locked,
}

/// Parameters of an add/change-artwork request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkParams {
    /// Image location.
    pub url: String,
    /// Horizontal center ratio.
    pub x_ratio: f64,
    /// Vertical center ratio.
    pub y_ratio: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Size relative to the dominant clip extent.
    pub size_ratio: f64,
    /// Upper bound on `size_ratio`; the configured default when `None`.
    pub size_ratio_limit: Option<f64>,
    /// Cluster merge distance (Lab units) for quantization.
    pub sensitivity: Option<f64>,
    /// Maximum palette size.
    pub color_limit: Option<usize>,
    /// Colors to knock out of the artwork.
    #[serde(default)]
    pub colors_to_remove: Vec<Rgb>,
    /// Skip quantization and composite the artwork as-is.
    #[serde(default)]
    pub show_original_artwork: bool,
}

impl ArtworkParams {
    /// Default size ratio for new artwork.
    pub const DEFAULT_SIZE_RATIO: f64 = 0.5;

    /// Centered, unrotated artwork at the default size.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            x_ratio: 0.5,
            y_ratio: 0.5,
            rotation: 0.0,
            size_ratio: Self::DEFAULT_SIZE_RATIO,
            size_ratio_limit: None,
            sensitivity: None,
            color_limit: None,
            colors_to_remove: Vec::new(),
            show_original_artwork: false,
        }
    }

    /// Quantizer options with this request's overrides applied to `base`.
    #[must_use]
    pub fn quantize_options(&self, base: &QuantizeOptions) -> QuantizeOptions {
        let mut options = base.clone();
        if let Some(sensitivity) = self.sensitivity.filter(|s| s.is_finite() && *s >= 0.0) {
            options.merge_distance = sensitivity;
        }
        if let Some(limit) = self.color_limit {
            options.limit = limit;
        }
        options
            .colors_to_remove
            .extend(self.colors_to_remove.iter().copied());
        options
    }

    fn placement(&self) -> Placement {
        Placement {
            x_ratio: self.x_ratio,
            y_ratio: self.y_ratio,
            size_ratio: self.size_ratio,
            rotation: self.rotation,
            source_url: self.url.clone(),
            show_original_artwork: self.show_original_artwork,
        }
    }
}

/// A decomposed color layer as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImagePartInfo {
    /// `data:image/png;base64,...` of the part in artwork space.
    pub uri: String,
    /// Palette color.
    pub color: Rgb,
    /// Finish assigned to the color.
    pub finish_kind: FinishKind,
}

/// What the viewer should show for a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundaryVisibility {
    /// Whether the tech-pack mirror is shown in the live scene.
    pub techpack_mirror: bool,
    /// Whether clip-region and frame helpers are shown.
    pub debug_helpers: bool,
}

/// Shared collaborators handed to every boundary.
#[derive(Clone)]
pub struct BoundaryContext {
    /// Tunables.
    pub config: Arc<StudioConfig>,
    /// Detail maps for textured finishes.
    pub assets: Arc<FinishAssets>,
    /// Artwork source.
    pub loader: Arc<dyn ImageLoader>,
    /// Viewer notifications.
    pub hooks: SceneHooks,
}

impl std::fmt::Debug for BoundaryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryContext")
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct Artwork {
    editor: PlacementEditor,
    source: Arc<RgbaImage>,
    /// `None` when showing the original artwork.
    layers: Option<Arc<ArtworkLayers>>,
}

impl Artwork {
    /// The image drawn on the preview canvas.
    fn preview(&self) -> &RgbaImage {
        self.layers
            .as_ref()
            .map_or(&*self.source, |layers| &layers.quantized.image)
    }

    fn composite_internal(&self, image: &RgbaImage) -> Result<RgbaImage, PipelineError> {
        composite(
            image,
            &self.editor.transform(CanvasKind::Internal),
            self.editor.region(CanvasKind::Internal),
        )
    }

    fn composited_layers(&self) -> Result<Layers, PipelineError> {
        match &self.layers {
            None => Ok(Layers::Original(self.composite_internal(&self.source)?)),
            Some(layers) => layers
                .parts
                .iter()
                .map(|part| -> Result<ImagePart, PipelineError> {
                    Ok(ImagePart {
                        color: part.color,
                        image: self.composite_internal(&part.image)?,
                        pixel_count: part.pixel_count,
                    })
                })
                .collect::<Result<Vec<_>, PipelineError>>()
                .map(Layers::Parts),
        }
    }
}

#[derive(Default)]
struct BoundaryState {
    artwork: Option<Artwork>,
    /// Generation of the in-flight load, if any.
    loading: Option<u64>,
    locked: bool,
    finishes: FinishAssignments,
    canvas: Option<Arc<RgbaImage>>,
    layers: Option<Layers>,
    arena: SurfaceArena,
    surfaces: Vec<SurfaceKey>,
    developer_mode: bool,
    /// Bumped whenever the artwork or its placement changes; passes
    /// computed against an older revision are discarded.
    revision: u64,
}

/// Inputs of a synthesis pass, copied out of the state lock.
struct Snapshot {
    revision: u64,
    artwork: Artwork,
    finishes: FinishAssignments,
}

/// Output of a synthesis pass, ready to be swapped in.
struct Synthesized {
    canvas: RgbaImage,
    layers: Layers,
    surfaces: Vec<Surface>,
}

impl BoundaryState {
    const fn phase(&self) -> PlacementPhase {
        if self.loading.is_some() {
            PlacementPhase::Loading
        } else if self.artwork.is_none() {
            PlacementPhase::Empty
        } else if self.locked {
            PlacementPhase::Locked
        } else {
            PlacementPhase::Editable
        }
    }

    fn release_surfaces(&mut self) {
        self.arena.replace(&mut self.surfaces, Vec::new());
        self.layers = None;
        self.canvas = None;
    }

    fn snapshot(&self) -> Option<Snapshot> {
        self.artwork.as_ref().map(|artwork| Snapshot {
            revision: self.revision,
            artwork: artwork.clone(),
            finishes: self.finishes.clone(),
        })
    }

    /// Swap in a finished pass. Returns `false` if the artwork changed
    /// since the snapshot was taken.
    fn install(
        &mut self,
        revision: u64,
        synthesized: Synthesized,
        finishes: &FinishAssignments,
        assets: &FinishAssets,
        uv_region: &ClipRegion,
    ) -> Result<bool, PipelineError> {
        if revision != self.revision || self.artwork.is_none() {
            return Ok(false);
        }
        self.canvas = Some(Arc::new(synthesized.canvas));
        self.layers = Some(synthesized.layers);
        if *finishes == self.finishes {
            self.arena.replace(&mut self.surfaces, synthesized.surfaces);
        } else {
            self.refinish(assets, uv_region)?;
        }
        Ok(true)
    }

    fn refinish(
        &mut self,
        assets: &FinishAssets,
        uv_region: &ClipRegion,
    ) -> Result<(), PipelineError> {
        let Some(layers) = &self.layers else {
            return Ok(());
        };
        let surfaces = synthesize(layers, &self.finishes, assets, uv_region.uv_window())?;
        self.arena.replace(&mut self.surfaces, surfaces);
        Ok(())
    }
}

/// One boundary of the loaded model.
pub struct Boundary {
    name: String,
    display_name: String,
    techpack_name: String,
    geometry: BoundaryGeometry,
    region: ClipRegion,
    ctx: BoundaryContext,
    readiness: Readiness,
    generation: AtomicU64,
    state: Mutex<BoundaryState>,
    composite: Throttle<()>,
    synthesis: Throttle<()>,
    notify: Throttle<PlacementData>,
}

fn throttled<T: Send + 'static>(
    boundary: &Weak<Boundary>,
    window: Duration,
    run: fn(&Boundary, T),
) -> Throttle<T> {
    let boundary = boundary.clone();
    Throttle::new(window, move |value| {
        let boundary = boundary.clone();
        async move {
            if let Some(boundary) = boundary.upgrade() {
                run(&boundary, value);
            }
        }
        .boxed()
    })
}

impl Boundary {
    /// Build a boundary from its mesh and tech-pack counterpart.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] when the tech-pack mesh is missing or the
    /// UV unwrap is degenerate.
    pub fn new(
        mesh: &MeshData,
        techpack: Option<&MeshData>,
        ctx: BoundaryContext,
    ) -> Result<Arc<Self>, GeometryError> {
        let geometry = analyze_boundary(mesh, techpack, &ctx.config.hull)?;
        let region = ClipRegion::fit(
            &geometry.hull,
            geometry.aspect_ratio,
            geometry.uv_normal,
            ctx.config.placement.working_side,
        )?;
        let display_name =
            display_name_if_boundary(&mesh.name).unwrap_or_else(|| mesh.name.clone());
        let techpack_name =
            techpack.map_or_else(|| naming::techpack_name(&mesh.name), |t| t.name.clone());
        debug!(
            boundary = %mesh.name,
            aspect_ratio = geometry.aspect_ratio,
            hull_points = geometry.hull.len(),
            "boundary analyzed"
        );

        Ok(Arc::new_cyclic(|weak| {
            let config = &ctx.config;
            Self {
                composite: throttled(weak, config.composite_window, Self::run_composite),
                synthesis: throttled(weak, config.decompose_window, Self::run_synthesis),
                notify: throttled(weak, config.placement.notify_window, Self::run_notify),
                name: mesh.name.clone(),
                display_name,
                techpack_name,
                geometry,
                region,
                readiness: Readiness::new(),
                generation: AtomicU64::new(0),
                state: Mutex::new(BoundaryState::default()),
                ctx,
            }
        }))
    }

    fn lock(&self) -> MutexGuard<'_, BoundaryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ───── Identity and geometry ─────────────────────────────────────

    /// Mesh name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable region name (`Tee_boundary_left_sleeve` -> `Left sleeve`).
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Name of the tech-pack mirror mesh.
    #[must_use]
    pub fn techpack_name(&self) -> &str {
        &self.techpack_name
    }

    /// Derived geometry constants.
    #[must_use]
    pub const fn geometry(&self) -> &BoundaryGeometry {
        &self.geometry
    }

    /// Physical width / height of the usable region.
    #[must_use]
    pub const fn aspect_ratio(&self) -> f64 {
        self.geometry.aspect_ratio
    }

    /// Center of the boundary mesh, for camera framing.
    #[must_use]
    pub const fn uv_center(&self) -> Vec3 {
        self.geometry.uv_center
    }

    /// Average surface normal.
    #[must_use]
    pub const fn surface_normal(&self) -> Vec3 {
        self.geometry.surface_normal
    }

    /// UV-space up direction.
    #[must_use]
    pub const fn uv_normal(&self) -> DVec2 {
        self.geometry.uv_normal
    }

    /// Clip region on the working canvas.
    #[must_use]
    pub const fn region(&self) -> &ClipRegion {
        &self.region
    }

    // ───── Artwork ───────────────────────────────────────────────────

    /// Load, quantize and place artwork, replacing any current artwork.
    ///
    /// The current artwork stays in place until the new image is loaded
    /// and quantized. A later call supersedes this one.
    ///
    /// # Errors
    ///
    /// - [`StudioError::Superseded`] if another `add_artwork` or a reset
    ///   started before this one finished; state is untouched.
    /// - Loader and pipeline errors; the prior artwork is kept and the
    ///   boundary settles again unless a synthesis pass is queued.
    pub async fn add_artwork(
        &self,
        params: ArtworkParams,
        disable_editing: bool,
    ) -> Result<(), StudioError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.lock().loading = Some(generation);
        self.readiness.mark_pending();
        info!(boundary = %self.name, url = loggable(&params.url), "loading artwork");

        let prepared = self.prepare(&params).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(boundary = %self.name, "artwork load superseded");
            return Err(StudioError::Superseded);
        }

        let (source, layers) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(boundary = %self.name, error = %err, "artwork load failed");
                self.lock().loading = None;
                if !self.synthesis.has_pending() {
                    self.readiness.settle_now();
                }
                return Err(err);
            }
        };

        let editor = PlacementEditor::new(
            self.region.clone(),
            &self.ctx.config.placement,
            source.dimensions(),
            params.placement(),
            params.size_ratio_limit,
        );
        if !editor.is_compliant() {
            debug!(
                boundary = %self.name,
                visibility = editor.visibility(),
                "programmatic placement below visibility floor"
            );
        }
        let data = editor.data();
        let colors = layers.as_ref().map_or(0, |l| l.quantized.palette.len());
        {
            let mut state = self.lock();
            state.release_surfaces();
            state.revision += 1;
            state.loading = None;
            state.locked = disable_editing;
            state.artwork = Some(Artwork {
                editor,
                source,
                layers,
            });
        }
        self.composite.cancel();
        self.synthesis.cancel();
        self.schedule_passes();
        self.notify.schedule(data);
        self.ctx.hooks.mark_dirty();
        info!(boundary = %self.name, colors, "artwork placed");
        Ok(())
    }

    async fn prepare(
        &self,
        params: &ArtworkParams,
    ) -> Result<(Arc<RgbaImage>, Option<Arc<ArtworkLayers>>), StudioError> {
        let image = self.ctx.loader.load(&params.url).await?;
        let layers = if params.show_original_artwork {
            None
        } else {
            let options = params.quantize_options(&self.ctx.config.quantize);
            Some(Arc::new(extract_layers(&image, &options)?))
        };
        Ok((Arc::new(image), layers))
    }

    /// Remove the artwork and release its surfaces. Finish assignments are
    /// kept. Any in-flight load is superseded.
    pub fn reset_boundary(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.composite.cancel();
        self.synthesis.cancel();
        self.notify.cancel();
        {
            let mut state = self.lock();
            state.release_surfaces();
            state.revision += 1;
            state.artwork = None;
            state.loading = None;
            state.locked = false;
        }
        self.readiness.settle_now();
        self.ctx.hooks.mark_dirty();
        info!(boundary = %self.name, "boundary reset");
    }

    /// Lock or unlock interactive editing. Returns `false` without artwork.
    pub fn disable_editing(&self, disabled: bool) -> bool {
        let mut state = self.lock();
        if state.artwork.is_none() {
            return false;
        }
        state.locked = disabled;
        true
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> PlacementPhase {
        self.lock().phase()
    }

    /// Current placement, if artwork is placed.
    #[must_use]
    pub fn placement(&self) -> Option<Placement> {
        self.lock()
            .artwork
            .as_ref()
            .map(|a| a.editor.placement().clone())
    }

    /// Visible fraction of the artwork's bounding box.
    #[must_use]
    pub fn visibility(&self) -> Option<f64> {
        self.lock().artwork.as_ref().map(|a| a.editor.visibility())
    }

    /// Palette of the current artwork; `None` without artwork or when
    /// showing the original.
    #[must_use]
    pub fn palette(&self) -> Option<Palette> {
        self.lock()
            .artwork
            .as_ref()
            .and_then(|a| a.layers.as_ref())
            .map(|layers| layers.quantized.palette.clone())
    }

    // ───── Interactive edits ─────────────────────────────────────────

    fn edit(&self, apply: impl FnOnce(&mut PlacementEditor) -> EditOutcome) -> Option<EditOutcome> {
        let (outcome, data) = {
            let mut state = self.lock();
            if state.phase() != PlacementPhase::Editable {
                return None;
            }
            let artwork = state.artwork.as_mut()?;
            let outcome = apply(&mut artwork.editor);
            let data = artwork.editor.data();
            if outcome != EditOutcome::Rejected {
                state.revision += 1;
            }
            (outcome, data)
        };
        if outcome != EditOutcome::Rejected {
            self.schedule_passes();
            self.notify.schedule(data);
            self.ctx.hooks.mark_dirty();
        }
        Some(outcome)
    }

    /// Move the artwork center; `None` unless editable.
    pub fn drag_to(&self, x_ratio: f64, y_ratio: f64) -> Option<EditOutcome> {
        self.edit(|editor| editor.drag_to(x_ratio, y_ratio))
    }

    /// Resize the artwork; `None` unless editable.
    pub fn scale_to(&self, size_ratio: f64) -> Option<EditOutcome> {
        self.edit(|editor| editor.scale_to(size_ratio))
    }

    /// Rotate the artwork; `None` unless editable.
    pub fn rotate_to(&self, rotation: f64) -> Option<EditOutcome> {
        self.edit(|editor| editor.rotate_to(rotation))
    }

    /// Snap the artwork to the horizontal center.
    pub fn center_horizontally(&self) -> Option<EditOutcome> {
        self.edit(|editor| {
            editor.center_horizontally();
            EditOutcome::Applied
        })
    }

    /// Snap the artwork to the vertical center.
    pub fn center_vertically(&self) -> Option<EditOutcome> {
        self.edit(|editor| {
            editor.center_vertically();
            EditOutcome::Applied
        })
    }

    // ───── Finishes ──────────────────────────────────────────────────

    /// Assign a finish to a palette color and re-synthesize.
    ///
    /// # Errors
    ///
    /// Propagates synthesis failures; the assignment is kept.
    pub fn change_texture_finish(&self, color: Rgb, kind: FinishKind) -> Result<(), StudioError> {
        {
            let mut state = self.lock();
            state.finishes.set(color, kind);
            state.refinish(&self.ctx.assets, &self.region)?;
        }
        debug!(boundary = %self.name, color = %color.to_hex(), finish = %kind, "finish changed");
        self.ctx.hooks.mark_dirty();
        Ok(())
    }

    /// Return every color to Matte and re-synthesize.
    ///
    /// # Errors
    ///
    /// Propagates synthesis failures.
    pub fn reset_texture_finish(&self) -> Result<(), StudioError> {
        {
            let mut state = self.lock();
            state.finishes.clear();
            state.refinish(&self.ctx.assets, &self.region)?;
        }
        self.ctx.hooks.mark_dirty();
        Ok(())
    }

    /// Current finish assignments.
    #[must_use]
    pub fn finishes(&self) -> FinishAssignments {
        self.lock().finishes.clone()
    }

    // ───── Synthesis ─────────────────────────────────────────────────

    fn schedule_passes(&self) {
        self.readiness.mark_pending();
        self.composite.schedule(());
        self.synthesis.schedule(());
    }

    fn run_composite(&self, (): ()) {
        let Some(snapshot) = self.lock().snapshot() else {
            return;
        };
        let artwork = &snapshot.artwork;
        match artwork.composite_internal(artwork.preview()) {
            Ok(canvas) => {
                {
                    let mut state = self.lock();
                    if state.revision != snapshot.revision {
                        return;
                    }
                    state.canvas = Some(Arc::new(canvas));
                }
                self.ctx.hooks.mark_dirty();
            }
            Err(err) => warn!(boundary = %self.name, error = %err, "composite failed"),
        }
    }

    fn run_synthesis(&self, (): ()) {
        match self.synthesize_current() {
            Ok(Some(surfaces)) => {
                debug!(boundary = %self.name, surfaces, "surfaces synthesized");
                self.ctx.hooks.mark_dirty();
            }
            Ok(None) => debug!(boundary = %self.name, "stale synthesis discarded"),
            Err(err) => warn!(boundary = %self.name, error = %err, "synthesis failed"),
        }
        self.readiness.settle_after(self.ctx.config.settle_delay);
    }

    /// Run one pass on a snapshot of the state and swap the result in.
    /// The state lock is not held while compositing.
    ///
    /// `Ok(None)` means the artwork changed while the pass ran.
    fn synthesize_current(&self) -> Result<Option<usize>, PipelineError> {
        let snapshot = {
            let mut state = self.lock();
            match state.snapshot() {
                Some(snapshot) => snapshot,
                None => {
                    state.release_surfaces();
                    return Ok(Some(0));
                }
            }
        };
        let synthesized = self.synthesize_snapshot(&snapshot)?;
        let mut state = self.lock();
        let installed = state.install(
            snapshot.revision,
            synthesized,
            &snapshot.finishes,
            &self.ctx.assets,
            &self.region,
        )?;
        Ok(installed.then_some(state.surfaces.len()))
    }

    fn synthesize_snapshot(&self, snapshot: &Snapshot) -> Result<Synthesized, PipelineError> {
        let artwork = &snapshot.artwork;
        let canvas = artwork.composite_internal(artwork.preview())?;
        let layers = artwork.composited_layers()?;
        let surfaces = synthesize(
            &layers,
            &snapshot.finishes,
            &self.ctx.assets,
            self.region.uv_window(),
        )?;
        Ok(Synthesized {
            canvas,
            layers,
            surfaces,
        })
    }

    fn run_notify(&self, data: PlacementData) {
        self.ctx.hooks.artwork_changed(&self.name, &data);
    }

    /// Whether the surfaces reflect the current placement and finishes.
    #[must_use]
    pub fn is_ready_for_screenshot(&self) -> bool {
        self.readiness.is_ready()
    }

    /// The readiness signal.
    #[must_use]
    pub const fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// Live surfaces with their tech-pack mirrors, in palette order.
    #[must_use]
    pub fn surfaces(&self) -> Vec<MirroredSurface> {
        let state = self.lock();
        state
            .surfaces
            .iter()
            .filter_map(|key| state.arena.get(*key).cloned())
            .collect()
    }

    /// Number of live surfaces.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.lock().arena.len()
    }

    /// The most recent composited canvas.
    #[must_use]
    pub fn canvas(&self) -> Option<Arc<RgbaImage>> {
        self.lock().canvas.clone()
    }

    // ───── Export ────────────────────────────────────────────────────

    /// Placement values, or `None` data without artwork.
    #[must_use]
    pub fn export_placement(&self) -> PlacementExport {
        PlacementExport {
            boundary_name: self.name.clone(),
            data: self.lock().artwork.as_ref().map(|a| a.editor.data()),
        }
    }

    /// Decomposed color layers with their finishes.
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::Export`] if PNG encoding fails.
    pub fn decomposed_image_parts(&self) -> Result<Vec<ImagePartInfo>, StudioError> {
        let (layers, finishes) = {
            let state = self.lock();
            let layers = state.artwork.as_ref().and_then(|a| a.layers.clone());
            (layers, state.finishes.clone())
        };
        let Some(layers) = layers else {
            return Ok(Vec::new());
        };
        layers
            .parts
            .iter()
            .map(|part| -> Result<ImagePartInfo, StudioError> {
                Ok(ImagePartInfo {
                    uri: png_data_uri(&part.image)?,
                    color: part.color,
                    finish_kind: finishes.get(part.color),
                })
            })
            .collect()
    }

    /// Wait for readiness, then return the composited canvas for the
    /// tech pack (`None` without artwork).
    ///
    /// # Errors
    ///
    /// Returns [`StudioError::ReadinessTimeout`] if the boundary does not
    /// settle within `timeout`.
    pub async fn techpack_image(
        &self,
        timeout: Duration,
    ) -> Result<Option<Arc<RgbaImage>>, StudioError> {
        self.readiness.wait(timeout).await?;
        Ok(self.canvas())
    }

    // ───── Developer mode ────────────────────────────────────────────

    /// Show or hide the tech-pack mirror and debug helpers.
    pub fn set_developer_mode(&self, enabled: bool) {
        self.lock().developer_mode = enabled;
    }

    /// Current helper visibility.
    #[must_use]
    pub fn visibility_flags(&self) -> BoundaryVisibility {
        let enabled = self.lock().developer_mode;
        BoundaryVisibility {
            techpack_mirror: enabled,
            debug_helpers: enabled,
        }
    }

    /// Raster overlay of the clip region and artwork frame, in developer
    /// mode only.
    #[must_use]
    pub fn debug_overlay(&self) -> Option<RgbaImage> {
        let state = self.lock();
        if !state.developer_mode {
            return None;
        }
        let transform = state
            .artwork
            .as_ref()
            .map(|a| a.editor.transform(CanvasKind::Working));
        Some(debug_overlay(&self.region, transform.as_ref(), None))
    }

    /// SVG overlay of the clip region and artwork frame, in developer mode
    /// only.
    #[must_use]
    pub fn debug_svg(&self) -> Option<String> {
        let state = self.lock();
        if !state.developer_mode {
            return None;
        }
        let transform = state
            .artwork
            .as_ref()
            .map(|a| a.editor.transform(CanvasKind::Working));
        let metadata = SvgMetadata {
            title: Some(self.display_name.as_str()),
            description: Some(self.name.as_str()),
        };
        Some(clip_region_svg(&self.region, transform.as_ref(), &metadata))
    }
}

impl std::fmt::Debug for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Boundary")
            .field("name", &self.name)
            .field("phase", &self.phase())
            .field("ready", &self.is_ready_for_screenshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::loader::MemoryLoader;

    const RED: Rgb = Rgb::new(220, 30, 40);
    const BLUE: Rgb = Rgb::new(53, 133, 201);

    fn context(loader: Arc<MemoryLoader>) -> BoundaryContext {
        let mut config = StudioConfig::default();
        config.placement.working_side = 40.0;
        BoundaryContext {
            config: Arc::new(config),
            assets: Arc::new(FinishAssets::procedural(8)),
            loader,
            hooks: SceneHooks::new(),
        }
    }

    fn two_color() -> RgbaImage {
        RgbaImage::from_fn(20, 10, |x, _| {
            let c = if x < 12 { RED } else { BLUE };
            Rgba([c.r(), c.g(), c.b(), 255])
        })
    }

    fn boundary(loader: Arc<MemoryLoader>) -> Arc<Boundary> {
        let mesh = MeshData::plane("Tee_boundary_front", 2.0, 1.0, 2);
        let techpack = MeshData::plane("Tee_boundary_front_techpack", 2.0, 1.0, 1);
        Boundary::new(&mesh, Some(&techpack), context(loader)).unwrap()
    }

    #[test]
    fn quantize_overrides() {
        let mut params = ArtworkParams::new("a");
        params.sensitivity = Some(20.0);
        params.color_limit = Some(2);
        params.colors_to_remove = vec![RED];
        let options = params.quantize_options(&QuantizeOptions::default());
        assert!((options.merge_distance - 20.0).abs() < f64::EPSILON);
        assert_eq!(options.limit, 2);
        assert_eq!(options.colors_to_remove, vec![RED]);

        params.sensitivity = Some(f64::NAN);
        let options = params.quantize_options(&QuantizeOptions::default());
        assert!((options.merge_distance - QuantizeOptions::DEFAULT_MERGE_DISTANCE).abs() < f64::EPSILON);
    }

    #[test]
    fn requires_techpack() {
        let mesh = MeshData::plane("Tee_boundary_front", 2.0, 1.0, 2);
        let result = Boundary::new(&mesh, None, context(Arc::new(MemoryLoader::new())));
        assert!(matches!(result, Err(GeometryError::MissingTechpack { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn phases_follow_lifecycle() {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert("memory://art", two_color());
        let b = boundary(Arc::clone(&loader));
        assert_eq!(b.phase(), PlacementPhase::Empty);
        assert_eq!(b.display_name(), "Front");
        assert_eq!(b.techpack_name(), "Tee_boundary_front_techpack");
        assert!(b.drag_to(0.2, 0.2).is_none());

        b.add_artwork(ArtworkParams::new("memory://art"), true)
            .await
            .unwrap();
        assert_eq!(b.phase(), PlacementPhase::Locked);
        assert!(b.drag_to(0.2, 0.2).is_none());
        assert!(b.disable_editing(false));
        assert_eq!(b.phase(), PlacementPhase::Editable);
        assert!(b.drag_to(0.4, 0.5).is_some());

        b.reset_boundary();
        assert_eq!(b.phase(), PlacementPhase::Empty);
        assert!(!b.disable_editing(true));
        assert!(b.export_placement().data.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn synthesis_settles_readiness() {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert("memory://art", two_color());
        let b = boundary(loader);
        b.add_artwork(ArtworkParams::new("memory://art"), false)
            .await
            .unwrap();
        assert!(!b.is_ready_for_screenshot());
        assert_eq!(b.surface_count(), 0);

        b.readiness().wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(b.surface_count(), 2);
        for surface in b.surfaces() {
            assert!(Arc::ptr_eq(&surface.live.material, &surface.techpack.material));
        }
        assert_eq!(b.canvas().unwrap().dimensions(), (160, 160));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_after_synthesis_stays_ready() {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert("memory://art", two_color());
        let b = boundary(loader);
        b.add_artwork(ArtworkParams::new("memory://art"), false)
            .await
            .unwrap();
        b.readiness().wait(Duration::from_secs(5)).await.unwrap();
        let before = b.export_placement();

        // The synthesis timer is still in its trailing window here.
        let result = b
            .add_artwork(ArtworkParams::new("memory://missing"), false)
            .await;
        assert!(matches!(result, Err(StudioError::Io { .. })));
        assert!(b.is_ready_for_screenshot());
        b.readiness().wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(b.export_placement(), before);
        assert_eq!(b.phase(), PlacementPhase::Editable);
        assert_eq!(b.surface_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_synthesis_is_discarded() {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert("memory://art", two_color());
        let b = boundary(loader);
        b.add_artwork(ArtworkParams::new("memory://art"), false)
            .await
            .unwrap();
        b.readiness().wait(Duration::from_secs(5)).await.unwrap();

        let stale = b.lock().snapshot().unwrap();
        let synthesized = b.synthesize_snapshot(&stale).unwrap();
        assert_ne!(b.drag_to(0.3, 0.5), Some(EditOutcome::Rejected));
        let installed = b
            .lock()
            .install(stale.revision, synthesized, &stale.finishes, &b.ctx.assets, &b.region)
            .unwrap();
        assert!(!installed);

        let fresh = b.lock().snapshot().unwrap();
        let synthesized = b.synthesize_snapshot(&fresh).unwrap();
        let installed = b
            .lock()
            .install(fresh.revision, synthesized, &fresh.finishes, &b.ctx.assets, &b.region)
            .unwrap();
        assert!(installed);
        assert_eq!(b.surface_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_change_resynthesizes_in_place() {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert("memory://art", two_color());
        let b = boundary(loader);
        b.add_artwork(ArtworkParams::new("memory://art"), false)
            .await
            .unwrap();
        b.readiness().wait(Duration::from_secs(5)).await.unwrap();

        b.change_texture_finish(BLUE, FinishKind::Glitter).unwrap();
        let finishes: Vec<_> = b
            .surfaces()
            .iter()
            .map(|s| (s.live.color, s.live.finish()))
            .collect();
        assert!(finishes.contains(&(Some(BLUE), FinishKind::Glitter)));
        assert!(finishes.contains(&(Some(RED), FinishKind::Matte)));
        assert_eq!(b.surface_count(), 2);

        b.reset_texture_finish().unwrap();
        assert!(b.surfaces().iter().all(|s| s.live.finish() == FinishKind::Matte));
    }

    #[tokio::test(start_paused = true)]
    async fn show_original_yields_one_surface() {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert("memory://art", two_color());
        let b = boundary(loader);
        let mut params = ArtworkParams::new("memory://art");
        params.show_original_artwork = true;
        b.add_artwork(params, false).await.unwrap();
        b.readiness().wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(b.surface_count(), 1);
        assert!(b.palette().is_none());
        assert!(b.decomposed_image_parts().unwrap().is_empty());
        assert_eq!(b.surfaces()[0].live.color, None);
    }

    #[tokio::test(start_paused = true)]
    async fn developer_mode_gates_overlays() {
        let loader = Arc::new(MemoryLoader::new());
        loader.insert("memory://art", two_color());
        let b = boundary(loader);
        assert!(b.debug_overlay().is_none());
        assert!(b.debug_svg().is_none());

        b.set_developer_mode(true);
        assert!(b.visibility_flags().techpack_mirror);
        let overlay = b.debug_overlay().unwrap();
        assert_eq!(overlay.dimensions(), (40, 40));
        b.add_artwork(ArtworkParams::new("memory://art"), false)
            .await
            .unwrap();
        let svg = b.debug_svg().unwrap();
        assert!(svg.contains("<title>Front</title>"));
        assert_eq!(svg.matches("<path").count(), 2);
    }
}
