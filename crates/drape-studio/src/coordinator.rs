//! Registry of every boundary in the loaded model.

use std::sync::Arc;
use std::time::Duration;

use drape_export::TechpackEntry;
use drape_pipeline::composite::is_blank;
use drape_pipeline::naming::{is_boundary, is_techpack};
use drape_pipeline::placement::PlacementExport;
use drape_pipeline::{FinishAssets, FinishKind, GeometryError, MeshData, Rgb, RgbaImage};
use tracing::{debug, info, warn};

use crate::StudioError;
use crate::boundary::{ArtworkParams, Boundary, BoundaryContext};
use crate::config::StudioConfig;
use crate::loader::ImageLoader;
use crate::report::ValidationReport;
use crate::scene::{MeshSource, SceneHooks};

/// Owns the boundaries of one model and routes requests to them by name.
///
/// Unknown names are never errors: lookups return `None` and mutators
/// return `false`.
#[derive(Debug)]
pub struct BoundaryCoordinator {
    ctx: BoundaryContext,
    boundaries: Vec<Arc<Boundary>>,
    report: ValidationReport,
    developer_mode: bool,
}

impl BoundaryCoordinator {
    /// Build a coordinator, generating the finish detail maps once.
    #[must_use]
    pub fn new(config: StudioConfig, loader: Arc<dyn ImageLoader>, hooks: SceneHooks) -> Self {
        let assets = Arc::new(FinishAssets::procedural(config.finish_map_size));
        Self::with_assets(config, assets, loader, hooks)
    }

    /// Build a coordinator sharing an existing asset pool.
    #[must_use]
    pub fn with_assets(
        config: StudioConfig,
        assets: Arc<FinishAssets>,
        loader: Arc<dyn ImageLoader>,
        hooks: SceneHooks,
    ) -> Self {
        Self {
            ctx: BoundaryContext {
                config: Arc::new(config),
                assets,
                loader,
                hooks,
            },
            boundaries: Vec::new(),
            report: ValidationReport::default(),
            developer_mode: false,
        }
    }

    /// The shared configuration.
    #[must_use]
    pub fn config(&self) -> &StudioConfig {
        &self.ctx.config
    }

    /// Replace the registry with one boundary per boundary mesh in `scene`.
    ///
    /// Boundaries whose geometry cannot be derived are skipped and recorded
    /// in the returned report; the rest of the model still loads.
    pub fn load_model(&mut self, scene: &dyn MeshSource) -> &ValidationReport {
        for boundary in self.boundaries.drain(..) {
            boundary.reset_boundary();
        }
        self.report.clear();

        for name in scene.mesh_names() {
            if !is_boundary(&name) || is_techpack(&name) {
                continue;
            }
            let Some(mesh) = scene.find_mesh_by_name(&name) else {
                continue;
            };
            let techpack = scene.find_techpack_equivalent(&name);
            if let Err(err) = self.add_boundary(mesh, techpack) {
                warn!(boundary = %name, error = %err, "skipping boundary");
                self.report.record_geometry(&name, &err);
            }
        }

        info!(
            boundaries = self.boundaries.len(),
            issues = self.report.len(),
            "model loaded"
        );
        self.ctx.hooks.mark_dirty();
        &self.report
    }

    /// Build and register a boundary. A boundary with the same name is
    /// replaced.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] when the boundary cannot be analyzed.
    pub fn add_boundary(
        &mut self,
        mesh: &MeshData,
        techpack: Option<&MeshData>,
    ) -> Result<Arc<Boundary>, GeometryError> {
        let boundary = Boundary::new(mesh, techpack, self.ctx.clone())?;
        boundary.set_developer_mode(self.developer_mode);
        if let Some(index) = self.boundaries.iter().position(|b| b.name() == mesh.name) {
            let old = std::mem::replace(&mut self.boundaries[index], Arc::clone(&boundary));
            old.reset_boundary();
        } else {
            self.boundaries.push(Arc::clone(&boundary));
        }
        debug!(boundary = %mesh.name, display = boundary.display_name(), "boundary registered");
        Ok(boundary)
    }

    /// Issues from the last [`load_model`](Self::load_model).
    #[must_use]
    pub const fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Every registered boundary, in model order.
    #[must_use]
    pub fn boundaries(&self) -> &[Arc<Boundary>] {
        &self.boundaries
    }

    /// The boundary whose mesh is called `name`.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Arc<Boundary>> {
        self.boundaries.iter().find(|b| b.name() == name)
    }

    /// The boundary whose tech-pack mirror is called `name`.
    #[must_use]
    pub fn find_by_techpack_name(&self, name: &str) -> Option<&Arc<Boundary>> {
        self.boundaries.iter().find(|b| b.techpack_name() == name)
    }

    /// Whether every name in `names` is a registered boundary.
    #[must_use]
    pub fn validate_all_exist<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.iter().all(|name| self.find_by_name(name.as_ref()).is_some())
    }

    /// The names in `names` that are not registered boundaries.
    #[must_use]
    pub fn missing_boundaries<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| self.find_by_name(name).is_none())
            .map(str::to_string)
            .collect()
    }

    /// Add or replace the artwork of boundary `name`.
    ///
    /// Returns `Ok(None)` for an unknown boundary.
    ///
    /// # Errors
    ///
    /// Propagates [`Boundary::add_artwork`] failures.
    pub async fn change_artwork(
        &self,
        name: &str,
        params: ArtworkParams,
        disable_editing: bool,
    ) -> Result<Option<Arc<Boundary>>, StudioError> {
        let Some(boundary) = self.find_by_name(name).cloned() else {
            debug!(boundary = name, "change_artwork: unknown boundary");
            return Ok(None);
        };
        boundary.add_artwork(params, disable_editing).await?;
        Ok(Some(boundary))
    }

    /// Remove the artwork of boundary `name`. Returns `false` if unknown.
    pub fn remove_artwork(&self, name: &str) -> bool {
        self.find_by_name(name).is_some_and(|boundary| {
            boundary.reset_boundary();
            true
        })
    }

    /// Assign a finish to one palette color of boundary `name`.
    ///
    /// Returns `false` if the boundary is unknown or synthesis fails.
    pub fn apply_texture_finish(&self, name: &str, color: Rgb, kind: FinishKind) -> bool {
        let Some(boundary) = self.find_by_name(name) else {
            return false;
        };
        match boundary.change_texture_finish(color, kind) {
            Ok(()) => true,
            Err(err) => {
                warn!(boundary = name, error = %err, "finish change failed");
                false
            }
        }
    }

    /// Return every color of boundary `name` to Matte.
    ///
    /// Returns `false` if the boundary is unknown or synthesis fails.
    pub fn reset_texture_finish(&self, name: &str) -> bool {
        let Some(boundary) = self.find_by_name(name) else {
            return false;
        };
        match boundary.reset_texture_finish() {
            Ok(()) => true,
            Err(err) => {
                warn!(boundary = name, error = %err, "finish reset failed");
                false
            }
        }
    }

    /// Show or hide tech-pack mirrors and debug helpers on every boundary,
    /// including boundaries registered later.
    pub fn set_developer_mode(&mut self, enabled: bool) {
        self.developer_mode = enabled;
        for boundary in &self.boundaries {
            boundary.set_developer_mode(enabled);
        }
        self.ctx.hooks.mark_dirty();
    }

    /// Whether developer mode is on.
    #[must_use]
    pub const fn developer_mode(&self) -> bool {
        self.developer_mode
    }

    /// Placement of every boundary, in model order.
    #[must_use]
    pub fn export_all_placements(&self) -> Vec<PlacementExport> {
        self.boundaries.iter().map(|b| b.export_placement()).collect()
    }

    fn timeout_or_default(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or(self.ctx.config.readiness_timeout)
    }

    /// Tech-pack images: `whole` first, then one entry per boundary with a
    /// non-blank composite, each taken after that boundary settles.
    ///
    /// `timeout` applies per boundary; `None` uses the configured default.
    ///
    /// # Errors
    ///
    /// - [`StudioError::ReadinessTimeout`] if a boundary does not settle.
    /// - [`StudioError::Export`] if PNG encoding fails.
    pub async fn export_techpack(
        &self,
        whole: &RgbaImage,
        timeout: Option<Duration>,
    ) -> Result<Vec<TechpackEntry>, StudioError> {
        let timeout = self.timeout_or_default(timeout);
        let mut entries = vec![TechpackEntry::whole(whole)?];
        for boundary in &self.boundaries {
            let Some(image) = boundary.techpack_image(timeout).await? else {
                continue;
            };
            if is_blank(&image) {
                debug!(boundary = boundary.name(), "blank composite left out of tech pack");
                continue;
            }
            entries.push(TechpackEntry::named(boundary.display_name(), &image)?);
        }
        info!(entries = entries.len(), "tech pack exported");
        Ok(entries)
    }

    /// Wait for each boundary to settle, then clear its artwork.
    ///
    /// A boundary that does not settle within `timeout` is reset anyway.
    /// Returns the number of boundaries that timed out.
    pub async fn reset_all(&self, timeout: Option<Duration>) -> usize {
        let timeout = self.timeout_or_default(timeout);
        let mut timed_out = 0;
        for boundary in &self.boundaries {
            if let Err(err) = boundary.readiness().wait(timeout).await {
                warn!(boundary = boundary.name(), error = %err, "resetting unsettled boundary");
                timed_out += 1;
            }
            boundary.reset_boundary();
        }
        timed_out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::scene::InMemoryScene;

    fn coordinator() -> BoundaryCoordinator {
        let mut config = StudioConfig::default();
        config.placement.working_side = 40.0;
        config.finish_map_size = 8;
        BoundaryCoordinator::new(config, Arc::new(MemoryLoader::new()), SceneHooks::new())
    }

    fn garment() -> InMemoryScene {
        InMemoryScene::new()
            .with(MeshData::plane("Tee_body", 3.0, 3.0, 1))
            .with(MeshData::plane("Tee_boundary_front", 2.0, 1.0, 2))
            .with(MeshData::plane("Tee_boundary_front_techpack", 2.0, 1.0, 1))
            .with(MeshData::plane("Tee_boundary_back", 2.0, 1.0, 2))
    }

    #[test]
    fn load_model_skips_and_reports() {
        let mut coordinator = coordinator();
        let report = coordinator.load_model(&garment());
        assert_eq!(
            report.messages(),
            vec!["could not find flat version of Tee_boundary_back".to_string()]
        );
        assert_eq!(coordinator.boundaries().len(), 1);
        assert!(coordinator.find_by_name("Tee_body").is_none());
        assert!(coordinator.find_by_name("Tee_boundary_front_techpack").is_none());
        assert_eq!(
            coordinator
                .find_by_techpack_name("Tee_boundary_front_techpack")
                .unwrap()
                .name(),
            "Tee_boundary_front"
        );
    }

    #[test]
    fn reload_replaces_registry() {
        let mut coordinator = coordinator();
        coordinator.load_model(&garment());
        coordinator.load_model(&InMemoryScene::new());
        assert!(coordinator.boundaries().is_empty());
        assert!(coordinator.report().is_empty());
    }

    #[test]
    fn validate_all_exist_is_pure() {
        let mut coordinator = coordinator();
        coordinator.load_model(&garment());
        assert!(coordinator.validate_all_exist(&["Tee_boundary_front"]));
        assert!(!coordinator.validate_all_exist(&["Tee_boundary_front", "Tee_boundary_hood"]));
        assert_eq!(
            coordinator.missing_boundaries(&["Tee_boundary_hood"]),
            vec!["Tee_boundary_hood".to_string()]
        );
        assert_eq!(coordinator.report().len(), 1);
    }

    #[test]
    fn unknown_names_are_not_errors() {
        let coordinator = coordinator();
        assert!(!coordinator.remove_artwork("nope"));
        assert!(!coordinator.apply_texture_finish("nope", Rgb::new(0, 0, 0), FinishKind::Metallic));
        assert!(!coordinator.reset_texture_finish("nope"));
        assert!(coordinator.export_all_placements().is_empty());
    }

    #[test]
    fn developer_mode_reaches_later_boundaries() {
        let mut coordinator = coordinator();
        coordinator.set_developer_mode(true);
        coordinator.load_model(&garment());
        let front = Arc::clone(coordinator.find_by_name("Tee_boundary_front").unwrap());
        assert!(front.visibility_flags().debug_helpers);

        coordinator.set_developer_mode(false);
        assert!(!front.visibility_flags().techpack_mirror);
    }
}
