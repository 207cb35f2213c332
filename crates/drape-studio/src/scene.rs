//! Narrow interfaces to the viewer that owns the scene graph.

use std::sync::Arc;

use drape_pipeline::MeshData;
use drape_pipeline::naming::techpack_name;
use drape_pipeline::placement::PlacementData;

/// Geometry lookup used when boundaries are built.
pub trait MeshSource {
    /// Names of every mesh in the loaded model.
    fn mesh_names(&self) -> Vec<String>;

    /// The mesh called `name`.
    fn find_mesh_by_name(&self, name: &str) -> Option<&MeshData>;

    /// The flattened tech-pack counterpart of the mesh called `name`.
    fn find_techpack_equivalent(&self, name: &str) -> Option<&MeshData> {
        self.find_mesh_by_name(&techpack_name(name))
    }
}

/// A model held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryScene {
    meshes: Vec<MeshData>,
}

impl InMemoryScene {
    /// An empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh, replacing any mesh with the same name.
    pub fn insert(&mut self, mesh: MeshData) {
        match self.meshes.iter_mut().find(|m| m.name == mesh.name) {
            Some(existing) => *existing = mesh,
            None => self.meshes.push(mesh),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, mesh: MeshData) -> Self {
        self.insert(mesh);
        self
    }
}

impl FromIterator<MeshData> for InMemoryScene {
    fn from_iter<I: IntoIterator<Item = MeshData>>(iter: I) -> Self {
        let mut scene = Self::new();
        for mesh in iter {
            scene.insert(mesh);
        }
        scene
    }
}

impl MeshSource for InMemoryScene {
    fn mesh_names(&self) -> Vec<String> {
        self.meshes.iter().map(|m| m.name.clone()).collect()
    }

    fn find_mesh_by_name(&self, name: &str) -> Option<&MeshData> {
        self.meshes.iter().find(|m| m.name == name)
    }
}

/// Called after any mutation that needs a re-render.
pub type DirtyCallback = Arc<dyn Fn() + Send + Sync>;

/// Called with a boundary name and its settled placement.
pub type PlacementCallback = Arc<dyn Fn(&str, &PlacementData) + Send + Sync>;

/// One-way notifications from boundaries to the viewer.
#[derive(Clone, Default)]
pub struct SceneHooks {
    on_dirty: Option<DirtyCallback>,
    on_artwork_changed: Option<PlacementCallback>,
}

impl SceneHooks {
    /// Hooks that ignore every notification.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the re-render callback.
    #[must_use]
    pub fn on_dirty(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_dirty = Some(Arc::new(callback));
        self
    }

    /// Set the placement-changed listener.
    #[must_use]
    pub fn on_artwork_changed(
        mut self,
        callback: impl Fn(&str, &PlacementData) + Send + Sync + 'static,
    ) -> Self {
        self.on_artwork_changed = Some(Arc::new(callback));
        self
    }

    /// Request a re-render.
    pub fn mark_dirty(&self) {
        if let Some(callback) = &self.on_dirty {
            callback();
        }
    }

    /// Report a coalesced placement change.
    pub fn artwork_changed(&self, boundary: &str, data: &PlacementData) {
        if let Some(callback) = &self.on_artwork_changed {
            callback(boundary, data);
        }
    }
}

impl std::fmt::Debug for SceneHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneHooks")
            .field("on_dirty", &self.on_dirty.is_some())
            .field("on_artwork_changed", &self.on_artwork_changed.is_some())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn techpack_lookup_uses_suffix() {
        let scene: InMemoryScene = [
            MeshData::plane("Tee_boundary_front", 1.0, 1.0, 1),
            MeshData::plane("Tee_boundary_front_techpack", 1.0, 1.0, 1),
        ]
        .into_iter()
        .collect();
        let techpack = scene.find_techpack_equivalent("Tee_boundary_front").unwrap();
        assert_eq!(techpack.name, "Tee_boundary_front_techpack");
        assert!(scene.find_techpack_equivalent("Tee_boundary_back").is_none());
    }

    #[test]
    fn insert_replaces_same_name() {
        let scene = InMemoryScene::new()
            .with(MeshData::plane("a", 1.0, 1.0, 1))
            .with(MeshData::plane("a", 2.0, 1.0, 1));
        assert_eq!(scene.mesh_names(), vec!["a".to_string()]);
    }

    #[test]
    fn hooks_forward_notifications() {
        let dirty = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&dirty);
        let hooks = SceneHooks::new().on_dirty(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        hooks.mark_dirty();
        hooks.clone().mark_dirty();
        assert_eq!(dirty.load(Ordering::SeqCst), 2);
        SceneHooks::new().mark_dirty();
    }
}
