//! drape-studio: async boundary coordination.
//!
//! Wraps the pure [`drape_pipeline`] stages in long-lived [`Boundary`]
//! objects driven from a tokio runtime:
//!
//! - artwork loading through an [`ImageLoader`] (paths, `data:` URIs and,
//!   with the `http` feature, the network)
//! - throttled re-compositing, decomposition and finish synthesis after
//!   interactive edits ([`Throttle`])
//! - a per-boundary [`Readiness`] signal that export waits on
//! - a [`BoundaryCoordinator`] that builds boundaries from a model and
//!   routes requests to them by name
//!
//! The viewer is reached only through [`SceneHooks`] and [`MeshSource`].

pub mod boundary;
pub mod config;
pub mod coordinator;
mod error;
pub mod loader;
pub mod readiness;
pub mod report;
pub mod scene;
pub mod throttle;

pub use boundary::{
    ArtworkParams, Boundary, BoundaryContext, BoundaryVisibility, ImagePartInfo, PlacementPhase,
};
pub use config::StudioConfig;
pub use coordinator::BoundaryCoordinator;
pub use error::StudioError;
pub use loader::{ImageLoader, MemoryLoader, UrlLoader};
pub use readiness::Readiness;
pub use report::{ValidationIssue, ValidationReport};
pub use scene::{InMemoryScene, MeshSource, SceneHooks};
pub use throttle::Throttle;
