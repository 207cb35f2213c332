//! Integration tests: a garment model driven through the coordinator on a
//! paused tokio clock.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use drape_export::decode_data_uri;
use drape_pipeline::composite::is_blank;
use drape_pipeline::placement::PlacementData;
use drape_pipeline::{EditOutcome, FinishKind, MeshData, Rgb, RgbaImage, decode_image};
use drape_studio::{
    ArtworkParams, BoundaryCoordinator, ImageLoader, InMemoryScene, MemoryLoader, PlacementPhase,
    SceneHooks, StudioConfig, StudioError,
};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use image::Rgba;

const RED: Rgb = Rgb::new(220, 30, 40);
const BLUE: Rgb = Rgb::new(53, 133, 201);
const FRONT: &str = "Tee_boundary_front";
const ART: &str = "memory://two-color";

/// 60% red columns, 40% blue.
fn two_color() -> RgbaImage {
    RgbaImage::from_fn(50, 30, |x, _| {
        let c = if x < 30 { RED } else { BLUE };
        Rgba([c.r(), c.g(), c.b(), 255])
    })
}

fn garment() -> InMemoryScene {
    InMemoryScene::new()
        .with(MeshData::plane("Tee_body", 3.0, 3.0, 1))
        .with(MeshData::plane(FRONT, 2.0, 1.5, 4))
        .with(MeshData::plane("Tee_boundary_front_techpack", 2.0, 1.5, 1))
        .with(MeshData::plane("Tee_boundary_back", 2.0, 1.5, 4))
}

fn config() -> StudioConfig {
    let mut config = StudioConfig::default();
    config.placement.working_side = 60.0;
    config.finish_map_size = 16;
    config
}

/// Serves [`MemoryLoader`] images after a per-URL delay.
#[derive(Default)]
struct SlowLoader {
    images: MemoryLoader,
    delays: HashMap<String, Duration>,
}

impl SlowLoader {
    fn with(mut self, url: &str, delay: Duration, image: RgbaImage) -> Self {
        self.images.insert(url, image);
        self.delays.insert(url.to_string(), delay);
        self
    }
}

impl ImageLoader for SlowLoader {
    fn load<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RgbaImage, StudioError>> {
        async move {
            let delay = self.delays.get(url).copied().unwrap_or_default();
            tokio::time::sleep(delay).await;
            self.images.load(url).await
        }
        .boxed()
    }
}

fn coordinator_with(loader: Arc<dyn ImageLoader>, hooks: SceneHooks) -> BoundaryCoordinator {
    let mut coordinator = BoundaryCoordinator::new(config(), loader, hooks);
    let report = coordinator.load_model(&garment());
    assert_eq!(
        report.messages(),
        vec!["could not find flat version of Tee_boundary_back".to_string()]
    );
    coordinator
}

fn coordinator() -> BoundaryCoordinator {
    let loader = MemoryLoader::new();
    loader.insert(ART, two_color());
    coordinator_with(Arc::new(loader), SceneHooks::new())
}

#[tokio::test(start_paused = true)]
async fn techpack_export_waits_for_synthesis() {
    let coordinator = coordinator();
    let front = coordinator
        .change_artwork(FRONT, ArtworkParams::new(ART), false)
        .await
        .unwrap()
        .expect("front boundary is registered");
    assert!(!front.is_ready_for_screenshot());

    let whole = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
    let entries = coordinator.export_techpack(&whole, None).await.unwrap();
    assert!(front.is_ready_for_screenshot());

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["whole", "front"]);
    let (media, bytes) = decode_data_uri(&entries[1].image).unwrap();
    assert_eq!(media, "image/png");
    let composite = decode_image(&bytes).unwrap();
    assert_eq!(composite.dimensions(), (240, 240));
    assert!(!is_blank(&composite));
}

#[tokio::test(start_paused = true)]
async fn export_times_out_before_synthesis() {
    let coordinator = coordinator();
    coordinator
        .change_artwork(FRONT, ArtworkParams::new(ART), false)
        .await
        .unwrap();
    let whole = RgbaImage::new(4, 4);
    let result = coordinator
        .export_techpack(&whole, Some(Duration::from_millis(500)))
        .await;
    assert!(matches!(result, Err(StudioError::ReadinessTimeout(_))));
}

#[tokio::test(start_paused = true)]
async fn metallic_finish_reported_on_one_part() {
    let coordinator = coordinator();
    let front = coordinator
        .change_artwork(FRONT, ArtworkParams::new(ART), false)
        .await
        .unwrap()
        .unwrap();
    front.readiness().wait(Duration::from_secs(10)).await.unwrap();

    let blue = Rgb::from_hex("#3585c9").unwrap();
    assert!(coordinator.apply_texture_finish(FRONT, blue, FinishKind::Metallic));

    let parts = front.decomposed_image_parts().unwrap();
    assert_eq!(parts.len(), 2);
    for part in &parts {
        let expected = if part.color == blue {
            FinishKind::Metallic
        } else {
            FinishKind::Matte
        };
        assert_eq!(part.finish_kind, expected, "{}", part.color.to_hex());
        assert!(part.uri.starts_with("data:image/png;base64,"));
    }
    let metallic: Vec<_> = front
        .surfaces()
        .into_iter()
        .filter(|s| s.live.finish() == FinishKind::Metallic)
        .collect();
    assert_eq!(metallic.len(), 1);
    assert_eq!(metallic[0].techpack.finish(), FinishKind::Metallic);

    assert!(coordinator.reset_texture_finish(FRONT));
    assert!(
        front
            .decomposed_image_parts()
            .unwrap()
            .iter()
            .all(|p| p.finish_kind == FinishKind::Matte)
    );
}

#[tokio::test(start_paused = true)]
async fn drag_burst_coalesces_into_one_notification() {
    let seen: Arc<Mutex<Vec<(String, PlacementData)>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let hooks = SceneHooks::new().on_artwork_changed(move |name, data| {
        sink.lock().unwrap().push((name.to_string(), *data));
    });
    let loader = MemoryLoader::new();
    loader.insert(ART, two_color());
    let coordinator = coordinator_with(Arc::new(loader), hooks);
    let front = coordinator
        .change_artwork(FRONT, ArtworkParams::new(ART), false)
        .await
        .unwrap()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(seen.lock().unwrap().len(), 1);
    seen.lock().unwrap().clear();

    for step in 1..=10 {
        let outcome = front.drag_to(0.5 + f64::from(step) * 0.01, 0.5).unwrap();
        assert_eq!(outcome, EditOutcome::Applied);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, FRONT);
    assert_eq!(Some(seen[0].1), front.export_placement().data);
    assert!((seen[0].1.x_ratio - 0.6).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn newer_artwork_supersedes_slow_load() {
    let loader = SlowLoader::default()
        .with("slow", Duration::from_secs(1), two_color())
        .with("fast", Duration::from_millis(10), two_color());
    let coordinator = coordinator_with(Arc::new(loader), SceneHooks::new());
    let front = coordinator.find_by_name(FRONT).unwrap();

    let (slow, fast) = tokio::join!(
        front.add_artwork(ArtworkParams::new("slow"), false),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            front.add_artwork(ArtworkParams::new("fast"), false).await
        }
    );
    assert!(matches!(slow, Err(StudioError::Superseded)));
    fast.unwrap();
    assert_eq!(front.placement().unwrap().source_url, "fast");
    assert_eq!(front.phase(), PlacementPhase::Editable);
}

#[tokio::test(start_paused = true)]
async fn failed_load_keeps_prior_artwork() {
    let coordinator = coordinator();
    let front = coordinator
        .change_artwork(FRONT, ArtworkParams::new(ART), true)
        .await
        .unwrap()
        .unwrap();
    front.readiness().wait(Duration::from_secs(10)).await.unwrap();
    let before = front.export_placement();

    let result = coordinator
        .change_artwork(FRONT, ArtworkParams::new("memory://missing"), false)
        .await;
    assert!(matches!(result, Err(StudioError::Io { .. })));
    assert_eq!(front.export_placement(), before);
    assert_eq!(front.phase(), PlacementPhase::Locked);
    assert_eq!(front.surface_count(), 2);
    assert!(front.is_ready_for_screenshot());

    let whole = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
    let entries = coordinator
        .export_techpack(&whole, Some(Duration::from_secs(5)))
        .await
        .unwrap();
    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["whole", "front"]);
    let (_, bytes) = decode_data_uri(&entries[1].image).unwrap();
    assert!(!is_blank(&decode_image(&bytes).unwrap()));
    assert_eq!(coordinator.export_all_placements(), vec![before]);
}

#[tokio::test(start_paused = true)]
async fn unknown_boundary_and_reset_all() {
    let coordinator = coordinator();
    let missing = coordinator
        .change_artwork("Tee_boundary_hood", ArtworkParams::new(ART), false)
        .await
        .unwrap();
    assert!(missing.is_none());

    coordinator
        .change_artwork(FRONT, ArtworkParams::new(ART), false)
        .await
        .unwrap();
    assert_eq!(coordinator.reset_all(None).await, 0);

    let exports = coordinator.export_all_placements();
    assert_eq!(exports.len(), 1);
    assert!(exports[0].data.is_none());
    let front = coordinator.find_by_name(FRONT).unwrap();
    assert_eq!(front.phase(), PlacementPhase::Empty);
    assert_eq!(front.surface_count(), 0);
}
