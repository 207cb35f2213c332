//! SVG rendition of the developer-mode overlay.
//!
//! The clip polygon and (optionally) the rendered artwork frame become
//! closed `<path>` elements in a document whose `viewBox` is the square
//! canvas of the clip region. The raster counterpart lives in
//! [`drape_pipeline::debug`].

use drape_pipeline::Point;
use drape_pipeline::debug::{CLIP_COLOR, FRAME_COLOR};
use drape_pipeline::placement::ArtworkTransform;
use drape_pipeline::uv_region::ClipRegion;
use image::Rgba;
use svg::Document;
use svg::node::Text;
use svg::node::element::path::Data;
use svg::node::element::{Description, Path, Title};

/// Metadata to embed in the SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Emitted as `<title>`, typically the boundary display name.
    pub title: Option<&'a str>,
    /// Emitted as `<desc>`.
    pub description: Option<&'a str>,
}

fn closed_path_data(points: &[Point]) -> Option<Data> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    Some(data.close())
}

fn css_color(color: Rgba<u8>) -> String {
    let [r, g, b, _] = color.0;
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn outline_path(points: &[Point], color: Rgba<u8>, class: &str) -> Option<Path> {
    closed_path_data(points).map(|d| {
        Path::new()
            .set("class", class)
            .set("d", d)
            .set("fill", "none")
            .set("stroke", css_color(color))
            .set("stroke-width", 1)
    })
}

/// Serialize the clip region (and the artwork frame, when placed) as SVG.
///
/// # Examples
///
/// ```
/// use drape_export::{SvgMetadata, clip_region_svg};
/// use drape_pipeline::{ClipRegion, Point};
///
/// let hull = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
/// let region = ClipRegion::fit(&hull, 1.0, glam::DVec2::Y, 100.0).unwrap();
/// let metadata = SvgMetadata { title: Some("Front"), ..SvgMetadata::default() };
/// let svg = clip_region_svg(&region, None, &metadata);
/// assert!(svg.contains("<title>Front</title>"));
/// assert!(svg.contains("class=\"clip\""));
/// ```
#[must_use]
pub fn clip_region_svg(
    region: &ClipRegion,
    transform: Option<&ArtworkTransform>,
    metadata: &SvgMetadata<'_>,
) -> String {
    let side = region.side();
    let mut doc = Document::new()
        .set("width", side)
        .set("height", side)
        .set("viewBox", (0, 0, side, side));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(path) = outline_path(region.polygon(), CLIP_COLOR, "clip") {
        doc = doc.add(path);
    }
    if let Some(frame) = transform.and_then(|t| outline_path(&t.corners(), FRAME_COLOR, "frame"))
    {
        doc = doc.add(frame);
    }

    doc.to_string()
}
