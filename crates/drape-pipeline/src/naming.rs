//! Mesh naming conventions.
//!
//! Artwork regions are named `<Garment>_boundary_<region>`, colorable
//! groups `<Garment>_layer_<name>`, and each has a flattened tech-pack
//! counterpart carrying the [`TECHPACK_SUFFIX`]. Matching is
//! case-insensitive on the marker; the region part keeps its case.

/// Suffix of a tech-pack mirror mesh.
pub const TECHPACK_SUFFIX: &str = "_techpack";

const BOUNDARY_MARKER: &str = "boundary_";
const LAYER_MARKER: &str = "layer_";

/// Region part after the last `marker` that starts the name or follows a
/// `_` with at least one character before it.
fn region_after<'a>(name: &'a str, marker: &str) -> Option<&'a str> {
    let lower = name.to_ascii_lowercase();
    lower
        .rmatch_indices(marker)
        .map(|(idx, _)| idx)
        .find(|&idx| idx == 0 || (idx >= 2 && lower.as_bytes()[idx - 1] == b'_'))
        .map(|idx| &name[idx + marker.len()..])
        .filter(|region| !region.is_empty())
}

/// `left_sleeve` -> `Left sleeve`.
fn humanize(region: &str) -> String {
    let spaced = region.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Display name of a boundary mesh, or `None` if `name` is not one.
///
/// ```
/// use drape_pipeline::naming::display_name_if_boundary;
///
/// assert_eq!(display_name_if_boundary("Tee_boundary_front").as_deref(), Some("Front"));
/// assert_eq!(display_name_if_boundary("NoMatch"), None);
/// ```
#[must_use]
pub fn display_name_if_boundary(name: &str) -> Option<String> {
    if is_techpack(name) {
        return None;
    }
    region_after(name, BOUNDARY_MARKER).map(humanize)
}

/// Display name of a changeable group (layer), or `None`.
#[must_use]
pub fn display_name_if_layer(name: &str) -> Option<String> {
    if is_techpack(name) {
        return None;
    }
    region_after(name, LAYER_MARKER).map(humanize)
}

/// Whether `name` is a boundary mesh (not its tech-pack mirror).
#[must_use]
pub fn is_boundary(name: &str) -> bool {
    display_name_if_boundary(name).is_some()
}

/// Whether `name` is a tech-pack mirror.
#[must_use]
pub fn is_techpack(name: &str) -> bool {
    name.len() > TECHPACK_SUFFIX.len()
        && name
            .to_ascii_lowercase()
            .ends_with(TECHPACK_SUFFIX)
}

/// Name of the tech-pack mirror of `name`.
#[must_use]
pub fn techpack_name(name: &str) -> String {
    format!("{name}{TECHPACK_SUFFIX}")
}

/// Name of the mesh a tech-pack mirror belongs to.
#[must_use]
pub fn source_of_techpack(name: &str) -> Option<&str> {
    is_techpack(name).then(|| &name[..name.len() - TECHPACK_SUFFIX.len()])
}

/// Export-safe form of a display name: lowercase, spaces to underscores.
#[must_use]
pub fn sanitized(display_name: &str) -> String {
    display_name.trim().to_lowercase().replace(' ', "_")
}
