use std::path::{Path, PathBuf};

use anyhow::Context;
use smfkit::{MapConfig, MapDocument};

/// Open a map container with `config`.
pub fn load_document(path: &Path, config: MapConfig) -> anyhow::Result<MapDocument> {
    MapDocument::open_with(path, config)
        .with_context(|| format!("failed to load map: {}", path.display()))
}

/// Parse a `WxL` map size such as `8x8`.
pub fn parse_map_size(size: &str) -> anyhow::Result<(u32, u32)> {
    let (width, length) = size
        .split_once(['x', 'X'])
        .with_context(|| format!("map size '{size}' is not of the form WxL"))?;
    let width = width
        .trim()
        .parse()
        .with_context(|| format!("invalid map width in '{size}'"))?;
    let length = length
        .trim()
        .parse()
        .with_context(|| format!("invalid map length in '{size}'"))?;
    Ok((width, length))
}

/// The container path without its extension, used as the default extraction prefix.
pub fn default_prefix(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}
