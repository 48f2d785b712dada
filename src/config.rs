//! Document configuration
//!
//! Options that change how a [`crate::MapDocument`] loads and saves containers without
//! changing the container format itself.

use crate::raster::Quality;

/// Configuration for loading and saving map containers.
///
/// Loading always validates the magic string and the structural integrity of the header,
/// the extra header chain and the tile table. This configuration controls the remaining
/// knobs: how strictly header constants are enforced, and how sections are normalised
/// before they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Block compression quality for the minimap section.
    pub minimap_quality: Quality,

    /// Flip elevation samples (`v -> 65535 - v`) after normalisation.
    pub invert_elevation: bool,

    /// Reject containers whose version or grid constants differ from the ones this crate
    /// writes, instead of only reporting them.
    pub strict_header: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            minimap_quality: Quality::Fast,
            invert_elevation: false,
            strict_header: false,
        }
    }
}

impl MapConfig {
    /// Creates a configuration tuned for fast builds
    ///
    /// Identical to the default; provided so call sites can state intent.
    #[must_use]
    pub fn fast() -> Self {
        Self::default()
    }

    /// Creates a configuration favouring minimap quality over build time
    #[must_use]
    pub fn quality() -> Self {
        Self {
            minimap_quality: Quality::Normal,
            ..Self::default()
        }
    }

    /// Creates a configuration that rejects non-standard headers on load
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict_header: true,
            ..Self::default()
        }
    }

    /// Returns a copy with elevation inversion switched on or off.
    #[must_use]
    pub fn with_invert_elevation(mut self, invert: bool) -> Self {
        self.invert_elevation = invert;
        self
    }
}
