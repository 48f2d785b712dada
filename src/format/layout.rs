//! Map dimensions and the section offset allocator.
//!
//! Sections are packed back to back, with no padding, in this order:
//!
//! ```text
//! header | extra headers | elevation | surface | minimap | resource | [vegetation] | tiles | features
//! ```
//!
//! [`recalculate`] is the only place offsets are computed. It is a pure function of the
//! dimensions, the extra header chain and the tile table, and a document stores its result
//! whole instead of patching individual offsets.

use crate::{
    format::{
        extraheader::ExtraHeaderChain,
        header::{Header, HEADER_SIZE, UNIT_SCALE},
        tiles::TileTable,
    },
    Error, Result,
};

/// Edge length of the minimap in pixels.
pub const MINIMAP_DIMENSION: usize = 1024;

/// Number of stored minimap mip levels (1024 down to 4).
pub const MINIMAP_MIPS: usize = 9;

/// Byte size of the block-compressed minimap with its mip chain.
///
/// Each 4x4 block takes 8 bytes and the smallest levels still occupy one block, so this is
/// `sum(max(1, (1024 >> level) / 4)^2 * 8)` over the stored levels.
pub const MINIMAP_SIZE: usize = 699_048;

/// Map size in user units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Width in user units
    pub width: u32,
    /// Length in user units
    pub length: u32,
}

impl Dimensions {
    /// Validated dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if either side is zero or too large for the
    /// header's 32-bit internal-unit fields.
    pub fn new(width: u32, length: u32) -> Result<Self> {
        let fits = |side: u32| {
            side > 0
                && i64::from(side) * i64::from(UNIT_SCALE) <= i64::from(i32::MAX)
        };

        if !fits(width) || !fits(length) {
            return Err(Error::InvalidDimensions { width, length });
        }

        Ok(Dimensions { width, length })
    }

    /// Dimensions described by a header's internal-unit width and length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] unless both are positive multiples of 64.
    pub fn from_internal(width: i32, length: i32) -> Result<Self> {
        let valid = |side: i32| side > 0 && side % UNIT_SCALE == 0;
        if !valid(width) || !valid(length) {
            return Err(malformed_error!(
                "Header dimensions {}x{} are not positive multiples of {}",
                width,
                length,
                UNIT_SCALE
            ));
        }

        Self::new((width / UNIT_SCALE) as u32, (length / UNIT_SCALE) as u32)
    }

    /// Width and length in internal units.
    #[must_use]
    pub fn internal(&self) -> (i32, i32) {
        // Both fit by construction
        (
            (self.width as i32) * UNIT_SCALE,
            (self.length as i32) * UNIT_SCALE,
        )
    }

    fn scaled(&self, factor: usize) -> (usize, usize) {
        (
            self.width as usize * factor,
            self.length as usize * factor,
        )
    }

    /// Elevation raster size: one sample per vertex, `(64w+1) x (64l+1)`.
    #[must_use]
    pub fn elevation_size(&self) -> (usize, usize) {
        let (width, length) = self.scaled(64);
        (width + 1, length + 1)
    }

    /// Surface-class and resource raster size, `32w x 32l`.
    #[must_use]
    pub fn half_size(&self) -> (usize, usize) {
        self.scaled(32)
    }

    /// Tile-index and vegetation raster size, `16w x 16l`.
    #[must_use]
    pub fn quarter_size(&self) -> (usize, usize) {
        self.scaled(16)
    }
}

/// Byte offsets of every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offsets {
    /// Elevation section
    pub elevation: u32,
    /// Surface-class section
    pub surface: u32,
    /// Block-compressed minimap
    pub minimap: u32,
    /// Resource-density section
    pub resource: u32,
    /// Vegetation-density section, present only with its extra header
    pub vegetation: Option<u32>,
    /// Tile table followed by the tile-index raster
    pub tile_index: u32,
    /// Feature list
    pub features: u32,
}

impl Offsets {
    /// Offsets as recorded in a loaded header and extra header chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if a header offset is negative.
    pub fn from_header(header: &Header, chain: &ExtraHeaderChain) -> Result<Self> {
        let field = |name: &str, value: i32| {
            u32::try_from(value)
                .map_err(|_| malformed_error!("Negative {} offset {}", name, value))
        };

        Ok(Offsets {
            elevation: field("elevation", header.elevation_offset)?,
            surface: field("surface", header.surface_offset)?,
            minimap: field("minimap", header.minimap_offset)?,
            resource: field("resource", header.resource_offset)?,
            vegetation: chain.vegetation().and_then(|vegetation| vegetation.offset),
            tile_index: field("tile", header.tile_index_offset)?,
            features: field("feature", header.feature_offset)?,
        })
    }
}

/// Compute the offset of every section.
///
/// # Errors
///
/// Returns [`Error::LayoutOverflow`] if any offset does not fit the header's 32-bit fields.
pub fn recalculate(
    dimensions: Dimensions,
    extra_headers: &ExtraHeaderChain,
    tiles: &TileTable,
) -> Result<Offsets> {
    let area = |(width, length): (usize, usize)| width as u64 * length as u64;

    let elevation = (HEADER_SIZE + extra_headers.total_size()) as u64;
    let surface = elevation + area(dimensions.elevation_size()) * 2;
    let minimap = surface + area(dimensions.half_size());
    let resource = minimap + MINIMAP_SIZE as u64;
    let after_resource = resource + area(dimensions.half_size());

    let (vegetation, tile_index) = if extra_headers.vegetation().is_some() {
        (
            Some(after_resource),
            after_resource + area(dimensions.quarter_size()),
        )
    } else {
        (None, after_resource)
    };

    let features =
        tile_index + tiles.encoded_size() as u64 + area(dimensions.quarter_size()) * 4;

    let narrow = |offset: u64| {
        if offset > i32::MAX as u64 {
            return Err(Error::LayoutOverflow);
        }
        Ok(offset as u32)
    };

    Ok(Offsets {
        elevation: narrow(elevation)?,
        surface: narrow(surface)?,
        minimap: narrow(minimap)?,
        resource: narrow(resource)?,
        vegetation: vegetation.map(narrow).transpose()?,
        tile_index: narrow(tile_index)?,
        features: narrow(features)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::extraheader::{ExtraHeader, VEGETATION_TAG};

    fn dims(width: u32, length: u32) -> Dimensions {
        Dimensions::new(width, length).unwrap()
    }

    #[test]
    fn minimap_size_matches_mip_chain() {
        let computed: usize = (0..MINIMAP_MIPS)
            .map(|level| {
                let blocks = ((MINIMAP_DIMENSION >> level) / 4).max(1);
                blocks * blocks * 8
            })
            .sum();
        assert_eq!(computed, MINIMAP_SIZE);
    }

    #[test]
    fn dimension_validation() {
        assert!(Dimensions::new(0, 4).is_err());
        assert!(Dimensions::new(4, 0).is_err());
        assert!(Dimensions::new(u32::MAX, 4).is_err());
        assert_eq!(dims(2, 3).internal(), (128, 192));

        assert_eq!(Dimensions::from_internal(256, 128).unwrap(), dims(4, 2));
        assert!(Dimensions::from_internal(100, 128).is_err());
        assert!(Dimensions::from_internal(-64, 128).is_err());
    }

    #[test]
    fn section_sizes() {
        let dims = dims(2, 3);
        assert_eq!(dims.elevation_size(), (129, 193));
        assert_eq!(dims.half_size(), (64, 96));
        assert_eq!(dims.quarter_size(), (32, 48));
    }

    #[test]
    fn plain_layout() {
        let offsets = recalculate(dims(4, 4), &ExtraHeaderChain::new(), &TileTable::new()).unwrap();

        assert_eq!(offsets.elevation, 80);
        assert_eq!(offsets.surface, 80 + 257 * 257 * 2);
        assert_eq!(offsets.minimap, offsets.surface + 128 * 128);
        assert_eq!(offsets.resource, offsets.minimap + MINIMAP_SIZE as u32);
        assert_eq!(offsets.vegetation, None);
        assert_eq!(offsets.tile_index, offsets.resource + 128 * 128);
        assert_eq!(offsets.features, offsets.tile_index + 8 + 64 * 64 * 4);
    }

    #[test]
    fn vegetation_shifts_tiles() {
        let mut chain = ExtraHeaderChain::new();
        let plain = recalculate(dims(2, 2), &chain, &TileTable::new()).unwrap();

        chain.find_or_create(VEGETATION_TAG);
        let with = recalculate(dims(2, 2), &chain, &TileTable::new()).unwrap();

        assert_eq!(with.elevation, plain.elevation + 12);
        assert_eq!(with.vegetation, Some(plain.tile_index + 12));
        assert_eq!(with.tile_index, plain.tile_index + 12 + 1024);
    }

    #[test]
    fn opaque_headers_shift_everything() {
        let mut chain = ExtraHeaderChain::new();
        if let ExtraHeader::Opaque { payload, .. } = chain.find_or_create(5) {
            payload.extend_from_slice(&[0; 4]);
        }

        let offsets = recalculate(dims(1, 1), &chain, &TileTable::new()).unwrap();
        assert_eq!(offsets.elevation, 80 + 12);
    }

    #[test]
    fn tile_names_shift_features() {
        let mut tiles = TileTable::new();
        let before = recalculate(dims(2, 2), &ExtraHeaderChain::new(), &tiles).unwrap();

        tiles.push("0123456789", 4).unwrap();
        let after = recalculate(dims(2, 2), &ExtraHeaderChain::new(), &tiles).unwrap();

        assert_eq!(after.tile_index, before.tile_index);
        assert_eq!(after.features, before.features + 15);
    }

    #[test]
    fn idempotent() {
        let mut chain = ExtraHeaderChain::new();
        chain.find_or_create(VEGETATION_TAG);
        let first = recalculate(dims(3, 5), &chain, &TileTable::new()).unwrap();
        let second = recalculate(dims(3, 5), &chain, &TileTable::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn overflow_detected() {
        let result = recalculate(dims(512, 512), &ExtraHeaderChain::new(), &TileTable::new());
        assert!(matches!(result, Err(Error::LayoutOverflow)));
    }
}
