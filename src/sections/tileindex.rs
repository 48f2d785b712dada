//! Tile-index section raster: one 32-bit flat tile index per `16w x 16l` cell.
//!
//! The tile table preceding the raster belongs to the document and is written separately;
//! this codec only produces the indices. Without a source the indices count up row by row,
//! so each cell references its own tile.

use crate::{
    format::{layout::Dimensions, mapfile::MapFile},
    raster::{ChannelRule, Raster, RasterShape},
    sections::{resolver::Acquired, SectionCodec, SectionKind},
    Result,
};

/// Codec for the tile-index raster.
pub struct TileIndexCodec;

impl SectionCodec for TileIndexCodec {
    type Sample = u32;
    const KIND: SectionKind = SectionKind::TileIndex;

    fn shape(dimensions: Dimensions) -> RasterShape {
        let (width, height) = dimensions.quarter_size();
        RasterShape::new(width, height, 1)
    }

    fn channel_rules() -> Vec<ChannelRule<u32>> {
        vec![ChannelRule::copy(0, 0)]
    }

    fn synthesize(dimensions: Dimensions) -> Raster<u32> {
        let shape = Self::shape(dimensions);
        let data = (0..shape.sample_count())
            .map(|index| u32::try_from(index).unwrap_or(u32::MAX))
            .collect();
        Raster::from_parts(shape, data)
    }

    fn read_container(map: &MapFile) -> Result<Option<Acquired<u32>>> {
        Ok(Some(Acquired::Raster(map.read_tile_indices()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_indices_are_row_major() {
        let raster = TileIndexCodec::synthesize(Dimensions::new(2, 1).unwrap());

        assert_eq!(raster.shape(), RasterShape::new(32, 16, 1));
        assert_eq!(raster.pixel(0, 0), &[0]);
        assert_eq!(raster.pixel(5, 0), &[5]);
        assert_eq!(raster.pixel(3, 2), &[2 * 32 + 3]);
        assert_eq!(TileIndexCodec::section_size(Dimensions::new(2, 1).unwrap()), 32 * 16 * 4);
    }
}
