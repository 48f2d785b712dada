//! Surface-class section: one 8-bit class per `32w x 32l` cell.

use crate::{
    format::{layout::Dimensions, mapfile::MapFile},
    raster::{ChannelRule, RasterShape},
    sections::{resolver::Acquired, SectionCodec, SectionKind},
    Result,
};

/// Codec for the surface-class section.
pub struct SurfaceCodec;

impl SectionCodec for SurfaceCodec {
    type Sample = u8;
    const KIND: SectionKind = SectionKind::Surface;

    fn shape(dimensions: Dimensions) -> RasterShape {
        let (width, height) = dimensions.half_size();
        RasterShape::new(width, height, 1)
    }

    fn channel_rules() -> Vec<ChannelRule<u8>> {
        vec![ChannelRule::copy(0, 0)]
    }

    fn read_container(map: &MapFile) -> Result<Option<Acquired<u8>>> {
        Ok(Some(Acquired::Raster(map.read_surface()?)))
    }
}
