//! Resource-density section: 8-bit density per `32w x 32l` cell.
//!
//! Resource maps are conventionally painted in the green channel, so colour sources are read
//! from channel 1.

use crate::{
    format::{layout::Dimensions, mapfile::MapFile},
    raster::{ChannelRule, RasterShape},
    sections::{resolver::Acquired, SectionCodec, SectionKind},
    Result,
};

/// Codec for the resource-density section.
pub struct ResourceCodec;

impl SectionCodec for ResourceCodec {
    type Sample = u8;
    const KIND: SectionKind = SectionKind::Resource;

    fn shape(dimensions: Dimensions) -> RasterShape {
        let (width, height) = dimensions.half_size();
        RasterShape::new(width, height, 1)
    }

    fn channel_rules() -> Vec<ChannelRule<u8>> {
        vec![ChannelRule::copy(1, 0)]
    }

    fn read_container(map: &MapFile) -> Result<Option<Acquired<u8>>> {
        Ok(Some(Acquired::Raster(map.read_resource()?)))
    }
}
