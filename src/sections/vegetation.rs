//! Vegetation-density section: 8-bit density per `16w x 16l` cell.
//!
//! The section exists only while the document carries a vegetation extra header.

use crate::{
    format::{layout::Dimensions, mapfile::MapFile},
    raster::{ChannelRule, RasterShape},
    sections::{resolver::Acquired, SectionCodec, SectionKind},
    Result,
};

/// Codec for the vegetation-density section.
pub struct VegetationCodec;

impl SectionCodec for VegetationCodec {
    type Sample = u8;
    const KIND: SectionKind = SectionKind::Vegetation;

    fn shape(dimensions: Dimensions) -> RasterShape {
        let (width, height) = dimensions.quarter_size();
        RasterShape::new(width, height, 1)
    }

    fn channel_rules() -> Vec<ChannelRule<u8>> {
        vec![ChannelRule::copy(0, 0)]
    }

    fn read_container(map: &MapFile) -> Result<Option<Acquired<u8>>> {
        Ok(map.read_vegetation()?.map(Acquired::Raster))
    }
}
