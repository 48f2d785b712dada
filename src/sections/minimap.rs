//! Minimap section: a 1024x1024 DXT1 image with its mip chain, always
//! [`MINIMAP_SIZE`] bytes.
//!
//! Sources are normalised to BGRA, the input order of the block compressor. Image sources
//! are always swizzled, even when they already have four channels; a source without alpha
//! gets full alpha. A minimap copied from another container is already compressed and is
//! passed through unchanged.

use crate::{
    format::{
        layout::{Dimensions, MINIMAP_DIMENSION, MINIMAP_SIZE},
        mapfile::MapFile,
    },
    raster::{ChannelRule, Raster, RasterShape},
    sections::{resolver::Acquired, SectionCodec, SectionContext, SectionKind},
    Error, Result,
};

/// Opaque mid grey, in BGRA.
const DEFAULT_PIXEL: [u8; 4] = [128, 128, 128, 255];

/// Codec for the minimap section.
pub struct MinimapCodec;

impl SectionCodec for MinimapCodec {
    type Sample = u8;
    const KIND: SectionKind = SectionKind::Minimap;

    fn shape(_dimensions: Dimensions) -> RasterShape {
        RasterShape::new(MINIMAP_DIMENSION, MINIMAP_DIMENSION, 4)
    }

    fn channel_rules() -> Vec<ChannelRule<u8>> {
        vec![
            ChannelRule::copy(2, 0),
            ChannelRule::copy(1, 0),
            ChannelRule::copy(0, 0),
            ChannelRule::copy(3, 255),
        ]
    }

    fn always_remap() -> bool {
        true
    }

    fn synthesize(dimensions: Dimensions) -> Raster<u8> {
        let shape = Self::shape(dimensions);
        Raster::from_parts(shape, DEFAULT_PIXEL.repeat(shape.width * shape.height))
    }

    fn read_container(map: &MapFile) -> Result<Option<Acquired<u8>>> {
        Ok(Some(Acquired::Payload(map.read_minimap()?.to_vec())))
    }

    fn encode(raster: Raster<u8>, context: &SectionContext) -> Result<Vec<u8>> {
        let compressed = context
            .compressor
            .compress(&raster, context.config.minimap_quality)?;

        if compressed.len() != MINIMAP_SIZE {
            return Err(Error::ContractViolation(format!(
                "block compressor returned {} bytes, minimap needs {}",
                compressed.len(),
                MINIMAP_SIZE
            )));
        }
        Ok(compressed)
    }

    fn section_size(_dimensions: Dimensions) -> usize {
        MINIMAP_SIZE
    }
}
