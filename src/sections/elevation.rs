//! Elevation section: one 16-bit sample per vertex, `(64w+1) x (64l+1)`.
//!
//! Sample 0 maps to the header's floor and 65535 to its ceiling.

use crate::{
    format::{layout::Dimensions, mapfile::MapFile},
    raster::{ChannelRule, Raster, RasterShape},
    sections::{resolver::Acquired, SectionCodec, SectionContext, SectionKind},
    Result,
};

/// Codec for the elevation section.
pub struct ElevationCodec;

impl SectionCodec for ElevationCodec {
    type Sample = u16;
    const KIND: SectionKind = SectionKind::Elevation;

    fn shape(dimensions: Dimensions) -> RasterShape {
        let (width, height) = dimensions.elevation_size();
        RasterShape::new(width, height, 1)
    }

    fn channel_rules() -> Vec<ChannelRule<u16>> {
        vec![ChannelRule::copy(0, 0)]
    }

    fn read_container(map: &MapFile) -> Result<Option<Acquired<u16>>> {
        Ok(Some(Acquired::Raster(map.read_elevation()?)))
    }

    fn encode(mut raster: Raster<u16>, context: &SectionContext) -> Result<Vec<u8>> {
        if context.config.invert_elevation {
            for sample in raster.data_mut() {
                *sample = u16::MAX - *sample;
            }
        }
        Ok(raster.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::MapConfig,
        diagnostics::Diagnostics,
        raster::{Dxt1Compressor, ImageCodec},
        sections::{produce, SectionSource},
    };

    #[test]
    fn default_is_flat_zero() {
        let config = MapConfig::default();
        let diagnostics = Diagnostics::new();
        let context = SectionContext {
            dimensions: Dimensions::new(1, 1).unwrap(),
            config: &config,
            codec: &ImageCodec,
            compressor: &Dxt1Compressor,
            diagnostics: &diagnostics,
        };

        let bytes = produce::<ElevationCodec>(&SectionSource::Synthesize, &context).unwrap();
        assert_eq!(bytes.len(), 65 * 65 * 2);
        assert!(bytes.iter().all(|&byte| byte == 0));
    }

    #[test]
    fn invert_flips_samples() {
        let config = MapConfig::default().with_invert_elevation(true);
        let diagnostics = Diagnostics::new();
        let context = SectionContext {
            dimensions: Dimensions::new(1, 1).unwrap(),
            config: &config,
            codec: &ImageCodec,
            compressor: &Dxt1Compressor,
            diagnostics: &diagnostics,
        };

        let raster = Raster::filled(RasterShape::new(1, 2, 1), &[0x0100u16]).unwrap();
        let bytes = ElevationCodec::encode(raster, &context).unwrap();
        assert_eq!(bytes, [0xFF, 0xFE, 0xFF, 0xFE]);
    }
}
