//! The raster codec service: image files in and out.
//!
//! Sections never talk to an image library directly; they go through [`RasterCodec`], so a
//! document can be given a different codec (tests use an in-memory one). [`ImageCodec`] is
//! the default implementation, backed by the `image` crate and supporting every format that
//! crate was built with.

use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageDecoder, ImageReader};

use crate::{
    raster::{DynRaster, Raster, RasterShape, SampleFormat},
    Error, Result,
};

/// Geometry reported by [`RasterCodec::probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterInfo {
    /// Pixels per row
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Samples per pixel
    pub channels: usize,
}

/// Decode and encode raster image files.
pub trait RasterCodec: Send + Sync {
    /// Read the geometry of an image without decoding its pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a supported image.
    fn probe(&self, path: &Path) -> Result<RasterInfo>;

    /// Decode an image into samples of the requested format, keeping its channel count.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or decoded.
    fn decode(&self, path: &Path, format: SampleFormat) -> Result<DynRaster>;

    /// Write a raster to `path`, choosing the file format from its extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the raster has no matching image layout or cannot be written.
    fn encode(&self, path: &Path, raster: &DynRaster) -> Result<()>;
}

/// [`RasterCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl RasterCodec for ImageCodec {
    fn probe(&self, path: &Path) -> Result<RasterInfo> {
        let decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()?;
        let (width, height) = decoder.dimensions();

        Ok(RasterInfo {
            width: width as usize,
            height: height as usize,
            channels: usize::from(decoder.color_type().channel_count()),
        })
    }

    fn decode(&self, path: &Path, format: SampleFormat) -> Result<DynRaster> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let channels = usize::from(image.color().channel_count());
        let shape = RasterShape::new(image.width() as usize, image.height() as usize, channels);

        Ok(match format {
            SampleFormat::U8 => {
                let data = match channels {
                    1 => image.into_luma8().into_raw(),
                    2 => image.into_luma_alpha8().into_raw(),
                    3 => image.into_rgb8().into_raw(),
                    _ => image.into_rgba8().into_raw(),
                };
                DynRaster::U8(Raster::from_vec(shape_for(shape), data)?)
            }
            SampleFormat::U16 => {
                let data = match channels {
                    1 => image.into_luma16().into_raw(),
                    2 => image.into_luma_alpha16().into_raw(),
                    3 => image.into_rgb16().into_raw(),
                    _ => image.into_rgba16().into_raw(),
                };
                DynRaster::U16(Raster::from_vec(shape_for(shape), data)?)
            }
        })
    }

    fn encode(&self, path: &Path, raster: &DynRaster) -> Result<()> {
        let shape = raster.shape();
        let (Ok(width), Ok(height)) = (u32::try_from(shape.width), u32::try_from(shape.height))
        else {
            return Err(Error::Unrepresentable(format!(
                "{}x{} is too large for an image file",
                shape.width, shape.height
            )));
        };

        let mismatch = || {
            Error::Unrepresentable(format!(
                "{} channels at {}x{} do not form an image",
                shape.channels, shape.width, shape.height
            ))
        };

        let image = match raster {
            DynRaster::U8(raster) => {
                let data = raster.data().to_vec();
                match shape.channels {
                    1 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
                    2 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLumaA8),
                    3 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
                    4 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
                    _ => None,
                }
            }
            DynRaster::U16(raster) => {
                let data = raster.data().to_vec();
                match shape.channels {
                    1 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLuma16),
                    2 => {
                        ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageLumaA16)
                    }
                    3 => ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgb16),
                    4 => {
                        ImageBuffer::from_raw(width, height, data).map(DynamicImage::ImageRgba16)
                    }
                    _ => None,
                }
            }
        }
        .ok_or_else(mismatch)?;

        image.save(path)?;
        Ok(())
    }
}

/// Decoded images with more than four channels are flattened to RGBA.
fn shape_for(shape: RasterShape) -> RasterShape {
    RasterShape::new(shape.width, shape.height, shape.channels.clamp(1, 4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::temp_path;

    #[test]
    fn grey16_round_trip() {
        let path = temp_path("codec_grey16_round_trip.png");
        let raster = Raster::from_vec(RasterShape::new(3, 2, 1), vec![0u16, 1, 256, 4096, 65535, 7])
            .unwrap();

        ImageCodec.encode(&path, &DynRaster::U16(raster.clone())).unwrap();

        let info = ImageCodec.probe(&path).unwrap();
        assert_eq!(
            info,
            RasterInfo {
                width: 3,
                height: 2,
                channels: 1
            }
        );
        assert_eq!(
            ImageCodec.decode(&path, SampleFormat::U16).unwrap(),
            DynRaster::U16(raster)
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rgb8_keeps_channels() {
        let path = temp_path("codec_rgb8_keeps_channels.png");
        let raster = Raster::filled(RasterShape::new(2, 2, 3), &[10u8, 20, 30]).unwrap();

        ImageCodec.encode(&path, &DynRaster::U8(raster.clone())).unwrap();
        let decoded = ImageCodec.decode(&path, SampleFormat::U8).unwrap();

        assert_eq!(decoded.shape().channels, 3);
        assert_eq!(decoded, DynRaster::U8(raster));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn decode_missing_file() {
        let result = ImageCodec.decode(Path::new("/nonexistent/image.png"), SampleFormat::U8);
        assert!(matches!(result, Err(Error::FileError(_))));
    }

    #[test]
    fn decode_non_image() {
        let path = temp_path("codec_decode_non_image.png");
        std::fs::write(&path, b"not an image at all").unwrap();

        assert!(ImageCodec.probe(&path).is_err());
        assert!(ImageCodec.decode(&path, SampleFormat::U8).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
