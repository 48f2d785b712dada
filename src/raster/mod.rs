//! Interleaved sample buffers and the external raster services.
//!
//! Every raster section of a container is a plain row-major array of samples. [`Raster`]
//! is the owned in-memory form used between acquiring a source and writing the section;
//! each section invocation owns its buffer exclusively and hands it to the writer when done.
//!
//! # Key Components
//!
//! - [`Raster`] / [`RasterShape`] - owned interleaved buffer and its geometry
//! - [`Sample`] - the numeric sample types sections are stored in (`u8`, `u16`, `u32`)
//! - [`DynRaster`] - a decoded image in whichever sample format the codec produced
//! - [`channels`] / [`resample`] - normalisation of foreign rasters to a section's shape
//! - [`codec`] - the raster codec service (decode/encode image files)
//! - [`dxt1`] - the block compressor service used for the minimap

pub mod channels;
pub mod codec;
pub mod dxt1;
pub mod resample;

pub use channels::ChannelRule;
pub use codec::{ImageCodec, RasterCodec, RasterInfo};
pub use dxt1::{BlockCompressor, Dxt1Compressor, Quality};

use crate::{
    file::io::{read_le_at, BinIO},
    Error, Result,
};

/// Width, height and channel count of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterShape {
    /// Pixels per row
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Samples per pixel
    pub channels: usize,
}

impl RasterShape {
    /// Creates a shape.
    #[must_use]
    pub const fn new(width: usize, height: usize, channels: usize) -> Self {
        RasterShape {
            width,
            height,
            channels,
        }
    }

    /// Total number of samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.width * self.height * self.channels
    }

    /// Returns `true` if width and height match, ignoring channels.
    #[must_use]
    pub fn same_size(&self, other: &RasterShape) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Sample format requested from, or produced by, the raster codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 8-bit unsigned
    U8,
    /// 16-bit unsigned
    U16,
}

/// Numeric type a section stores its samples in.
pub trait Sample: BinIO + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Format to request from the raster codec when decoding a source for this type.
    const FORMAT: SampleFormat;

    /// Convert a decoded image to this sample type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unrepresentable`] if the conversion is not defined.
    fn from_dyn(raster: DynRaster) -> Result<Raster<Self>>;

    /// Convert to the nearest sample the codec can encode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unrepresentable`] if a sample does not fit.
    fn to_dyn(raster: Raster<Self>) -> Result<DynRaster>;
}

impl Sample for u8 {
    const FORMAT: SampleFormat = SampleFormat::U8;

    fn from_dyn(raster: DynRaster) -> Result<Raster<u8>> {
        Ok(match raster {
            DynRaster::U8(raster) => raster,
            DynRaster::U16(raster) => raster.map(|sample| (sample >> 8) as u8),
        })
    }

    fn to_dyn(raster: Raster<u8>) -> Result<DynRaster> {
        Ok(DynRaster::U8(raster))
    }
}

impl Sample for u16 {
    const FORMAT: SampleFormat = SampleFormat::U16;

    fn from_dyn(raster: DynRaster) -> Result<Raster<u16>> {
        Ok(match raster {
            DynRaster::U8(raster) => raster.map(|sample| u16::from(sample) * 257),
            DynRaster::U16(raster) => raster,
        })
    }

    fn to_dyn(raster: Raster<u16>) -> Result<DynRaster> {
        Ok(DynRaster::U16(raster))
    }
}

impl Sample for u32 {
    const FORMAT: SampleFormat = SampleFormat::U16;

    fn from_dyn(raster: DynRaster) -> Result<Raster<u32>> {
        Ok(match raster {
            DynRaster::U8(raster) => raster.map(u32::from),
            DynRaster::U16(raster) => raster.map(u32::from),
        })
    }

    fn to_dyn(raster: Raster<u32>) -> Result<DynRaster> {
        if let Some(sample) = raster.data.iter().find(|&&sample| sample > u32::from(u16::MAX)) {
            return Err(Error::Unrepresentable(format!(
                "value {sample} exceeds the 16-bit range of the image codec"
            )));
        }

        Ok(DynRaster::U16(raster.map(|sample| sample as u16)))
    }
}

/// Owned, interleaved, row-major sample buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster<T> {
    shape: RasterShape,
    data: Vec<T>,
}

impl<T: Copy + Default> Raster<T> {
    /// Zero-filled raster.
    #[must_use]
    pub fn new(shape: RasterShape) -> Self {
        Raster {
            shape,
            data: vec![T::default(); shape.sample_count()],
        }
    }
}

impl<T: Copy> Raster<T> {
    /// Raster where every pixel equals `pixel`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Error`] if `pixel` does not have `shape.channels` samples.
    pub fn filled(shape: RasterShape, pixel: &[T]) -> Result<Self> {
        if pixel.len() != shape.channels {
            return Err(Error::Error(format!(
                "fill pixel has {} channels, raster has {}",
                pixel.len(),
                shape.channels
            )));
        }

        Ok(Self::from_parts(shape, pixel.repeat(shape.width * shape.height)))
    }

    /// Wrap existing samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Error`] if `data` does not hold exactly `shape.sample_count()`
    /// samples.
    pub fn from_vec(shape: RasterShape, data: Vec<T>) -> Result<Self> {
        if data.len() != shape.sample_count() {
            return Err(Error::Error(format!(
                "raster of {}x{}x{} needs {} samples, got {}",
                shape.width,
                shape.height,
                shape.channels,
                shape.sample_count(),
                data.len()
            )));
        }

        Ok(Self::from_parts(shape, data))
    }

    /// Wrap samples whose count already matches `shape`.
    pub(crate) fn from_parts(shape: RasterShape, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), shape.sample_count());
        Raster { shape, data }
    }

    /// Geometry of the raster.
    #[must_use]
    pub fn shape(&self) -> RasterShape {
        self.shape
    }

    /// Pixels per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.shape.width
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.shape.height
    }

    /// Samples per pixel.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.shape.channels
    }

    /// All samples, row-major and interleaved.
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to all samples.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the raster, returning its samples.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// The samples of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates lie outside the raster.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> &[T] {
        let start = (y * self.shape.width + x) * self.shape.channels;
        &self.data[start..start + self.shape.channels]
    }

    /// Apply `f` to every sample, producing a raster of another sample type.
    #[must_use]
    pub fn map<U, F: Fn(T) -> U>(self, f: F) -> Raster<U> {
        Raster {
            shape: self.shape,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

impl<T: BinIO> Raster<T> {
    /// Encode all samples little-endian, in order.
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.data.len() * std::mem::size_of::<T>());
        for sample in &self.data {
            bytes.extend_from_slice(sample.to_le_bytes().as_ref());
        }
        bytes
    }

    /// Decode a raster of `shape` from little-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `bytes` is too short.
    pub fn from_le_bytes(shape: RasterShape, bytes: &[u8]) -> Result<Self> {
        let count = shape.sample_count();
        let mut data = Vec::with_capacity(count);
        let mut offset = 0;
        for _ in 0..count {
            data.push(read_le_at::<T>(bytes, &mut offset)?);
        }
        Ok(Raster { shape, data })
    }
}

/// A decoded image in the sample format the codec produced.
#[derive(Debug, Clone, PartialEq)]
pub enum DynRaster {
    /// 8-bit samples
    U8(Raster<u8>),
    /// 16-bit samples
    U16(Raster<u16>),
}

impl DynRaster {
    /// Geometry of the wrapped raster.
    #[must_use]
    pub fn shape(&self) -> RasterShape {
        match self {
            DynRaster::U8(raster) => raster.shape(),
            DynRaster::U16(raster) => raster.shape(),
        }
    }

    /// Sample format of the wrapped raster.
    #[must_use]
    pub fn format(&self) -> SampleFormat {
        match self {
            DynRaster::U8(_) => SampleFormat::U8,
            DynRaster::U16(_) => SampleFormat::U16,
        }
    }
}
