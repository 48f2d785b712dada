//! DXT1 block compression for the minimap section.
//!
//! The minimap is stored as DXT1 (BC1) blocks with a mip chain from the full size down to
//! 4x4. Each 4x4 pixel block becomes 8 bytes: two RGB565 endpoint colours and sixteen 2-bit
//! palette indices, all little-endian.
//!
//! Compression input is BGRA, the order the minimap section normalises its sources to.
//! Alpha is ignored; blocks are always encoded in opaque four-colour mode.

use crate::{
    file::io::read_le_at,
    raster::{Raster, RasterShape},
    Error, Result,
};

/// Encoded size of one 4x4 block.
pub const BLOCK_SIZE: usize = 8;

/// Endpoint selection effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    /// Endpoints from the block's per-channel bounding box.
    #[default]
    Fast,
    /// Endpoints along the block's principal colour axis.
    Normal,
}

/// The block compressor service: BGRA raster in, fixed-size compressed mip chain out.
pub trait BlockCompressor: Send + Sync {
    /// Compress a square, power-of-two BGRA raster together with its mip chain.
    ///
    /// The returned buffer must be exactly [`compressed_size`] bytes for the raster's edge
    /// length; callers treat any other size as a contract violation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unrepresentable`] if the raster is not a square power of two of at
    /// least 4 pixels with 4 channels.
    fn compress(&self, bgra: &Raster<u8>, quality: Quality) -> Result<Vec<u8>>;
}

/// In-crate DXT1 encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dxt1Compressor;

impl BlockCompressor for Dxt1Compressor {
    fn compress(&self, bgra: &Raster<u8>, quality: Quality) -> Result<Vec<u8>> {
        let edge = bgra.width();
        check_square(edge, bgra.height())?;
        if bgra.channels() != 4 {
            return Err(Error::Unrepresentable(format!(
                "block compression needs 4 channels, got {}",
                bgra.channels()
            )));
        }

        let mut output = Vec::with_capacity(compressed_size(edge));
        let mut level = bgra.clone();
        loop {
            compress_level(&level, quality, &mut output);
            if level.width() <= 4 {
                break;
            }
            level = downsample(&level);
        }

        Ok(output)
    }
}

fn check_square(width: usize, height: usize) -> Result<()> {
    if width != height || width < 4 || !width.is_power_of_two() {
        return Err(Error::Unrepresentable(format!(
            "block compression needs a square power of two of at least 4, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Byte size of a compressed mip chain for a square raster of `edge` pixels.
///
/// Levels run from `edge` down to 4.
#[must_use]
pub fn compressed_size(edge: usize) -> usize {
    let mut size = 0;
    let mut level = edge;
    while level >= 4 {
        size += (level / 4) * (level / 4) * BLOCK_SIZE;
        level /= 2;
    }
    size
}

/// Decode the top mip level of a compressed chain to RGBA.
///
/// # Errors
///
/// Returns [`Error::Unrepresentable`] for an unsupported edge length, or
/// [`Error::OutOfBounds`] if `data` is shorter than one level.
pub fn decode_dxt1(data: &[u8], edge: usize) -> Result<Raster<u8>> {
    check_square(edge, edge)?;

    let mut raster = Raster::new(RasterShape::new(edge, edge, 4));
    let blocks = edge / 4;
    let mut offset = 0;

    for block_y in 0..blocks {
        for block_x in 0..blocks {
            let c0 = read_le_at::<u16>(data, &mut offset)?;
            let c1 = read_le_at::<u16>(data, &mut offset)?;
            let indices = read_le_at::<u32>(data, &mut offset)?;

            let palette = decode_palette(c0, c1);
            for pixel in 0..16 {
                let x = block_x * 4 + pixel % 4;
                let y = block_y * 4 + pixel / 4;
                let colour = palette[((indices >> (pixel * 2)) & 0b11) as usize];
                let start = (y * edge + x) * 4;
                raster.data_mut()[start..start + 4].copy_from_slice(&colour);
            }
        }
    }

    Ok(raster)
}

type Rgb = [f32; 3];

fn to_565(colour: Rgb) -> u16 {
    let r = (colour[0].clamp(0.0, 255.0) * 31.0 / 255.0).round() as u16;
    let g = (colour[1].clamp(0.0, 255.0) * 63.0 / 255.0).round() as u16;
    let b = (colour[2].clamp(0.0, 255.0) * 31.0 / 255.0).round() as u16;
    (r << 11) | (g << 5) | b
}

fn from_565(colour: u16) -> [u8; 3] {
    let r = ((colour >> 11) & 0x1F) as u8;
    let g = ((colour >> 5) & 0x3F) as u8;
    let b = (colour & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// RGBA palette for a block.
fn decode_palette(c0: u16, c1: u16) -> [[u8; 4]; 4] {
    let p0 = from_565(c0);
    let p1 = from_565(c1);
    let mix = |a: u8, b: u8, wa: u16, wb: u16| {
        ((u16::from(a) * wa + u16::from(b) * wb) / (wa + wb)) as u8
    };

    let rgba = |c: [u8; 3]| [c[0], c[1], c[2], 255];
    if c0 > c1 {
        [
            rgba(p0),
            rgba(p1),
            rgba([0, 1, 2].map(|i| mix(p0[i], p1[i], 2, 1))),
            rgba([0, 1, 2].map(|i| mix(p0[i], p1[i], 1, 2))),
        ]
    } else {
        [
            rgba(p0),
            rgba(p1),
            rgba([0, 1, 2].map(|i| mix(p0[i], p1[i], 1, 1))),
            [0, 0, 0, 0],
        ]
    }
}

/// RGB of each pixel of the block at `(block_x, block_y)` in a BGRA raster.
fn block_colours(bgra: &Raster<u8>, block_x: usize, block_y: usize) -> [Rgb; 16] {
    let mut colours = [[0.0; 3]; 16];
    for (pixel, colour) in colours.iter_mut().enumerate() {
        let sample = bgra.pixel(block_x * 4 + pixel % 4, block_y * 4 + pixel / 4);
        *colour = [
            f32::from(sample[2]),
            f32::from(sample[1]),
            f32::from(sample[0]),
        ];
    }
    colours
}

fn bounding_box(colours: &[Rgb; 16]) -> (Rgb, Rgb) {
    let mut low = [255.0f32; 3];
    let mut high = [0.0f32; 3];
    for colour in colours {
        for channel in 0..3 {
            low[channel] = low[channel].min(colour[channel]);
            high[channel] = high[channel].max(colour[channel]);
        }
    }
    (high, low)
}

fn principal_axis(colours: &[Rgb; 16]) -> (Rgb, Rgb) {
    let mut mean = [0.0f32; 3];
    for colour in colours {
        for channel in 0..3 {
            mean[channel] += colour[channel] / 16.0;
        }
    }

    let mut covariance = [[0.0f32; 3]; 3];
    for colour in colours {
        let d = [
            colour[0] - mean[0],
            colour[1] - mean[1],
            colour[2] - mean[2],
        ];
        for row in 0..3 {
            for column in 0..3 {
                covariance[row][column] += d[row] * d[column];
            }
        }
    }

    let mut axis = [1.0f32, 1.0, 1.0];
    for _ in 0..8 {
        let next = covariance.map(|row| row[0] * axis[0] + row[1] * axis[1] + row[2] * axis[2]);
        let length = next.iter().map(|v| v * v).sum::<f32>().sqrt();
        if length < f32::EPSILON {
            return bounding_box(colours);
        }
        axis = next.map(|v| v / length);
    }

    let project = |colour: &Rgb| {
        (colour[0] - mean[0]) * axis[0]
            + (colour[1] - mean[1]) * axis[1]
            + (colour[2] - mean[2]) * axis[2]
    };
    let mut low = (f32::MAX, colours[0]);
    let mut high = (f32::MIN, colours[0]);
    for colour in colours {
        let t = project(colour);
        if t < low.0 {
            low = (t, *colour);
        }
        if t > high.0 {
            high = (t, *colour);
        }
    }

    (high.1, low.1)
}

fn encode_block(colours: &[Rgb; 16], quality: Quality, output: &mut Vec<u8>) {
    let (high, low) = match quality {
        Quality::Fast => bounding_box(colours),
        Quality::Normal => principal_axis(colours),
    };

    let mut c0 = to_565(high);
    let mut c1 = to_565(low);
    if c0 < c1 {
        std::mem::swap(&mut c0, &mut c1);
    }

    let mut indices = 0u32;
    if c0 != c1 {
        let palette = decode_palette(c0, c1);
        for (pixel, colour) in colours.iter().enumerate() {
            let mut best = (f32::MAX, 0u32);
            for (entry, candidate) in palette.iter().enumerate() {
                let distance: f32 = (0..3)
                    .map(|channel| {
                        let delta = colour[channel] - f32::from(candidate[channel]);
                        delta * delta
                    })
                    .sum();
                if distance < best.0 {
                    best = (distance, entry as u32);
                }
            }
            indices |= best.1 << (pixel * 2);
        }
    }

    output.extend_from_slice(&c0.to_le_bytes());
    output.extend_from_slice(&c1.to_le_bytes());
    output.extend_from_slice(&indices.to_le_bytes());
}

fn compress_level(bgra: &Raster<u8>, quality: Quality, output: &mut Vec<u8>) {
    let blocks = bgra.width() / 4;
    for block_y in 0..blocks {
        for block_x in 0..blocks {
            encode_block(&block_colours(bgra, block_x, block_y), quality, output);
        }
    }
}

/// Halve a square raster with a 2x2 box filter.
fn downsample(raster: &Raster<u8>) -> Raster<u8> {
    let edge = raster.width() / 2;
    let channels = raster.channels();
    let shape = RasterShape::new(edge, edge, channels);
    let mut data = Vec::with_capacity(shape.sample_count());

    for y in 0..edge {
        for x in 0..edge {
            for channel in 0..channels {
                let sum: u32 = [(0, 0), (1, 0), (0, 1), (1, 1)]
                    .iter()
                    .map(|(dx, dy)| u32::from(raster.pixel(x * 2 + dx, y * 2 + dy)[channel]))
                    .sum();
                data.push(((sum + 2) / 4) as u8);
            }
        }
    }

    Raster::from_parts(shape, data)
}
