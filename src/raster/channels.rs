//! Channel remapping.
//!
//! A section declares, per destination channel, which source channel it is copied from or
//! which constant fills it. Remapping is total: every destination sample is defined for any
//! source channel count.
//!
//! Source channels are interpreted by count the way image files lay them out: one channel is
//! grey, two are grey and alpha, three are RGB, four are RGBA. A rule naming a colour channel
//! (0 to 2) of a grey source reads the grey channel, and a rule naming alpha (3) of a
//! grey-alpha source reads its alpha. Any other missing channel takes the rule's fill value.

use crate::raster::{Raster, RasterShape};

/// How one destination channel is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRule<T> {
    /// Source channel to copy, if any.
    pub source: Option<usize>,
    /// Value used when the source channel does not exist.
    pub fill: T,
}

impl<T> ChannelRule<T> {
    /// Copy from `source`, falling back to `fill`.
    pub const fn copy(source: usize, fill: T) -> Self {
        ChannelRule {
            source: Some(source),
            fill,
        }
    }

    /// Always `value`.
    pub const fn constant(value: T) -> Self {
        ChannelRule {
            source: None,
            fill: value,
        }
    }
}

/// Source channel that `index` refers to in a raster with `channels` channels.
fn resolve_source(index: usize, channels: usize) -> Option<usize> {
    match (channels, index) {
        (channels, index) if index < channels => Some(index),
        (1 | 2, 0..=2) => Some(0),
        (2, 3) => Some(1),
        _ => None,
    }
}

/// Rebuild `raster` with one channel per rule.
#[must_use]
pub fn remap<T: Copy + Default>(raster: &Raster<T>, rules: &[ChannelRule<T>]) -> Raster<T> {
    let source_channels = raster.channels();
    let resolved: Vec<(Option<usize>, T)> = rules
        .iter()
        .map(|rule| {
            (
                rule.source
                    .and_then(|index| resolve_source(index, source_channels)),
                rule.fill,
            )
        })
        .collect();

    let shape = RasterShape::new(raster.width(), raster.height(), rules.len());
    let mut data = Vec::with_capacity(shape.sample_count());
    for pixel in raster.data().chunks_exact(source_channels.max(1)) {
        for (source, fill) in &resolved {
            data.push(source.map_or(*fill, |index| pixel[index]));
        }
    }

    // Zero-channel sources contribute no chunks; fall back to fills for every pixel
    if source_channels == 0 {
        data.clear();
        for _ in 0..shape.width * shape.height {
            data.extend(resolved.iter().map(|(_, fill)| *fill));
        }
    }

    Raster::from_parts(shape, data)
}
