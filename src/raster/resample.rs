//! Nearest-neighbour resampling.

use crate::raster::{Raster, RasterShape};

/// Resize `raster` to `width` x `height`, keeping its channel count.
///
/// Destination pixel `(x, y)` takes source pixel `(x * sw / dw, y * sh / dh)`. An empty
/// source produces a zero-filled destination.
#[must_use]
pub fn nearest<T: Copy + Default>(raster: &Raster<T>, width: usize, height: usize) -> Raster<T> {
    let channels = raster.channels();
    let shape = RasterShape::new(width, height, channels);

    if raster.width() == width && raster.height() == height {
        return raster.clone();
    }
    if raster.width() == 0 || raster.height() == 0 {
        return Raster::new(shape);
    }

    let columns: Vec<usize> = (0..width).map(|x| x * raster.width() / width).collect();
    let mut data = Vec::with_capacity(shape.sample_count());
    for y in 0..height {
        let source_y = y * raster.height() / height;
        for &source_x in &columns {
            data.extend_from_slice(raster.pixel(source_x, source_y));
        }
    }

    Raster::from_parts(shape, data)
}
