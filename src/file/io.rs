//! Fixed byte order reading and writing of primitive values.
//!
//! Every multi-byte integer and float in a map container is stored little-endian, including
//! the counts embedded in the tile and feature tables. This module is the only place that
//! knows about byte order; the [`crate::file::parser::Parser`] and
//! [`crate::file::writer::MapWriter`] cursors are built on top of it.
//!
//! # Key Components
//!
//! - [`BinIO`] - trait mapping a primitive type to its fixed-size byte array
//! - [`read_le`] / [`read_le_at`] - bounds-checked reads, the latter advancing an offset
//!
//! Writes go through [`crate::file::writer::MapWriter`], which streams
//! [`BinIO::to_le_bytes`] to its output.
//!
//! # Usage Examples
//!
//! ```rust,ignore
//! use smfkit::file::io::read_le_at;
//!
//! let data = [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00];
//! let mut offset = 2;
//! let second: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!((second, offset), (2, 4));
//! # Ok::<(), smfkit::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All functions return [`crate::Error::OutOfBounds`] if the buffer is too short for the
//! requested operation. Nothing here panics on short input.

use crate::Result;

/// Trait for type-specific binary conversion of primitive values.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size byte
/// array required for that particular type (e.g. `[u8; 4]` for `u32`).
pub trait BinIO: Sized + Copy {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte array in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte array in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_bin_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BinIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_bin_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Safely reads a value of type `T` in little-endian byte order from the start of a buffer.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than `T`.
pub fn read_le<T: BinIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing the
/// offset past the value on success.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: BinIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_bounds_error!());
    };
    if end > data.len() {
        return Err(out_of_bounds_error!());
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(out_of_bounds_error!());
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_u8() {
        let result = read_le::<u8>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x01);
    }

    #[test]
    fn read_le_u16() {
        let result = read_le::<u16>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0201);
    }

    #[test]
    fn read_le_i32() {
        let result = read_le::<i32>(&[0xFF, 0xFF, 0xFF, 0xFF]).unwrap();
        assert_eq!(result, -1);
    }

    #[test]
    fn read_le_u32() {
        let result = read_le::<u32>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0403_0201);
    }

    #[test]
    fn read_le_f32() {
        let result = read_le::<f32>(&1.5f32.to_le_bytes()).unwrap();
        assert_eq!(result, 1.5);
    }

    #[test]
    fn read_le_u64() {
        let result = read_le::<u64>(&TEST_BUFFER).unwrap();
        assert_eq!(result, 0x0807_0605_0403_0201);
    }

    #[test]
    fn read_le_at_advances() {
        let mut offset = 0;
        assert_eq!(read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0201);
        assert_eq!(offset, 2);
        assert_eq!(read_le_at::<u32>(&TEST_BUFFER, &mut offset).unwrap(), 0x0605_0403);
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_le_out_of_bounds() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(result, Err(crate::Error::OutOfBounds { .. })));
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_le_offset_overflow() {
        let mut offset = usize::MAX - 1;
        assert!(read_le_at::<u32>(&TEST_BUFFER, &mut offset).is_err());
    }
}
