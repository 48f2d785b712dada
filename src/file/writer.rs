//! Seek-then-write output cursor for container serialisation.
//!
//! Every section of a container is written by first seeking to the offset the layout
//! allocated for it and then streaming its bytes with no padding. [`MapWriter`] wraps any
//! `Write + Seek` target (a file on disk, or an in-memory `Cursor<Vec<u8>>` in tests) and
//! provides the little-endian primitive writes used by the header and table encoders.
//!
//! The writer tracks its own position so callers can check section boundaries without an
//! extra `stream_position` system call per section.

use std::io::{Seek, SeekFrom, Write};

use crate::{file::io::BinIO, Result};

/// Output cursor used by every encoder.
pub struct MapWriter<W: Write + Seek> {
    inner: W,
    position: u64,
}

impl<W: Write + Seek> MapWriter<W> {
    /// Wrap an output positioned at its start.
    pub fn new(inner: W) -> Self {
        MapWriter { inner, position: 0 }
    }

    /// Absolute position of the next byte to be written.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move to an absolute offset.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying output.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        if offset != self.position {
            self.position = self.inner.seek(SeekFrom::Start(offset))?;
        }
        Ok(())
    }

    /// Write a primitive in little-endian byte order.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying output.
    pub fn write_le<T: BinIO>(&mut self, value: T) -> Result<()> {
        self.write_bytes(value.to_le_bytes().as_ref())
    }

    /// Write raw bytes.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying output.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    /// Write a byte string followed by a single null terminator.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying output.
    pub fn write_cstring(&mut self, value: &[u8]) -> Result<()> {
        self.write_bytes(value)?;
        self.write_bytes(&[0])
    }

    /// Flush buffered data to the underlying output.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the underlying output.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the wrapped output.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the final flush.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn writes_little_endian() {
        let mut writer = MapWriter::new(Cursor::new(Vec::new()));
        writer.write_le(0x0403_0201u32).unwrap();
        writer.write_le(-1i16).unwrap();
        writer.write_cstring(b"ab").unwrap();
        assert_eq!(writer.position(), 9);

        let data = writer.into_inner().unwrap().into_inner();
        assert_eq!(data, [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF, b'a', b'b', 0x00]);
    }

    #[test]
    fn seek_past_end_zero_fills() {
        let mut writer = MapWriter::new(Cursor::new(Vec::new()));
        writer.seek_to(4).unwrap();
        writer.write_le(7u8).unwrap();
        writer.seek_to(1).unwrap();
        writer.write_le(9u8).unwrap();
        assert_eq!(writer.position(), 2);

        let data = writer.into_inner().unwrap().into_inner();
        assert_eq!(data, [0, 9, 0, 0, 7]);
    }
}
