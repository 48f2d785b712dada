//! Low-level byte stream parser for map container decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary data
//! parser used by every record decoder in [`crate::format`]. It offers bounds-checked access to
//! binary data in the container's fixed little-endian byte order, plus the null-terminated
//! string handling needed by the tile-file and feature-name tables.
//!
//! # Architecture
//!
//! The parser is built around a simple cursor-based model that maintains a position within
//! a byte slice:
//!
//! - **Position tracking** - Maintains current offset for sequential parsing operations
//! - **Bounds checking** - All operations validate data availability before reading
//! - **Type-safe reading** - Strongly typed methods for the primitive types of the format
//!
//! # Usage Examples
//!
//! ```rust
//! use smfkit::Parser;
//!
//! let data = [0x02, 0x00, 0x00, 0x00, b'a', b'b', 0x00];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<i32>()?, 2);
//! assert_eq!(parser.read_cstring()?, b"ab");
//! assert_eq!(parser.pos(), data.len());
//! # Ok::<(), smfkit::Error>(())
//! ```
//!
//! # Error Handling
//!
//! All reading operations return [`crate::Result`] and fail with
//! [`crate::Error::OutOfBounds`] instead of reading past the end of the buffer. A failed read
//! does not move the cursor.

use crate::{
    file::io::{read_le_at, BinIO},
    Result,
};

/// A cursor over a byte slice for sequential, bounds-checked decoding.
///
/// `Parser` never owns data; it borrows the slice (typically a whole container mapped from
/// disk) and only tracks a position within it.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Move the cursor to an absolute position.
    ///
    /// Seeking to exactly the end of the buffer is allowed; any read from there fails.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies beyond the end of the buffer.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Move the cursor forward by `step` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if that would pass the end of the buffer.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let end = self.calc_end_position(step)?;
        self.position = end;
        Ok(())
    }

    /// Current absolute position of the cursor.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Read a little-endian primitive and advance past it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if not enough data remains.
    pub fn read_le<T: BinIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Borrow a null-terminated byte string, without its terminator, and advance past it.
    ///
    /// No encoding is assumed; names in existing containers were written by tools with
    /// no particular encoding in mind.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if no terminator is found before the end of the
    /// buffer.
    pub fn read_cstring(&mut self) -> Result<&'a [u8]> {
        let start = self.position;
        let Some(length) = self.data[start..].iter().position(|&byte| byte == 0) else {
            return Err(out_of_bounds_error!());
        };

        let string_data = &self.data[start..start + length];
        self.position = start + length + 1;

        Ok(string_data)
    }

    /// Borrow the next `length` bytes and advance past them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Absolute position `length` bytes ahead of the cursor, checked against the buffer.
    fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }
}
