//! Byte-level access to containers on disk or in memory.
//!
//! This module abstracts over the places a container's bytes can come from and provides the
//! primitive decoding and encoding layer every format record is built on.
//!
//! # Key Components
//!
//! - [`File`] - owned, read-only view over one container's bytes
//! - [`Backend`] - trait for data sources (memory-mapped files, in-memory buffers)
//! - [`parser::Parser`] - bounds-checked decoding cursor
//! - [`writer::MapWriter`] - seek-then-write encoding cursor
//! - [`io`] - fixed little-endian primitive conversion
//!
//! # Examples
//!
//! ```rust,no_run
//! use smfkit::File;
//! use std::path::Path;
//!
//! let file = File::from_file(Path::new("maps/duel.smf"))?;
//! let magic = file.data_slice(0, 16)?;
//! println!("{} bytes, magic {:02x?}", file.len(), magic);
//! # Ok::<(), smfkit::Error>(())
//! ```
//!
//! Source files are only ever opened read-only; a [`File`] should be dropped as soon as the
//! data needed from it has been copied out.

pub mod io;
pub mod parser;
pub mod writer;

mod memory;
mod physical;

use std::path::Path;

use crate::{Error::Empty, Result};
use memory::Memory;
use physical::Physical;

/// Backend trait for file data sources.
///
/// Abstracts over where the bytes live. Implementations must be thread-safe so that a
/// [`File`] can be moved across threads by callers that want to.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range does not lie within the data.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data.
    fn len(&self) -> usize;
}

/// Read-only bytes of a single container.
pub struct File {
    data: Box<dyn Backend>,
}

impl File {
    /// Memory-map a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, or
    /// [`crate::Error::Empty`] if it has no content.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;

        Self::load(input)
    }

    /// Take ownership of an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] if the buffer is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        let input = Memory::new(data);

        Self::load(input)
    }

    fn load<T: Backend + 'static>(data: T) -> Result<File> {
        if data.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            data: Box::new(data),
        })
    }

    /// Total size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the file has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The complete file content.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// A bounds-checked slice of the file content.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the range does not lie within the file.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Returns `true` if the file begins with exactly `magic`.
    #[must_use]
    pub fn starts_with(&self, magic: &[u8]) -> bool {
        self.data().starts_with(magic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_mem_rejects_empty() {
        assert!(matches!(File::from_mem(Vec::new()), Err(crate::Error::Empty)));
    }

    #[test]
    fn from_mem_access() {
        let file = File::from_mem(b"spring map file\0rest".to_vec()).unwrap();

        assert_eq!(file.len(), 20);
        assert!(!file.is_empty());
        assert!(file.starts_with(b"spring map file\0"));
        assert!(!file.starts_with(b"spring tilefile\0"));
        assert_eq!(file.data_slice(16, 4).unwrap(), b"rest");
        assert!(file.data_slice(17, 4).is_err());
    }

    #[test]
    fn from_file_missing() {
        let result = File::from_file(Path::new("/nonexistent/map.smf"));
        assert!(matches!(result, Err(crate::Error::FileError(_))));
    }
}
