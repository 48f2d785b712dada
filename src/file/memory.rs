//! In-memory backend for containers that were never on disk (or were read fully).

use super::Backend;
use crate::Result;

/// Container bytes owned in a heap buffer
#[derive(Debug)]
pub struct Memory {
    buffer: Vec<u8>,
}

impl Memory {
    /// Take ownership of `buffer`
    pub fn new(buffer: Vec<u8>) -> Memory {
        Memory { buffer }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.buffer.get(offset..end))
            .ok_or_else(|| out_of_bounds_error!())
    }

    fn data(&self) -> &[u8] {
        &self.buffer
    }

    fn len(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::header::MAP_MAGIC;

    #[test]
    fn slices_within_buffer() {
        let mut buffer = MAP_MAGIC.to_vec();
        buffer.resize(80, 0xCC);

        let memory = Memory::new(buffer);
        assert_eq!(memory.len(), 80);
        assert_eq!(memory.data_slice(0, 16).unwrap(), MAP_MAGIC);
        assert_eq!(memory.data_slice(79, 1).unwrap(), &[0xCC]);
        assert_eq!(memory.data_slice(80, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn rejects_out_of_range() {
        let memory = Memory::new(vec![0u8; 8]);

        assert!(matches!(
            memory.data_slice(usize::MAX, 1),
            Err(crate::Error::OutOfBounds { .. })
        ));
        assert!(memory.data_slice(7, 2).is_err());
        assert!(memory.data_slice(9, 0).is_err());
        assert!(Memory::new(Vec::new()).data_slice(0, 1).is_err());
    }
}
