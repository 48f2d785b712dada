//! The extra header chain following the fixed header.
//!
//! Each record starts with `{size: i32, tag: i32}`, where `size` counts the whole record
//! including those two fields, followed by `size - 8` bytes of tag-specific payload. The
//! only tag this crate interprets is [`VEGETATION_TAG`], whose payload is the offset of the
//! vegetation-density section. Any other record is carried as [`ExtraHeader::Opaque`] and
//! written back unchanged, in its original position in the chain.

use std::io::{Seek, Write};

use crate::{
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    file::{parser::Parser, writer::MapWriter},
    Result,
};

/// Size of the `{size, tag}` prefix shared by every record.
pub const EXTRA_HEADER_PREFIX: usize = 8;

/// Tag of the vegetation-density record.
pub const VEGETATION_TAG: i32 = 1;

/// Byte size of the vegetation-density record.
pub const VEGETATION_HEADER_SIZE: usize = 12;

/// Payload of the vegetation-density record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VegetationHeader {
    /// Offset of the vegetation section, `None` until a layout has been computed.
    pub offset: Option<u32>,
}

/// One record of the extra header chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraHeader {
    /// Vegetation-density section pointer
    Vegetation(VegetationHeader),
    /// Record with a tag this crate does not interpret
    Opaque {
        /// Type tag as found in the file
        tag: i32,
        /// Raw payload following the prefix
        payload: Vec<u8>,
    },
}

impl ExtraHeader {
    /// Type tag of this record.
    #[must_use]
    pub fn tag(&self) -> i32 {
        match self {
            ExtraHeader::Vegetation(_) => VEGETATION_TAG,
            ExtraHeader::Opaque { tag, .. } => *tag,
        }
    }

    /// Encoded byte size of this record, prefix included.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        match self {
            ExtraHeader::Vegetation(_) => VEGETATION_HEADER_SIZE,
            ExtraHeader::Opaque { payload, .. } => EXTRA_HEADER_PREFIX + payload.len(),
        }
    }

    fn write<W: Write + Seek>(&self, writer: &mut MapWriter<W>) -> Result<()> {
        let size = i32::try_from(self.byte_size()).map_err(|_| crate::Error::LayoutOverflow)?;
        writer.write_le(size)?;
        writer.write_le(self.tag())?;

        match self {
            ExtraHeader::Vegetation(vegetation) => {
                let offset = vegetation.offset.unwrap_or(0);
                let offset = i32::try_from(offset).map_err(|_| crate::Error::LayoutOverflow)?;
                writer.write_le(offset)
            }
            ExtraHeader::Opaque { payload, .. } => writer.write_bytes(payload),
        }
    }
}

/// Ordered list of extra header records.
///
/// At most one record per interpreted tag exists; [`ExtraHeaderChain::find_or_create`]
/// searches before it inserts, and loading drops later duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraHeaderChain {
    records: Vec<ExtraHeader>,
}

impl ExtraHeaderChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `count` records starting at the parser's position.
    ///
    /// Unknown tags are kept and reported as warnings. A second vegetation record is
    /// dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for a negative count, a record whose size is
    /// smaller than its own prefix, a vegetation record that is not exactly
    /// [`VEGETATION_HEADER_SIZE`] bytes, or a chain that runs past the end of the data.
    pub fn parse(parser: &mut Parser, count: i32, diagnostics: &Diagnostics) -> Result<Self> {
        if count < 0 {
            return Err(malformed_error!("Negative extra header count {}", count));
        }

        let mut chain = ExtraHeaderChain::new();
        for index in 0..count {
            let start = parser.pos();
            let (size, tag) = match (parser.read_le::<i32>(), parser.read_le::<i32>()) {
                (Ok(size), Ok(tag)) => (size, tag),
                _ => {
                    return Err(malformed_error!(
                        "Extra header {} at offset {} is truncated",
                        index,
                        start
                    ))
                }
            };

            let size = match usize::try_from(size) {
                Ok(size) if size >= EXTRA_HEADER_PREFIX => size,
                _ => {
                    return Err(malformed_error!(
                        "Extra header {} declares invalid size {}",
                        index,
                        size
                    ))
                }
            };

            let Ok(payload) = parser.read_bytes(size - EXTRA_HEADER_PREFIX) else {
                return Err(malformed_error!(
                    "Extra header {} ({} bytes) runs past the end of the file",
                    index,
                    size
                ));
            };

            if tag == VEGETATION_TAG {
                if size != VEGETATION_HEADER_SIZE {
                    return Err(malformed_error!(
                        "Vegetation extra header has size {}, expected {}",
                        size,
                        VEGETATION_HEADER_SIZE
                    ));
                }

                if chain.has(VEGETATION_TAG) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticSeverity::Warning,
                            DiagnosticCategory::ExtraHeader,
                            "Duplicate vegetation extra header dropped",
                        )
                        .with_offset(start as u64),
                    );
                    continue;
                }

                let offset = crate::file::io::read_le::<i32>(payload)?;
                let offset = match u32::try_from(offset) {
                    Ok(0) => None,
                    Ok(offset) => Some(offset),
                    Err(_) => {
                        return Err(malformed_error!(
                            "Vegetation section offset {} is negative",
                            offset
                        ))
                    }
                };
                chain
                    .records
                    .push(ExtraHeader::Vegetation(VegetationHeader { offset }));
            } else {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::ExtraHeader,
                        format!("Unknown extra header tag {tag} ({size} bytes) preserved"),
                    )
                    .with_offset(start as u64),
                );
                chain.records.push(ExtraHeader::Opaque {
                    tag,
                    payload: payload.to_vec(),
                });
            }
        }

        Ok(chain)
    }

    /// Encode every record in order at the writer's current position.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors, or [`crate::Error::LayoutOverflow`] if a size or offset does
    /// not fit its 32-bit field.
    pub fn write<W: Write + Seek>(&self, writer: &mut MapWriter<W>) -> Result<()> {
        for record in &self.records {
            record.write(writer)?;
        }
        Ok(())
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the chain has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate the records in file order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtraHeader> {
        self.records.iter()
    }

    /// Returns `true` if a record with `tag` exists.
    #[must_use]
    pub fn has(&self, tag: i32) -> bool {
        self.records.iter().any(|record| record.tag() == tag)
    }

    /// Returns the record with `tag`, appending a new empty one if none exists.
    pub fn find_or_create(&mut self, tag: i32) -> &mut ExtraHeader {
        let position = match self.records.iter().position(|record| record.tag() == tag) {
            Some(position) => position,
            None => {
                let record = if tag == VEGETATION_TAG {
                    ExtraHeader::Vegetation(VegetationHeader::default())
                } else {
                    ExtraHeader::Opaque {
                        tag,
                        payload: Vec::new(),
                    }
                };
                self.records.push(record);
                self.records.len() - 1
            }
        };

        &mut self.records[position]
    }

    /// Removes every record with `tag`, returning `true` if any was removed.
    pub fn remove(&mut self, tag: i32) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.tag() != tag);
        self.records.len() != before
    }

    /// Sum of the encoded sizes of all records.
    #[must_use]
    pub fn total_size(&self) -> usize {
        self.records.iter().map(ExtraHeader::byte_size).sum()
    }

    /// The vegetation record, if present.
    #[must_use]
    pub fn vegetation(&self) -> Option<&VegetationHeader> {
        self.records.iter().find_map(|record| match record {
            ExtraHeader::Vegetation(vegetation) => Some(vegetation),
            ExtraHeader::Opaque { .. } => None,
        })
    }

    /// Sets the section offset of the vegetation record, if present.
    pub fn set_vegetation_offset(&mut self, offset: u32) {
        for record in &mut self.records {
            if let ExtraHeader::Vegetation(vegetation) = record {
                vegetation.offset = Some(offset);
            }
        }
    }
}
