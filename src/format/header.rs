//! The fixed 80-byte header at the start of every map container.
//!
//! # Layout
//!
//! | Offset | Size | Field |
//! |-------:|-----:|-------|
//! | 0  | 16 | magic, `"spring map file\0"` |
//! | 16 | 4  | version (1) |
//! | 20 | 4  | document id |
//! | 24 | 4  | width in internal units (user units x 64) |
//! | 28 | 4  | length in internal units |
//! | 32 | 4  | square width (8) |
//! | 36 | 4  | texels per square (8) |
//! | 40 | 4  | texels per tile (32) |
//! | 44 | 4  | floor, `f32` (user units x 512) |
//! | 48 | 4  | ceiling, `f32` (user units x 512) |
//! | 52 | 24 | offsets: elevation, surface, tile index, minimap, resource, features |
//! | 76 | 4  | number of extra headers |
//!
//! Every field is little-endian. The extra header chain follows immediately.

use std::io::{Seek, Write};

use crate::{
    file::{parser::Parser, writer::MapWriter},
    Error, Result,
};

/// Magic string identifying a map container.
pub const MAP_MAGIC: &[u8; 16] = b"spring map file\0";

/// Magic string identifying a companion tile atlas.
pub const ATLAS_MAGIC: &[u8; 16] = b"spring tilefile\0";

/// Byte size of the fixed header.
pub const HEADER_SIZE: usize = 80;

/// The only format version written.
pub const FORMAT_VERSION: i32 = 1;

/// Distance between elevation vertices.
pub const SQUARE_WIDTH: i32 = 8;

/// Texels per elevation square.
pub const SQUARE_TEXELS: i32 = 8;

/// Texels per ground tile.
pub const TILE_TEXELS: i32 = 32;

/// Internal units per user unit of width or length.
pub const UNIT_SCALE: i32 = 64;

/// Header height units per user unit of floor or ceiling.
pub const HEIGHT_SCALE: f32 = 512.0;

/// Decoded fixed header.
///
/// Offsets are kept exactly as found in (or destined for) the file; the document model keeps
/// its own [`crate::format::layout::Offsets`] and only copies them here when writing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    /// Format version
    pub version: i32,
    /// Random document identifier
    pub id: i32,
    /// Width in internal units
    pub width: i32,
    /// Length in internal units
    pub length: i32,
    /// Distance between elevation vertices
    pub square_width: i32,
    /// Texels per square
    pub square_texels: i32,
    /// Texels per tile
    pub tile_texels: i32,
    /// Elevation that sample 0 maps to, in header height units
    pub floor: f32,
    /// Elevation that sample 65535 maps to, in header height units
    pub ceiling: f32,
    /// Offset of the elevation section
    pub elevation_offset: i32,
    /// Offset of the surface-class section
    pub surface_offset: i32,
    /// Offset of the tile table
    pub tile_index_offset: i32,
    /// Offset of the minimap section
    pub minimap_offset: i32,
    /// Offset of the resource-density section
    pub resource_offset: i32,
    /// Offset of the feature list
    pub feature_offset: i32,
    /// Number of extra header records that follow
    pub extra_header_count: i32,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            version: FORMAT_VERSION,
            id: 0,
            width: 0,
            length: 0,
            square_width: SQUARE_WIDTH,
            square_texels: SQUARE_TEXELS,
            tile_texels: TILE_TEXELS,
            floor: 0.0,
            ceiling: 0.0,
            elevation_offset: 0,
            surface_offset: 0,
            tile_index_offset: 0,
            minimap_offset: 0,
            resource_offset: 0,
            feature_offset: 0,
            extra_header_count: 0,
        }
    }
}

impl Header {
    /// Decode the header from the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMagic`] if `data` does not begin with [`MAP_MAGIC`], and
    /// [`Error::Malformed`] if it is too short to hold the rest of the header.
    pub fn parse(data: &[u8]) -> Result<Header> {
        if !data.starts_with(MAP_MAGIC) {
            return Err(Error::InvalidMagic);
        }

        if data.len() < HEADER_SIZE {
            return Err(malformed_error!(
                "Truncated header - {} of {} bytes",
                data.len(),
                HEADER_SIZE
            ));
        }

        let mut parser = Parser::new(data);
        parser.advance_by(MAP_MAGIC.len())?;

        Ok(Header {
            version: parser.read_le::<i32>()?,
            id: parser.read_le::<i32>()?,
            width: parser.read_le::<i32>()?,
            length: parser.read_le::<i32>()?,
            square_width: parser.read_le::<i32>()?,
            square_texels: parser.read_le::<i32>()?,
            tile_texels: parser.read_le::<i32>()?,
            floor: parser.read_le::<f32>()?,
            ceiling: parser.read_le::<f32>()?,
            elevation_offset: parser.read_le::<i32>()?,
            surface_offset: parser.read_le::<i32>()?,
            tile_index_offset: parser.read_le::<i32>()?,
            minimap_offset: parser.read_le::<i32>()?,
            resource_offset: parser.read_le::<i32>()?,
            feature_offset: parser.read_le::<i32>()?,
            extra_header_count: parser.read_le::<i32>()?,
        })
    }

    /// Encode the header at offset 0.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the writer.
    pub fn write<W: Write + Seek>(&self, writer: &mut MapWriter<W>) -> Result<()> {
        writer.seek_to(0)?;
        writer.write_bytes(MAP_MAGIC)?;
        writer.write_le(self.version)?;
        writer.write_le(self.id)?;
        writer.write_le(self.width)?;
        writer.write_le(self.length)?;
        writer.write_le(self.square_width)?;
        writer.write_le(self.square_texels)?;
        writer.write_le(self.tile_texels)?;
        writer.write_le(self.floor)?;
        writer.write_le(self.ceiling)?;
        writer.write_le(self.elevation_offset)?;
        writer.write_le(self.surface_offset)?;
        writer.write_le(self.tile_index_offset)?;
        writer.write_le(self.minimap_offset)?;
        writer.write_le(self.resource_offset)?;
        writer.write_le(self.feature_offset)?;
        writer.write_le(self.extra_header_count)?;
        Ok(())
    }

    /// Returns `true` if the version and grid constants are the ones this crate writes.
    #[must_use]
    pub fn has_standard_constants(&self) -> bool {
        self.version == FORMAT_VERSION
            && self.square_width == SQUARE_WIDTH
            && self.square_texels == SQUARE_TEXELS
            && self.tile_texels == TILE_TEXELS
    }
}
