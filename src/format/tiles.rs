//! Tile-file reference table and tile atlas probing.
//!
//! The tile section begins with `{file_count: i32, tile_count: i32}`, followed by one
//! `{tiles_in_file: i32, name\0}` record per referenced atlas, followed by the tile-index
//! raster. Indices in the raster number the tiles of all atlases consecutively, in table
//! order.

use std::{
    io::{Seek, Write},
    path::Path,
};

use crate::{
    diagnostics::{DiagnosticCategory, Diagnostics},
    file::{parser::Parser, writer::MapWriter, File},
    format::{header::ATLAS_MAGIC, name::Name},
    Error, Result,
};

/// Fixed part of the table: file count and tile count.
pub const TILE_TABLE_PREFIX: usize = 8;

/// Per-file overhead on top of the name bytes: tile count and name terminator.
pub const TILE_RECORD_OVERHEAD: usize = 5;

/// Byte offset of the tile count inside an atlas file.
const ATLAS_COUNT_OFFSET: usize = 20;

/// One referenced tile atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileReference {
    /// Atlas file name, stored as given.
    pub name: Name,
    /// Number of tiles that atlas contributes.
    pub count: u32,
}

/// Ordered list of referenced tile atlases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileTable {
    files: Vec<TileReference>,
}

impl TileTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a reference without opening the atlas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTileReference`] if `name` is empty or contains a NUL byte.
    pub fn push(&mut self, name: impl Into<Name>, count: u32) -> Result<()> {
        let name = name.into();
        if name.is_empty() || name.contains_nul() {
            return Err(Error::InvalidTileReference(format!(
                "'{}' is not a storable file name",
                name.to_string_lossy().escape_debug()
            )));
        }

        self.files.push(TileReference { name, count });
        Ok(())
    }

    /// Removes all references.
    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Number of referenced files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no file is referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate the references in table order.
    pub fn iter(&self) -> impl Iterator<Item = &TileReference> {
        self.files.iter()
    }

    /// Sum of the tile counts of every referenced file.
    #[must_use]
    pub fn total_tiles(&self) -> u64 {
        self.files.iter().map(|file| u64::from(file.count)).sum()
    }

    /// Maps a flat tile index to `(file position, index within that file)`.
    ///
    /// Returns `None` if the index lies beyond the last referenced tile.
    #[must_use]
    pub fn resolve(&self, index: u32) -> Option<(usize, u32)> {
        let mut start = 0u64;
        for (position, file) in self.files.iter().enumerate() {
            let end = start + u64::from(file.count);
            if u64::from(index) < end {
                return u32::try_from(u64::from(index) - start)
                    .ok()
                    .map(|local| (position, local));
            }
            start = end;
        }
        None
    }

    /// Encoded size of the table, excluding the index raster that follows it.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        TILE_TABLE_PREFIX
            + self
                .files
                .iter()
                .map(|file| file.name.len() + TILE_RECORD_OVERHEAD)
                .sum::<usize>()
    }

    /// Decode the table at the parser's position, leaving the parser at the index raster.
    ///
    /// A declared total tile count that differs from the per-file counts is reported, not
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if the table is truncated or declares a negative count.
    pub fn parse(parser: &mut Parser, diagnostics: &Diagnostics) -> Result<Self> {
        let start = parser.pos();
        let (file_count, declared_tiles) = match (parser.read_le::<i32>(), parser.read_le::<i32>())
        {
            (Ok(files), Ok(tiles)) => (files, tiles),
            _ => return Err(malformed_error!("Tile table at offset {} is truncated", start)),
        };

        let Ok(file_count) = usize::try_from(file_count) else {
            return Err(malformed_error!("Negative tile file count {}", file_count));
        };

        let mut table = TileTable::new();
        for index in 0..file_count {
            let Ok(count) = parser.read_le::<i32>() else {
                return Err(malformed_error!("Tile file record {} is truncated", index));
            };
            let Ok(count) = u32::try_from(count) else {
                return Err(malformed_error!(
                    "Tile file record {} has negative tile count {}",
                    index,
                    count
                ));
            };
            let Ok(name) = parser.read_cstring() else {
                return Err(malformed_error!("Tile file name {} is unterminated", index));
            };

            table.files.push(TileReference {
                name: Name::from_bytes(name),
                count,
            });
        }

        if i64::from(declared_tiles) != table.total_tiles() as i64 {
            diagnostics.info(
                DiagnosticCategory::TileTable,
                format!(
                    "Tile table declares {} tiles, referenced files hold {}",
                    declared_tiles,
                    table.total_tiles()
                ),
            );
        }

        Ok(table)
    }

    /// Encode the table at the writer's current position.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors, or [`Error::LayoutOverflow`] if a count does not fit 32 bits.
    pub fn write<W: Write + Seek>(&self, writer: &mut MapWriter<W>) -> Result<()> {
        let file_count = i32::try_from(self.files.len()).map_err(|_| Error::LayoutOverflow)?;
        let total = i32::try_from(self.total_tiles()).map_err(|_| Error::LayoutOverflow)?;

        writer.write_le(file_count)?;
        writer.write_le(total)?;
        for file in &self.files {
            let count = i32::try_from(file.count).map_err(|_| Error::LayoutOverflow)?;
            writer.write_le(count)?;
            writer.write_cstring(file.name.as_bytes())?;
        }
        Ok(())
    }
}

/// Open a tile atlas and read how many tiles it holds.
///
/// The returned reference is named after the file name component of `path`.
///
/// # Errors
///
/// Returns [`Error::InvalidTileReference`] if the file is not a tile atlas, or
/// [`Error::FileError`] if it cannot be opened.
pub fn probe_atlas(path: &Path) -> Result<TileReference> {
    let file = File::from_file(path)?;
    if !file.starts_with(ATLAS_MAGIC) {
        return Err(Error::InvalidTileReference(format!(
            "{} is not a tile atlas",
            path.display()
        )));
    }

    let count = file
        .data_slice(ATLAS_COUNT_OFFSET, 4)
        .and_then(crate::file::io::read_le::<i32>)
        .map_err(|_| Error::InvalidTileReference(format!("{} is truncated", path.display())))?;
    let count = u32::try_from(count).map_err(|_| {
        Error::InvalidTileReference(format!("{} has negative tile count", path.display()))
    })?;

    let name = path.file_name().ok_or_else(|| {
        Error::InvalidTileReference(format!("{} has no file name", path.display()))
    })?;

    Ok(TileReference {
        name: Name::from_bytes(name.as_encoded_bytes()),
        count,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::test::{temp_path, write_atlas};

    fn table() -> TileTable {
        let mut table = TileTable::new();
        table.push("a.smt", 3).unwrap();
        table.push("bb.smt", 0).unwrap();
        table.push("ccc.smt", 2).unwrap();
        table
    }

    #[test]
    fn resolve_cumulative() {
        let table = table();

        assert_eq!(table.total_tiles(), 5);
        assert_eq!(table.resolve(0), Some((0, 0)));
        assert_eq!(table.resolve(2), Some((0, 2)));
        assert_eq!(table.resolve(3), Some((2, 0)));
        assert_eq!(table.resolve(4), Some((2, 1)));
        assert_eq!(table.resolve(5), None);
    }

    #[test]
    fn encoded_size_counts_names() {
        let table = table();
        assert_eq!(table.encoded_size(), 8 + (5 + 5) + (6 + 5) + (7 + 5));

        let mut writer = MapWriter::new(Cursor::new(Vec::new()));
        table.write(&mut writer).unwrap();
        assert_eq!(writer.position() as usize, table.encoded_size());
    }

    #[test]
    fn parse_encoded() {
        let table = table();
        let mut writer = MapWriter::new(Cursor::new(Vec::new()));
        table.write(&mut writer).unwrap();
        let mut data = writer.into_inner().unwrap().into_inner();
        data.extend_from_slice(&[0xAA; 4]);

        let diagnostics = Diagnostics::new();
        let mut parser = Parser::new(&data);
        let parsed = TileTable::parse(&mut parser, &diagnostics).unwrap();

        assert_eq!(parsed, table);
        assert_eq!(parser.pos(), table.encoded_size());
        assert!(!diagnostics.has_any());
    }

    #[test]
    fn parse_truncated() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend_from_slice(&4i32.to_le_bytes());
        data.extend_from_slice(b"no-terminator");

        let result = TileTable::parse(&mut Parser::new(&data), &Diagnostics::new());
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn parse_keeps_name_bytes() {
        let mut table = TileTable::new();
        table.push(b"gr\xE9s.smt".as_slice(), 7).unwrap();
        let mut writer = MapWriter::new(Cursor::new(Vec::new()));
        table.write(&mut writer).unwrap();
        let data = writer.into_inner().unwrap().into_inner();

        let parsed = TileTable::parse(&mut Parser::new(&data), &Diagnostics::new()).unwrap();
        let name = &parsed.iter().next().unwrap().name;
        assert_eq!(name.as_bytes(), b"gr\xE9s.smt");
        assert_eq!(parsed.encoded_size(), data.len());
    }

    #[test]
    fn push_rejects_nul() {
        let mut table = TileTable::new();
        assert!(matches!(
            table.push("bad\0name", 1),
            Err(Error::InvalidTileReference(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn probe_reads_count() {
        let path = temp_path("probe_reads_count.smt");
        write_atlas(&path, 42);

        let reference = probe_atlas(&path).unwrap();
        assert_eq!(reference.name, "probe_reads_count.smt");
        assert_eq!(reference.count, 42);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn probe_rejects_other_files() {
        let path = temp_path("probe_rejects_other_files.smt");
        std::fs::write(&path, b"spring map file\0\x01\0\0\0\0\0\0\0\0\0\0\0").unwrap();

        assert!(matches!(
            probe_atlas(&path),
            Err(Error::InvalidTileReference(_))
        ));

        let _ = std::fs::remove_file(&path);
    }
}
