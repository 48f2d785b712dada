//! Read-only view of an existing map container.
//!
//! [`MapFile`] validates and decodes everything a document model needs (header, extra
//! header chain, tile table, feature list) and gives bounds-checked access to the raw
//! raster sections. It serves two purposes: loading a document, and acting as a section
//! source when another container is named as the origin of a section.
//!
//! Offsets are taken from the file as recorded; nothing here recomputes them.

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    config::MapConfig,
    diagnostics::{DiagnosticCategory, Diagnostics},
    file::{parser::Parser, File},
    format::{
        extraheader::ExtraHeaderChain,
        features::FeatureList,
        header::{Header, HEADER_SIZE, MAP_MAGIC},
        layout::{Dimensions, Offsets, MINIMAP_SIZE},
        tiles::TileTable,
    },
    raster::{Raster, RasterShape, Sample},
    Result,
};

/// A validated map container.
pub struct MapFile {
    file: File,
    path: Option<PathBuf>,
    header: Header,
    dimensions: Dimensions,
    offsets: Offsets,
    extra_headers: ExtraHeaderChain,
    tiles: TileTable,
    tile_index_start: usize,
    features: FeatureList,
    diagnostics: Arc<Diagnostics>,
}

impl MapFile {
    /// Open and validate a container on disk with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidMagic`] if the file is not a map container,
    /// [`crate::Error::Malformed`] if its header, extra headers or tile table are damaged,
    /// or [`crate::Error::FileError`] if it cannot be read.
    pub fn from_file(path: &Path) -> Result<MapFile> {
        Self::open(path, &MapConfig::default(), Arc::new(Diagnostics::new()))
    }

    /// Validate a container held in memory with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`MapFile::from_file`].
    pub fn from_mem(data: Vec<u8>) -> Result<MapFile> {
        let file = File::from_mem(data)?;
        Self::load(file, None, &MapConfig::default(), Arc::new(Diagnostics::new()))
    }

    /// Open a container on disk, reporting into `diagnostics`.
    ///
    /// # Errors
    ///
    /// See [`MapFile::from_file`].
    pub fn open(path: &Path, config: &MapConfig, diagnostics: Arc<Diagnostics>) -> Result<MapFile> {
        let file = File::from_file(path)?;
        Self::load(file, Some(path.to_path_buf()), config, diagnostics)
    }

    /// Returns `true` if `path` names a readable file starting with the container magic.
    ///
    /// Only the first 16 bytes are read.
    #[must_use]
    pub fn is_map_file(path: &Path) -> bool {
        let mut magic = [0u8; 16];
        fs::File::open(path)
            .and_then(|mut file| file.read_exact(&mut magic))
            .is_ok_and(|()| &magic == MAP_MAGIC)
    }

    fn load(
        file: File,
        path: Option<PathBuf>,
        config: &MapConfig,
        diagnostics: Arc<Diagnostics>,
    ) -> Result<MapFile> {
        let data = file.data();
        let header = Header::parse(data)?;

        if !header.has_standard_constants() {
            let message = format!(
                "Non-standard header: version {}, square {}x{}, tile texels {}",
                header.version, header.square_width, header.square_texels, header.tile_texels
            );
            if config.strict_header {
                return Err(malformed_error!(message));
            }
            diagnostics.warning(DiagnosticCategory::Header, message);
        }

        let dimensions = Dimensions::from_internal(header.width, header.length)?;

        let mut parser = Parser::new(data);
        parser.seek(HEADER_SIZE)?;
        let extra_headers =
            ExtraHeaderChain::parse(&mut parser, header.extra_header_count, &diagnostics)?;
        let offsets = Offsets::from_header(&header, &extra_headers)?;

        let Ok(tile_offset) = usize::try_from(offsets.tile_index) else {
            return Err(malformed_error!("Tile table offset is not addressable"));
        };
        if parser.seek(tile_offset).is_err() {
            return Err(malformed_error!(
                "Tile table offset {} lies past the end of the file",
                tile_offset
            ));
        }
        let tiles = TileTable::parse(&mut parser, &diagnostics)?;
        let tile_index_start = parser.pos();

        let features = FeatureList::parse(data, offsets.features as usize, &diagnostics);

        log::info!(
            "loaded {}x{} map{} with {} tile file(s) and {} feature(s)",
            dimensions.width,
            dimensions.length,
            path.as_ref()
                .map(|path| format!(" {}", path.display()))
                .unwrap_or_default(),
            tiles.len(),
            features.features().len()
        );

        Ok(MapFile {
            file,
            path,
            header,
            dimensions,
            offsets,
            extra_headers,
            tiles,
            tile_index_start,
            features,
            diagnostics,
        })
    }

    /// Path the container was opened from, if it came from disk.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The decoded fixed header.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Map size in user units.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Section offsets as recorded in the file.
    #[must_use]
    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    /// The extra header chain.
    #[must_use]
    pub fn extra_headers(&self) -> &ExtraHeaderChain {
        &self.extra_headers
    }

    /// The tile-file reference table.
    #[must_use]
    pub fn tiles(&self) -> &TileTable {
        &self.tiles
    }

    /// The feature list, empty if it was found to be corrupt.
    #[must_use]
    pub fn features(&self) -> &FeatureList {
        &self.features
    }

    /// Diagnostics reported while loading.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Total size of the container in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.file.len()
    }

    /// Returns `true` if the container holds no bytes (never the case for a valid one).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }

    fn section(&self, offset: u32, len: usize) -> Result<&[u8]> {
        self.file.data_slice(offset as usize, len)
    }

    fn grey<T: Sample>(&self, offset: u32, (width, height): (usize, usize)) -> Result<Raster<T>> {
        let shape = RasterShape::new(width, height, 1);
        let bytes = self.section(offset, shape.sample_count() * std::mem::size_of::<T>())?;
        Raster::from_le_bytes(shape, bytes)
    }

    /// The elevation section.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the section lies past the end of the file.
    pub fn read_elevation(&self) -> Result<Raster<u16>> {
        self.grey(self.offsets.elevation, self.dimensions.elevation_size())
    }

    /// The surface-class section.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the section lies past the end of the file.
    pub fn read_surface(&self) -> Result<Raster<u8>> {
        self.grey(self.offsets.surface, self.dimensions.half_size())
    }

    /// The resource-density section.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the section lies past the end of the file.
    pub fn read_resource(&self) -> Result<Raster<u8>> {
        self.grey(self.offsets.resource, self.dimensions.half_size())
    }

    /// The vegetation-density section, `None` if the container has none.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the section lies past the end of the file.
    pub fn read_vegetation(&self) -> Result<Option<Raster<u8>>> {
        match self.offsets.vegetation {
            Some(offset) => self.grey(offset, self.dimensions.quarter_size()).map(Some),
            None => Ok(None),
        }
    }

    /// The compressed minimap bytes, mip chain included.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the section lies past the end of the file.
    pub fn read_minimap(&self) -> Result<&[u8]> {
        self.section(self.offsets.minimap, MINIMAP_SIZE)
    }

    /// The tile-index raster following the tile table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the raster lies past the end of the file.
    pub fn read_tile_indices(&self) -> Result<Raster<u32>> {
        let (width, height) = self.dimensions.quarter_size();
        let shape = RasterShape::new(width, height, 1);
        let bytes = self
            .file
            .data_slice(self.tile_index_start, shape.sample_count() * 4)?;
        Raster::from_le_bytes(shape, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::{extraheader::VEGETATION_TAG, header::ATLAS_MAGIC},
        test::{build_container, temp_path, ContainerSpec},
        Error,
    };

    #[test]
    fn load_minimal() {
        let spec = ContainerSpec::new(1, 1);
        let map = MapFile::from_mem(build_container(&spec)).unwrap();

        assert_eq!(map.dimensions(), Dimensions::new(1, 1).unwrap());
        assert_eq!(map.header().id, spec.id);
        assert_eq!(map.offsets().elevation, 80);
        assert!(map.extra_headers().is_empty());
        assert!(map.tiles().is_empty());
        assert!(map.features().is_empty());
        assert!(!map.diagnostics().has_any());
    }

    #[test]
    fn sections_are_readable() {
        let spec = ContainerSpec::new(1, 2).with_vegetation().with_tile("t.smt", 4);
        let map = MapFile::from_mem(build_container(&spec)).unwrap();

        let elevation = map.read_elevation().unwrap();
        assert_eq!((elevation.width(), elevation.height()), (65, 129));
        assert_eq!(elevation.data()[0], spec.elevation_fill);

        assert_eq!(map.read_surface().unwrap().data()[0], spec.surface_fill);
        assert_eq!(map.read_resource().unwrap().data()[0], spec.resource_fill);
        assert_eq!(map.read_minimap().unwrap().len(), MINIMAP_SIZE);
        assert!(map.extra_headers().has(VEGETATION_TAG));
        assert_eq!(
            map.read_vegetation().unwrap().unwrap().data()[0],
            spec.vegetation_fill
        );

        let indices = map.read_tile_indices().unwrap();
        assert_eq!((indices.width(), indices.height()), (16, 32));
        assert_eq!(indices.data()[17], 17);
        assert_eq!(map.tiles().iter().next().unwrap().name, "t.smt");
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut data = build_container(&ContainerSpec::new(1, 1));
        data[..16].copy_from_slice(ATLAS_MAGIC);
        assert!(matches!(MapFile::from_mem(data), Err(Error::InvalidMagic)));
    }

    #[test]
    fn rejects_truncated_tile_table() {
        let spec = ContainerSpec::new(1, 1);
        let data = build_container(&spec);
        let offsets = MapFile::from_mem(data.clone()).unwrap().offsets().tile_index as usize;

        let result = MapFile::from_mem(data[..offsets + 4].to_vec());
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn non_standard_header_policy() {
        let mut data = build_container(&ContainerSpec::new(1, 1));
        data[16..20].copy_from_slice(&2i32.to_le_bytes());

        let map = MapFile::from_mem(data.clone()).unwrap();
        assert_eq!(map.diagnostics().by_category(DiagnosticCategory::Header).len(), 1);

        let file = File::from_mem(data).unwrap();
        let strict = MapFile::load(file, None, &MapConfig::strict(), Arc::new(Diagnostics::new()));
        assert!(matches!(strict, Err(Error::Malformed { .. })));
    }

    #[test]
    fn truncated_features_are_soft() {
        let spec = ContainerSpec::new(1, 1).with_feature("tree", 1.0, 2.0);
        let mut data = build_container(&spec);
        data.truncate(data.len() - 10);

        let map = MapFile::from_mem(data).unwrap();
        assert!(map.features().is_empty());
        assert!(map.diagnostics().has_warnings());
    }

    #[test]
    fn magic_probe() {
        let path = temp_path("mapfile_magic_probe.smf");
        std::fs::write(&path, build_container(&ContainerSpec::new(1, 1))).unwrap();
        assert!(MapFile::is_map_file(&path));
        assert_eq!(MapFile::from_file(&path).unwrap().path(), Some(path.as_path()));

        std::fs::write(&path, b"short").unwrap();
        assert!(!MapFile::is_map_file(&path));
        assert!(!MapFile::is_map_file(Path::new("/nonexistent/map.smf")));

        let _ = std::fs::remove_file(&path);
    }
}
