//! The editable map document.
//!
//! [`MapDocument`] owns everything needed to write a container: the header values, the extra
//! header chain, the tile table, the feature list and one [`SectionSource`] per raster
//! section. Raster content is never held between calls; it is re-acquired from the sources
//! on every [`MapDocument::save`].
//!
//! # Lifecycle
//!
//! ```text
//!  create ──► Fresh ──┐
//!                     ├── mutation ──► Dirty ── save ──► Saved ── mutation ──► Dirty ...
//!  open ───► Loaded ──┘
//! ```
//!
//! A loaded document reports the offsets recorded in its file until the first
//! [`MapDocument::recalculate`]. Saving always recalculates.
//!
//! # Examples
//!
//! ```rust,no_run
//! use smfkit::{MapDocument, SectionKind, SectionSource};
//!
//! let mut document = MapDocument::create(8, 8)?;
//! document.set_height_range(-50.0, 400.0);
//! document.set_source(SectionKind::Elevation, SectionSource::Path("height.png".into()))?;
//! document.enable_vegetation();
//! document.add_tile_file("maps/duel.smt".as_ref())?;
//! document.save("maps/duel.smf".as_ref())?;
//! # Ok::<(), smfkit::Error>(())
//! ```
//!
//! # Failure during save
//!
//! Sections are written one after another into the destination file. If writing fails part
//! way, the file is left with some sections from this save and some from before (or none);
//! the error is returned and no attempt is made to repair the file. Only when the destination
//! is itself one of the sources is the output staged in a sibling `.partial` file and renamed
//! into place after the last section.

use std::{
    collections::HashMap,
    fmt,
    fs,
    io::{BufWriter, Seek, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use rand::Rng;

use crate::{
    config::MapConfig,
    diagnostics::{DiagnosticCategory, Diagnostics},
    format::{
        extraheader::{ExtraHeader, ExtraHeaderChain, VEGETATION_TAG},
        features::{Feature, FeatureList},
        header::{Header, HEADER_SIZE, HEIGHT_SCALE},
        layout::{recalculate, Dimensions, Offsets, MINIMAP_DIMENSION},
        mapfile::MapFile,
        name::Name,
        tiles::{probe_atlas, TileTable},
    },
    raster::{
        dxt1::decode_dxt1, BlockCompressor, DynRaster, Dxt1Compressor, ImageCodec, RasterCodec,
        Sample,
    },
    sections::{
        produce, ElevationCodec, MinimapCodec, ResourceCodec, SectionCodec, SectionContext,
        SectionKind, SectionSet, SectionSource, SurfaceCodec, TileIndexCodec, VegetationCodec,
    },
    Error, Result,
};

/// Where a document is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// Created in memory, never saved
    Fresh,
    /// Opened from an existing container, unchanged
    Loaded,
    /// Changed since it was created, opened or saved
    Dirty,
    /// Written and unchanged since
    Saved,
}

/// Text format for exported feature lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureFormat {
    /// `name,x,y,z,rotation,scale` lines
    #[default]
    Csv,
    /// Lua table entries
    Lua,
}

impl FeatureFormat {
    /// File extension for this format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            FeatureFormat::Csv => "csv",
            FeatureFormat::Lua => "lua",
        }
    }
}

/// Outcome of [`MapDocument::extract`].
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Files written
    pub written: Vec<PathBuf>,
    /// Sections skipped because the container has nothing to extract
    pub skipped: Vec<(SectionKind, String)>,
    /// Sections that could not be extracted
    pub failed: Vec<(SectionKind, String)>,
}

impl ExtractReport {
    /// Returns `true` if no section failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// An editable map container.
pub struct MapDocument {
    id: i32,
    dimensions: Dimensions,
    floor: f32,
    ceiling: f32,
    extra_headers: ExtraHeaderChain,
    tiles: TileTable,
    features: FeatureList,
    sources: HashMap<SectionKind, SectionSource>,
    offsets: Offsets,
    state: DocumentState,
    origin: Option<PathBuf>,
    config: MapConfig,
    codec: Box<dyn RasterCodec>,
    compressor: Box<dyn BlockCompressor>,
    diagnostics: Arc<Diagnostics>,
}

impl MapDocument {
    /// Create an empty document of `width` x `length` user units.
    ///
    /// Every section starts out with default content and offsets are computed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] or [`Error::LayoutOverflow`] for unusable sizes.
    pub fn create(width: u32, length: u32) -> Result<MapDocument> {
        let dimensions = Dimensions::new(width, length)?;
        let extra_headers = ExtraHeaderChain::new();
        let tiles = TileTable::new();
        let offsets = recalculate(dimensions, &extra_headers, &tiles)?;

        Ok(MapDocument {
            id: rand::thread_rng().gen(),
            dimensions,
            floor: 0.0,
            ceiling: 0.0,
            extra_headers,
            tiles,
            features: FeatureList::new(),
            sources: HashMap::new(),
            offsets,
            state: DocumentState::Fresh,
            origin: None,
            config: MapConfig::default(),
            codec: Box::new(ImageCodec),
            compressor: Box::new(Dxt1Compressor),
            diagnostics: Arc::new(Diagnostics::new()),
        })
    }

    /// Open an existing container with the default configuration.
    ///
    /// Every raster section present in the file uses the file itself as its source, so
    /// saving without changes reproduces it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMagic`] if the file is not a map container,
    /// [`Error::Malformed`] if it is damaged beyond soft recovery, or [`Error::FileError`].
    pub fn open(path: impl AsRef<Path>) -> Result<MapDocument> {
        Self::open_with(path, MapConfig::default())
    }

    /// Open an existing container with `config`.
    ///
    /// # Errors
    ///
    /// See [`MapDocument::open`].
    pub fn open_with(path: impl AsRef<Path>, config: MapConfig) -> Result<MapDocument> {
        let path = path.as_ref();
        let diagnostics = Arc::new(Diagnostics::new());
        let map = MapFile::open(path, &config, diagnostics.clone())?;

        let mut sources = HashMap::new();
        for kind in [
            SectionKind::Elevation,
            SectionKind::Surface,
            SectionKind::Minimap,
            SectionKind::Resource,
            SectionKind::TileIndex,
        ] {
            sources.insert(kind, SectionSource::Path(path.to_path_buf()));
        }
        if map.extra_headers().has(VEGETATION_TAG) {
            sources.insert(
                SectionKind::Vegetation,
                SectionSource::Path(path.to_path_buf()),
            );
        }

        let header = map.header();
        Ok(MapDocument {
            id: header.id,
            dimensions: map.dimensions(),
            floor: header.floor,
            ceiling: header.ceiling,
            extra_headers: map.extra_headers().clone(),
            tiles: map.tiles().clone(),
            features: map.features().clone(),
            sources,
            offsets: *map.offsets(),
            state: DocumentState::Loaded,
            origin: Some(path.to_path_buf()),
            config,
            codec: Box::new(ImageCodec),
            compressor: Box::new(Dxt1Compressor),
            diagnostics,
        })
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: MapConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the raster codec service.
    #[must_use]
    pub fn with_raster_codec(mut self, codec: Box<dyn RasterCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the block compressor service.
    #[must_use]
    pub fn with_block_compressor(mut self, compressor: Box<dyn BlockCompressor>) -> Self {
        self.compressor = compressor;
        self
    }

    /// Document identifier written to the header.
    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Draw a new random document identifier.
    pub fn regenerate_id(&mut self) {
        self.id = rand::thread_rng().gen();
        self.touch();
    }

    /// Map size in user units.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Elevation that sample 0 maps to, in user units.
    #[must_use]
    pub fn floor(&self) -> f32 {
        self.floor / HEIGHT_SCALE
    }

    /// Elevation that sample 65535 maps to, in user units.
    #[must_use]
    pub fn ceiling(&self) -> f32 {
        self.ceiling / HEIGHT_SCALE
    }

    /// Offsets as of the last [`MapDocument::recalculate`], or as loaded.
    #[must_use]
    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DocumentState {
        self.state
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

    /// The feature list.
    #[must_use]
    pub fn features(&self) -> &FeatureList {
        &self.features
    }

    /// Source of a raster section.
    #[must_use]
    pub fn source(&self, kind: SectionKind) -> &SectionSource {
        static SYNTHESIZE: SectionSource = SectionSource::Synthesize;
        self.sources.get(&kind).unwrap_or(&SYNTHESIZE)
    }

    /// The container this document was opened from.
    #[must_use]
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Everything reported while loading, saving and extracting.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns `true` if the document carries a vegetation section.
    #[must_use]
    pub fn has_vegetation(&self) -> bool {
        self.extra_headers.has(VEGETATION_TAG)
    }

    fn touch(&mut self) {
        self.state = DocumentState::Dirty;
    }

    /// Change the map size.
    ///
    /// Sources are resampled to the new size when saved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] for a zero or oversized side; the document is
    /// unchanged.
    pub fn set_dimensions(&mut self, width: u32, length: u32) -> Result<()> {
        self.dimensions = Dimensions::new(width, length)?;
        self.touch();
        Ok(())
    }

    /// Set the elevations, in user units, that samples 0 and 65535 map to.
    ///
    /// The header stores both scaled by [`HEIGHT_SCALE`].
    pub fn set_height_range(&mut self, floor: f32, ceiling: f32) {
        self.floor = floor * HEIGHT_SCALE;
        self.ceiling = ceiling * HEIGHT_SCALE;
        self.touch();
    }

    /// Set where a raster section's content comes from.
    ///
    /// Naming a vegetation source enables the vegetation section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Error`] for [`SectionKind::Features`], which is not a raster; use
    /// [`MapDocument::import_features`] instead.
    pub fn set_source(&mut self, kind: SectionKind, source: SectionSource) -> Result<()> {
        if kind == SectionKind::Features {
            return Err(Error::Error(
                "the feature list has no raster source; import features instead".to_string(),
            ));
        }

        if kind == SectionKind::Vegetation {
            self.enable_vegetation();
        }
        self.sources.insert(kind, source);
        self.touch();
        Ok(())
    }

    /// Reset a section to default content.
    pub fn clear_source(&mut self, kind: SectionKind) {
        if self.sources.remove(&kind).is_some() {
            self.touch();
        }
    }

    /// Add the vegetation extra header and section, if not already present.
    pub fn enable_vegetation(&mut self) {
        if !self.has_vegetation() {
            self.extra_headers.find_or_create(VEGETATION_TAG);
            self.touch();
        }
    }

    /// Remove the vegetation extra header and section.
    pub fn disable_vegetation(&mut self) {
        if self.extra_headers.remove(VEGETATION_TAG) {
            self.sources.remove(&SectionKind::Vegetation);
            self.touch();
        }
    }

    /// Reference a tile atlas, reading its tile count from the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTileReference`] if the file is not a tile atlas; nothing is
    /// appended in that case.
    pub fn add_tile_file(&mut self, path: &Path) -> Result<()> {
        let reference = probe_atlas(path)?;
        log::debug!("referencing {} with {} tiles", reference.name, reference.count);
        self.add_tile_reference(reference.name, reference.count)
    }

    /// Reference a tile atlas by name without opening it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTileReference`] if the name cannot be stored.
    pub fn add_tile_reference(&mut self, name: impl Into<Name>, count: u32) -> Result<()> {
        self.tiles.push(name, count)?;
        self.touch();
        Ok(())
    }

    /// Remove every tile atlas reference.
    pub fn clear_tile_files(&mut self) {
        self.tiles.clear();
        self.touch();
    }

    /// Index of a feature type name, adding it if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the name cannot be stored.
    pub fn add_feature_type(&mut self, name: impl Into<Name>) -> Result<u32> {
        let index = self.features.add_type(name)?;
        self.touch();
        Ok(index)
    }

    /// Place a feature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFeatureType`] if its type index has no name.
    pub fn add_feature(&mut self, feature: Feature) -> Result<()> {
        self.features.push(feature)?;
        self.touch();
        Ok(())
    }

    /// Replace the feature list with one read from another container or a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed; the current list is kept.
    pub fn import_features(&mut self, path: &Path) -> Result<()> {
        let features = if MapFile::is_map_file(path) {
            MapFile::open(path, &self.config, self.diagnostics.clone())?
                .features()
                .clone()
        } else {
            FeatureList::from_csv(&fs::read_to_string(path)?)?
        };

        log::debug!(
            "imported {} features of {} types from {}",
            features.features().len(),
            features.types().len(),
            path.display()
        );
        self.features = features;
        self.touch();
        Ok(())
    }

    /// Write the current feature list as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] if the file cannot be written.
    pub fn export_features(&self, path: &Path, format: FeatureFormat) -> Result<()> {
        let text = match format {
            FeatureFormat::Csv => self.features.to_csv(),
            FeatureFormat::Lua => self.features.to_lua(),
        };
        fs::write(path, text)?;
        Ok(())
    }

    /// Recompute every section offset from the current dimensions, extra headers and tile
    /// table, and store the result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LayoutOverflow`] if the container would exceed 32-bit offsets.
    pub fn recalculate(&mut self) -> Result<&Offsets> {
        let offsets = recalculate(self.dimensions, &self.extra_headers, &self.tiles)?;
        if let Some(vegetation) = offsets.vegetation {
            self.extra_headers.set_vegetation_offset(vegetation);
        }
        self.offsets = offsets;
        Ok(&self.offsets)
    }

    fn header(&self) -> Result<Header> {
        let (width, length) = self.dimensions.internal();
        let field = |offset: u32| i32::try_from(offset).map_err(|_| Error::LayoutOverflow);

        Ok(Header {
            id: self.id,
            width,
            length,
            floor: self.floor,
            ceiling: self.ceiling,
            elevation_offset: field(self.offsets.elevation)?,
            surface_offset: field(self.offsets.surface)?,
            tile_index_offset: field(self.offsets.tile_index)?,
            minimap_offset: field(self.offsets.minimap)?,
            resource_offset: field(self.offsets.resource)?,
            feature_offset: field(self.offsets.features)?,
            extra_header_count: i32::try_from(self.extra_headers.len())
                .map_err(|_| Error::LayoutOverflow)?,
            ..Header::default()
        })
    }

    /// Write the container to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContractViolation`] if a section's content does not match its
    /// reserved size, [`Error::LayoutOverflow`] for oversized layouts, or
    /// [`Error::FileError`] on I/O failure (see the module documentation for what that
    /// leaves on disk).
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let staged = self.reads_from(path);
        let target = if staged {
            let mut name = path.as_os_str().to_owned();
            name.push(".partial");
            PathBuf::from(name)
        } else {
            path.to_path_buf()
        };

        let file = fs::File::create(&target)?;
        let result = self.save_to(BufWriter::new(file)).and_then(|mut writer| {
            writer.flush()?;
            Ok(())
        });

        match result {
            Ok(()) if staged => fs::rename(&target, path)?,
            Ok(()) => {}
            Err(error) => {
                if staged {
                    let _ = fs::remove_file(&target);
                }
                return Err(error);
            }
        }

        log::info!(
            "saved {}x{} map to {}",
            self.dimensions.width,
            self.dimensions.length,
            path.display()
        );
        Ok(())
    }

    /// Returns `true` if any section source is the file at `path`.
    fn reads_from(&self, path: &Path) -> bool {
        let Ok(destination) = fs::canonicalize(path) else {
            return false;
        };

        self.sources.values().any(|source| match source {
            SectionSource::Path(source) => {
                fs::canonicalize(source).is_ok_and(|source| source == destination)
            }
            SectionSource::Synthesize => false,
        })
    }

    /// Write the container to any seekable output, returning it.
    ///
    /// # Errors
    ///
    /// See [`MapDocument::save`].
    pub fn save_to<W: Write + Seek>(&mut self, output: W) -> Result<W> {
        self.recalculate()?;
        let offsets = self.offsets;
        let header = self.header()?;

        let mut writer = crate::file::writer::MapWriter::new(output);
        header.write(&mut writer)?;
        self.extra_headers.write(&mut writer)?;
        expect_position(&writer, HEADER_SIZE + self.extra_headers.total_size(), "extra headers")?;

        let context = SectionContext {
            dimensions: self.dimensions,
            config: &self.config,
            codec: self.codec.as_ref(),
            compressor: self.compressor.as_ref(),
            diagnostics: &self.diagnostics,
        };

        self.write_section::<ElevationCodec, W>(&mut writer, offsets.elevation, &context)?;
        self.write_section::<SurfaceCodec, W>(&mut writer, offsets.surface, &context)?;
        self.write_section::<MinimapCodec, W>(&mut writer, offsets.minimap, &context)?;
        self.write_section::<ResourceCodec, W>(&mut writer, offsets.resource, &context)?;
        if let Some(vegetation) = offsets.vegetation {
            self.write_section::<VegetationCodec, W>(&mut writer, vegetation, &context)?;
        }

        writer.seek_to(u64::from(offsets.tile_index))?;
        self.tiles.write(&mut writer)?;
        let raster_start = offsets.tile_index as usize + self.tiles.encoded_size();
        self.write_section::<TileIndexCodec, W>(&mut writer, raster_start as u32, &context)?;

        log::debug!(
            "saving features at offset {}: {} features, {} types",
            offsets.features,
            self.features.features().len(),
            self.features.types().len()
        );
        writer.seek_to(u64::from(offsets.features))?;
        self.features.write(&mut writer)?;
        expect_position(
            &writer,
            offsets.features as usize + self.features.encoded_size(),
            "features",
        )?;

        let output = writer.into_inner()?;
        self.state = DocumentState::Saved;
        Ok(output)
    }

    fn write_section<C: SectionCodec, W: Write + Seek>(
        &self,
        writer: &mut crate::file::writer::MapWriter<W>,
        offset: u32,
        context: &SectionContext,
    ) -> Result<()> {
        let source = self.source(C::KIND);
        log::debug!("saving {} at offset {} from {}", C::KIND, offset, source);

        let bytes = produce::<C>(source, context)?;
        writer.seek_to(u64::from(offset))?;
        writer.write_bytes(&bytes)?;
        expect_position(
            writer,
            offset as usize + C::section_size(self.dimensions),
            &C::KIND.to_string(),
        )
    }

    /// Write selected sections of the origin container to individual files named
    /// `<prefix>_<section>.<ext>`.
    ///
    /// Raster sections are read verbatim from the origin file, not from this document's
    /// sources. A section that cannot be written is reported and the others are still
    /// extracted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoOrigin`] for a document that was not opened from a file, or an
    /// error if the origin can no longer be read.
    pub fn extract(
        &self,
        prefix: &Path,
        sections: SectionSet,
        feature_format: FeatureFormat,
    ) -> Result<ExtractReport> {
        let origin = self.origin.as_deref().ok_or(Error::NoOrigin)?;
        let map = MapFile::open(origin, &self.config, self.diagnostics.clone())?;
        let mut report = ExtractReport::default();

        for kind in sections.kinds() {
            let extension = match kind {
                SectionKind::Features => feature_format.extension(),
                _ => "png",
            };
            let mut name = prefix.as_os_str().to_owned();
            name.push(format!("_{}.{}", kind.file_suffix(), extension));
            let path = PathBuf::from(name);

            match self.extract_section(&map, kind, &path, feature_format) {
                Ok(true) => {
                    log::info!("extracted {} to {}", kind, path.display());
                    report.written.push(path);
                }
                Ok(false) => {
                    let reason = format!("container has no {kind} data");
                    self.diagnostics.info(DiagnosticCategory::Section, reason.clone());
                    report.skipped.push((kind, reason));
                }
                Err(error) => {
                    self.diagnostics.error(
                        DiagnosticCategory::Section,
                        format!("extracting {kind} failed: {error}"),
                    );
                    report.failed.push((kind, error.to_string()));
                }
            }
        }

        Ok(report)
    }

    fn extract_section(
        &self,
        map: &MapFile,
        kind: SectionKind,
        path: &Path,
        feature_format: FeatureFormat,
    ) -> Result<bool> {
        let raster = match kind {
            SectionKind::Elevation => DynRaster::U16(map.read_elevation()?),
            SectionKind::Surface => DynRaster::U8(map.read_surface()?),
            SectionKind::Minimap => {
                DynRaster::U8(decode_dxt1(map.read_minimap()?, MINIMAP_DIMENSION)?)
            }
            SectionKind::Resource => DynRaster::U8(map.read_resource()?),
            SectionKind::Vegetation => match map.read_vegetation()? {
                Some(raster) => DynRaster::U8(raster),
                None => return Ok(false),
            },
            SectionKind::TileIndex => u32::to_dyn(map.read_tile_indices()?)?,
            SectionKind::Features => {
                if map.features().features().is_empty() {
                    return Ok(false);
                }
                let text = match feature_format {
                    FeatureFormat::Csv => map.features().to_csv(),
                    FeatureFormat::Lua => map.features().to_lua(),
                };
                fs::write(path, text)?;
                return Ok(true);
            }
        };

        self.codec.encode(path, &raster)?;
        Ok(true)
    }
}

fn expect_position<W: Write + Seek>(
    writer: &crate::file::writer::MapWriter<W>,
    expected: usize,
    what: &str,
) -> Result<()> {
    if writer.position() != expected as u64 {
        return Err(Error::ContractViolation(format!(
            "{what} ended at {}, layout expects {expected}",
            writer.position()
        )));
    }
    Ok(())
}

impl fmt::Display for MapDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, length) = self.dimensions.internal();
        writeln!(f, "Map")?;
        if let Some(origin) = &self.origin {
            writeln!(f, "  File:        {}", origin.display())?;
        }
        writeln!(f, "  ID:          {}", self.id)?;
        writeln!(
            f,
            "  Size:        {}x{} ({}x{} internal)",
            self.dimensions.width, self.dimensions.length, width, length
        )?;
        writeln!(f, "  Heights:     {} to {}", self.floor(), self.ceiling())?;

        writeln!(f, "Offsets")?;
        writeln!(f, "  Elevation:   {}", self.offsets.elevation)?;
        writeln!(f, "  Surface:     {}", self.offsets.surface)?;
        writeln!(f, "  Minimap:     {}", self.offsets.minimap)?;
        writeln!(f, "  Resource:    {}", self.offsets.resource)?;
        if let Some(vegetation) = self.offsets.vegetation {
            writeln!(f, "  Vegetation:  {}", vegetation)?;
        }
        writeln!(f, "  Tiles:       {}", self.offsets.tile_index)?;
        writeln!(f, "  Features:    {}", self.offsets.features)?;

        writeln!(f, "Extra headers: {}", self.extra_headers.len())?;
        for record in self.extra_headers.iter() {
            match record {
                ExtraHeader::Vegetation(vegetation) => writeln!(
                    f,
                    "  vegetation (offset {})",
                    vegetation
                        .offset
                        .map_or_else(|| "unset".to_string(), |offset| offset.to_string())
                )?,
                ExtraHeader::Opaque { tag, payload } => {
                    writeln!(f, "  tag {} ({} bytes, preserved)", tag, payload.len() + 8)?
                }
            }
        }

        writeln!(
            f,
            "Tile files: {} ({} tiles)",
            self.tiles.len(),
            self.tiles.total_tiles()
        )?;
        for file in self.tiles.iter() {
            writeln!(f, "  {:>6}  {}", file.count, file.name)?;
        }

        write!(
            f,
            "Features: {} of {} types",
            self.features.features().len(),
            self.features.types().len()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::test::{build_container, temp_path, write_atlas, ContainerSpec};

    #[test]
    fn create_computes_offsets() {
        let document = MapDocument::create(2, 2).unwrap();

        assert_eq!(document.state(), DocumentState::Fresh);
        assert_eq!(document.offsets().elevation, 80);
        assert!(!document.has_vegetation());
        assert!(matches!(
            MapDocument::create(0, 2),
            Err(Error::InvalidDimensions { width: 0, length: 2 })
        ));
    }

    #[test]
    fn mutations_mark_dirty() {
        let mut document = MapDocument::create(1, 1).unwrap();
        document.set_height_range(1.0, 2.0);
        assert_eq!(document.state(), DocumentState::Dirty);

        document.save_to(Cursor::new(Vec::new())).unwrap();
        assert_eq!(document.state(), DocumentState::Saved);

        document.enable_vegetation();
        assert_eq!(document.state(), DocumentState::Dirty);
    }

    #[test]
    fn in_memory_save_matches_layout() {
        let mut document = MapDocument::create(1, 1).unwrap();
        document.add_tile_reference("a.smt", 256).unwrap();
        let tree = document.add_feature_type("tree").unwrap();
        document
            .add_feature(Feature {
                type_index: tree,
                x: 1.0,
                ..Feature::default()
            })
            .unwrap();

        let data = document.save_to(Cursor::new(Vec::new())).unwrap().into_inner();
        let offsets = *document.offsets();

        assert_eq!(
            data.len(),
            offsets.features as usize + document.features().encoded_size()
        );

        let map = MapFile::from_mem(data).unwrap();
        assert_eq!(map.offsets(), &offsets);
        assert_eq!(map.header().id, document.id());
        assert_eq!(map.tiles(), document.tiles());
        assert_eq!(map.features(), document.features());
    }

    #[test]
    fn vegetation_source_enables_section() {
        let mut document = MapDocument::create(1, 1).unwrap();
        document
            .set_source(SectionKind::Vegetation, SectionSource::Synthesize)
            .unwrap();
        assert!(document.has_vegetation());

        document.recalculate().unwrap();
        assert!(document.offsets().vegetation.is_some());
        assert_eq!(
            document.extra_headers().vegetation().unwrap().offset,
            document.offsets().vegetation
        );

        document.disable_vegetation();
        document.recalculate().unwrap();
        assert!(document.offsets().vegetation.is_none());
    }

    #[test]
    fn features_have_no_raster_source() {
        let mut document = MapDocument::create(1, 1).unwrap();
        assert!(document
            .set_source(SectionKind::Features, SectionSource::Synthesize)
            .is_err());
    }

    #[test]
    fn add_tile_file_probes_atlas() {
        let atlas = temp_path("document_add_tile_file.smt");
        write_atlas(&atlas, 12);
        let mut document = MapDocument::create(1, 1).unwrap();

        document.add_tile_file(&atlas).unwrap();
        assert_eq!(document.tiles().total_tiles(), 12);

        assert!(document
            .add_tile_file(Path::new("/nonexistent/atlas.smt"))
            .is_err());
        assert_eq!(document.tiles().len(), 1);

        let _ = fs::remove_file(&atlas);
    }

    #[test]
    fn open_uses_file_as_sources() {
        let path = temp_path("document_open_sources.smf");
        fs::write(&path, build_container(&ContainerSpec::new(1, 1).with_vegetation())).unwrap();

        let document = MapDocument::open(&path).unwrap();
        assert_eq!(document.state(), DocumentState::Loaded);
        assert_eq!(document.id(), ContainerSpec::new(1, 1).id);
        assert_eq!(
            document.source(SectionKind::Vegetation),
            &SectionSource::Path(path.clone())
        );
        assert_eq!(document.floor(), -20.0);
        assert_eq!(document.ceiling(), 300.0);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn height_range_is_stored_scaled() {
        let mut document = MapDocument::create(1, 1).unwrap();
        document.set_height_range(1.0, -0.25);
        assert_eq!((document.floor(), document.ceiling()), (1.0, -0.25));

        let data = document.save_to(Cursor::new(Vec::new())).unwrap().into_inner();
        assert_eq!(&data[44..48], &512.0f32.to_le_bytes());
        assert_eq!(&data[48..52], &(-128.0f32).to_le_bytes());

        let map = MapFile::from_mem(data).unwrap();
        assert_eq!(map.header().floor, 512.0);
        assert_eq!(map.header().ceiling, -128.0);
    }

    #[test]
    fn extract_requires_origin() {
        let document = MapDocument::create(1, 1).unwrap();
        let result = document.extract(
            Path::new("/tmp/never"),
            SectionSet::all(),
            FeatureFormat::Csv,
        );
        assert!(matches!(result, Err(Error::NoOrigin)));
    }

    #[test]
    fn display_report() {
        let mut document = MapDocument::create(2, 3).unwrap();
        document.add_tile_reference("ground.smt", 40).unwrap();
        document.enable_vegetation();
        document.recalculate().unwrap();

        let report = document.to_string();
        assert!(report.contains("2x3 (128x192 internal)"));
        assert!(report.contains("Vegetation:"));
        assert!(report.contains("ground.smt"));
        assert!(report.ends_with("Features: 0 of 0 types"));
    }
}
