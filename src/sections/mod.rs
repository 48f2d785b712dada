//! Raster sections and how their content is produced.
//!
//! Every raster section is produced the same way when a document is saved:
//!
//! 1. the section's [`SectionSource`] is turned into an ordered list of
//!    [`resolver::Strategy`] values (another container, an image file, synthesized default
//!    content) which are tried until one succeeds;
//! 2. a raster that came from elsewhere is normalised to the section's channel layout
//!    ([`crate::raster::channels`]) and pixel size ([`crate::raster::resample`]);
//! 3. the codec finishes the buffer (e.g. elevation inversion, minimap compression) and
//!    returns exactly the bytes the layout reserved for the section.
//!
//! Each section is described by a [`SectionCodec`] implementation in its own module.
//! Sources are re-acquired on every save and nothing is cached between sections.

pub mod elevation;
pub mod minimap;
pub mod resolver;
pub mod resource;
pub mod surface;
pub mod tileindex;
pub mod vegetation;

use std::{fmt, path::PathBuf};

use bitflags::bitflags;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{
    config::MapConfig,
    diagnostics::{DiagnosticCategory, Diagnostics},
    format::{layout::Dimensions, mapfile::MapFile},
    raster::{
        channels::{remap, ChannelRule},
        resample::nearest,
        BlockCompressor, Raster, RasterCodec, RasterShape, Sample,
    },
    Error, Result,
};

use resolver::{resolve, strategies, Acquired, Resolution, Strategy};

pub use elevation::ElevationCodec;
pub use minimap::MinimapCodec;
pub use resource::ResourceCodec;
pub use surface::SurfaceCodec;
pub use tileindex::TileIndexCodec;
pub use vegetation::VegetationCodec;

/// Sections of a container, in save order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum SectionKind {
    /// 16-bit elevation samples, one per vertex
    #[strum(to_string = "elevation", serialize = "height")]
    Elevation,
    /// 8-bit surface classes
    #[strum(to_string = "surface", serialize = "type")]
    Surface,
    /// Block-compressed overview image
    #[strum(to_string = "minimap", serialize = "mini")]
    Minimap,
    /// 8-bit resource density
    #[strum(to_string = "resource", serialize = "metal")]
    Resource,
    /// 8-bit vegetation density, optional
    #[strum(to_string = "vegetation", serialize = "grass")]
    Vegetation,
    /// Tile table and 32-bit tile indices
    #[strum(to_string = "tileindex", serialize = "tiles")]
    TileIndex,
    /// Placed objects
    #[strum(to_string = "features", serialize = "featurelist")]
    Features,
}

impl SectionKind {
    /// Suffix used for extracted files, following the names map tools conventionally use.
    #[must_use]
    pub fn file_suffix(&self) -> &'static str {
        match self {
            SectionKind::Elevation => "height",
            SectionKind::Surface => "type",
            SectionKind::Minimap => "minimap",
            SectionKind::Resource => "metal",
            SectionKind::Vegetation => "grass",
            SectionKind::TileIndex => "tileindex",
            SectionKind::Features => "featurelist",
        }
    }

    /// The single-member set for this kind.
    #[must_use]
    pub fn as_set(&self) -> SectionSet {
        match self {
            SectionKind::Elevation => SectionSet::ELEVATION,
            SectionKind::Surface => SectionSet::SURFACE,
            SectionKind::Minimap => SectionSet::MINIMAP,
            SectionKind::Resource => SectionSet::RESOURCE,
            SectionKind::Vegetation => SectionSet::VEGETATION,
            SectionKind::TileIndex => SectionSet::TILE_INDEX,
            SectionKind::Features => SectionSet::FEATURES,
        }
    }
}

bitflags! {
    /// A selection of sections, e.g. for extraction.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionSet: u8 {
        /// Elevation
        const ELEVATION = 1 << 0;
        /// Surface classes
        const SURFACE = 1 << 1;
        /// Minimap
        const MINIMAP = 1 << 2;
        /// Resource density
        const RESOURCE = 1 << 3;
        /// Vegetation density
        const VEGETATION = 1 << 4;
        /// Tile indices
        const TILE_INDEX = 1 << 5;
        /// Feature list
        const FEATURES = 1 << 6;
    }
}

impl SectionSet {
    /// Member kinds in save order.
    pub fn kinds(self) -> impl Iterator<Item = SectionKind> {
        SectionKind::iter().filter(move |kind| self.contains(kind.as_set()))
    }

    /// Parse a comma-separated list of section names, e.g. `"height,metal"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Error`] naming the first unknown section.
    pub fn parse_list(list: &str) -> Result<SectionSet> {
        let mut set = SectionSet::empty();
        for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            if name.eq_ignore_ascii_case("all") {
                set |= SectionSet::all();
                continue;
            }
            let kind: SectionKind = name
                .parse()
                .map_err(|_| Error::Error(format!("unknown section '{name}'")))?;
            set |= kind.as_set();
        }
        Ok(set)
    }
}

/// Where a section's content comes from when the document is saved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SectionSource {
    /// Synthesized default content.
    #[default]
    Synthesize,
    /// Another container of this format, or an image file.
    Path(PathBuf),
}

impl fmt::Display for SectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionSource::Synthesize => write!(f, "default content"),
            SectionSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Services and settings available while producing a section.
pub struct SectionContext<'a> {
    /// Target map size
    pub dimensions: Dimensions,
    /// Document configuration
    pub config: &'a MapConfig,
    /// Raster codec service
    pub codec: &'a dyn RasterCodec,
    /// Block compressor service
    pub compressor: &'a dyn BlockCompressor,
    /// Where fallbacks are reported
    pub diagnostics: &'a Diagnostics,
}

/// Description of one raster section.
pub trait SectionCodec {
    /// Sample type stored in the section.
    type Sample: Sample;

    /// Which section this codec produces.
    const KIND: SectionKind;

    /// Normalised raster shape for `dimensions`.
    fn shape(dimensions: Dimensions) -> RasterShape;

    /// One rule per destination channel.
    fn channel_rules() -> Vec<ChannelRule<Self::Sample>>;

    /// Remap image sources even when their channel count already matches.
    fn always_remap() -> bool {
        false
    }

    /// Default content.
    fn synthesize(dimensions: Dimensions) -> Raster<Self::Sample> {
        Raster::new(Self::shape(dimensions))
    }

    /// Read this section from another container, `None` if that container lacks it.
    ///
    /// # Errors
    ///
    /// Returns an error if the section cannot be read from the container.
    fn read_container(map: &MapFile) -> Result<Option<Acquired<Self::Sample>>>;

    /// Encode a normalised raster into the section's bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if an external service fails.
    fn encode(raster: Raster<Self::Sample>, _context: &SectionContext) -> Result<Vec<u8>> {
        Ok(raster.to_le_bytes())
    }

    /// Exact byte size of the section.
    fn section_size(dimensions: Dimensions) -> usize {
        Self::shape(dimensions).sample_count() * std::mem::size_of::<Self::Sample>()
    }
}

/// Produce the bytes of section `C` from `source`.
///
/// Strategies are tried in order; every decline is logged, and a named source that could
/// not be used at all is reported before falling back to default content.
///
/// # Errors
///
/// Returns [`Error::ContractViolation`] if the produced bytes differ from the size the
/// layout reserved, or any error from the section's encoder.
pub fn produce<C: SectionCodec>(
    source: &SectionSource,
    context: &SectionContext,
) -> Result<Vec<u8>> {
    let mut declined = Vec::new();
    let mut acquired = None;

    for &strategy in strategies(source) {
        match resolve::<C>(strategy, source, context) {
            Resolution::Acquired(found) => {
                log::debug!("{} acquired from {} via {:?}", C::KIND, source, strategy);
                acquired = Some((strategy, found));
                break;
            }
            Resolution::Declined(reason) => {
                log::debug!("{} source {} declined {:?}: {}", C::KIND, source, strategy, reason);
                declined.push(format!("{strategy:?}: {reason}"));
            }
        }
    }

    let (strategy, found) = match acquired {
        Some(acquired) => acquired,
        None => (
            Strategy::Synthesize,
            Acquired::Raster(C::synthesize(context.dimensions)),
        ),
    };

    if strategy == Strategy::Synthesize && matches!(source, SectionSource::Path(_)) {
        context.diagnostics.warning(
            DiagnosticCategory::Source,
            format!(
                "{} source {} unusable ({}); using default content",
                C::KIND,
                source,
                declined.join("; ")
            ),
        );
    }

    let bytes = match found {
        Acquired::Payload(bytes) => bytes,
        Acquired::Raster(raster) => {
            let normalised =
                normalise::<C>(raster, strategy == Strategy::Raster, context.dimensions);
            C::encode(normalised, context)?
        }
    };

    let expected = C::section_size(context.dimensions);
    if bytes.len() != expected {
        return Err(Error::ContractViolation(format!(
            "{} section produced {} bytes, layout reserves {}",
            C::KIND,
            bytes.len(),
            expected
        )));
    }

    Ok(bytes)
}

/// Bring a raster to the section's channel layout and size.
pub fn normalise<C: SectionCodec>(
    raster: Raster<C::Sample>,
    from_image: bool,
    dimensions: Dimensions,
) -> Raster<C::Sample> {
    let target = C::shape(dimensions);
    let rules = C::channel_rules();

    let raster = if raster.channels() != rules.len() || (from_image && C::always_remap()) {
        remap(&raster, &rules)
    } else {
        raster
    };

    if raster.shape().same_size(&target) {
        raster
    } else {
        nearest(&raster, target.width, target.height)
    }
}
