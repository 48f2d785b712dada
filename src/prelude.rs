//! # smfkit Prelude
//!
//! The types needed to open, edit, save and extract map containers in one import.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all smfkit operations
pub use crate::Error;

/// The result type used throughout smfkit
pub use crate::Result;

/// Load and save settings
pub use crate::MapConfig;

// ================================================================================================
// Documents
// ================================================================================================

/// Editable container and its lifecycle
pub use crate::{DocumentState, ExtractReport, FeatureFormat, MapDocument};

/// Read-only container view
pub use crate::MapFile;

// ================================================================================================
// Layout and Records
// ================================================================================================

pub use crate::format::{
    extraheader::{ExtraHeader, ExtraHeaderChain, VegetationHeader},
    layout::{recalculate, Dimensions, Offsets, MINIMAP_SIZE},
    tiles::{TileReference, TileTable},
};

pub use crate::{Feature, FeatureList, Name};

// ================================================================================================
// Sections and Rasters
// ================================================================================================

pub use crate::sections::{SectionCodec, SectionKind, SectionSet, SectionSource};

pub use crate::raster::{
    BlockCompressor, DynRaster, Dxt1Compressor, ImageCodec, Quality, Raster, RasterCodec,
    RasterShape, SampleFormat,
};

// ================================================================================================
// Diagnostics
// ================================================================================================

pub use crate::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
