// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # smfkit
//!
//! Reading, editing and writing Spring RTS map containers (`.smf`).
//!
//! A map container is a single binary file holding a terrain description: a fixed header,
//! a chain of optional extra headers, a 16-bit elevation grid, surface classes, a
//! DXT1-compressed minimap, resource and vegetation density grids, a tile-index grid with
//! the list of tile atlases it refers to, and a list of placed features. `smfkit` computes
//! the byte layout of all of these from the map size, produces each section from whatever
//! source it was given (another container, an image file, or default content) and writes
//! the result in one pass.
//!
//! ## Features
//!
//! - **Layout allocation** - section offsets are a pure function of size, extra headers and
//!   tile table, and are checked against 32-bit header fields
//! - **Source resolution** - each section is taken from another container, an image, or
//!   synthesized, with channel remapping and nearest-neighbour resampling
//! - **Memory-mapped loading** - existing containers are read in place, sections are decoded
//!   on demand
//! - **Soft recovery** - damaged feature lists and unknown extra headers are reported through
//!   [`Diagnostics`] instead of failing the load
//! - **Extraction** - sections of an existing container are written back out as images and
//!   CSV or Lua feature lists
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smfkit::prelude::*;
//!
//! let mut document = MapDocument::create(8, 8)?;
//! document.set_height_range(-100.0, 500.0);
//! document.set_source(SectionKind::Elevation, SectionSource::Path("height.png".into()))?;
//! document.set_source(SectionKind::Minimap, SectionSource::Path("minimap.png".into()))?;
//! document.add_tile_file("duel.smt".as_ref())?;
//! document.save("duel.smf".as_ref())?;
//!
//! for diagnostic in document.diagnostics().iter() {
//!     println!("{diagnostic}");
//! }
//! # Ok::<(), smfkit::Error>(())
//! ```
//!
//! ### Inspecting a container
//!
//! ```rust,no_run
//! use smfkit::MapDocument;
//!
//! let document = MapDocument::open("duel.smf")?;
//! println!("{document}");
//! # Ok::<(), smfkit::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`](crate::File) - byte access, bounds-checked parsing and seek-then-write output
//! - [`format`] - header, extra headers, layout, tile table, feature list, read-only container
//! - [`raster`] - sample buffers, channel remapping, resampling, image and DXT1 services
//! - [`sections`] - per-section codecs and source resolution
//! - [`document`] - the editable [`MapDocument`]
//!
//! Saving is single-threaded and re-acquires every source; nothing is cached between saves.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use smfkit::prelude::*;
///
/// let document = MapDocument::open("duel.smf")?;
/// println!("{} tile files", document.tiles().len());
/// # Ok::<(), smfkit::Error>(())
/// ```
pub mod prelude;

/// Settings that change how documents are loaded and saved.
pub mod config;

/// Collection of non-fatal conditions found while loading, saving and extracting.
pub mod diagnostics;

/// The editable map document.
pub mod document;

/// On-disk records: header, extra headers, layout, tiles, features.
pub mod format;

/// Sample buffers and the external raster services.
pub mod raster;

/// Raster sections and how their content is produced.
pub mod sections;

/// `smfkit` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust,no_run
/// use smfkit::{MapDocument, Result};
///
/// fn load(path: &str) -> Result<MapDocument> {
///     MapDocument::open(path)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `smfkit` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust,no_run
/// use smfkit::{Error, MapDocument};
///
/// match MapDocument::open("duel.smf") {
///     Ok(document) => println!("{:?}", document.dimensions()),
///     Err(Error::InvalidMagic) => eprintln!("not a map container"),
///     Err(Error::Malformed { message, .. }) => eprintln!("damaged: {message}"),
///     Err(e) => eprintln!("error: {e}"),
/// }
/// ```
pub use error::Error;

/// The editable document and its companion types
pub use document::{DocumentState, ExtractReport, FeatureFormat, MapDocument};

/// Read-only view of an existing container
pub use format::mapfile::MapFile;

/// Layout types
pub use format::layout::{Dimensions, Offsets};

/// Feature records
pub use format::features::{Feature, FeatureList};

/// Raw table names
pub use format::name::Name;

/// Section selection and sources
pub use sections::{SectionKind, SectionSet, SectionSource};

/// Configuration
pub use config::MapConfig;

/// Diagnostics
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

/// Low-level byte access
///
/// # Examples
///
/// ```rust,no_run
/// use smfkit::Parser;
///
/// let data = [0x01, 0x00, 0x00, 0x00];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_le::<i32>()?, 1);
/// # Ok::<(), smfkit::Error>(())
/// ```
pub use file::{io::BinIO, parser::Parser, writer::MapWriter, File};
