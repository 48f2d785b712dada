//! On-disk records of a map container.
//!
//! A container is a fixed [`header::Header`], an [`extraheader::ExtraHeaderChain`], and a
//! run of sections whose offsets are derived by [`layout::recalculate`]:
//!
//! ```text
//! 0    80          80+E
//! ┌────┬───────────┬───────────┬─────────┬─────────┬──────────┬────────────┬────────────┬──────────┐
//! │hdr │ extra hdrs│ elevation │ surface │ minimap │ resource │ vegetation?│ tile table │ features │
//! └────┴───────────┴───────────┴─────────┴─────────┴──────────┴────────────┴────────────┴──────────┘
//! ```
//!
//! Sections are contiguous; the tile table is followed directly by its index raster.
//! [`mapfile::MapFile`] reads all of this back from bytes without keeping any section
//! decoded.

pub mod extraheader;
pub mod features;
pub mod header;
pub mod layout;
pub mod mapfile;
pub mod name;
pub mod tiles;
