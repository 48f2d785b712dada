use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// smfkit - inspect, build and extract Spring map containers
#[derive(Debug, Parser)]
#[command(name = "smfkit", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared across all subcommands.
#[derive(Debug, Parser)]
pub struct GlobalOptions {
    /// Emit output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Display container overview: size, heights, offsets, extra headers, tiles, features.
    Info {
        /// Path to the map container.
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Create or update a container and save it in place.
    Build(BuildArgs),

    /// Write sections of a container out as images and feature lists.
    Extract {
        /// Path to the map container.
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Output file prefix (default: the container path without extension).
        #[arg(short, long, value_name = "PREFIX")]
        output: Option<PathBuf>,

        /// Comma-separated sections: height, type, minimap, metal, grass, tileindex,
        /// featurelist, or all.
        #[arg(long, value_name = "LIST", default_value = "all")]
        sections: String,

        /// Write the feature list as Lua instead of CSV.
        #[arg(long)]
        lua: bool,
    },
}

/// Arguments of `smfkit build`.
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Container to create or update.
    #[arg(short, long, value_name = "FILE")]
    pub file: PathBuf,

    /// Map size in units of 64 elevation squares, e.g. 8x8.
    #[arg(long, value_name = "WxL")]
    pub mapsize: Option<String>,

    /// Elevation that the lowest sample maps to, in map units.
    #[arg(long, value_name = "F", allow_hyphen_values = true)]
    pub floor: Option<f32>,

    /// Elevation that the highest sample maps to, in map units.
    #[arg(long, value_name = "C", allow_hyphen_values = true)]
    pub ceiling: Option<f32>,

    /// Elevation source (container or image).
    #[arg(long, value_name = "PATH")]
    pub height: Option<PathBuf>,

    /// Surface class source.
    #[arg(long = "type", value_name = "PATH")]
    pub surface: Option<PathBuf>,

    /// Tile index source.
    #[arg(long = "map", value_name = "PATH")]
    pub tile_index: Option<PathBuf>,

    /// Minimap source.
    #[arg(long, value_name = "PATH")]
    pub mini: Option<PathBuf>,

    /// Resource density source.
    #[arg(long, value_name = "PATH")]
    pub metal: Option<PathBuf>,

    /// Vegetation density source; adds the vegetation section.
    #[arg(long, value_name = "PATH", conflicts_with = "no_grass")]
    pub grass: Option<PathBuf>,

    /// Remove the vegetation section.
    #[arg(long)]
    pub no_grass: bool,

    /// Feature list source (container or CSV).
    #[arg(long, value_name = "PATH")]
    pub features: Option<PathBuf>,

    /// Invert elevation samples.
    #[arg(long)]
    pub invert: bool,

    /// Use the slower, higher quality minimap compression.
    #[arg(long)]
    pub slow_dxt1: bool,

    /// Tile atlases to reference; replaces the current list.
    #[arg(value_name = "TILEFILES")]
    pub tile_files: Vec<PathBuf>,
}
