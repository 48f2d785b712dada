use anyhow::Context;
use serde::Serialize;
use smfkit::{MapConfig, MapDocument, MapFile, SectionKind, SectionSource};

use crate::{
    app::{BuildArgs, GlobalOptions},
    commands::common::{file_display_name, load_document, parse_map_size},
    output::{collect_diagnostics, print_diagnostics, print_output, DiagnosticInfo},
};

/// Size of a newly created map when `--mapsize` is not given.
const DEFAULT_SIZE: (u32, u32) = (2, 2);

#[derive(Debug, Serialize)]
pub struct BuildResult {
    pub file: String,
    pub created: bool,
    pub width: u32,
    pub length: u32,
    pub vegetation: bool,
    pub tile_files: usize,
    pub features: usize,
    pub bytes: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<DiagnosticInfo>,
}

pub fn run(args: &BuildArgs, opts: &GlobalOptions) -> anyhow::Result<()> {
    let mut config = MapConfig::default().with_invert_elevation(args.invert);
    if args.slow_dxt1 {
        config.minimap_quality = MapConfig::quality().minimap_quality;
    }

    let size = args.mapsize.as_deref().map(parse_map_size).transpose()?;
    let created = !MapFile::is_map_file(&args.file);

    let mut document = if created {
        let (width, length) = size.unwrap_or(DEFAULT_SIZE);
        log::info!("creating {}x{} map {}", width, length, args.file.display());
        MapDocument::create(width, length)
            .context("invalid map size")?
            .with_config(config)
    } else {
        let mut document = load_document(&args.file, config)?;
        if let Some((width, length)) = size {
            document
                .set_dimensions(width, length)
                .context("invalid map size")?;
        }
        document
    };

    if args.floor.is_some() || args.ceiling.is_some() {
        document.set_height_range(
            args.floor.unwrap_or(document.floor()),
            args.ceiling.unwrap_or(document.ceiling()),
        );
    }

    let sources = [
        (SectionKind::Elevation, &args.height),
        (SectionKind::Surface, &args.surface),
        (SectionKind::TileIndex, &args.tile_index),
        (SectionKind::Minimap, &args.mini),
        (SectionKind::Resource, &args.metal),
        (SectionKind::Vegetation, &args.grass),
    ];
    for (kind, path) in sources {
        if let Some(path) = path {
            document.set_source(kind, SectionSource::Path(path.clone()))?;
        }
    }
    if args.no_grass {
        document.disable_vegetation();
    }

    if let Some(path) = &args.features {
        document
            .import_features(path)
            .with_context(|| format!("failed to import features from {}", path.display()))?;
    }

    if !args.tile_files.is_empty() {
        document.clear_tile_files();
        for path in &args.tile_files {
            document
                .add_tile_file(path)
                .with_context(|| format!("failed to add tile file {}", path.display()))?;
        }
    }

    document
        .save(&args.file)
        .with_context(|| format!("failed to save map: {}", args.file.display()))?;

    let offsets = document.offsets();
    let result = BuildResult {
        file: file_display_name(&args.file),
        created,
        width: document.dimensions().width,
        length: document.dimensions().length,
        vegetation: offsets.vegetation.is_some(),
        tile_files: document.tiles().len(),
        features: document.features().features().len(),
        bytes: offsets.features + document.features().encoded_size() as u32,
        diagnostics: collect_diagnostics(document.diagnostics()),
    };

    print_output(&result, opts, |result| {
        let verb = if result.created { "Created" } else { "Updated" };
        println!(
            "{verb} {} ({}x{}, {} bytes)",
            result.file, result.width, result.length, result.bytes
        );
        println!(
            "  {} tile files, {} features{}",
            result.tile_files,
            result.features,
            if result.vegetation { ", vegetation" } else { "" }
        );
        print_diagnostics(document.diagnostics());
    })
}
