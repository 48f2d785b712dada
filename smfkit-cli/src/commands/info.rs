use std::path::Path;

use serde::Serialize;
use smfkit::{format::extraheader::ExtraHeader, MapConfig};

use crate::{
    app::GlobalOptions,
    commands::common::{file_display_name, load_document},
    output::{
        collect_diagnostics, print_diagnostics, print_output, Align, DiagnosticInfo, TabWriter,
    },
};

#[derive(Debug, Serialize)]
pub struct MapInfo {
    pub file: String,
    pub id: i32,
    pub width: u32,
    pub length: u32,
    pub floor: f32,
    pub ceiling: f32,
    pub offsets: OffsetInfo,
    pub extra_headers: Vec<ExtraHeaderInfo>,
    pub tile_files: Vec<TileFileInfo>,
    pub total_tiles: u64,
    pub feature_types: usize,
    pub feature_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<DiagnosticInfo>,
}

#[derive(Debug, Serialize)]
pub struct OffsetInfo {
    pub elevation: u32,
    pub surface: u32,
    pub minimap: u32,
    pub resource: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vegetation: Option<u32>,
    pub tile_index: u32,
    pub features: u32,
}

#[derive(Debug, Serialize)]
pub struct ExtraHeaderInfo {
    pub tag: i32,
    pub kind: String,
    pub size: usize,
}

#[derive(Debug, Serialize)]
pub struct TileFileInfo {
    pub name: String,
    pub count: u32,
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let document = load_document(path, MapConfig::default())?;
    let offsets = document.offsets();

    let info = MapInfo {
        file: file_display_name(path),
        id: document.id(),
        width: document.dimensions().width,
        length: document.dimensions().length,
        floor: document.floor(),
        ceiling: document.ceiling(),
        offsets: OffsetInfo {
            elevation: offsets.elevation,
            surface: offsets.surface,
            minimap: offsets.minimap,
            resource: offsets.resource,
            vegetation: offsets.vegetation,
            tile_index: offsets.tile_index,
            features: offsets.features,
        },
        extra_headers: document
            .extra_headers()
            .iter()
            .map(|record| ExtraHeaderInfo {
                tag: record.tag(),
                kind: match record {
                    ExtraHeader::Vegetation(_) => "vegetation".to_string(),
                    ExtraHeader::Opaque { .. } => "unknown".to_string(),
                },
                size: record.byte_size(),
            })
            .collect(),
        tile_files: document
            .tiles()
            .iter()
            .map(|file| TileFileInfo {
                name: file.name.to_string(),
                count: file.count,
            })
            .collect(),
        total_tiles: document.tiles().total_tiles(),
        feature_types: document.features().types().len(),
        feature_count: document.features().features().len(),
        diagnostics: collect_diagnostics(document.diagnostics()),
    };

    print_output(&info, opts, |info| {
        println!("Map:           {}", info.file);
        println!("ID:            {}", info.id);
        println!("Size:          {}x{}", info.width, info.length);
        println!("Heights:       {} to {}", info.floor, info.ceiling);
        println!("Tiles:         {}", info.total_tiles);
        println!(
            "Features:      {} of {} types",
            info.feature_count, info.feature_types
        );

        println!("\nSections:");
        let mut tw = TabWriter::new(&[("Section", Align::Left), ("Offset", Align::Right)])
            .indent("  ");
        let o = &info.offsets;
        tw.row(vec!["elevation".into(), o.elevation.to_string()]);
        tw.row(vec!["surface".into(), o.surface.to_string()]);
        tw.row(vec!["minimap".into(), o.minimap.to_string()]);
        tw.row(vec!["resource".into(), o.resource.to_string()]);
        if let Some(vegetation) = o.vegetation {
            tw.row(vec!["vegetation".into(), vegetation.to_string()]);
        }
        tw.row(vec!["tileindex".into(), o.tile_index.to_string()]);
        tw.row(vec!["features".into(), o.features.to_string()]);
        tw.print();

        if !info.extra_headers.is_empty() {
            println!("\nExtra headers:");
            let mut tw = TabWriter::new(&[
                ("Tag", Align::Right),
                ("Kind", Align::Left),
                ("Size", Align::Right),
            ])
            .indent("  ");
            for record in &info.extra_headers {
                tw.row(vec![
                    record.tag.to_string(),
                    record.kind.clone(),
                    record.size.to_string(),
                ]);
            }
            tw.print();
        }

        if !info.tile_files.is_empty() {
            println!("\nTile files:");
            let mut tw =
                TabWriter::new(&[("Name", Align::Left), ("Tiles", Align::Right)]).indent("  ");
            for file in &info.tile_files {
                tw.row(vec![file.name.to_string(), file.count.to_string()]);
            }
            tw.print();
        }

        print_diagnostics(document.diagnostics());
    })
}
