//! Integration tests for section layout.
//!
//! Every saved container must place its sections back to back in save order, with the
//! offsets recorded in the header matching what was actually written.

use std::io::Cursor;

use smfkit::{
    format::{header::HEADER_SIZE, layout::MINIMAP_SIZE},
    prelude::*,
    sections::{
        ElevationCodec, MinimapCodec, ResourceCodec, SurfaceCodec, TileIndexCodec,
        VegetationCodec,
    },
};

fn save_in_memory(document: &mut MapDocument) -> Result<Vec<u8>> {
    Ok(document.save_to(Cursor::new(Vec::new()))?.into_inner())
}

/// Check that every section starts exactly where the previous one ends.
fn assert_contiguous(document: &MapDocument, data: &[u8]) {
    let dims = document.dimensions();
    let offsets = document.offsets();

    let mut sections = vec![
        ("elevation", offsets.elevation, ElevationCodec::section_size(dims)),
        ("surface", offsets.surface, SurfaceCodec::section_size(dims)),
        ("minimap", offsets.minimap, MinimapCodec::section_size(dims)),
        ("resource", offsets.resource, ResourceCodec::section_size(dims)),
    ];
    if let Some(vegetation) = offsets.vegetation {
        sections.push(("vegetation", vegetation, VegetationCodec::section_size(dims)));
    }
    sections.push((
        "tiles",
        offsets.tile_index,
        document.tiles().encoded_size() + TileIndexCodec::section_size(dims),
    ));
    sections.push(("features", offsets.features, document.features().encoded_size()));

    let mut expected = HEADER_SIZE + document.extra_headers().total_size();
    for (name, offset, size) in sections {
        assert_eq!(offset as usize, expected, "{name} does not follow its predecessor");
        expected += size;
    }
    assert_eq!(data.len(), expected, "file length does not end at the feature list");
}

#[test]
fn sections_are_contiguous() -> Result<()> {
    for (width, length) in [(1, 1), (2, 2), (4, 2), (3, 5)] {
        for vegetation in [false, true] {
            let mut document = MapDocument::create(width, length)?;
            if vegetation {
                document.enable_vegetation();
            }
            document.add_tile_reference("ground.smt", 1200)?;
            document.add_tile_reference("rock_tiles.smt", 300)?;
            let tree = document.add_feature_type("tree")?;
            document.add_feature(Feature {
                type_index: tree,
                x: 10.0,
                z: 20.0,
                scale: 1.0,
                ..Feature::default()
            })?;

            let data = save_in_memory(&mut document)?;
            assert_contiguous(&document, &data);
        }
    }
    Ok(())
}

#[test]
fn recalculate_is_idempotent() -> Result<()> {
    let mut document = MapDocument::create(3, 2)?;
    document.enable_vegetation();
    document.add_tile_reference("a.smt", 5)?;

    let first = *document.recalculate()?;
    let second = *document.recalculate()?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn elevation_directly_after_header() -> Result<()> {
    let mut document = MapDocument::create(4, 4)?;
    let data = save_in_memory(&mut document)?;

    let offsets = document.offsets();
    assert_eq!(offsets.elevation as usize, HEADER_SIZE);
    assert_eq!(
        (offsets.surface - offsets.elevation) as usize,
        (256 + 1) * (256 + 1) * 2
    );
    assert_eq!(
        ElevationCodec::section_size(document.dimensions()),
        (256 + 1) * (256 + 1) * 2
    );
    assert_eq!((offsets.resource - offsets.minimap) as usize, MINIMAP_SIZE);
    assert_contiguous(&document, &data);
    Ok(())
}

#[test]
fn vegetation_shifts_tile_index() -> Result<()> {
    let mut plain = MapDocument::create(2, 2)?;
    let mut with_vegetation = MapDocument::create(2, 2)?;
    with_vegetation.enable_vegetation();

    let plain = *plain.recalculate()?;
    let shifted = *with_vegetation.recalculate()?;

    // 12-byte extra header plus the 32x32 density grid
    assert_eq!(shifted.elevation, plain.elevation + 12);
    assert_eq!(shifted.vegetation, Some(plain.tile_index + 12));
    assert_eq!(shifted.tile_index - 12, plain.tile_index + 16 * 2 * 16 * 2);
    Ok(())
}

#[test]
fn tile_name_shifts_features() -> Result<()> {
    let path = std::env::temp_dir().join(format!(
        "smfkit-it-{}-layout-tile-name.smf",
        std::process::id()
    ));
    let mut original = MapDocument::create(2, 2)?;
    original.add_tile_reference("base.smt", 64)?;
    original.save(&path)?;

    let mut document = MapDocument::open(&path)?;
    let loaded = *document.offsets();
    document.add_tile_reference("abcdef.smt", 16)?;
    let recalculated = *document.recalculate()?;

    assert_eq!(recalculated.tile_index, loaded.tile_index);
    assert_eq!(recalculated.features, loaded.features + 10 + 5);

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[test]
fn oversized_layout_is_rejected() {
    let document = MapDocument::create(512, 512);
    assert!(matches!(document, Err(Error::LayoutOverflow)));
}
