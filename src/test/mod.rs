//! Shared fixtures for unit tests.
//!
//! Containers are assembled byte by byte here, independently of the document writer, so the
//! loader can be tested against a layout nobody computed with [`crate::format::layout`].

use std::path::{Path, PathBuf};

use crate::format::{
    header::{ATLAS_MAGIC, MAP_MAGIC},
    layout::MINIMAP_SIZE,
};

/// Unique path in the system temporary directory.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("smfkit-{}-{}", std::process::id(), name))
}

/// Write a minimal tile atlas claiming `count` tiles.
pub fn write_atlas(path: &Path, count: i32) {
    let mut data = ATLAS_MAGIC.to_vec();
    data.extend_from_slice(&1i32.to_le_bytes());
    data.extend_from_slice(&count.to_le_bytes());
    data.extend_from_slice(&32i32.to_le_bytes());
    data.extend_from_slice(&1i32.to_le_bytes());
    std::fs::write(path, data).unwrap();
}

/// Description of a fixture container.
pub struct ContainerSpec {
    pub width: u32,
    pub length: u32,
    pub id: i32,
    pub elevation_fill: u16,
    pub surface_fill: u8,
    pub resource_fill: u8,
    pub vegetation_fill: u8,
    pub vegetation: bool,
    pub opaque: Vec<(i32, Vec<u8>)>,
    pub tiles: Vec<(String, i32)>,
    pub types: Vec<String>,
    pub features: Vec<(i32, [f32; 5])>,
}

impl ContainerSpec {
    pub fn new(width: u32, length: u32) -> Self {
        ContainerSpec {
            width,
            length,
            id: 0x0BAD_CAFE,
            elevation_fill: 0x1234,
            surface_fill: 3,
            resource_fill: 200,
            vegetation_fill: 9,
            vegetation: false,
            opaque: Vec::new(),
            tiles: Vec::new(),
            types: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn with_vegetation(mut self) -> Self {
        self.vegetation = true;
        self
    }

    pub fn with_opaque(mut self, tag: i32, payload: &[u8]) -> Self {
        self.opaque.push((tag, payload.to_vec()));
        self
    }

    pub fn with_tile(mut self, name: &str, count: i32) -> Self {
        self.tiles.push((name.to_string(), count));
        self
    }

    pub fn with_feature(mut self, name: &str, x: f32, z: f32) -> Self {
        let index = match self.types.iter().position(|existing| existing == name) {
            Some(index) => index,
            None => {
                self.types.push(name.to_string());
                self.types.len() - 1
            }
        };
        self.features.push((index as i32, [x, 0.0, z, 0.0, 1.0]));
        self
    }
}

fn put_i32(data: &mut [u8], offset: usize, value: i32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Assemble a container from `spec`.
///
/// Tile indices are `y * width + x`.
pub fn build_container(spec: &ContainerSpec) -> Vec<u8> {
    let (w, l) = (spec.width as usize, spec.length as usize);
    let mut data = MAP_MAGIC.to_vec();
    data.resize(80, 0);
    put_i32(&mut data, 16, 1);
    put_i32(&mut data, 20, spec.id);
    put_i32(&mut data, 24, spec.width as i32 * 64);
    put_i32(&mut data, 28, spec.length as i32 * 64);
    put_i32(&mut data, 32, 8);
    put_i32(&mut data, 36, 8);
    put_i32(&mut data, 40, 32);
    data[44..48].copy_from_slice(&(-20.0f32 * 512.0).to_le_bytes());
    data[48..52].copy_from_slice(&(300.0f32 * 512.0).to_le_bytes());

    let extra_count = spec.opaque.len() + usize::from(spec.vegetation);
    put_i32(&mut data, 76, extra_count as i32);

    for (tag, payload) in &spec.opaque {
        data.extend_from_slice(&(8 + payload.len() as i32).to_le_bytes());
        data.extend_from_slice(&tag.to_le_bytes());
        data.extend_from_slice(payload);
    }
    let vegetation_pointer = data.len() + 8;
    if spec.vegetation {
        data.extend_from_slice(&12i32.to_le_bytes());
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
    }

    let offset = data.len() as i32;

    put_i32(&mut data, 52, offset);
    for _ in 0..(64 * w + 1) * (64 * l + 1) {
        data.extend_from_slice(&spec.elevation_fill.to_le_bytes());
    }

    let offset = data.len() as i32;

    put_i32(&mut data, 56, offset);
    data.extend(std::iter::repeat(spec.surface_fill).take(32 * w * 32 * l));

    let offset = data.len() as i32;

    put_i32(&mut data, 64, offset);
    data.extend(std::iter::repeat(0u8).take(MINIMAP_SIZE));

    let offset = data.len() as i32;

    put_i32(&mut data, 68, offset);
    data.extend(std::iter::repeat(spec.resource_fill).take(32 * w * 32 * l));

    if spec.vegetation {
        let offset = data.len() as i32;
        put_i32(&mut data, vegetation_pointer, offset);
        data.extend(std::iter::repeat(spec.vegetation_fill).take(16 * w * 16 * l));
    }

    let offset = data.len() as i32;

    put_i32(&mut data, 60, offset);
    let total: i32 = spec.tiles.iter().map(|(_, count)| count).sum();
    data.extend_from_slice(&(spec.tiles.len() as i32).to_le_bytes());
    data.extend_from_slice(&total.to_le_bytes());
    for (name, count) in &spec.tiles {
        data.extend_from_slice(&count.to_le_bytes());
        data.extend_from_slice(name.as_bytes());
        data.push(0);
    }
    for index in 0..(16 * w * 16 * l) as u32 {
        data.extend_from_slice(&index.to_le_bytes());
    }

    let offset = data.len() as i32;

    put_i32(&mut data, 72, offset);
    data.extend_from_slice(&(spec.types.len() as i32).to_le_bytes());
    data.extend_from_slice(&(spec.features.len() as i32).to_le_bytes());
    for name in &spec.types {
        data.extend_from_slice(name.as_bytes());
        data.push(0);
    }
    for (type_index, values) in &spec.features {
        data.extend_from_slice(&type_index.to_le_bytes());
        for value in values {
            data.extend_from_slice(&value.to_le_bytes());
        }
    }
    data.push(0);

    data
}
