#![no_main]

use libfuzzer_sys::fuzz_target;
use smfkit::MapFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(map) = MapFile::from_mem(data.to_vec()) {
        let _ = map.read_elevation();
        let _ = map.read_vegetation();
        let _ = map.read_tile_indices();
    }
});
