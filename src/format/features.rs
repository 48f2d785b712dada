//! Placed-object ("feature") list.
//!
//! On disk the list is `{type_count: i32, feature_count: i32}`, then `type_count`
//! null-terminated type names, then `feature_count` records of
//! `{type_index: i32, x, y, z, rotation, scale: f32}` (24 bytes each), then one terminator
//! byte.
//!
//! Decoding is lenient: the feature list is the last section of a container and the one most
//! often damaged by truncation, so an implausible list is reported and loaded as empty
//! instead of failing the whole load.

use std::{
    fmt::Write as _,
    io::{Seek, Write},
};

use crate::{
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    file::{parser::Parser, writer::MapWriter},
    format::name::Name,
    Error, Result,
};

/// Encoded size of one feature record.
pub const FEATURE_RECORD_SIZE: usize = 24;

/// Scale applied to rotations in Lua exports.
const LUA_ROTATION_SCALE: f32 = 32768.0;

/// One placed object.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Feature {
    /// Index into the type name table
    pub type_index: u32,
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
    /// Horizontal position along the length axis
    pub z: f32,
    /// Rotation around the vertical axis
    pub rotation: f32,
    /// Uniform scale
    pub scale: f32,
}

/// Type names plus the features referencing them.
///
/// Every feature's `type_index` is a valid index into the type names; the list cannot be
/// brought into any other state through its API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureList {
    types: Vec<Name>,
    features: Vec<Feature>,
}

impl FeatureList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Type names in table order.
    #[must_use]
    pub fn types(&self) -> &[Name] {
        &self.types
    }

    /// Features in file order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Returns `true` if there are neither types nor features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.features.is_empty()
    }

    /// Index of `name` in the type table, adding it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Error`] if the name contains a NUL byte and so cannot be stored.
    pub fn add_type(&mut self, name: impl Into<Name>) -> Result<u32> {
        let name = name.into();
        if name.contains_nul() {
            return Err(Error::Error(format!(
                "Feature type name '{}' contains a NUL byte",
                name.to_string_lossy().escape_debug()
            )));
        }

        let index = match self.types.iter().position(|existing| *existing == name) {
            Some(index) => index,
            None => {
                self.types.push(name);
                self.types.len() - 1
            }
        };

        u32::try_from(index).map_err(|_| Error::LayoutOverflow)
    }

    /// Appends a feature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFeatureType`] if its type index has no name.
    pub fn push(&mut self, feature: Feature) -> Result<()> {
        if feature.type_index as usize >= self.types.len() {
            return Err(Error::InvalidFeatureType {
                index: feature.type_index,
                types: self.types.len(),
            });
        }

        self.features.push(feature);
        Ok(())
    }

    /// Type name of `feature`.
    #[must_use]
    pub fn type_name(&self, feature: &Feature) -> Option<&Name> {
        self.types.get(feature.type_index as usize)
    }

    /// Encoded size of the list including its terminator byte.
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        8 + self.types.iter().map(|name| name.len() + 1).sum::<usize>()
            + self.features.len() * FEATURE_RECORD_SIZE
            + 1
    }

    /// Decode the list stored at `offset` within `data`.
    ///
    /// A count that would place the records past the end of `data`, a truncated name table
    /// or a record with an out-of-range type index is reported once and yields an empty
    /// list.
    #[must_use]
    pub fn parse(data: &[u8], offset: usize, diagnostics: &Diagnostics) -> FeatureList {
        match Self::parse_counted(data, offset) {
            Ok(list) => list,
            Err(reason) => {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::Features,
                        format!("{reason}; ignoring feature data"),
                    )
                    .with_offset(offset as u64),
                );
                FeatureList::new()
            }
        }
    }

    fn parse_counted(data: &[u8], offset: usize) -> std::result::Result<FeatureList, String> {
        let mut parser = Parser::new(data);
        let truncated = |_| "Feature list is truncated".to_string();

        parser
            .seek(offset)
            .map_err(|_| format!("Feature list offset {offset} lies past the end of the file"))?;
        let type_count = parser.read_le::<i32>().map_err(truncated)?;
        let feature_count = parser.read_le::<i32>().map_err(truncated)?;

        let (Ok(type_count), Ok(feature_count)) =
            (usize::try_from(type_count), usize::try_from(feature_count))
        else {
            return Err(format!(
                "Negative feature counts ({type_count} types, {feature_count} features)"
            ));
        };

        let records_end = feature_count
            .checked_mul(FEATURE_RECORD_SIZE)
            .and_then(|size| size.checked_add(parser.pos()));
        if records_end.map_or(true, |end| end > data.len()) {
            return Err(format!(
                "File is not large enough to contain {feature_count} features"
            ));
        }

        let mut list = FeatureList::new();
        for _ in 0..type_count {
            let name = parser.read_cstring().map_err(truncated)?;
            list.types.push(Name::from_bytes(name));
        }

        for _ in 0..feature_count {
            let type_index = parser.read_le::<i32>().map_err(truncated)?;
            let feature = Feature {
                type_index: u32::try_from(type_index).unwrap_or(u32::MAX),
                x: parser.read_le::<f32>().map_err(truncated)?,
                y: parser.read_le::<f32>().map_err(truncated)?,
                z: parser.read_le::<f32>().map_err(truncated)?,
                rotation: parser.read_le::<f32>().map_err(truncated)?,
                scale: parser.read_le::<f32>().map_err(truncated)?,
            };

            if feature.type_index as usize >= list.types.len() {
                return Err(format!(
                    "Feature type index {type_index} is out of range ({} types)",
                    list.types.len()
                ));
            }
            list.features.push(feature);
        }

        Ok(list)
    }

    /// Encode the list at the writer's current position.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors, or [`Error::LayoutOverflow`] if a count does not fit 32 bits.
    pub fn write<W: Write + Seek>(&self, writer: &mut MapWriter<W>) -> Result<()> {
        let type_count = i32::try_from(self.types.len()).map_err(|_| Error::LayoutOverflow)?;
        let feature_count =
            i32::try_from(self.features.len()).map_err(|_| Error::LayoutOverflow)?;

        writer.write_le(type_count)?;
        writer.write_le(feature_count)?;
        for name in &self.types {
            writer.write_cstring(name.as_bytes())?;
        }
        for feature in &self.features {
            let type_index =
                i32::try_from(feature.type_index).map_err(|_| Error::LayoutOverflow)?;
            writer.write_le(type_index)?;
            writer.write_le(feature.x)?;
            writer.write_le(feature.y)?;
            writer.write_le(feature.z)?;
            writer.write_le(feature.rotation)?;
            writer.write_le(feature.scale)?;
        }
        writer.write_le(0u8)
    }

    /// One `name,x,y,z,rotation,scale` line per feature.
    ///
    /// Names that are not valid UTF-8 are written with replacement characters.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        for feature in &self.features {
            let _ = writeln!(
                output,
                "{},{},{},{},{},{}",
                self.type_name(feature).map(Name::to_string_lossy).unwrap_or_default(),
                feature.x,
                feature.y,
                feature.z,
                feature.rotation,
                feature.scale
            );
        }
        output
    }

    /// One Lua table entry per feature, in the form used by map configuration scripts.
    #[must_use]
    pub fn to_lua(&self) -> String {
        let mut output = String::new();
        for feature in &self.features {
            let _ = writeln!(
                output,
                "\t\t{{ name = '{}', x = {}, z = {}, rot = \"{}\",}},",
                self.type_name(feature).map(Name::to_string_lossy).unwrap_or_default(),
                feature.x as i32,
                feature.z as i32,
                (feature.rotation * LUA_ROTATION_SCALE) as i32
            );
        }
        output
    }

    /// Parse the CSV form written by [`FeatureList::to_csv`].
    ///
    /// Type names are interned in first-seen order. Blank lines and lines starting with `#`
    /// are skipped. The name is everything before the last five commas, so names may
    /// themselves contain commas.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] naming the first line that does not hold a name and
    /// five numbers.
    pub fn from_csv(text: &str) -> Result<FeatureList> {
        let mut list = FeatureList::new();

        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields: Vec<&str> = line.rsplitn(6, ',').collect();
            if fields.len() != 6 {
                return Err(malformed_error!(
                    "Feature line {} has {} fields, expected 6",
                    number + 1,
                    fields.len()
                ));
            }
            fields.reverse();

            let mut values = [0f32; 5];
            for (value, field) in values.iter_mut().zip(&fields[1..]) {
                *value = field.trim().parse::<f32>().map_err(|_| {
                    malformed_error!("Feature line {}: '{}' is not a number", number + 1, field)
                })?;
            }

            let type_index = list.add_type(fields[0].trim())?;
            list.push(Feature {
                type_index,
                x: values[0],
                y: values[1],
                z: values[2],
                rotation: values[3],
                scale: values[4],
            })?;
        }

        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn sample() -> FeatureList {
        let mut list = FeatureList::new();
        let tree = list.add_type("tree").unwrap();
        let rock = list.add_type("rock").unwrap();
        assert_eq!(list.add_type("tree").unwrap(), tree);

        list.push(Feature {
            type_index: tree,
            x: 100.0,
            y: 12.5,
            z: 200.0,
            rotation: 0.5,
            scale: 1.0,
        })
        .unwrap();
        list.push(Feature {
            type_index: rock,
            x: 8.0,
            y: 0.0,
            z: 16.0,
            rotation: 0.0,
            scale: 2.0,
        })
        .unwrap();
        list
    }

    fn encode(list: &FeatureList) -> Vec<u8> {
        let mut writer = MapWriter::new(Cursor::new(Vec::new()));
        list.write(&mut writer).unwrap();
        writer.into_inner().unwrap().into_inner()
    }

    #[test]
    fn push_rejects_unknown_type() {
        let mut list = sample();
        let result = list.push(Feature {
            type_index: 2,
            ..Feature::default()
        });

        assert!(matches!(
            result,
            Err(Error::InvalidFeatureType { index: 2, types: 2 })
        ));
        assert_eq!(list.features().len(), 2);
    }

    #[test]
    fn encoded_layout() {
        let list = sample();
        let data = encode(&list);

        assert_eq!(data.len(), list.encoded_size());
        assert_eq!(data.len(), 8 + 5 + 5 + 2 * FEATURE_RECORD_SIZE + 1);
        assert_eq!(&data[8..13], b"tree\0");
        assert_eq!(data[data.len() - 1], 0);
    }

    #[test]
    fn parse_at_offset() {
        let list = sample();
        let mut data = vec![0xEE; 32];
        data.extend(encode(&list));
        let diagnostics = Diagnostics::new();

        assert_eq!(FeatureList::parse(&data, 32, &diagnostics), list);
        assert!(!diagnostics.has_any());
    }

    #[test]
    fn parse_count_past_end_is_soft() {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes());
        data.extend_from_slice(&1000i32.to_le_bytes());
        data.extend_from_slice(b"tree\0");
        let diagnostics = Diagnostics::new();

        let list = FeatureList::parse(&data, 0, &diagnostics);

        assert!(list.is_empty());
        assert_eq!(diagnostics.by_category(DiagnosticCategory::Features).len(), 1);
    }

    #[test]
    fn parse_bad_type_index_is_soft() {
        let mut list = sample();
        list.features[1].type_index = 9;
        let diagnostics = Diagnostics::new();

        assert!(FeatureList::parse(&encode(&list), 0, &diagnostics).is_empty());
        assert!(diagnostics.has_warnings());
    }

    #[test]
    fn parse_offset_past_end_is_soft() {
        let diagnostics = Diagnostics::new();
        assert!(FeatureList::parse(&[0; 4], 16, &diagnostics).is_empty());
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn parse_keeps_type_name_bytes() {
        let mut list = FeatureList::new();
        let index = list.add_type(b"arbre_\xE9t\xE9".as_slice()).unwrap();
        list.push(Feature {
            type_index: index,
            ..Feature::default()
        })
        .unwrap();
        let data = encode(&list);
        let diagnostics = Diagnostics::new();

        let parsed = FeatureList::parse(&data, 0, &diagnostics);
        assert_eq!(parsed.types()[0].as_bytes(), b"arbre_\xE9t\xE9");
        assert_eq!(parsed.encoded_size(), data.len());
        assert!(!diagnostics.has_any());
    }

    #[test]
    fn csv_export_and_import() {
        let list = sample();
        let csv = list.to_csv();

        assert_eq!(csv.lines().next(), Some("tree,100,12.5,200,0.5,1"));
        assert_eq!(FeatureList::from_csv(&csv).unwrap(), list);
    }

    #[test]
    fn csv_import_names_with_commas() {
        let list = FeatureList::from_csv("# comment\n\nodd,name,1,2,3,4,5\n").unwrap();

        assert_eq!(list.types(), [Name::from("odd,name")]);
        assert_eq!(list.features()[0].scale, 5.0);
    }

    #[test]
    fn csv_import_rejects_garbage() {
        assert!(matches!(
            FeatureList::from_csv("tree,1,2,3"),
            Err(Error::Malformed { .. })
        ));
        assert!(matches!(
            FeatureList::from_csv("tree,1,2,x,4,5"),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn lua_export() {
        let lua = sample().to_lua();
        assert_eq!(
            lua.lines().next(),
            Some("\t\t{ name = 'tree', x = 100, z = 200, rot = \"16384\",},")
        );
    }
}
