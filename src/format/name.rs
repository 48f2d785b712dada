//! Names stored in the tile-file and feature-type tables.
//!
//! Both tables hold NUL-terminated byte strings with no declared encoding. Containers made by
//! older Windows tools carry names in the system code page, so a [`Name`] keeps the exact
//! bytes it was read with and only decodes them (lossily) for display and text export.

use std::{borrow::Cow, fmt};

/// A table name as raw bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Name(Vec<u8>);

impl Name {
    /// Wrap raw name bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Name(bytes.into())
    }

    /// The stored bytes, without a terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of stored bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty name.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if the name could not be written as a NUL-terminated string.
    #[must_use]
    pub fn contains_nul(&self) -> bool {
        self.0.contains(&0)
    }

    /// Decode as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name(value.as_bytes().to_vec())
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name(value.into_bytes())
    }
}

impl From<&[u8]> for Name {
    fn from(value: &[u8]) -> Self {
        Name(value.to_vec())
    }
}

impl From<Vec<u8>> for Name {
    fn from(value: Vec<u8>) -> Self {
        Name(value)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}
