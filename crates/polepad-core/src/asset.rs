//! Asset identifiers shared by GIS and inspection records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of a physical pole or pad asset.
///
/// Always stored trimmed and uppercased so that `" p0010 "` and `"P0010"`
/// resolve to the same GIS row.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Filename-safe form. Bytes outside `[A-Z0-9_-]` are written as `x`
    /// plus two lowercase hex digits. Ids never hold lowercase ASCII, so
    /// distinct ids always get distinct stems.
    pub fn file_stem(&self) -> String {
        let mut stem = String::with_capacity(self.0.len());
        for b in self.0.bytes() {
            if b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'-' || b == b'_' {
                stem.push(char::from(b));
            } else {
                stem.push_str(&format!("x{b:02x}"));
            }
        }
        stem
    }
}

impl From<String> for AssetId {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for AssetId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
