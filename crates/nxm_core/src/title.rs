//! Title identifiers and their directory naming convention.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 64-bit title identifier.
///
/// Title content directories are named by the fixed-width lowercase
/// hexadecimal form of the identifier (see [`TitleId::dir_name`]); the scanner
/// uses [`TitleId::from_dir_name`] to recognize per-title directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TitleId(pub u64);

impl TitleId {
    /// The fixed-width lowercase hex directory name for this title.
    pub fn dir_name(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// Parse a directory name as a title id.
    ///
    /// Only exactly 16 hex digits are accepted; anything else returns `None`
    /// so the scanner can silently skip unrelated directories.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        if name.len() != 16 || !name.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u64::from_str_radix(name, 16).ok().map(TitleId)
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for TitleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        u64::from_str_radix(s, 16).map(TitleId)
    }
}

impl Serialize for TitleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.dir_name())
    }
}
