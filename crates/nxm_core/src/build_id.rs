//! Build identifiers and their normalization rules.
//!
//! A build id uniquely identifies one compiled executable image. Patches and
//! cheats name their target by build id; the engines match those names against
//! the ids of the loaded executables.
//!
//! Matching works on the **normalized** form: uppercase hex with trailing `'0'`
//! characters trimmed. Trimming lets a patch named with a shortened id match a
//! full id, but it is a heuristic: a genuine id ending in zero nibbles that are
//! not padding would be over-trimmed. The behavior is kept for compatibility
//! with existing patch archives.

use std::fmt;

/// Raw length of a build id in bytes.
pub const BUILD_ID_LEN: usize = 32;

/// A fixed-length executable build identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildId([u8; BUILD_ID_LEN]);

impl BuildId {
    pub fn from_bytes(bytes: [u8; BUILD_ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; BUILD_ID_LEN] {
        &self.0
    }

    /// Full uppercase hex form (64 characters).
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(BUILD_ID_LEN * 2);
        for byte in &self.0 {
            out.push_str(&format!("{:02X}", byte));
        }
        out
    }

    /// Normalized form used for matching: uppercase hex, trailing zeros trimmed.
    pub fn normalized(&self) -> String {
        normalize_build_id(&self.to_hex())
    }
}

impl fmt::Debug for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuildId({})", self.to_hex())
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Normalize a textual build id for matching.
///
/// Uppercases and trims trailing `'0'` characters so shorter-than-full
/// identifiers (as found in patch filenames) compare equal to full ones.
pub fn normalize_build_id(id: &str) -> String {
    let upper = id.trim().to_uppercase();
    upper.trim_end_matches('0').to_string()
}
