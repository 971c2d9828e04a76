//! Binary patch decoding, matching, and application.
//!
//! Patch files target one executable, named by build id. Two formats are
//! supported: binary-offset patches (`.ips`, covering both the classic and
//! 32-bit record layouts) name their target in the filename, and text patches
//! (`.pchtxt`) embed it in their content. The engine in [`engine`] indexes the
//! loaded executables by normalized build id, accumulates every matching
//! file's edits per executable, and only then applies them; the final image
//! never depends on the order patch sources were discovered in.

use thiserror::Error;

pub mod engine;
pub mod ips;
pub mod pchtxt;

pub use engine::apply_patches;
pub use ips::decode_ips;
pub use pchtxt::{decode_pchtxt, TextPatch};

/// Binary-offset patch file extension.
pub const IPS_EXTENSION: &str = "ips";
/// Text patch file extension.
pub const PCHTXT_EXTENSION: &str = "pchtxt";

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from patch decoding.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not an IPS patch (magic {0:02x?})")]
    InvalidIpsMagic([u8; 5]),

    #[error("text patch has no @nsobid header")]
    MissingBuildId,

    #[error("malformed text patch line {line}: '{content}'")]
    MalformedLine { line: usize, content: String },
}

/// One byte-replacement edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEdit {
    /// Offset in the patch's own convention (usually file-relative; the
    /// protected offset translates it at apply time).
    pub offset: u32,
    pub bytes: Vec<u8>,
}

/// An ordered collection of edits for one executable.
///
/// Edits from every matching patch source are accumulated here before any of
/// them touches the image, so application order is the accumulation order and
/// nothing else.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    edits: Vec<PatchEdit>,
}

impl PatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, edit: PatchEdit) {
        self.edits.push(edit);
    }

    pub fn append(&mut self, mut other: PatchSet) {
        self.edits.append(&mut other.edits);
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply all edits to `image`, translating each stored offset by
    /// `protected_offset` (the header length the patch offsets include but
    /// the image does not).
    ///
    /// Edits that land before the image start or past its end are skipped
    /// with a warning; the rest still apply. Returns the number of edits
    /// applied.
    pub fn apply(&self, image: &mut [u8], protected_offset: u32) -> usize {
        let mut applied = 0;

        for edit in &self.edits {
            let Some(start) = edit.offset.checked_sub(protected_offset) else {
                tracing::warn!(
                    "Skipping edit at {:#x}: inside the protected {:#x}-byte header",
                    edit.offset,
                    protected_offset
                );
                continue;
            };

            let start = start as usize;
            let end = start + edit.bytes.len();
            if end > image.len() {
                tracing::warn!(
                    "Skipping edit at {:#x}: extends past image end ({:#x} > {:#x})",
                    edit.offset,
                    end,
                    image.len()
                );
                continue;
            }

            image[start..end].copy_from_slice(&edit.bytes);
            applied += 1;
        }

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_with_protected_offset() {
        let mut set = PatchSet::new();
        set.push(PatchEdit {
            offset: 0x100,
            bytes: vec![0xaa, 0xbb],
        });

        let mut image = vec![0u8; 8];
        assert_eq!(set.apply(&mut image, 0x100), 1);
        assert_eq!(&image[..2], &[0xaa, 0xbb]);
    }

    #[test]
    fn test_apply_skips_protected_header_edit() {
        let mut set = PatchSet::new();
        set.push(PatchEdit {
            offset: 0x40,
            bytes: vec![0xff],
        });

        let mut image = vec![0u8; 8];
        assert_eq!(set.apply(&mut image, 0x100), 0);
        assert_eq!(image, vec![0u8; 8]);
    }

    #[test]
    fn test_apply_skips_out_of_range_edit() {
        let mut set = PatchSet::new();
        set.push(PatchEdit {
            offset: 6,
            bytes: vec![1, 2, 3, 4],
        });
        set.push(PatchEdit {
            offset: 0,
            bytes: vec![9],
        });

        let mut image = vec![0u8; 8];
        assert_eq!(set.apply(&mut image, 0), 1);
        assert_eq!(image[0], 9);
        assert_eq!(&image[6..], &[0, 0]);
    }

    #[test]
    fn test_append_preserves_order() {
        let mut first = PatchSet::new();
        first.push(PatchEdit {
            offset: 0,
            bytes: vec![1],
        });
        let mut second = PatchSet::new();
        second.push(PatchEdit {
            offset: 0,
            bytes: vec![2],
        });

        first.append(second);
        let mut image = vec![0u8; 1];
        first.apply(&mut image, 0);
        // Later-accumulated edit wins on overlap
        assert_eq!(image[0], 2);
    }
}
