//! Loaded executable images and header parsing.
//!
//! The loader proper is an external collaborator; this module only parses
//! enough of an executable header to identify it (magic + build id) and to
//! carry its mutable backing image through the patch engine.

use crate::build_id::{BuildId, BUILD_ID_LEN};
use crate::{Error, Result};
use byteorder::{ReadBytesExt, LE};
use std::io::Cursor;

/// Size of the NSO file header that precedes the program image.
///
/// Binary patches are commonly authored against file offsets (header
/// included); the patch engine subtracts this as the protected offset when
/// applying them to the in-memory program image.
pub const NSO_HEADER_SIZE: usize = 0x100;

const NSO_MAGIC: u32 = u32::from_le_bytes(*b"NSO0");
const NSO_BUILD_ID_OFFSET: usize = 0x40;

const META_MAGIC: u32 = u32::from_le_bytes(*b"META");

/// Kind of executable image, which determines the protected offset
/// convention its patches are authored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutableKind {
    /// Partition-resident program image; patch offsets include the file header.
    Nso,
    /// Standalone relocatable image; patch offsets are image offsets.
    Nro,
    /// Kernel initial process image; patch offsets are image offsets.
    Kip,
}

impl ExecutableKind {
    /// Header length that stored patch offsets are relative to.
    pub fn protected_offset(&self) -> u32 {
        match self {
            ExecutableKind::Nso => NSO_HEADER_SIZE as u32,
            ExecutableKind::Nro | ExecutableKind::Kip => 0,
        }
    }
}

/// A loaded executable: slot name, identity, and mutable backing image.
///
/// The patch engine mutates `image` in place. The image excludes the file
/// header; callers translate header-relative patch offsets via the
/// protected offset.
#[derive(Debug, Clone)]
pub struct Executable {
    /// Well-known slot name (e.g. `main`, `rtld`, `subsdk0`).
    pub name: String,
    pub kind: ExecutableKind,
    pub build_id: BuildId,
    pub image: Vec<u8>,
}

impl Executable {
    /// Parse an NSO file into an executable for the given slot.
    ///
    /// Validates the magic, extracts the build id from the header, and takes
    /// the bytes after the header as the backing image.
    pub fn parse_nso(name: &str, bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NSO_HEADER_SIZE {
            return Err(Error::InvalidExecutable {
                name: name.to_string(),
                reason: format!("file too short for NSO header ({} bytes)", bytes.len()),
            });
        }

        let magic = Cursor::new(&bytes[..4]).read_u32::<LE>()?;
        if magic != NSO_MAGIC {
            return Err(Error::InvalidExecutable {
                name: name.to_string(),
                reason: format!("bad magic {:#010x}", magic),
            });
        }

        let mut build_id = [0u8; BUILD_ID_LEN];
        build_id.copy_from_slice(&bytes[NSO_BUILD_ID_OFFSET..NSO_BUILD_ID_OFFSET + BUILD_ID_LEN]);

        Ok(Self {
            name: name.to_string(),
            kind: ExecutableKind::Nso,
            build_id: BuildId::from_bytes(build_id),
            image: bytes[NSO_HEADER_SIZE..].to_vec(),
        })
    }
}

/// Parsed process metadata (`main.npdm`).
///
/// Only the header fields needed for reporting are decoded; the raw bytes are
/// retained for the process-creation collaborator.
#[derive(Debug, Clone)]
pub struct ProgramMeta {
    pub main_thread_priority: u8,
    pub main_thread_core: u8,
    pub main_thread_stack_size: u32,
    bytes: Vec<u8>,
}

impl ProgramMeta {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 0x18 {
            return Err(Error::InvalidMeta(format!(
                "file too short for META header ({} bytes)",
                bytes.len()
            )));
        }

        let mut cursor = Cursor::new(bytes);
        let magic = cursor.read_u32::<LE>()?;
        if magic != META_MAGIC {
            return Err(Error::InvalidMeta(format!("bad magic {:#010x}", magic)));
        }

        Ok(Self {
            main_thread_priority: bytes[0x0E],
            main_thread_core: bytes[0x0F],
            main_thread_stack_size: Cursor::new(&bytes[0x14..0x18]).read_u32::<LE>()?,
            bytes: bytes.to_vec(),
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal NSO image: valid header plus `body` as the program image.
    pub(crate) fn fake_nso(build_id_prefix: &[u8], body: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; NSO_HEADER_SIZE];
        bytes[..4].copy_from_slice(b"NSO0");
        bytes[NSO_BUILD_ID_OFFSET..NSO_BUILD_ID_OFFSET + build_id_prefix.len()]
            .copy_from_slice(build_id_prefix);
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn test_parse_nso() {
        let bytes = fake_nso(&[0xde, 0xad, 0xbe, 0xef], b"program image");
        let exe = Executable::parse_nso("main", &bytes).unwrap();

        assert_eq!(exe.name, "main");
        assert_eq!(exe.kind, ExecutableKind::Nso);
        assert_eq!(exe.image, b"program image");
        assert!(exe.build_id.to_hex().starts_with("DEADBEEF"));
    }

    #[test]
    fn test_parse_nso_bad_magic() {
        let mut bytes = fake_nso(&[1], b"x");
        bytes[..4].copy_from_slice(b"XXXX");
        assert!(Executable::parse_nso("main", &bytes).is_err());
    }

    #[test]
    fn test_parse_nso_too_short() {
        assert!(Executable::parse_nso("main", b"NSO0").is_err());
    }

    #[test]
    fn test_protected_offset_by_kind() {
        assert_eq!(ExecutableKind::Nso.protected_offset(), 0x100);
        assert_eq!(ExecutableKind::Nro.protected_offset(), 0);
        assert_eq!(ExecutableKind::Kip.protected_offset(), 0);
    }

    #[test]
    fn test_parse_meta() {
        let mut bytes = vec![0u8; 0x20];
        bytes[..4].copy_from_slice(b"META");
        bytes[0x0E] = 44;
        bytes[0x0F] = 1;
        bytes[0x14..0x18].copy_from_slice(&0x10000u32.to_le_bytes());

        let meta = ProgramMeta::parse(&bytes).unwrap();
        assert_eq!(meta.main_thread_priority, 44);
        assert_eq!(meta.main_thread_core, 1);
        assert_eq!(meta.main_thread_stack_size, 0x10000);
        assert_eq!(meta.raw(), &bytes[..]);
    }

    #[test]
    fn test_parse_meta_bad_magic() {
        let bytes = vec![0u8; 0x20];
        assert!(ProgramMeta::parse(&bytes).is_err());
    }
}
