use crate::error::PackError;
use binrw::binrw;
use std::fmt::Display;

/// Compression applied to one entry's stored bytes.
#[binrw]
#[brw(little, repr = u8)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub enum PackCompression {
    #[default]
    None = 0,
    Zstd = 1,
}

/// Fixed-size table-of-contents record for one entry.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PackEntry {
    /// Index into the pack's path table.
    pub path_index: u32,

    pub compression: PackCompression,

    pub data_offset: u64,
    pub compressed_size: u64,
    pub uncompressed_size: u64,

    /// xxh3 checksum of the uncompressed bytes.
    pub checksum: u64,
}

impl PackEntry {
    pub fn size_of() -> usize {
        std::mem::size_of::<u32>() + 1 + (std::mem::size_of::<u64>() * 4)
    }
}

impl Display for PackCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PackCompression::None => "none",
            PackCompression::Zstd => "zstd",
        })
    }
}

impl TryFrom<u8> for PackCompression {
    type Error = PackError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => PackCompression::None,
            1 => PackCompression::Zstd,
            _ => return Err(PackError::InvalidCompressionType(value)),
        })
    }
}
