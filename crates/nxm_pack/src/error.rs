use thiserror::Error;

/// Errors from mounting or reading a pack.
#[derive(Error, Debug)]
pub enum PackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("binary read error: {0}")]
    BinRead(#[from] binrw::Error),

    #[error("invalid magic: {0:#018x}")]
    InvalidMagic(u64),

    #[error("unsupported version: {0}")]
    InvalidVersion(u32),

    #[error("invalid compression type: {0}")]
    InvalidCompressionType(u8),

    #[error("entry path index {index} out of range ({count} paths)")]
    InvalidPathIndex { index: u32, count: u32 },

    #[error("missing entry: {0}")]
    MissingEntry(String),

    #[error("checksum mismatch for '{path}': expected {expected:016x}, got {actual:016x}")]
    ChecksumMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    #[error("invalid path string: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
