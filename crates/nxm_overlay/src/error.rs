//! Error types for overlay operations.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during overlay resolution.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading overlays, writing the rebuilt pack).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the pack codec when mounting or reading a container.
    #[error("pack error: {0}")]
    Pack(#[from] nxm_pack::Error),

    /// Error from the pack builder when writing the rebuilt container.
    #[error("pack builder error: {0}")]
    PackBuilder(#[from] nxm_pack::PackBuilderError),

    /// The caller supplied the wrong number of executable slots. This is a
    /// contract violation, not a data error, and aborts the operation.
    #[error("executable slot count mismatch: expected {expected}, got {actual}")]
    SlotCountMismatch { expected: usize, actual: usize },
}
