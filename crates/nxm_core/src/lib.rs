//! Core shared types for nx-mod.
//!
//! This crate holds the plain data types that the scanner, overlay engine,
//! patch engine, and cheat installer all agree on:
//!
//! - [`TitleId`]: 64-bit title identifier and its on-disk directory naming
//! - [`BuildId`]: per-executable build identifier used as the join key
//!   between patches/cheats and loaded executables
//! - [`Executable`]: a loaded executable image with its build id
//! - [`ProgramMeta`]: parsed `main.npdm` process metadata handle
//!
//! Heavier machinery (container codecs, directory scanning, patch decoding)
//! lives in the sibling crates.

pub mod build_id;
pub mod exe;
pub mod title;

pub use build_id::{normalize_build_id, BuildId};
pub use exe::{Executable, ExecutableKind, ProgramMeta, NSO_HEADER_SIZE};
pub use title::TitleId;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced when parsing executable images and metadata.
#[derive(Error, Debug)]
pub enum Error {
    /// The supplied bytes are not a recognizable executable image.
    #[error("invalid executable '{name}': {reason}")]
    InvalidExecutable { name: String, reason: String },

    /// The supplied bytes are not a recognizable process metadata blob.
    #[error("invalid program metadata: {0}")]
    InvalidMeta(String),

    /// Header read failed (short buffer, truncated stream).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
