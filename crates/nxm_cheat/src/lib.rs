//! Cheat source parsing and installation.
//!
//! Cheat files are line-oriented text: bracketed section headers open named
//! instruction groups, and every other non-blank line is an opaque instruction
//! handed to the tamper engine verbatim. Parsing is all-or-nothing per file;
//! a malformed header discards the whole file so a half-parsed cheat set can
//! never reach the tamper engine.
//!
//! Installation matches each entry's source filename (an abbreviated build id)
//! against the loaded executables and hands matches to the external
//! [`TamperEngine`].

use camino::Utf8PathBuf;
use serde::Serialize;
use thiserror::Error;

mod install;
mod parse;

pub use install::{install_cheats, TamperEngine};
pub use parse::{parse_cheat_file, parse_cheat_text};

/// Reserved directory name for cheat sources inside a mod.
pub const CHEATS_DIR: &str = "cheats";

/// Cheat source file extension.
pub const CHEAT_EXTENSION: &str = "txt";

/// Filename of the persisted enabled-cheats list inside a title's `cheats/`
/// content directory.
pub const ENABLED_CHEATS_FILE: &str = "enabled.txt";

/// Name given to the single entry of a headerless cheat file.
pub const DEFAULT_CHEAT_NAME: &str = "<unnamed>";

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from cheat installation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for tamper-engine failures.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

/// One named group of cheat instructions, parsed from a cheat source file.
///
/// A single file may yield many entries, one per bracketed section. Immutable
/// once parsed.
#[derive(Debug, Clone, Serialize)]
pub struct CheatEntry {
    /// Section name from the bracketed header.
    pub name: String,
    /// File this entry was parsed from. The file stem doubles as the
    /// abbreviated build id of the target executable.
    pub source: Utf8PathBuf,
    /// Opaque instruction lines, in file order.
    pub instructions: Vec<String>,
}
