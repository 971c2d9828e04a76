//! Mod catalog model and directory scanner.
//!
//! The scanner walks a set of search roots and produces a [`CatalogSet`]: one
//! [`TitleCatalog`] per discovered title (overlay directories, overlay
//! containers, cheat entries) plus a process-wide [`PatchCatalog`] of
//! title-independent patch source directories. Catalogs are plain data;
//! the overlay, patch, and cheat engines consume them without touching the
//! filesystem layout again.
//!
//! Catalogs are rebuilt wholesale on every collection pass and must not be
//! read while a pass is in progress; the [`CatalogSet`] owner is responsible
//! for that exclusion.

pub mod model;
pub mod scan;

pub use model::{
    LoadResult, ModContainer, ModDirectory, PatchCatalog, TitleCatalog, EXEFS_SLOTS,
    EXEFS_SLOT_COUNT,
};
pub use scan::{ensure_title_dir, CatalogSet};

use thiserror::Error;

/// Reserved directory name for content-fs overlays inside a mod.
pub const ROMFS_DIR: &str = "romfs";
/// Reserved directory name for executable-fs overlays inside a mod.
pub const EXEFS_DIR: &str = "exefs";
/// Reserved name of the per-title contents root.
pub const CONTENTS_ROOT: &str = "contents";
/// Reserved names of the three patch roots.
pub const EXEFS_PATCHES_ROOT: &str = "exefs_patches";
pub const NRO_PATCHES_ROOT: &str = "nro_patches";
pub const KIP_PATCHES_ROOT: &str = "kip_patches";
/// Well-known container filenames inside a mod directory.
pub const ROMFS_CONTAINER: &str = "romfs.bin";
pub const EXEFS_CONTAINER: &str = "exefs.nsp";
/// Well-known process metadata filename inside an exefs overlay.
pub const PROGRAM_META_FILE: &str = "main.npdm";
/// Suffix marking an executable slot as stubbed.
pub const STUB_SUFFIX: &str = ".stub";

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during catalog collection.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cheat error: {0}")]
    Cheat(#[from] nxm_cheat::Error),
}
