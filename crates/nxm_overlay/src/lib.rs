//! Overlay resolution for nx-mod.
//!
//! This crate merges a title's mod overlays with its base content container
//! and rebuilds a single consistent container from the union. It covers two
//! coupled resolvers:
//!
//! - **Content resolution** ([`resolve_content`]): merges loose overlay
//!   directories and packed overlay containers on top of a base pack. Loose
//!   overlays beat packed overlays, earlier overlays beat later ones, and the
//!   rebuilt pack lists every logical path exactly once in byte-wise order.
//! - **Executable-partition resolution** ([`resolve_exefs_partition`],
//!   [`apply_exefs_overlays`]): whole-partition replacement containers and
//!   per-slot executable replacement/stubbing.
//!
//! # Example
//!
//! ```no_run
//! use camino::{Utf8Path, Utf8PathBuf};
//! use nxm_catalog::CatalogSet;
//! use nxm_core::TitleId;
//! use nxm_overlay::{resolve_content, ContentResolution};
//! use nxm_pack::Pack;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut catalogs = CatalogSet::new();
//! catalogs.collect(&[Utf8PathBuf::from("/mods/contents")])?;
//!
//! let base = Pack::mount_from_reader(std::fs::File::open("base.nxpack")?)?;
//! if let Some(catalog) = catalogs.title(TitleId(0x0100_0000_0000_0001)) {
//!     match resolve_content(catalog, base, Utf8Path::new("out.nxpack"))? {
//!         ContentResolution::Unmodified(_) => println!("no overlays apply"),
//!         ContentResolution::Rebuilt { stats, .. } => {
//!             println!("rebuilt with {} overlay file(s)", stats.overlay_files)
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod exefs;
pub mod resolve;

pub use error::{Error, Result};
pub use exefs::{apply_exefs_overlays, resolve_exefs_partition};
pub use resolve::{resolve_content, ContentResolution, ResolveStats};
