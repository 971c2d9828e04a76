mod cheats;
mod resolve;
mod scan;

pub use cheats::{list_cheats, CheatsArgs};
pub use resolve::{resolve_title, ResolveArgs};
pub use scan::{scan_mods, ScanArgs};

use camino::Utf8PathBuf;
use miette::{IntoDiagnostic, Result};
use nxm_catalog::CatalogSet;

/// Run a catalog collection pass over the given search roots.
pub(crate) fn collect_catalogs(roots: &[String]) -> Result<CatalogSet> {
    let roots: Vec<Utf8PathBuf> = roots.iter().map(Utf8PathBuf::from).collect();

    let mut set = CatalogSet::new();
    set.collect(&roots).into_diagnostic()?;
    Ok(set)
}
