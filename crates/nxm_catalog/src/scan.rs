//! Directory scanning and catalog collection.
//!
//! Search roots are classified by their directory name: a `contents` root
//! holds per-title directories (named by the title id's 16-digit hex form), a
//! patch root (`exefs_patches`, `nro_patches`, `kip_patches`) holds
//! title-independent patch directories, and anything else is scanned one
//! level deeper with the same two checks. Classification is best-effort;
//! directories that match nothing are traversed silently.

use crate::model::{ModContainer, ModDirectory, PatchCatalog, TitleCatalog};
use crate::{
    Result, CONTENTS_ROOT, EXEFS_CONTAINER, EXEFS_DIR, EXEFS_PATCHES_ROOT, KIP_PATCHES_ROOT,
    NRO_PATCHES_ROOT, ROMFS_CONTAINER, ROMFS_DIR,
};
use camino::{Utf8Path, Utf8PathBuf};
use nxm_cheat::{parse_cheat_file, CHEATS_DIR, CHEAT_EXTENSION};
use nxm_core::TitleId;
use std::collections::HashMap;

/// The patch kinds a patch root can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatchRootKind {
    Exefs,
    Nro,
    Kip,
}

/// Process-wide catalog state: per-title catalogs plus the patch catalog.
///
/// Title catalogs are rebuilt wholesale on every [`collect`](Self::collect)
/// pass. The patch catalog is populated at most once per lifecycle; call
/// [`reset`](Self::reset) to start over.
#[derive(Debug, Default)]
pub struct CatalogSet {
    titles: HashMap<TitleId, TitleCatalog>,
    patches: PatchCatalog,
}

impl CatalogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the given search roots and rebuild the catalogs.
    ///
    /// Non-existent roots are reported and skipped; they are not fatal.
    pub fn collect(&mut self, roots: &[Utf8PathBuf]) -> Result<()> {
        self.titles.clear();
        let collect_patches = !self.patches.initialized();

        for root in roots {
            if !root.as_std_path().is_dir() {
                tracing::warn!("Search root not found, skipping: {}", root);
                continue;
            }
            self.collect_root(root, collect_patches, true)?;
        }

        if collect_patches {
            self.patches.mark_initialized();
        }

        tracing::info!(
            "Catalog collection complete: {} title(s), {} exefs / {} nro / {} kip patch set(s)",
            self.titles.len(),
            self.patches.exefs_patches.len(),
            self.patches.nro_patches.len(),
            self.patches.kip_patches.len()
        );
        Ok(())
    }

    /// Catalog for one title, if anything was discovered for it.
    pub fn title(&self, id: TitleId) -> Option<&TitleCatalog> {
        self.titles.get(&id)
    }

    /// All title catalogs, ordered by title id.
    pub fn titles(&self) -> Vec<&TitleCatalog> {
        let mut titles: Vec<&TitleCatalog> = self.titles.values().collect();
        titles.sort_unstable_by_key(|c| c.title_id);
        titles
    }

    pub fn patches(&self) -> &PatchCatalog {
        &self.patches
    }

    /// Drop all collected state, including the patch catalog's
    /// once-initialized flag.
    pub fn reset(&mut self) {
        self.titles.clear();
        self.patches.reset();
    }

    fn collect_root(&mut self, root: &Utf8Path, collect_patches: bool, descend: bool) -> Result<()> {
        let name = root.file_name().unwrap_or_default().to_ascii_lowercase();

        if name == CONTENTS_ROOT {
            return self.collect_contents_root(root);
        }

        if let Some(kind) = classify_patch_root(&name) {
            if collect_patches {
                return self.collect_patch_root(kind, root);
            }
            tracing::debug!("Patch catalog already initialized, skipping {}", root);
            return Ok(());
        }

        if descend {
            for child in sorted_subdirs(root)? {
                self.collect_root(&child, collect_patches, false)?;
            }
        }
        Ok(())
    }

    fn collect_contents_root(&mut self, root: &Utf8Path) -> Result<()> {
        for title_dir in sorted_subdirs(root)? {
            let dir_name = title_dir.file_name().unwrap_or_default();
            let Some(title_id) = TitleId::from_dir_name(dir_name) else {
                tracing::trace!("Not a title directory, skipping: {}", title_dir);
                continue;
            };

            let catalog = self
                .titles
                .entry(title_id)
                .or_insert_with(|| TitleCatalog::new(title_id));

            for mod_dir in sorted_subdirs(&title_dir)? {
                let mod_name = mod_dir.file_name().unwrap_or_default().to_string();
                scan_mod_dir(catalog, &mod_name, &mod_dir)?;
            }
        }
        Ok(())
    }

    fn collect_patch_root(&mut self, kind: PatchRootKind, root: &Utf8Path) -> Result<()> {
        let list = match kind {
            PatchRootKind::Exefs => &mut self.patches.exefs_patches,
            PatchRootKind::Nro => &mut self.patches.nro_patches,
            PatchRootKind::Kip => &mut self.patches.kip_patches,
        };

        for dir in sorted_subdirs(root)? {
            let name = dir.file_name().unwrap_or_default().to_string();
            tracing::info!("Found {:?} patch set '{}' at {}", kind, name, dir);
            list.push(ModDirectory { name, path: dir });
        }
        Ok(())
    }
}

/// Path of a title's content directory under a contents root, created on
/// demand when absent.
pub fn ensure_title_dir(contents_root: &Utf8Path, title_id: TitleId) -> Result<Utf8PathBuf> {
    let dir = contents_root.join(title_id.dir_name());
    if !dir.as_std_path().is_dir() {
        tracing::info!("Creating title content directory {}", dir);
        std::fs::create_dir_all(dir.as_std_path())?;
    }
    Ok(dir)
}

fn classify_patch_root(name: &str) -> Option<PatchRootKind> {
    match name {
        EXEFS_PATCHES_ROOT => Some(PatchRootKind::Exefs),
        NRO_PATCHES_ROOT => Some(PatchRootKind::Nro),
        KIP_PATCHES_ROOT => Some(PatchRootKind::Kip),
        _ => None,
    }
}

/// Per-mod discovery counters for the informational report.
#[derive(Debug, Default)]
struct ModReport {
    romfs_dirs: usize,
    exefs_dirs: usize,
    containers: usize,
    cheats: usize,
}

/// Scan one mod directory inside a title directory.
///
/// The two well-known container filenames are detected independently of the
/// reserved-directory walk.
fn scan_mod_dir(catalog: &mut TitleCatalog, mod_name: &str, dir: &Utf8Path) -> Result<()> {
    let mut report = ModReport::default();

    let romfs_container = dir.join(ROMFS_CONTAINER);
    if romfs_container.as_std_path().is_file() {
        catalog.romfs_containers.push(ModContainer {
            name: mod_name.to_string(),
            path: romfs_container,
        });
        report.containers += 1;
    }

    let exefs_container = dir.join(EXEFS_CONTAINER);
    if exefs_container.as_std_path().is_file() {
        catalog.exefs_containers.push(ModContainer {
            name: mod_name.to_string(),
            path: exefs_container,
        });
        report.containers += 1;
    }

    walk_mod_subdirs(catalog, mod_name, dir, &mut report)?;

    tracing::info!(
        "Found mod '{}' for title {}: {} romfs dir(s), {} exefs dir(s), {} container(s), {} cheat(s)",
        mod_name,
        catalog.title_id,
        report.romfs_dirs,
        report.exefs_dirs,
        report.containers,
        report.cheats
    );
    Ok(())
}

/// Recursive reserved-name classification.
///
/// A reserved-name match terminates recursion into that subtree; anything
/// else is walked deeper to support nested mod groupings.
fn walk_mod_subdirs(
    catalog: &mut TitleCatalog,
    mod_name: &str,
    dir: &Utf8Path,
    report: &mut ModReport,
) -> Result<()> {
    for sub in sorted_subdirs(dir)? {
        let name = sub.file_name().unwrap_or_default().to_ascii_lowercase();
        match name.as_str() {
            ROMFS_DIR => {
                catalog.romfs_dirs.push(ModDirectory {
                    name: mod_name.to_string(),
                    path: sub,
                });
                report.romfs_dirs += 1;
            }
            EXEFS_DIR => {
                catalog.exefs_dirs.push(ModDirectory {
                    name: mod_name.to_string(),
                    path: sub,
                });
                report.exefs_dirs += 1;
            }
            CHEATS_DIR => {
                collect_cheats(catalog, &sub, report)?;
            }
            _ => walk_mod_subdirs(catalog, mod_name, &sub, report)?,
        }
    }
    Ok(())
}

fn collect_cheats(
    catalog: &mut TitleCatalog,
    dir: &Utf8Path,
    report: &mut ModReport,
) -> Result<()> {
    for file in sorted_files(dir)? {
        if file.extension().map(str::to_ascii_lowercase).as_deref() != Some(CHEAT_EXTENSION) {
            continue;
        }
        let entries = parse_cheat_file(&file)?;
        report.cheats += entries.len();
        catalog.cheats.extend(entries);
    }
    Ok(())
}

/// Subdirectories of `dir`, sorted byte-wise by name for deterministic
/// discovery order. Non-UTF-8 paths are skipped with a warning.
fn sorted_subdirs(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    list_entries(dir, true)
}

/// Plain files of `dir`, sorted byte-wise by name.
fn sorted_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    list_entries(dir, false)
}

fn list_entries(dir: &Utf8Path, dirs: bool) -> Result<Vec<Utf8PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir.as_std_path())? {
        let entry = entry?;
        let path = match Utf8PathBuf::from_path_buf(entry.path()) {
            Ok(p) => p,
            Err(p) => {
                tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                continue;
            }
        };
        if path.as_std_path().is_dir() == dirs {
            out.push(path);
        }
    }
    out.sort_unstable();
    Ok(out)
}
