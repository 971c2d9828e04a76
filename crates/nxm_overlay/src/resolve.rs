//! Content overlay resolution.
//!
//! # Resolution algorithm
//!
//! 1. If the title has no loose overlay directories and no overlay containers,
//!    return the base pack unchanged (identity fast path).
//! 2. Claim logical paths from loose overlay directories first, in discovery
//!    order, each directory enumerated in byte-wise path order. Files are held
//!    as deferred-read handles; nothing is loaded yet.
//! 3. Claim paths from overlay containers next, in discovery order.
//! 4. Each claim is first-writer-wins: a later overlay claiming an already
//!    claimed path is logged and dropped. Loose overlays therefore strictly
//!    beat containers, and earlier overlays strictly beat later ones.
//! 5. If nothing was claimed (all overlay sources were empty), return the base
//!    pack unchanged.
//! 6. Pass through every base entry whose path is unclaimed.
//! 7. Serialize the union (each logical path exactly once, in byte-wise
//!    ascending order) into a new pack at `out_path`. Entry bytes are pulled
//!    lazily from their origin (loose file, overlay container, or base) as the
//!    serializer reaches them.
//!
//! Collecting all claims before building means no partially built container is
//! ever observable, and the output is byte-identical for identical inputs
//! regardless of how sources were discovered.

use crate::error::{Error, Result};
use camino::Utf8Path;
use nxm_catalog::TitleCatalog;
use nxm_pack::{
    LooseFile, LooseFileStore, Pack, PackBuilder, PackBuilderError, PackEntryBuilder,
};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, Write};

/// Where a claimed logical path's bytes come from.
///
/// Classified once at claim time; the serializer dispatches on the variant
/// instead of re-inspecting names.
enum OverlaySource {
    /// Deferred-read handle into a loose overlay directory.
    Loose(LooseFile),
    /// Entry inside the overlay container at this index.
    Packed { container: usize },
    /// Unclaimed entry passed through from the base pack.
    Base,
}

/// Counters describing a rebuilt container.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveStats {
    /// Logical paths claimed by overlays.
    pub overlay_files: usize,
    /// Base entries passed through unmodified.
    pub base_files: usize,
    /// Claims dropped because an earlier overlay won the path.
    pub conflicts: usize,
}

/// Outcome of content resolution.
#[derive(Debug)]
pub enum ContentResolution<R: Read + Seek> {
    /// No overlay applied; the original base pack is handed back untouched.
    Unmodified(Pack<R>),
    /// A new container was built at the requested output path.
    Rebuilt { pack: Pack<File>, stats: ResolveStats },
}

/// Merge a title's content overlays with `base` and rebuild a container at
/// `out_path`.
///
/// See the module docs for the full algorithm. Unreadable overlay sources are
/// skipped with a warning: a broken mod degrades to "not applied", it never
/// fails the title.
pub fn resolve_content<R: Read + Seek>(
    catalog: &TitleCatalog,
    mut base: Pack<R>,
    out_path: &Utf8Path,
) -> Result<ContentResolution<R>> {
    if !catalog.has_content_overlays() {
        tracing::info!(
            "No content overlays for title {}, using base container unchanged",
            catalog.title_id
        );
        return Ok(ContentResolution::Unmodified(base));
    }

    tracing::info!(
        "Resolving content overlays for title {}: {} loose dir(s), {} container(s)",
        catalog.title_id,
        catalog.romfs_dirs.len(),
        catalog.romfs_containers.len()
    );

    let mut claimed: BTreeMap<String, OverlaySource> = BTreeMap::new();
    let mut stats = ResolveStats::default();

    // Loose overlays claim first and therefore always beat containers.
    for dir in &catalog.romfs_dirs {
        let files = match LooseFileStore::new(dir.path.clone()).enumerate() {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Skipping unreadable overlay dir '{}': {}", dir.path, e);
                continue;
            }
        };

        for file in files {
            match claimed.entry(file.rel_path().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(OverlaySource::Loose(file));
                }
                Entry::Occupied(_) => {
                    tracing::warn!(
                        "Overlay conflict on '{}': already claimed, dropping copy from mod '{}'",
                        file.rel_path(),
                        dir.name
                    );
                    stats.conflicts += 1;
                }
            }
        }
    }

    let mut overlay_packs: Vec<Pack<File>> = Vec::new();
    for container in &catalog.romfs_containers {
        let pack = File::open(container.path.as_std_path())
            .map_err(nxm_pack::Error::from)
            .and_then(Pack::mount_from_reader);
        let pack = match pack {
            Ok(pack) => pack,
            Err(e) => {
                tracing::warn!(
                    "Skipping unreadable overlay container '{}': {}",
                    container.path,
                    e
                );
                continue;
            }
        };

        let index = overlay_packs.len();
        let paths = pack.sorted_paths();
        overlay_packs.push(pack);

        for path in paths {
            match claimed.entry(path) {
                Entry::Vacant(slot) => {
                    slot.insert(OverlaySource::Packed { container: index });
                }
                Entry::Occupied(slot) => {
                    tracing::warn!(
                        "Overlay conflict on '{}': already claimed, dropping copy from mod '{}'",
                        slot.key(),
                        container.name
                    );
                    stats.conflicts += 1;
                }
            }
        }
    }

    if claimed.is_empty() {
        tracing::info!(
            "All overlay sources for title {} were empty, using base container unchanged",
            catalog.title_id
        );
        return Ok(ContentResolution::Unmodified(base));
    }
    stats.overlay_files = claimed.len();

    // Unclaimed base entries pass through untouched.
    for path in base.sorted_paths() {
        if let Entry::Vacant(slot) = claimed.entry(path) {
            slot.insert(OverlaySource::Base);
            stats.base_files += 1;
        }
    }

    // The BTreeMap iterates in byte-wise path order, which is exactly the
    // emission order the rebuilt container must have.
    let mut builder = PackBuilder::default();
    for path in claimed.keys() {
        builder = builder.with_entry(PackEntryBuilder::new(path)?);
    }

    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent.as_std_path())?;
    }
    let mut out_file = File::create(out_path.as_std_path())?;

    builder.build_to_writer(&mut out_file, |entry, out| {
        let source = claimed
            .get(entry.path())
            .ok_or_else(|| PackBuilderError::MissingDataSource(entry.path().to_string()))?;

        let bytes = match source {
            OverlaySource::Loose(file) => file.read()?,
            OverlaySource::Packed { container } => {
                overlay_packs[*container].load_entry(entry.path())?.into()
            }
            OverlaySource::Base => base.load_entry(entry.path())?.into(),
        };
        out.write_all(&bytes)?;
        Ok(())
    })?;
    drop(out_file);

    tracing::info!(
        "Rebuilt container for title {} at '{}': {} overlay file(s), {} base file(s), {} conflict(s)",
        catalog.title_id,
        out_path,
        stats.overlay_files,
        stats.base_files,
        stats.conflicts
    );

    let pack = Pack::mount_from_reader(File::open(out_path.as_std_path())?)?;
    Ok(ContentResolution::Rebuilt { pack, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use nxm_catalog::{ModContainer, ModDirectory, TitleCatalog};
    use nxm_core::TitleId;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    fn write_pack(path: &Utf8Path, entries: &[(&str, &[u8])]) {
        let mut builder = PackBuilder::default();
        for (entry_path, _) in entries {
            builder = builder.with_entry(PackEntryBuilder::new(entry_path).unwrap());
        }
        let data: HashMap<&str, &[u8]> = entries.iter().copied().collect();
        let mut file = File::create(path.as_std_path()).unwrap();
        builder
            .build_to_writer(&mut file, |entry, out| {
                out.write_all(data[entry.path()])?;
                Ok(())
            })
            .unwrap();
    }

    fn mount(path: &Utf8Path) -> Pack<File> {
        Pack::mount_from_reader(File::open(path.as_std_path()).unwrap()).unwrap()
    }

    fn catalog_with(
        dirs: &[(&str, &Utf8Path)],
        containers: &[(&str, &Utf8Path)],
    ) -> TitleCatalog {
        let mut catalog = TitleCatalog::new(TitleId(0x0100_0000_0000_0001));
        for (name, path) in dirs {
            catalog.romfs_dirs.push(ModDirectory {
                name: name.to_string(),
                path: path.to_path_buf(),
            });
        }
        for (name, path) in containers {
            catalog.romfs_containers.push(ModContainer {
                name: name.to_string(),
                path: path.to_path_buf(),
            });
        }
        catalog
    }

    #[test]
    fn test_identity_fast_path() {
        let dir = tempdir().unwrap();
        let base_path = utf8(&dir.path().join("base.nxpack"));
        write_pack(&base_path, &[("a.bin", b"base")]);

        let catalog = catalog_with(&[], &[]);
        let result =
            resolve_content(&catalog, mount(&base_path), &utf8(&dir.path().join("out"))).unwrap();

        assert!(matches!(result, ContentResolution::Unmodified(_)));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_empty_overlay_dirs_return_base_unchanged() {
        let dir = tempdir().unwrap();
        let base_path = utf8(&dir.path().join("base.nxpack"));
        write_pack(&base_path, &[("a.bin", b"base")]);

        let overlay_dir = utf8(&dir.path().join("romfs"));
        fs::create_dir_all(overlay_dir.as_std_path()).unwrap();

        let catalog = catalog_with(&[("modA", &overlay_dir)], &[]);
        let result =
            resolve_content(&catalog, mount(&base_path), &utf8(&dir.path().join("out"))).unwrap();

        assert!(matches!(result, ContentResolution::Unmodified(_)));
    }

    #[test]
    fn test_overlay_replaces_and_adds() {
        let dir = tempdir().unwrap();
        let base_path = utf8(&dir.path().join("base.nxpack"));
        write_pack(&base_path, &[("a.bin", b"base-a"), ("b.bin", b"base-b")]);

        let overlay_dir = utf8(&dir.path().join("romfs"));
        fs::create_dir_all(overlay_dir.as_std_path()).unwrap();
        fs::write(overlay_dir.join("a.bin").as_std_path(), b"mod-a").unwrap();
        fs::write(overlay_dir.join("c.bin").as_std_path(), b"mod-c").unwrap();

        let catalog = catalog_with(&[("modA", &overlay_dir)], &[]);
        let out_path = utf8(&dir.path().join("out.nxpack"));
        let result = resolve_content(&catalog, mount(&base_path), &out_path).unwrap();

        let ContentResolution::Rebuilt { mut pack, stats } = result else {
            panic!("expected a rebuilt container");
        };

        assert_eq!(stats.overlay_files, 2);
        assert_eq!(stats.base_files, 1);
        assert_eq!(pack.sorted_paths(), vec!["a.bin", "b.bin", "c.bin"]);
        assert_eq!(&pack.load_entry("a.bin").unwrap()[..], b"mod-a");
        assert_eq!(&pack.load_entry("b.bin").unwrap()[..], b"base-b");
        assert_eq!(&pack.load_entry("c.bin").unwrap()[..], b"mod-c");
    }

    #[test]
    fn test_loose_overlay_beats_container_overlay() {
        let dir = tempdir().unwrap();
        let base_path = utf8(&dir.path().join("base.nxpack"));
        write_pack(&base_path, &[("a.bin", b"base")]);

        let overlay_dir = utf8(&dir.path().join("romfs"));
        fs::create_dir_all(overlay_dir.as_std_path()).unwrap();
        fs::write(overlay_dir.join("a.bin").as_std_path(), b"loose").unwrap();

        let container_path = utf8(&dir.path().join("romfs.bin"));
        write_pack(&container_path, &[("a.bin", b"packed")]);

        // Container listed before the loose dir would be discovered; loose
        // still wins because loose overlays claim first.
        let catalog = catalog_with(&[("modA", &overlay_dir)], &[("modB", &container_path)]);
        let out_path = utf8(&dir.path().join("out.nxpack"));
        let result = resolve_content(&catalog, mount(&base_path), &out_path).unwrap();

        let ContentResolution::Rebuilt { mut pack, stats } = result else {
            panic!("expected a rebuilt container");
        };
        assert_eq!(&pack.load_entry("a.bin").unwrap()[..], b"loose");
        assert_eq!(stats.conflicts, 1);
    }

    #[test]
    fn test_first_loose_dir_wins_within_kind() {
        let dir = tempdir().unwrap();
        let base_path = utf8(&dir.path().join("base.nxpack"));
        write_pack(&base_path, &[]);

        let first = utf8(&dir.path().join("modA/romfs"));
        let second = utf8(&dir.path().join("modB/romfs"));
        fs::create_dir_all(first.join("a").as_std_path()).unwrap();
        fs::create_dir_all(second.join("a").as_std_path()).unwrap();
        fs::write(first.join("a/b.bin").as_std_path(), b"first").unwrap();
        fs::write(second.join("a/b.bin").as_std_path(), b"second").unwrap();

        let catalog = catalog_with(&[("modA", &first), ("modB", &second)], &[]);
        let out_path = utf8(&dir.path().join("out.nxpack"));
        let result = resolve_content(&catalog, mount(&base_path), &out_path).unwrap();

        let ContentResolution::Rebuilt { mut pack, stats } = result else {
            panic!("expected a rebuilt container");
        };
        assert_eq!(&pack.load_entry("a/b.bin").unwrap()[..], b"first");
        assert_eq!(stats.conflicts, 1);
    }

    #[test]
    fn test_container_overlay_applies() {
        let dir = tempdir().unwrap();
        let base_path = utf8(&dir.path().join("base.nxpack"));
        write_pack(&base_path, &[("a.bin", b"base")]);

        let container_path = utf8(&dir.path().join("romfs.bin"));
        write_pack(&container_path, &[("a.bin", b"packed"), ("d.bin", b"new")]);

        let catalog = catalog_with(&[], &[("modB", &container_path)]);
        let out_path = utf8(&dir.path().join("out.nxpack"));
        let result = resolve_content(&catalog, mount(&base_path), &out_path).unwrap();

        let ContentResolution::Rebuilt { mut pack, .. } = result else {
            panic!("expected a rebuilt container");
        };
        assert_eq!(&pack.load_entry("a.bin").unwrap()[..], b"packed");
        assert_eq!(&pack.load_entry("d.bin").unwrap()[..], b"new");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let dir = tempdir().unwrap();
        let base_path = utf8(&dir.path().join("base.nxpack"));
        write_pack(&base_path, &[("a.bin", b"base-a"), ("z.bin", b"base-z")]);

        let overlay_dir = utf8(&dir.path().join("romfs"));
        fs::create_dir_all(overlay_dir.join("sub").as_std_path()).unwrap();
        fs::write(overlay_dir.join("m.bin").as_std_path(), b"m").unwrap();
        fs::write(overlay_dir.join("sub/n.bin").as_std_path(), b"n").unwrap();

        let catalog = catalog_with(&[("modA", &overlay_dir)], &[]);

        let out_a = utf8(&dir.path().join("out_a.nxpack"));
        let out_b = utf8(&dir.path().join("out_b.nxpack"));
        resolve_content(&catalog, mount(&base_path), &out_a).unwrap();
        resolve_content(&catalog, mount(&base_path), &out_b).unwrap();

        let bytes_a = fs::read(out_a.as_std_path()).unwrap();
        let bytes_b = fs::read(out_b.as_std_path()).unwrap();
        assert_eq!(bytes_a, bytes_b);
    }

    #[test]
    fn test_unreadable_container_skipped() {
        let dir = tempdir().unwrap();
        let base_path = utf8(&dir.path().join("base.nxpack"));
        write_pack(&base_path, &[("a.bin", b"base")]);

        let bogus = utf8(&dir.path().join("romfs.bin"));
        fs::write(bogus.as_std_path(), b"not a pack at all").unwrap();

        let catalog = catalog_with(&[], &[("modB", &bogus)]);
        let result =
            resolve_content(&catalog, mount(&base_path), &utf8(&dir.path().join("out"))).unwrap();

        // The only overlay source was malformed, so the base passes through.
        assert!(matches!(result, ContentResolution::Unmodified(_)));
    }
}
