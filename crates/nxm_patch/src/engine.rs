//! Patch matching and application.
//!
//! The engine computes every executable's normalized build id once, scans all
//! patch source directories, accumulates matching edits per executable, and
//! applies each executable's accumulated set in one pass. Accumulate-then-
//! apply means a single executable can receive overlapping patches from
//! independent sources without re-reading the image per source, and the
//! outcome is independent of source discovery order for non-overlapping
//! edits.

use crate::{decode_ips, decode_pchtxt, PatchSet, IPS_EXTENSION, PCHTXT_EXTENSION};
use camino::{Utf8Path, Utf8PathBuf};
use nxm_catalog::ModDirectory;
use nxm_core::{normalize_build_id, Executable};
use std::fs::File;
use std::io::BufReader;

/// Scan `sources` for patches matching `executables` and apply them.
///
/// `protected_offset` is the header length the patch files' offsets include
/// but the in-memory images do not (0 for full-image formats). Unreadable
/// sources and malformed patch files are skipped with a warning; patch files
/// whose target id matches no executable are skipped silently.
///
/// Returns `true` when at least one edit was applied to at least one
/// executable.
pub fn apply_patches(
    sources: &[ModDirectory],
    protected_offset: u32,
    executables: &mut [Executable],
) -> bool {
    let ids: Vec<String> = executables
        .iter()
        .map(|exe| exe.build_id.normalized())
        .collect();

    let mut pending: Vec<PatchSet> = vec![PatchSet::new(); executables.len()];

    for source in sources {
        let files = match sorted_files(&source.path) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Skipping unreadable patch source '{}': {}", source.path, e);
                continue;
            }
        };

        for file in files {
            match file.extension().map(str::to_ascii_lowercase).as_deref() {
                Some(IPS_EXTENSION) => collect_ips(source, &file, &ids, &mut pending),
                Some(PCHTXT_EXTENSION) => collect_pchtxt(source, &file, &ids, &mut pending),
                _ => {}
            }
        }
    }

    let mut any_applied = false;
    for (exe, set) in executables.iter_mut().zip(&pending) {
        if set.is_empty() {
            continue;
        }
        let applied = set.apply(&mut exe.image, protected_offset);
        if applied > 0 {
            tracing::info!(
                "Applied {} edit(s) to '{}' ({})",
                applied,
                exe.name,
                exe.build_id.normalized()
            );
            any_applied = true;
        }
    }

    any_applied
}

/// A binary-offset patch names its target in the filename: the portion before
/// the first `.`, trailing zeros trimmed.
fn collect_ips(
    source: &ModDirectory,
    file: &Utf8Path,
    ids: &[String],
    pending: &mut [PatchSet],
) {
    let stem = file
        .file_name()
        .and_then(|name| name.split('.').next())
        .unwrap_or_default();
    let target = normalize_build_id(stem);

    let Some(index) = find_target(ids, &target) else {
        tracing::trace!("No executable matches patch '{}'", file);
        return;
    };

    let set = File::open(file.as_std_path())
        .map_err(crate::Error::from)
        .and_then(|f| decode_ips(&mut BufReader::new(f)));
    match set {
        Ok(set) => {
            tracing::info!(
                "Found patch '{}' from '{}' ({} edit(s))",
                file.file_name().unwrap_or_default(),
                source.name,
                set.len()
            );
            pending[index].append(set);
        }
        Err(e) => tracing::warn!("Discarding malformed patch '{}': {}", file, e),
    }
}

/// A text patch embeds its target id in the content, so it must be decoded
/// before matching.
fn collect_pchtxt(
    source: &ModDirectory,
    file: &Utf8Path,
    ids: &[String],
    pending: &mut [PatchSet],
) {
    let patch = std::fs::read_to_string(file.as_std_path())
        .map_err(crate::Error::from)
        .and_then(|text| decode_pchtxt(&text));
    let patch = match patch {
        Ok(patch) => patch,
        Err(e) => {
            tracing::warn!("Discarding malformed patch '{}': {}", file, e);
            return;
        }
    };

    let target = normalize_build_id(&patch.build_id);
    let Some(index) = find_target(ids, &target) else {
        tracing::trace!("No executable matches patch '{}'", file);
        return;
    };

    tracing::info!(
        "Found patch '{}' from '{}' ({} edit(s))",
        file.file_name().unwrap_or_default(),
        source.name,
        patch.edits.len()
    );
    pending[index].append(patch.edits);
}

/// Executable counts are small; a linear scan over the precomputed ids is
/// all the indexing this needs.
fn find_target(ids: &[String], target: &str) -> Option<usize> {
    ids.iter().position(|id| id == target)
}

fn sorted_files(dir: &Utf8Path) -> std::io::Result<Vec<Utf8PathBuf>> {
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
        if path.as_std_path().is_file() {
            out.push(path);
        }
    }
    out.sort_unstable();
    Ok(out)
}
