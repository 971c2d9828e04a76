//! Executable-partition resolution.
//!
//! Unlike content resolution, the executable partition is never merged at the
//! file level: a whole-partition container replaces it outright, and loose
//! exefs overlays operate on the fixed set of well-known executable slots.

use crate::error::{Error, Result};
use nxm_catalog::{
    LoadResult, TitleCatalog, EXEFS_SLOTS, EXEFS_SLOT_COUNT, PROGRAM_META_FILE, STUB_SUFFIX,
};
use nxm_core::{Executable, ProgramMeta};
use nxm_pack::Pack;
use std::fs::File;

/// Resolve a whole-partition executable replacement for the title.
///
/// The first discovered container that mounts cleanly wins; later ones are
/// logged as conflicting and ignored. Returns `None` when no replacement
/// applies, in which case the title's packaged partition is used.
pub fn resolve_exefs_partition(catalog: &TitleCatalog) -> Option<Pack<File>> {
    let mut winner: Option<Pack<File>> = None;

    for container in &catalog.exefs_containers {
        if winner.is_some() {
            tracing::warn!(
                "Ignoring conflicting exefs partition replacement from mod '{}' ({})",
                container.name,
                container.path
            );
            continue;
        }

        let pack = File::open(container.path.as_std_path())
            .map_err(nxm_pack::Error::from)
            .and_then(Pack::mount_from_reader);
        match pack {
            Ok(pack) => {
                tracing::info!(
                    "Replacing exefs partition of title {} with container from mod '{}'",
                    catalog.title_id,
                    container.name
                );
                winner = Some(pack);
            }
            Err(e) => {
                tracing::warn!(
                    "Skipping unreadable exefs container '{}': {}",
                    container.path,
                    e
                );
            }
        }
    }

    winner
}

/// Apply loose exefs overlays to the title's executable slots.
///
/// `executables` must hold exactly one (possibly empty) slot per well-known
/// name in [`EXEFS_SLOTS`] order; anything else is a caller contract
/// violation and aborts immediately.
///
/// For each overlay directory in discovery order:
/// - a file named after a slot replaces that slot's executable, first overlay
///   wins; the replacement's header is parsed on installation
/// - a `<slot>.stub` marker stubs the slot; stub flags accumulate across all
///   overlays
/// - a `main.npdm` is parsed at most once across all overlays
///
/// After all overlays are processed, slots stubbed but not replaced are
/// emptied. A slot that is both replaced and stubbed stays replaced.
pub fn apply_exefs_overlays(
    catalog: &TitleCatalog,
    executables: &mut [Option<Executable>],
) -> Result<LoadResult> {
    if executables.len() != EXEFS_SLOT_COUNT {
        return Err(Error::SlotCountMismatch {
            expected: EXEFS_SLOT_COUNT,
            actual: executables.len(),
        });
    }

    let mut result = LoadResult::new();

    for dir in &catalog.exefs_dirs {
        for (slot, slot_name) in EXEFS_SLOTS.iter().enumerate() {
            let replacement = dir.path.join(slot_name);
            if replacement.as_std_path().is_file() {
                if result.is_replaced(slot) {
                    tracing::warn!(
                        "Ignoring duplicate '{}' replacement from mod '{}'",
                        slot_name,
                        dir.name
                    );
                } else {
                    let bytes = std::fs::read(replacement.as_std_path())?;
                    match Executable::parse_nso(slot_name, &bytes) {
                        Ok(exe) => {
                            tracing::info!(
                                "Using replacement '{}' ({}) from mod '{}'",
                                slot_name,
                                exe.build_id.normalized(),
                                dir.name
                            );
                            executables[slot] = Some(exe);
                            result.set_replaced(slot);
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Ignoring invalid '{}' replacement from mod '{}': {}",
                                slot_name,
                                dir.name,
                                e
                            );
                        }
                    }
                }
            }

            let stub = dir.path.join(format!("{slot_name}{STUB_SUFFIX}"));
            if stub.as_std_path().is_file() {
                tracing::info!("Mod '{}' stubs '{}'", dir.name, slot_name);
                result.set_stubbed(slot);
            }
        }

        let meta_path = dir.path.join(PROGRAM_META_FILE);
        if meta_path.as_std_path().is_file() {
            if result.metadata.is_some() {
                tracing::warn!("Ignoring duplicate '{}' from mod '{}'", PROGRAM_META_FILE, dir.name);
            } else {
                let bytes = std::fs::read(meta_path.as_std_path())?;
                match ProgramMeta::parse(&bytes) {
                    Ok(meta) => {
                        tracing::info!("Using '{}' from mod '{}'", PROGRAM_META_FILE, dir.name);
                        result.metadata = Some(meta);
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Ignoring invalid '{}' from mod '{}': {}",
                            PROGRAM_META_FILE,
                            dir.name,
                            e
                        );
                    }
                }
            }
        }
    }

    // Replacement wins over stubbing for the same slot.
    for slot in 0..EXEFS_SLOT_COUNT {
        if result.is_stubbed(slot) && !result.is_replaced(slot) && executables[slot].take().is_some()
        {
            tracing::info!("Stubbed out '{}'", EXEFS_SLOTS[slot]);
        }
    }

    Ok(result)
}
