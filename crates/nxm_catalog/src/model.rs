//! Catalog data types.

use camino::Utf8PathBuf;
use nxm_cheat::CheatEntry;
use nxm_core::{ProgramMeta, TitleId};
use serde::Serialize;

/// The well-known executable slot names of an executable partition, in load
/// order. This set is a platform contract: callers of the exefs resolver must
/// supply exactly one slot per name.
pub const EXEFS_SLOTS: [&str; 13] = [
    "rtld", "main", "subsdk0", "subsdk1", "subsdk2", "subsdk3", "subsdk4", "subsdk5", "subsdk6",
    "subsdk7", "subsdk8", "subsdk9", "sdk",
];

/// Number of well-known executable slots.
pub const EXEFS_SLOT_COUNT: usize = EXEFS_SLOTS.len();

/// A named mod overlay directory. Immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct ModDirectory {
    /// Mod (or patch set) name, taken from the directory that contributed it.
    pub name: String,
    pub path: Utf8PathBuf,
}

/// A named mod overlay container file. Immutable after construction.
#[derive(Debug, Clone, Serialize)]
pub struct ModContainer {
    pub name: String,
    pub path: Utf8PathBuf,
}

/// Everything discovered for one title during a collection pass.
///
/// The four overlay lists preserve discovery order; earlier entries take
/// precedence during overlay resolution. The catalog is rebuilt wholesale on
/// every pass and never mutated incrementally.
#[derive(Debug, Clone, Serialize)]
pub struct TitleCatalog {
    pub title_id: TitleId,
    /// Loose content-fs overlay directories.
    pub romfs_dirs: Vec<ModDirectory>,
    /// Loose executable-fs overlay directories.
    pub exefs_dirs: Vec<ModDirectory>,
    /// Packed content-fs overlay containers.
    pub romfs_containers: Vec<ModContainer>,
    /// Whole-partition executable-fs replacement containers.
    pub exefs_containers: Vec<ModContainer>,
    /// Parsed cheat entries, unordered.
    pub cheats: Vec<CheatEntry>,
}

impl TitleCatalog {
    pub fn new(title_id: TitleId) -> Self {
        Self {
            title_id,
            romfs_dirs: Vec::new(),
            exefs_dirs: Vec::new(),
            romfs_containers: Vec::new(),
            exefs_containers: Vec::new(),
            cheats: Vec::new(),
        }
    }

    /// True when no overlay source of any kind was discovered.
    pub fn is_empty(&self) -> bool {
        self.romfs_dirs.is_empty()
            && self.exefs_dirs.is_empty()
            && self.romfs_containers.is_empty()
            && self.exefs_containers.is_empty()
            && self.cheats.is_empty()
    }

    /// True when content-fs overlays exist (the overlay engine's fast-path
    /// check).
    pub fn has_content_overlays(&self) -> bool {
        !self.romfs_dirs.is_empty() || !self.romfs_containers.is_empty()
    }
}

/// Title-independent patch source directories, one list per patch kind.
///
/// Populated at most once per process run; [`PatchCatalog::reset`] starts a
/// fresh lifecycle. This is an explicit object passed by reference to the
/// patch engine, not ambient process-global state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatchCatalog {
    /// Patches applied to partition-resident executables after load.
    pub exefs_patches: Vec<ModDirectory>,
    /// Patches applied to standalone executables.
    pub nro_patches: Vec<ModDirectory>,
    /// Patches applied to kernel-image executables.
    pub kip_patches: Vec<ModDirectory>,
    initialized: bool,
}

impl PatchCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of applying executable-fs overlays: which slots were replaced and
/// which were stubbed, plus the parsed process metadata if any overlay
/// carried one.
///
/// A slot marked both replaced and stubbed resolves in favor of the
/// replacement.
#[derive(Debug, Default)]
pub struct LoadResult {
    replaced: u32,
    stubbed: u32,
    pub metadata: Option<ProgramMeta>,
}

impl LoadResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_replaced(&mut self, slot: usize) {
        debug_assert!(slot < EXEFS_SLOT_COUNT);
        self.replaced |= 1 << slot;
    }

    pub fn is_replaced(&self, slot: usize) -> bool {
        self.replaced & (1 << slot) != 0
    }

    pub fn set_stubbed(&mut self, slot: usize) {
        debug_assert!(slot < EXEFS_SLOT_COUNT);
        self.stubbed |= 1 << slot;
    }

    pub fn is_stubbed(&self, slot: usize) -> bool {
        self.stubbed & (1 << slot) != 0
    }

    pub fn replaced_count(&self) -> u32 {
        self.replaced.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_result_bits() {
        let mut result = LoadResult::new();
        assert!(!result.is_replaced(0));
        assert!(!result.is_stubbed(0));

        result.set_replaced(1);
        result.set_stubbed(1);
        result.set_stubbed(12);

        assert!(result.is_replaced(1));
        assert!(result.is_stubbed(1));
        assert!(result.is_stubbed(12));
        assert!(!result.is_replaced(12));
        assert_eq!(result.replaced_count(), 1);
    }

    #[test]
    fn test_title_catalog_empty() {
        let catalog = TitleCatalog::new(TitleId(1));
        assert!(catalog.is_empty());
        assert!(!catalog.has_content_overlays());
    }

    #[test]
    fn test_patch_catalog_lifecycle() {
        let mut catalog = PatchCatalog::new();
        assert!(!catalog.initialized());

        catalog.mark_initialized();
        assert!(catalog.initialized());

        catalog.reset();
        assert!(!catalog.initialized());
    }
}
