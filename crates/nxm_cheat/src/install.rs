//! Cheat installation against loaded executables.

use crate::{CheatEntry, Result, CHEATS_DIR, ENABLED_CHEATS_FILE};
use camino::Utf8Path;
use nxm_core::{BuildId, Executable};

/// External cheat-execution collaborator.
///
/// The engine owns the virtual machine that runs installed cheats against a
/// process; this crate only decides *which* entries reach it and in what
/// order.
pub trait TamperEngine {
    /// Install one cheat against the executable identified by `build_id`.
    fn install_cheat(
        &mut self,
        name: &str,
        build_id: &BuildId,
        instructions: &[String],
    ) -> Result<()>;

    /// Select which installed cheats become active. Cheats not named stay
    /// installed but inactive.
    fn enable_cheats(&mut self, names: &[String]) -> Result<()>;
}

/// Install cheat entries against the loaded executables.
///
/// An entry matches an executable when the entry's source file stem
/// (case-normalized) equals the executable's build id truncated to the stem's
/// length. Unmatched entries are skipped with a warning (typically a game
/// version mismatch). After installation the persisted enabled-cheats list
/// (`cheats/enabled.txt` under `title_content_dir`) is loaded, when present,
/// and handed to the engine; without it no cheat is retroactively enabled.
///
/// Returns the number of installed entries.
pub fn install_cheats<E: TamperEngine>(
    entries: &[CheatEntry],
    executables: &[Executable],
    title_content_dir: &Utf8Path,
    engine: &mut E,
) -> Result<usize> {
    let mut installed = 0usize;

    for entry in entries {
        let stem = entry
            .source
            .file_stem()
            .unwrap_or_default()
            .to_uppercase();

        let target = executables
            .iter()
            .find(|exe| build_id_matches_prefix(&exe.build_id, &stem));

        let Some(exe) = target else {
            tracing::warn!(
                "No executable matches cheat '{}' from '{}' (expected build id prefix {})",
                entry.name,
                entry.source,
                stem
            );
            continue;
        };

        tracing::info!(
            "Installing cheat '{}' against '{}' ({})",
            entry.name,
            exe.name,
            exe.build_id.normalized()
        );
        engine.install_cheat(&entry.name, &exe.build_id, &entry.instructions)?;
        installed += 1;
    }

    let enabled_path = title_content_dir.join(CHEATS_DIR).join(ENABLED_CHEATS_FILE);
    if enabled_path.as_std_path().exists() {
        let text = std::fs::read_to_string(enabled_path.as_std_path())?;
        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        tracing::info!("Enabling {} persisted cheat(s)", names.len());
        engine.enable_cheats(&names)?;
    } else {
        tracing::debug!("No persisted enabled-cheats list at {}", enabled_path);
    }

    Ok(installed)
}

/// True when `id` truncated to `stem`'s length equals `stem`.
fn build_id_matches_prefix(id: &BuildId, stem: &str) -> bool {
    !stem.is_empty() && id.to_hex().starts_with(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use nxm_core::build_id::BUILD_ID_LEN;
    use nxm_core::ExecutableKind;
    use std::fs;

    #[derive(Default)]
    struct RecordingEngine {
        installed: Vec<String>,
        enabled: Vec<String>,
    }

    impl TamperEngine for RecordingEngine {
        fn install_cheat(
            &mut self,
            name: &str,
            _build_id: &BuildId,
            _instructions: &[String],
        ) -> Result<()> {
            self.installed.push(name.to_string());
            Ok(())
        }

        fn enable_cheats(&mut self, names: &[String]) -> Result<()> {
            self.enabled = names.to_vec();
            Ok(())
        }
    }

    fn exe_with_id(prefix: &[u8]) -> Executable {
        let mut bytes = [0u8; BUILD_ID_LEN];
        bytes[..prefix.len()].copy_from_slice(prefix);
        Executable {
            name: "main".to_string(),
            kind: ExecutableKind::Nso,
            build_id: BuildId::from_bytes(bytes),
            image: Vec::new(),
        }
    }

    fn entry(source: &str, name: &str) -> CheatEntry {
        CheatEntry {
            name: name.to_string(),
            source: Utf8PathBuf::from(source),
            instructions: vec!["04000000 00000000 00000001".to_string()],
        }
    }

    #[test]
    fn test_install_matching_entry() {
        let dir = tempfile::tempdir().unwrap();
        let title_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let exes = vec![exe_with_id(&[0xde, 0xad, 0xbe, 0xef])];
        let entries = vec![entry("DEADBEEF.txt", "Fly")];

        let mut engine = RecordingEngine::default();
        let installed = install_cheats(&entries, &exes, &title_dir, &mut engine).unwrap();

        assert_eq!(installed, 1);
        assert_eq!(engine.installed, vec!["Fly"]);
        assert!(engine.enabled.is_empty());
    }

    #[test]
    fn test_lowercase_filename_matches() {
        let dir = tempfile::tempdir().unwrap();
        let title_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let exes = vec![exe_with_id(&[0xde, 0xad, 0xbe, 0xef])];
        let entries = vec![entry("deadbeef.txt", "Fly")];

        let mut engine = RecordingEngine::default();
        assert_eq!(
            install_cheats(&entries, &exes, &title_dir, &mut engine).unwrap(),
            1
        );
    }

    #[test]
    fn test_unmatched_entry_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let title_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let exes = vec![exe_with_id(&[0x01])];
        let entries = vec![entry("FFFF.txt", "Nope")];

        let mut engine = RecordingEngine::default();
        let installed = install_cheats(&entries, &exes, &title_dir, &mut engine).unwrap();

        assert_eq!(installed, 0);
        assert!(engine.installed.is_empty());
    }

    #[test]
    fn test_enabled_list_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("cheats")).unwrap();
        fs::write(dir.path().join("cheats/enabled.txt"), "Fly\n\n  Swim  \n").unwrap();
        let title_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();

        let exes = vec![exe_with_id(&[0xde, 0xad])];
        let entries = vec![entry("DEAD.txt", "Fly")];

        let mut engine = RecordingEngine::default();
        install_cheats(&entries, &exes, &title_dir, &mut engine).unwrap();

        assert_eq!(engine.enabled, vec!["Fly", "Swim"]);
    }
}
