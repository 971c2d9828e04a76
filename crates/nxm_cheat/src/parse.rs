//! Line-oriented cheat file parsing.

use crate::{CheatEntry, Result, DEFAULT_CHEAT_NAME};
use camino::Utf8Path;

/// Parse a cheat file from disk.
///
/// IO failures are returned as errors; malformed content is not an error but
/// yields zero entries (see [`parse_cheat_text`]).
pub fn parse_cheat_file(path: &Utf8Path) -> Result<Vec<CheatEntry>> {
    let text = std::fs::read_to_string(path.as_std_path())?;
    Ok(parse_cheat_text(path, &text))
}

/// Parse cheat source text into named instruction groups.
///
/// A line beginning with `[` opens a new section; it must end with `]` and
/// name at least one character. Any malformed header discards the entire file
/// (zero entries, warning logged) rather than yielding a partial parse.
/// Blank lines are skipped; all other lines are instructions appended to the
/// current section. A file with no header yields one entry named
/// [`DEFAULT_CHEAT_NAME`] gathering all instruction lines.
pub fn parse_cheat_text(source: &Utf8Path, text: &str) -> Vec<CheatEntry> {
    let mut entries: Vec<CheatEntry> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') {
            if !line.ends_with(']') || line.len() < 3 {
                tracing::warn!(
                    "Discarding cheat file '{}': malformed section header '{}'",
                    source,
                    line
                );
                return Vec::new();
            }

            entries.push(CheatEntry {
                name: line[1..line.len() - 1].to_string(),
                source: source.to_path_buf(),
                instructions: Vec::new(),
            });
            continue;
        }

        if entries.is_empty() {
            entries.push(CheatEntry {
                name: DEFAULT_CHEAT_NAME.to_string(),
                source: source.to_path_buf(),
                instructions: Vec::new(),
            });
        }

        // A header always exists at this point
        if let Some(current) = entries.last_mut() {
            current.instructions.push(line.to_string());
        }
    }

    entries
}
