//! Text patch decoding.
//!
//! A text patch names its target executable in its own content via an
//! `@nsobid-<build id>` line. Edits are `<hex offset> <hex bytes>` lines
//! inside `@enabled` sections; `@disabled` sections are skipped without
//! parsing and `@stop` ends the file early. `//` starts a comment anywhere
//! on a line. Unknown `@` directives are ignored.

use crate::{Error, PatchEdit, PatchSet, Result};

const NSOBID_PREFIX: &str = "@nsobid-";

/// A decoded text patch: embedded target build id plus its edits.
#[derive(Debug, Clone)]
pub struct TextPatch {
    /// Target build id exactly as written in the file (not yet normalized).
    pub build_id: String,
    pub edits: PatchSet,
}

/// Decode text patch source.
///
/// A missing `@nsobid` header or a malformed enabled edit line fails the
/// whole file; the caller discards it rather than applying a partial edit
/// list.
pub fn decode_pchtxt(text: &str) -> Result<TextPatch> {
    let mut build_id = None;
    let mut edits = PatchSet::new();
    let mut enabled = false;

    for (index, raw) in text.lines().enumerate() {
        let line = match raw.find("//") {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(id) = line.strip_prefix(NSOBID_PREFIX) {
            build_id = Some(id.trim().to_string());
            continue;
        }

        if let Some(directive) = line.strip_prefix('@') {
            match directive.to_ascii_lowercase().as_str() {
                "stop" => break,
                "enabled" => enabled = true,
                "disabled" => enabled = false,
                other => tracing::debug!("Ignoring text patch directive '@{}'", other),
            }
            continue;
        }

        // Disabled sections are skipped without validation
        if !enabled {
            continue;
        }

        let mut parts = line.split_whitespace();
        let edit = parts
            .next()
            .zip(parts.next())
            .and_then(|(offset, value)| {
                let offset = u32::from_str_radix(offset, 16).ok()?;
                let bytes = parse_hex_bytes(value)?;
                Some(PatchEdit { offset, bytes })
            })
            .ok_or_else(|| Error::MalformedLine {
                line: index + 1,
                content: line.to_string(),
            })?;

        edits.push(edit);
    }

    let build_id = build_id.ok_or(Error::MissingBuildId)?;
    Ok(TextPatch { build_id, edits })
}

fn parse_hex_bytes(value: &str) -> Option<Vec<u8>> {
    if value.is_empty() || value.len() % 2 != 0 {
        return None;
    }
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&value[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_basic() {
        let text = "@nsobid-0123456789ABCDEF\n@enabled\n00000100 DEADBEEF\n00000200 00\n";
        let patch = decode_pchtxt(text).unwrap();

        assert_eq!(patch.build_id, "0123456789ABCDEF");
        assert_eq!(patch.edits.len(), 2);

        let mut image = vec![0u8; 0x300];
        patch.edits.apply(&mut image, 0);
        assert_eq!(&image[0x100..0x104], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_disabled_section_skipped() {
        let text = "@nsobid-AB\n@disabled\n00000000 FF\n@enabled\n00000001 EE\n";
        let patch = decode_pchtxt(text).unwrap();
        assert_eq!(patch.edits.len(), 1);
    }

    #[test]
    fn test_default_state_is_disabled() {
        let text = "@nsobid-AB\n00000000 FF\n";
        let patch = decode_pchtxt(text).unwrap();
        assert!(patch.edits.is_empty());
    }

    #[test]
    fn test_stop_ends_parsing() {
        let text = "@nsobid-AB\n@enabled\n00000000 11\n@stop\n00000001 22\n";
        let patch = decode_pchtxt(text).unwrap();
        assert_eq!(patch.edits.len(), 1);
    }

    #[test]
    fn test_comments_tolerated() {
        let text = "@nsobid-AB // target\n@enabled\n00000000 11 // patch a thing\n// whole-line comment\n";
        let patch = decode_pchtxt(text).unwrap();
        assert_eq!(patch.build_id, "AB");
        assert_eq!(patch.edits.len(), 1);
    }

    #[test]
    fn test_missing_build_id() {
        let text = "@enabled\n00000000 11\n";
        assert!(matches!(decode_pchtxt(text), Err(Error::MissingBuildId)));
    }

    #[test]
    fn test_malformed_edit_line() {
        let text = "@nsobid-AB\n@enabled\nzzzz 11\n";
        assert!(matches!(
            decode_pchtxt(text),
            Err(Error::MalformedLine { line: 3, .. })
        ));
    }

    #[test]
    fn test_odd_length_value_is_malformed() {
        let text = "@nsobid-AB\n@enabled\n00000000 123\n";
        assert!(decode_pchtxt(text).is_err());
    }
}
