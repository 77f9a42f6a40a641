//! Filename normalization (C7): shell-safe sanitization for on-disk names
//! and DOS 8.3 derivation for FAT12 directory entries.

use std::fs;
use std::path::Path;

use crate::error::ConversionError;
use crate::workspace::ConversionWorkspace;

/// Replaces every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_name(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Renames every tracked part on disk to a shell-safe form (extension
/// preserved), updating the workspace's tracked set so the new path
/// replaces the old one for deletion-on-close purposes.
pub fn normalize(parts: &mut [std::path::PathBuf], workspace: &mut ConversionWorkspace) -> Result<(), ConversionError> {
    for part in parts.iter_mut() {
        let parent = part.parent().unwrap_or_else(|| Path::new("."));
        let stem = part
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let ext = part.extension().and_then(|s| s.to_str());

        let sanitized_stem = sanitize_name(stem);
        let new_name = match ext {
            Some(ext) => format!("{}.{}", sanitized_stem, ext),
            None => sanitized_stem,
        };
        let new_path = parent.join(&new_name);

        if new_path != *part {
            fs::rename(&part, &new_path)?;
            workspace.replace_tracked(part, &new_path);
            *part = new_path;
        }
    }
    Ok(())
}

/// Derives a FAT12 DOS 8.3 name: uppercase, strip non-`[A-Z0-9]`
/// characters, split at the last `.`, truncate stem to 8 and extension to
/// 3 characters.
pub fn dos_name(s: &str) -> Result<String, ConversionError> {
    let upper = s.to_ascii_uppercase();
    let (stem_raw, ext_raw) = match upper.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext),
        None => (upper.as_str(), ""),
    };

    let clean = |s: &str| -> String {
        s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
    };

    let stem: String = clean(stem_raw).chars().take(8).collect();
    let ext: String = clean(ext_raw).chars().take(3).collect();

    if stem.is_empty() {
        return Err(ConversionError::InvalidDosName(s.to_string()));
    }

    Ok(if ext.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, ext)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_name_keeps_allowed_charset_p12() {
        let sanitized = sanitize_name("Chrono Trigger! (USA).sfc");
        assert!(sanitized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'));
    }

    #[test]
    fn sanitize_name_replaces_disallowed_chars() {
        assert_eq!(sanitize_name("a b/c"), "a_b_c");
    }

    #[test]
    fn dos_name_matches_format_p11() {
        let name = dos_name("chrono_trigger.fig").unwrap();
        assert_eq!(name, "CHRONOTR.FIG");
        let re_applied = dos_name(&name).unwrap();
        assert_eq!(name, re_applied);
    }

    #[test]
    fn dos_name_truncates_stem_and_extension() {
        let name = dos_name("verylongfilename.12345").unwrap();
        assert_eq!(name, "VERYLONG.123");
    }

    #[test]
    fn dos_name_without_extension() {
        let name = dos_name("README").unwrap();
        assert_eq!(name, "README");
    }

    #[test]
    fn dos_name_fails_when_stem_becomes_empty() {
        let result = dos_name("!!!.txt");
        assert!(matches!(result, Err(ConversionError::InvalidDosName(_))));
    }

    #[test]
    fn dos_name_is_idempotent() {
        for input in ["Super Mario World!.sfc", "GAME.078", "a.b.c"] {
            let once = dos_name(input).unwrap();
            let twice = dos_name(&once).unwrap();
            assert_eq!(once, twice);
        }
    }
}
