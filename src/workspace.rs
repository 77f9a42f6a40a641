//! Scoped per-ROM scratch workspace (C10): tracks every path it creates,
//! guarantees reverse-order cleanup on close, and promotes the subset
//! marked as output to the final output tree.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::warn;

use crate::error::ConversionError;

/// Scoped acquisition of `<base>/<rom_base_name>.<suffix>`. All artefacts
/// produced while converting one ROM are tracked here; `close` deletes
/// everything not explicitly marked as output.
pub struct ConversionWorkspace {
    work_dir: PathBuf,
    tracked: Vec<PathBuf>,
    marked_as_output: HashSet<PathBuf>,
    closed: bool,
    cancel_flag: Arc<AtomicBool>,
}

impl ConversionWorkspace {
    /// Creates `<base>/<rom_base_name>.<suffix>` and returns a workspace
    /// with that directory already tracked for deletion.
    pub fn new(
        base: &Path,
        rom_base_name: &str,
        suffix: &str,
        cancel_flag: Arc<AtomicBool>,
    ) -> Result<Self, ConversionError> {
        let work_dir = base.join(format!("{}.{}", rom_base_name, suffix));
        fs::create_dir_all(&work_dir)?;
        let mut workspace = ConversionWorkspace {
            work_dir: work_dir.clone(),
            tracked: Vec::new(),
            marked_as_output: HashSet::new(),
            closed: false,
            cancel_flag,
        };
        workspace.track(work_dir);
        Ok(workspace)
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Adds `path` to the tracked set in insertion order.
    pub fn track(&mut self, path: PathBuf) {
        self.tracked.push(path);
    }

    /// Removes `path` from the deletion set; it survives `close()` and
    /// becomes eligible for `promote_to_final`.
    pub fn mark_as_output(&mut self, path: &Path) {
        self.marked_as_output.insert(path.to_path_buf());
    }

    /// Swaps a tracked path for its renamed counterpart, preserving
    /// insertion order so deletion-on-close still covers it.
    pub fn replace_tracked(&mut self, old: &Path, new: &Path) {
        for tracked in self.tracked.iter_mut() {
            if tracked == old {
                *tracked = new.to_path_buf();
            }
        }
        if self.marked_as_output.remove(old) {
            self.marked_as_output.insert(new.to_path_buf());
        }
    }

    /// Moves `src` to `<final_dir>/<filename>`, preferring an atomic
    /// rename and falling back to copy-then-delete across devices.
    /// Overwrites an existing target and is idempotent when called again
    /// with the same source and destination.
    pub fn promote_to_final(&self, src: &Path, final_dir: &Path) -> Result<PathBuf, ConversionError> {
        fs::create_dir_all(final_dir)?;
        let file_name = src
            .file_name()
            .ok_or_else(|| ConversionError::IoError(std::io::Error::other("promoted path has no file name")))?;
        let dest = final_dir.join(file_name);

        if dest.exists() {
            warn!("[!] Overwriting existing output {}", dest.display());
        }

        match fs::rename(src, &dest) {
            Ok(()) => Ok(dest),
            Err(_) => {
                fs::copy(src, &dest)?;
                fs::remove_file(src)?;
                Ok(dest)
            }
        }
    }

    /// Deletes every tracked-but-not-marked path in reverse insertion
    /// order (files before the directories that contain them). Returns
    /// the list of failures, logging a warning for each; never raises on
    /// its own. Skips deletion entirely, with a warning, if the shared
    /// cancellation flag is set. Safe to call more than once.
    pub fn close(&mut self) -> Vec<String> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;

        if self.cancel_flag.load(Ordering::SeqCst) {
            warn!(
                "[!] Cancellation observed; leaving workspace {} for forensics",
                self.work_dir.display()
            );
            return Vec::new();
        }

        let mut failures = Vec::new();
        for path in self.tracked.iter().rev() {
            if self.marked_as_output.contains(path) {
                continue;
            }
            if !path.exists() {
                continue;
            }
            let result = if path.is_dir() {
                fs::remove_dir(path)
            } else {
                fs::remove_file(path)
            };
            if let Err(err) = result {
                let message = format!("{}: {}", path.display(), err);
                warn!("[!] Failed to clean up {}", message);
                failures.push(message);
            }
        }
        failures
    }
}

impl Drop for ConversionWorkspace {
    fn drop(&mut self) {
        if !self.closed {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cancel_flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn close_deletes_tracked_not_marked_paths_p9() {
        let dir = tempdir().unwrap();
        let mut ws = ConversionWorkspace::new(dir.path(), "game", "1", cancel_flag()).unwrap();
        let scratch = ws.work_dir().join("scratch.bin");
        fs::write(&scratch, b"data").unwrap();
        ws.track(scratch.clone());

        let failures = ws.close();
        assert!(failures.is_empty());
        assert!(!scratch.exists());
        assert!(!ws.work_dir().exists());
    }

    #[test]
    fn marked_paths_survive_close_p9() {
        let dir = tempdir().unwrap();
        let mut ws = ConversionWorkspace::new(dir.path(), "game", "1", cancel_flag()).unwrap();
        let output = ws.work_dir().join("game.img");
        fs::write(&output, b"image").unwrap();
        ws.track(output.clone());
        ws.mark_as_output(&output);

        ws.close();
        assert!(output.exists());
    }

    #[test]
    fn close_is_idempotent_p10() {
        let dir = tempdir().unwrap();
        let mut ws = ConversionWorkspace::new(dir.path(), "game", "1", cancel_flag()).unwrap();
        let scratch = ws.work_dir().join("a.bin");
        fs::write(&scratch, b"x").unwrap();
        ws.track(scratch);

        assert!(ws.close().is_empty());
        assert!(ws.close().is_empty());
        assert!(ws.close().is_empty());
    }

    #[test]
    fn cancellation_skips_cleanup() {
        let dir = tempdir().unwrap();
        let flag = cancel_flag();
        let mut ws = ConversionWorkspace::new(dir.path(), "game", "1", flag.clone()).unwrap();
        let scratch = ws.work_dir().join("a.bin");
        fs::write(&scratch, b"x").unwrap();
        ws.track(scratch.clone());

        flag.store(true, Ordering::SeqCst);
        ws.close();
        assert!(scratch.exists());
    }

    #[test]
    fn promote_to_final_moves_file() {
        let dir = tempdir().unwrap();
        let ws = ConversionWorkspace::new(dir.path(), "game", "1", cancel_flag()).unwrap();
        let src = ws.work_dir().join("game.img");
        fs::write(&src, b"image bytes").unwrap();

        let final_dir = dir.path().join("out");
        let promoted = ws.promote_to_final(&src, &final_dir).unwrap();
        assert!(promoted.exists());
        assert!(!src.exists());
        assert_eq!(fs::read(&promoted).unwrap(), b"image bytes");
    }

    #[test]
    fn promote_to_final_overwrites_existing_target() {
        let dir = tempdir().unwrap();
        let ws = ConversionWorkspace::new(dir.path(), "game", "1", cancel_flag()).unwrap();
        let final_dir = dir.path().join("out");
        fs::create_dir_all(&final_dir).unwrap();
        fs::write(final_dir.join("game.img"), b"old").unwrap();

        let src = ws.work_dir().join("game.img");
        fs::write(&src, b"new").unwrap();
        let promoted = ws.promote_to_final(&src, &final_dir).unwrap();
        assert_eq!(fs::read(&promoted).unwrap(), b"new");
    }
}
