//! Observer & reporting (C14): pluggable batch-progress callbacks driven
//! by the batch orchestrator.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{error, info, warn};

use crate::error::ConversionError;

/// Callbacks invoked by the batch orchestrator (C12) as it walks ROMs.
/// A plain trait rather than an async interface, matching the rest of
/// this crate's blocking, thread-per-task model.
pub trait ConversionObserver: Send + Sync {
    fn on_start(&self, _rom_path: &Path) {}
    fn on_success(&self, _rom_path: &Path, _disk_count: usize) {}
    fn on_failure(&self, _rom_path: &Path, _error: &ConversionError) {}
    /// Called once after the batch finishes walking the input tree.
    fn finish(&self) {}
}

/// Logs every observer callback through the `log` facade, in the style
/// of the teacher's `debug!`/`warn!`/`error!` calls in `console/snes.rs`.
pub struct LoggingObserver;

impl ConversionObserver for LoggingObserver {
    fn on_start(&self, rom_path: &Path) {
        info!("[+] Converting {}", rom_path.display());
    }

    fn on_success(&self, rom_path: &Path, disk_count: usize) {
        info!(
            "[+] {} -> {} floppy image(s)",
            rom_path.display(),
            disk_count
        );
    }

    fn on_failure(&self, rom_path: &Path, error: &ConversionError) {
        error!("[!] FAILED: {} - {}", rom_path.display(), error);
    }
}

/// Accumulates one `RELATIVE - MESSAGE` line per failed ROM and writes
/// `<output_root>/failures.txt` on `finish()`.
pub struct FailuresLog {
    output_root: PathBuf,
    failures: Mutex<Vec<String>>,
}

impl FailuresLog {
    pub fn new(output_root: PathBuf) -> FailuresLog {
        FailuresLog {
            output_root,
            failures: Mutex::new(Vec::new()),
        }
    }
}

impl ConversionObserver for FailuresLog {
    fn on_failure(&self, rom_path: &Path, error: &ConversionError) {
        let line = format!("{} - {}", rom_path.display(), error);
        self.failures.lock().expect("failures mutex poisoned").push(line);
    }

    fn finish(&self) {
        let failures = self.failures.lock().expect("failures mutex poisoned");
        if failures.is_empty() {
            return;
        }
        let path = self.output_root.join("failures.txt");
        if let Err(err) = fs::write(&path, failures.join("\n") + "\n") {
            warn!("[!] Could not write {}: {}", path.display(), err);
        }
    }
}

/// Broadcasts every callback to a fixed set of observers, so the CLI can
/// drive logging and the failures file from one batch run.
pub struct BroadcastObserver {
    observers: Vec<Box<dyn ConversionObserver>>,
}

impl BroadcastObserver {
    pub fn new(observers: Vec<Box<dyn ConversionObserver>>) -> BroadcastObserver {
        BroadcastObserver { observers }
    }
}

impl ConversionObserver for BroadcastObserver {
    fn on_start(&self, rom_path: &Path) {
        for observer in &self.observers {
            observer.on_start(rom_path);
        }
    }

    fn on_success(&self, rom_path: &Path, disk_count: usize) {
        for observer in &self.observers {
            observer.on_success(rom_path, disk_count);
        }
    }

    fn on_failure(&self, rom_path: &Path, error: &ConversionError) {
        for observer in &self.observers {
            observer.on_failure(rom_path, error);
        }
    }

    fn finish(&self) {
        for observer in &self.observers {
            observer.finish();
        }
    }
}
