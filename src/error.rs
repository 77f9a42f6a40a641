//! Defines the closed error taxonomy for `snes-floppy-forge`, providing a
//! centralized way to handle and propagate failures throughout the
//! conversion pipeline.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::Format;

/// Errors produced while converting a single ROM.
#[derive(Debug)]
pub enum ConversionError {
    /// The ROM Reader could not score any candidate header location high
    /// enough to trust.
    UnreadableHeader(String),
    /// A hardware validator rejected the ROM for the requested copier.
    UnsupportedHardware {
        format: Format,
        actual_bytes: u64,
        max_bytes: u64,
    },
    /// The ROM's base name sanitised to an empty string.
    InvalidRomName(String),
    /// A single part is larger than the largest floppy can hold.
    PartTooLarge { part_bytes: u64, max_bytes: u64 },
    /// Two GD3 part names collapsed onto the same DOS 8.3 name.
    DosNameCollision(String),
    /// A part's name cannot be expressed in DOS 8.3.
    InvalidDosName(String),
    /// The FAT12 writer could not allocate enough clusters for a file.
    OutOfSpace { needed_bytes: u64, free_bytes: u64 },
    /// The FAT12 root directory has no free entry left.
    DirectoryFull,
    /// Any other filesystem failure.
    IoError(io::Error),
    /// One or more tracked workspace artefacts could not be deleted.
    /// Always attached as context to another error; never raised alone.
    CleanupFailed(Vec<String>),
}

impl ConversionError {
    /// Attaches cleanup-failure context gathered while closing a workspace
    /// to an error that is already about to be returned to the caller.
    pub fn with_cleanup_context(self, failures: Vec<String>) -> ConversionError {
        if failures.is_empty() {
            return self;
        }
        match self {
            ConversionError::CleanupFailed(mut existing) => {
                existing.extend(failures);
                ConversionError::CleanupFailed(existing)
            }
            other => {
                let mut msg = other.to_string();
                msg.push_str(" (cleanup also failed: ");
                msg.push_str(&failures.join("; "));
                msg.push(')');
                ConversionError::IoError(io::Error::other(msg))
            }
        }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConversionError::UnreadableHeader(msg) => write!(f, "unreadable ROM header: {}", msg),
            ConversionError::UnsupportedHardware {
                format,
                actual_bytes,
                max_bytes,
            } => write!(
                f,
                "{:?} cannot hold a {}-byte ROM (max {} bytes)",
                format, actual_bytes, max_bytes
            ),
            ConversionError::InvalidRomName(name) => {
                write!(f, "ROM base name '{}' sanitised to empty", name)
            }
            ConversionError::PartTooLarge {
                part_bytes,
                max_bytes,
            } => write!(
                f,
                "part of {} bytes exceeds the largest floppy capacity ({} bytes)",
                part_bytes, max_bytes
            ),
            ConversionError::DosNameCollision(name) => {
                write!(f, "DOS 8.3 name collision on '{}'", name)
            }
            ConversionError::InvalidDosName(name) => {
                write!(f, "'{}' cannot be expressed as a DOS 8.3 name", name)
            }
            ConversionError::OutOfSpace {
                needed_bytes,
                free_bytes,
            } => write!(
                f,
                "FAT12 image out of space: needed {} bytes, {} free",
                needed_bytes, free_bytes
            ),
            ConversionError::DirectoryFull => write!(f, "FAT12 root directory is full"),
            ConversionError::IoError(err) => write!(f, "I/O error: {}", err),
            ConversionError::CleanupFailed(failures) => {
                write!(f, "cleanup failed for: {}", failures.join("; "))
            }
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConversionError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConversionError {
    fn from(err: io::Error) -> ConversionError {
        ConversionError::IoError(err)
    }
}

/// Errors raised while validating CLI-supplied configuration, kept
/// separate from [`ConversionError`] so argument mistakes never get
/// reported as pipeline failures.
#[derive(Debug)]
pub enum ConfigError {
    InvalidJobCount(usize),
    OutputRootUnwritable(PathBuf),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidJobCount(n) => {
                write!(f, "job count must be at least 1, got {}", n)
            }
            ConfigError::OutputRootUnwritable(path) => {
                write!(f, "output root '{}' is not writable", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}
