//! Template Factory (C9): materializes a blank FAT12 floppy image of a
//! chosen capacity.

use std::fs;
use std::path::Path;

use crate::error::ConversionError;
use crate::fat12::bpb::{write_bpb, FloppyType};

/// Writes a blank, valid FAT12 image of `floppy_type`'s capacity to
/// `target_path`, replacing any existing file there.
pub fn create_blank_disk(floppy_type: FloppyType, target_path: &Path) -> Result<(), ConversionError> {
    let mut image = vec![0u8; floppy_type.capacity_bytes()];
    write_bpb(&mut image, floppy_type);
    fs::write(target_path, &image)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_image_of_the_requested_capacity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blank.img");
        create_blank_disk(FloppyType::F144M, &path).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.len() as usize, FloppyType::F144M.capacity_bytes());
    }

    #[test]
    fn overwrites_an_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blank.img");
        fs::write(&path, b"stale contents").unwrap();
        create_blank_disk(FloppyType::F720K, &path).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.len() as usize, FloppyType::F720K.capacity_bytes());
    }
}
