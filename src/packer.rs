//! Disk Packer (C8): greedy bin-packing of ordered ROM parts onto the
//! smallest floppy type that fits each group.

use std::path::PathBuf;

use crate::error::ConversionError;
use crate::fat12::FloppyType;

/// A single copier part as it exists on disk, ready to be packed onto a
/// floppy and later copied into a FAT12 image under `dos_name`.
#[derive(Debug, Clone)]
pub struct RomPart {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub dos_name: String,
}

/// A contiguous run of parts assigned to one floppy.
#[derive(Debug, Clone)]
pub struct DiskLayout {
    pub parts: Vec<RomPart>,
    pub floppy_type: FloppyType,
}

/// Bytes reserved per floppy for FAT12 overhead (boot sector, two FATs,
/// root directory) on top of the raw part payload.
const OVERHEAD_BYTES: u64 = 16 * 1024;

fn largest_capacity() -> u64 {
    FloppyType::F160M.capacity_bytes() as u64
}

/// Greedily packs `parts` (in order) into the fewest floppies, always
/// sealing the current group at the smallest floppy type that fits it
/// once the next part would overflow the largest capacity.
pub fn pack(parts: Vec<RomPart>) -> Result<Vec<DiskLayout>, ConversionError> {
    let max_payload = largest_capacity() - OVERHEAD_BYTES;

    let mut layouts = Vec::new();
    let mut current: Vec<RomPart> = Vec::new();
    let mut current_bytes: u64 = 0;

    for part in parts {
        if part.size_bytes > max_payload {
            return Err(ConversionError::PartTooLarge {
                part_bytes: part.size_bytes,
                max_bytes: max_payload,
            });
        }

        if !current.is_empty() && current_bytes + part.size_bytes > max_payload {
            layouts.push(seal(current, current_bytes)?);
            current = Vec::new();
            current_bytes = 0;
        }

        current_bytes += part.size_bytes;
        current.push(part);
    }

    if !current.is_empty() {
        layouts.push(seal(current, current_bytes)?);
    }

    Ok(layouts)
}

fn seal(parts: Vec<RomPart>, total_bytes: u64) -> Result<DiskLayout, ConversionError> {
    let floppy_type = FloppyType::smallest_fit((total_bytes + OVERHEAD_BYTES) as usize)
        .unwrap_or(FloppyType::F160M);
    Ok(DiskLayout { parts, floppy_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(size_bytes: u64) -> RomPart {
        RomPart {
            path: PathBuf::from(format!("part-{}", size_bytes)),
            size_bytes,
            dos_name: "PART.BIN".into(),
        }
    }

    #[test]
    fn single_small_part_fits_on_smallest_floppy_p7() {
        let layouts = pack(vec![part(100_000)]).unwrap();
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].floppy_type, FloppyType::F720K);
    }

    #[test]
    fn every_layout_respects_capacity_minus_overhead_p7() {
        let parts = (0..20).map(|_| part(200_000)).collect::<Vec<_>>();
        let layouts = pack(parts).unwrap();
        for layout in &layouts {
            let total: u64 = layout.parts.iter().map(|p| p.size_bytes).sum();
            assert!(total + OVERHEAD_BYTES <= layout.floppy_type.capacity_bytes() as u64);
        }
    }

    #[test]
    fn concatenating_layouts_preserves_input_order_p8() {
        let parts: Vec<RomPart> = (0..10).map(|i| part(100_000 + i)).collect();
        let expected_sizes: Vec<u64> = parts.iter().map(|p| p.size_bytes).collect();
        let layouts = pack(parts).unwrap();
        let flattened: Vec<u64> = layouts
            .into_iter()
            .flat_map(|l| l.parts.into_iter().map(|p| p.size_bytes))
            .collect();
        assert_eq!(flattened, expected_sizes);
    }

    #[test]
    fn part_larger_than_largest_floppy_fails() {
        let huge = part(largest_capacity());
        let result = pack(vec![huge]);
        assert!(matches!(result, Err(ConversionError::PartTooLarge { .. })));
    }

    #[test]
    fn packing_is_deterministic() {
        let parts_a: Vec<RomPart> = (0..7).map(|i| part(300_000 + i * 1000)).collect();
        let parts_b = parts_a.clone();
        let layouts_a = pack(parts_a).unwrap();
        let layouts_b = pack(parts_b).unwrap();
        assert_eq!(layouts_a.len(), layouts_b.len());
        for (a, b) in layouts_a.iter().zip(layouts_b.iter()) {
            assert_eq!(a.floppy_type, b.floppy_type);
            assert_eq!(a.parts.len(), b.parts.len());
        }
    }
}
