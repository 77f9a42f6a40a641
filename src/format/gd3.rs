//! GD3 (Game Doctor SF3/6/7) 512-byte header, emitted only on the first
//! part of a disk volume.

use crate::rom::SnesRom;

const HI_8MB: [u8; 24] = [
    0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20, 0x20,
    0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22,
];
const HI_16MB: [u8; 24] = [
    0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21,
    0x22, 0x23, 0x22, 0x23, 0x22, 0x23, 0x22, 0x23,
];
const HI_24MB: [u8; 24] = [
    0x20, 0x21, 0x22, 0x00, 0x20, 0x21, 0x22, 0x00, 0x20, 0x21, 0x22, 0x00, 0x20, 0x21, 0x22, 0x00,
    0x24, 0x25, 0x23, 0x00, 0x24, 0x25, 0x23, 0x00,
];
const HI_32MB: [u8; 24] = [
    0x20, 0x21, 0x22, 0x23, 0x20, 0x21, 0x22, 0x23, 0x20, 0x21, 0x22, 0x23, 0x20, 0x21, 0x22, 0x23,
    0x24, 0x25, 0x26, 0x27, 0x24, 0x25, 0x26, 0x27,
];
const LO_4MB: [u8; 24] = [0x20; 24];
const LO_8MB: [u8; 24] = [
    0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21,
    0x20, 0x21, 0x20, 0x21, 0x20, 0x21, 0x20, 0x21,
];
const LO_16MB: [u8; 24] = [
    0x20, 0x21, 0x22, 0x23, 0x20, 0x21, 0x22, 0x23, 0x20, 0x21, 0x22, 0x23, 0x20, 0x21, 0x22, 0x23,
    0x20, 0x21, 0x22, 0x23, 0x20, 0x21, 0x22, 0x23,
];
const LO_32MB: [u8; 24] = [
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27,
    0x24, 0x25, 0x26, 0x27, 0x24, 0x25, 0x26, 0x27,
];

/// Picks the memory-map table whose bucket size is the smallest one at
/// least as large as `total_parts` (each part is one 8-Mbit / 1-MB chunk),
/// falling back to the largest bucket for anything bigger.
fn memory_map_table(is_hirom: bool, total_parts: usize) -> &'static [u8; 24] {
    let buckets: &[(usize, &[u8; 24])] = if is_hirom {
        &[(8, &HI_8MB), (16, &HI_16MB), (24, &HI_24MB), (32, &HI_32MB)]
    } else {
        &[(4, &LO_4MB), (8, &LO_8MB), (16, &LO_16MB), (32, &LO_32MB)]
    };
    for (size, table) in buckets {
        if total_parts <= *size {
            return table;
        }
    }
    buckets.last().unwrap().1
}

fn sram_code(sram_bytes: usize) -> u8 {
    if sram_bytes >= 8192 {
        0x81
    } else if sram_bytes >= 2048 {
        0x82
    } else {
        0x80
    }
}

/// Builds the 512-byte GD3 header. Returns an empty vec for any part index
/// beyond the first, matching one-header-per-volume hardware semantics.
pub fn generate(rom: &SnesRom, part_index: usize, total_parts: usize) -> Vec<u8> {
    if part_index > 0 {
        return Vec::new();
    }

    let mut header = vec![0u8; 512];
    header[0..16].copy_from_slice(b"GAME DOCTOR SF 3");
    header[16] = sram_code(rom.sram_bytes());

    let table = memory_map_table(rom.is_hirom(), total_parts);
    header[0x11..0x11 + 24].copy_from_slice(table);

    let has_sram = rom.sram_bytes() > 0;
    if !rom.is_hirom() && rom.has_dsp() {
        header[0x14] = 0x60;
        header[0x1C] = 0x60;
    }
    if rom.is_hirom() && has_sram {
        header[0x29] = 0x0C;
        header[0x2A] = 0x0C;
    }
    if !rom.is_hirom() && has_sram {
        header[0x24] = 0x40;
        header[0x28] = 0x40;
    }

    header
}
