//! Copier formats (C4): the four 512-byte header generators and the
//! `Format` enum that selects among them.

pub mod fig;
pub mod gd3;
pub mod swc;
pub mod ufo;

use crate::rom::SnesRom;

/// The four copier formats this crate can target. A plain closed enum, not
/// a trait object: dynamic dispatch across unknown formats is never
/// needed, only a fixed set of four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Format {
    Fig,
    Swc,
    Ufo,
    Gd3,
}

impl Format {
    /// Generates the 512-byte copier header for one split part. GD3 emits
    /// a header only for `part_index == 0`, and needs `total_parts` to pick
    /// its memory-map table; every other part of every format always
    /// returns exactly 512 bytes (P4).
    pub fn generate_header(
        self,
        rom: &SnesRom,
        part_size: usize,
        part_index: usize,
        total_parts: usize,
        is_last: bool,
    ) -> Vec<u8> {
        match self {
            Format::Fig => fig::generate(rom, part_size, is_last),
            Format::Swc => swc::generate(rom, part_size, is_last),
            Format::Ufo => ufo::generate(rom, part_size, is_last),
            Format::Gd3 => gd3::generate(rom, part_index, total_parts),
        }
    }
}
