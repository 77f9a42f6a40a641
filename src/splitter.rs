//! ROM Splitter (C5): orchestrates the reader, interleaver, validators,
//! and header generators into an ordered sequence of copier part files on
//! disk, in the copier's playback order.

use std::fs;

use crate::error::ConversionError;
use crate::format::Format;
use crate::normalize::dos_name;
use crate::rom::interleave::{interleave, block_swap, MBIT};
use crate::rom::{validate_hardware_capacity, SnesRom};
use crate::workspace::ConversionWorkspace;

const EIGHT_MBIT_BYTES: usize = 8 * MBIT;
const FOUR_MBIT_BYTES: usize = 4 * MBIT;
const GD3_PAD_BYTE: u8 = 0xFF;

/// Splits `rom` into on-disk copier parts inside `workspace`, named
/// `<base_name>.1`/`.2`/... (FIG/SWC), `<base_name>.1gm`/`.2gm`/... (UFO),
/// or title-derived `SF??????.078` names (GD3). Returns the part paths in
/// copier playback order.
pub fn split(
    rom: &SnesRom,
    workspace: &mut ConversionWorkspace,
    base_name: &str,
    format: Format,
) -> Result<Vec<std::path::PathBuf>, ConversionError> {
    let payload = match format {
        Format::Fig | Format::Swc => interleave(&rom.data),
        Format::Ufo => ufo_payload(rom),
        Format::Gd3 => rom.data.clone(),
    };

    validate_hardware_capacity(
        format,
        matches!(rom.rom_type, crate::rom::RomType::ExHiRom),
        payload.len() as u64,
    )?;

    match format {
        Format::Fig | Format::Swc => split_fixed_chunks(rom, workspace, base_name, format, &payload),
        Format::Ufo => split_ufo_chunks(rom, workspace, base_name, &payload),
        Format::Gd3 => split_gd3_chunks(rom, workspace, &payload),
    }
}

fn write_part(
    workspace: &mut ConversionWorkspace,
    name: &str,
    header: &[u8],
    body: &[u8],
) -> Result<std::path::PathBuf, ConversionError> {
    let path = workspace.work_dir().join(name);
    let mut bytes = Vec::with_capacity(header.len() + body.len());
    bytes.extend_from_slice(header);
    bytes.extend_from_slice(body);
    fs::write(&path, &bytes)?;
    workspace.track(path.clone());
    Ok(path)
}

fn split_fixed_chunks(
    rom: &SnesRom,
    workspace: &mut ConversionWorkspace,
    base_name: &str,
    format: Format,
    payload: &[u8],
) -> Result<Vec<std::path::PathBuf>, ConversionError> {
    let chunks: Vec<&[u8]> = payload.chunks(EIGHT_MBIT_BYTES).collect();
    let total = chunks.len();
    let mut paths = Vec::with_capacity(total);
    for (i, chunk) in chunks.into_iter().enumerate() {
        let is_last = i == total - 1;
        let header = format.generate_header(rom, chunk.len(), i, total, is_last);
        let name = format!("{}.{}", base_name, i + 1);
        paths.push(write_part(workspace, &name, &header, chunk)?);
    }
    Ok(paths)
}

/// Builds the interleaved UFO payload, applying the irregular-chunk
/// exemption (§9 Open Questions, resolved in `SPEC_FULL.md` §4): a HiROM
/// ROM whose raw length is 12, 20, or 28 Mbit skips mirror-extension
/// entirely and block-swaps its exact length instead, so its trailing
/// 4 Mbit becomes one short final chunk rather than padding to 8 Mbit.
fn ufo_payload(rom: &SnesRom) -> Vec<u8> {
    let raw_mbit = rom.data.len() / MBIT;
    if rom.is_hirom() && matches!(raw_mbit, 12 | 20 | 28) {
        block_swap(&rom.data)
    } else {
        interleave(&rom.data)
    }
}

fn split_ufo_chunks(
    rom: &SnesRom,
    workspace: &mut ConversionWorkspace,
    base_name: &str,
    payload: &[u8],
) -> Result<Vec<std::path::PathBuf>, ConversionError> {
    let raw_mbit = rom.data.len() / MBIT;
    let irregular = rom.is_hirom() && matches!(raw_mbit, 12 | 20 | 28);

    let mut boundaries = Vec::new();
    let mut offset = 0;
    while offset < payload.len() {
        let remaining = payload.len() - offset;
        let size = if irregular && remaining == FOUR_MBIT_BYTES {
            FOUR_MBIT_BYTES
        } else {
            remaining.min(EIGHT_MBIT_BYTES)
        };
        boundaries.push((offset, size));
        offset += size;
    }

    let total = boundaries.len();
    let mut paths = Vec::with_capacity(total);
    for (i, (start, size)) in boundaries.into_iter().enumerate() {
        let chunk = &payload[start..start + size];
        let is_last = i == total - 1;
        let header = Format::Ufo.generate_header(rom, chunk.len(), i, total, is_last);
        let name = format!("{}.{}gm", base_name, i + 1);
        paths.push(write_part(workspace, &name, &header, chunk)?);
    }
    Ok(paths)
}

/// Derives the six-character GD3 filename stem from a ROM title: upper
/// case, take the first 6 characters, then collapse runs of
/// non-alphanumerics into a single underscore.
fn gd3_title_stem(title: &str) -> String {
    let upper: String = title.to_uppercase().chars().take(6).collect();
    let mut stem = String::with_capacity(6);
    let mut last_was_separator = false;
    for c in upper.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c);
            last_was_separator = false;
        } else if !last_was_separator {
            stem.push('_');
            last_was_separator = true;
        }
    }
    stem
}

/// Rounds a HiROM GD3 part count up to the nearest even number (at least
/// 2 disks), per the Open Question resolution in `SPEC_FULL.md` §4.
fn gd3_target_part_count(is_hirom: bool, raw_parts: usize) -> usize {
    if is_hirom && raw_parts % 2 != 0 {
        raw_parts + 1
    } else if is_hirom && raw_parts < 2 {
        2
    } else {
        raw_parts
    }
}

fn split_gd3_chunks(
    rom: &SnesRom,
    workspace: &mut ConversionWorkspace,
    payload: &[u8],
) -> Result<Vec<std::path::PathBuf>, ConversionError> {
    let raw_parts = payload.len().div_ceil(EIGHT_MBIT_BYTES).max(1);
    let target_parts = gd3_target_part_count(rom.is_hirom(), raw_parts);
    let padded_len = target_parts * EIGHT_MBIT_BYTES;

    let mut padded = payload.to_vec();
    padded.resize(padded_len, GD3_PAD_BYTE);

    let stem = gd3_title_stem(&rom.title);
    let mut names = Vec::with_capacity(target_parts);
    for i in 0..target_parts {
        let letter = (b'A' + (i % 26) as u8) as char;
        names.push(format!("{}{}.078", stem, letter));
    }

    let mut seen_dos = std::collections::HashSet::new();
    for name in &names {
        let truncated = dos_name(name)?;
        if !seen_dos.insert(truncated.clone()) {
            return Err(ConversionError::DosNameCollision(truncated));
        }
    }

    let mut paths = Vec::with_capacity(target_parts);
    for (i, name) in names.into_iter().enumerate() {
        let chunk = &padded[i * EIGHT_MBIT_BYTES..(i + 1) * EIGHT_MBIT_BYTES];
        let header = Format::Gd3.generate_header(rom, chunk.len(), i, target_parts, i == target_parts - 1);
        paths.push(write_part(workspace, &name, &header, chunk)?);
    }
    Ok(paths)
}
