//! Processor (C11): wires the splitter, normalizer, packer, template
//! factory, and FAT12 writer into one "ROM -> N floppy images" pipeline,
//! scoped to a single per-ROM workspace.

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::ConversionError;
use crate::fat12::{create_blank_disk, Fat12Writer, Geometry};
use crate::format::Format;
use crate::normalize::{dos_name, normalize, sanitize_name};
use crate::packer::{pack, RomPart};
use crate::rom::analyze_rom;
use crate::splitter::split;
use crate::workspace::ConversionWorkspace;

fn derive_base_name(rom_file: &Path) -> Result<String, ConversionError> {
    let stem = rom_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let sanitized = sanitize_name(stem);
    if sanitized.is_empty() {
        return Err(ConversionError::InvalidRomName(stem.to_string()));
    }
    Ok(sanitized)
}

/// Converts `rom_file` into one or more FAT12 floppy images under
/// `output_base_dir/<sanitized-base-name>/`, using a scratch workspace
/// suffixed `suffix` (the batch orchestrator passes a fresh one per
/// task). Returns the number of floppy images produced.
pub fn process_rom(
    rom_file: &Path,
    output_base_dir: &Path,
    suffix: &str,
    format: Format,
) -> Result<usize, ConversionError> {
    process_rom_with_cancellation(rom_file, output_base_dir, suffix, format, Arc::new(AtomicBool::new(false)))
}

/// CLI entry point for converting one ROM: `process_rom` with a
/// process-unique scratch suffix, so callers never have to invent one.
pub fn run_single(
    input_file: &Path,
    output_dir: &Path,
    format: Format,
) -> Result<usize, ConversionError> {
    process_rom(input_file, output_dir, &std::process::id().to_string(), format)
}

/// As [`process_rom`], but shares a cancellation flag with the batch
/// orchestrator so an in-flight Workspace close can skip cleanup.
pub fn process_rom_with_cancellation(
    rom_file: &Path,
    output_base_dir: &Path,
    suffix: &str,
    format: Format,
    cancel_flag: Arc<AtomicBool>,
) -> Result<usize, ConversionError> {
    let base_name = derive_base_name(rom_file)?;
    fs::create_dir_all(output_base_dir)?;
    let mut workspace = ConversionWorkspace::new(output_base_dir, &base_name, suffix, cancel_flag)?;

    let result = run_pipeline(rom_file, &mut workspace, &base_name, format, output_base_dir);
    let cleanup_failures = workspace.close();

    result.map_err(|err| err.with_cleanup_context(cleanup_failures))
}

fn run_pipeline(
    rom_file: &Path,
    workspace: &mut ConversionWorkspace,
    base_name: &str,
    format: Format,
    output_base_dir: &Path,
) -> Result<usize, ConversionError> {
    let raw = fs::read(rom_file)?;
    let source_name = rom_file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("rom");
    let rom = analyze_rom(&raw, source_name)?;

    let mut part_paths = split(&rom, workspace, base_name, format)?;
    normalize(&mut part_paths, workspace)?;

    let mut rom_parts = Vec::with_capacity(part_paths.len());
    for path in &part_paths {
        let size_bytes = fs::metadata(path)?.len();
        let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        rom_parts.push(RomPart {
            path: path.clone(),
            size_bytes,
            dos_name: dos_name(file_name)?,
        });
    }

    let layouts = pack(rom_parts)?;
    let disk_count = layouts.len();
    let width = disk_count.to_string().len();
    let final_dir = output_base_dir.join(base_name);

    for (k, layout) in layouts.iter().enumerate() {
        let image_name = if disk_count == 1 {
            format!("{}.img", base_name)
        } else {
            format!("{}_{:0width$}.img", base_name, k + 1, width = width)
        };
        let image_path = workspace.work_dir().join(&image_name);
        create_blank_disk(layout.floppy_type, &image_path)?;
        workspace.track(image_path.clone());

        let mut writer = Fat12Writer::open(&image_path, Geometry::for_type(layout.floppy_type))?;
        for part in &layout.parts {
            let bytes = fs::read(&part.path)?;
            writer.write_file(&part.dos_name, &bytes)?;
        }
        writer.flush()?;

        workspace.mark_as_output(&image_path);
        workspace.promote_to_final(&image_path, &final_dir)?;
    }

    Ok(disk_count)
}
