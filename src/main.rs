use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use snes_floppy_forge::batch::run_batch;
use snes_floppy_forge::config::Config;
use snes_floppy_forge::observer::{BroadcastObserver, ConversionObserver, FailuresLog, LoggingObserver};
use snes_floppy_forge::rom::{analyze_rom, SnesRom};
use snes_floppy_forge::run_single;
use snes_floppy_forge::Format;

#[derive(Parser)]
#[clap(author, version, about = "Converts SNES ROMs into copier floppy images", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all log output below warning level.
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single ROM file.
    Single {
        input_file: PathBuf,
        output_dir: PathBuf,
        #[clap(long, value_enum)]
        format: CliFormat,
        /// Print the result as a JSON object instead of plain text.
        #[clap(long)]
        json: bool,
    },
    /// Walk a directory tree and convert every ROM found.
    Batch {
        input_dir: PathBuf,
        output_dir: PathBuf,
        #[clap(long, value_enum)]
        format: CliFormat,
        /// Number of worker threads (defaults to available CPU parallelism).
        #[clap(long)]
        jobs: Option<usize>,
        /// Validate inputs and print what would happen, without writing images.
        #[clap(long)]
        dry_run: bool,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum CliFormat {
    Fig,
    Swc,
    Ufo,
    Gd3,
}

impl From<CliFormat> for Format {
    fn from(value: CliFormat) -> Format {
        match value {
            CliFormat::Fig => Format::Fig,
            CliFormat::Swc => Format::Swc,
            CliFormat::Ufo => Format::Ufo,
            CliFormat::Gd3 => Format::Gd3,
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Warn
    } else {
        match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new().filter_level(level).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Single {
            input_file,
            output_dir,
            format,
            json,
        } => run_single_command(&input_file, &output_dir, format.into(), json),
        Command::Batch {
            input_dir,
            output_dir,
            format,
            jobs,
            dry_run,
        } => run_batch_command(&input_dir, &output_dir, format.into(), jobs, dry_run),
    }
}

/// Plain-data summary of one conversion, serialized for `single --json`.
/// `analysis` carries the header fields `analyze_rom` extracted, mirroring
/// the teacher's `RomAnalysisResult` as the machine-readable payload.
#[derive(serde::Serialize)]
struct ConversionSummary<'a> {
    rom: &'a str,
    format: Format,
    disk_count: usize,
    analysis: SnesRom,
}

fn run_single_command(
    input_file: &std::path::Path,
    output_dir: &std::path::Path,
    format: Format,
    json: bool,
) -> ExitCode {
    let jobs = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let config = match Config::new(format, jobs, output_dir.to_path_buf(), false) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid arguments: {}", err);
            return ExitCode::from(2);
        }
    };

    if !input_file.exists() {
        eprintln!("ROM file not found: {}", input_file.display());
        return ExitCode::from(2);
    }

    match run_single(input_file, &config.output_root, config.format) {
        Ok(disk_count) => {
            if json {
                let rom_path = input_file.display().to_string();
                let analysis = match std::fs::read(input_file).and_then(|raw| {
                    analyze_rom(&raw, &rom_path).map_err(std::io::Error::other)
                }) {
                    Ok(analysis) => analysis,
                    Err(err) => {
                        eprintln!("could not re-read ROM header for summary: {}", err);
                        return ExitCode::from(1);
                    }
                };
                let summary = ConversionSummary {
                    rom: &rom_path,
                    format: config.format,
                    disk_count,
                    analysis,
                };
                match serde_json::to_string(&summary) {
                    Ok(line) => println!("{}", line),
                    Err(err) => eprintln!("could not serialize summary: {}", err),
                }
            } else {
                println!("{} -> {} floppy image(s)", input_file.display(), disk_count);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("conversion failed: {}", err);
            ExitCode::from(1)
        }
    }
}

fn run_batch_command(
    input_dir: &std::path::Path,
    output_dir: &std::path::Path,
    format: Format,
    jobs: Option<usize>,
    dry_run: bool,
) -> ExitCode {
    let jobs = jobs
        .or_else(|| std::thread::available_parallelism().map(|n| n.get()).ok())
        .unwrap_or(1);

    let config = match Config::new(format, jobs, output_dir.to_path_buf(), dry_run) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid arguments: {}", err);
            return ExitCode::from(2);
        }
    };

    if !input_dir.is_dir() {
        eprintln!("input directory not found: {}", input_dir.display());
        return ExitCode::from(2);
    }

    if config.dry_run {
        println!(
            "dry run: would convert ROMs under {} into {}",
            input_dir.display(),
            config.output_root.display()
        );
        return ExitCode::SUCCESS;
    }

    if let Err(err) = std::fs::create_dir_all(&config.output_root) {
        eprintln!("could not create {}: {}", config.output_root.display(), err);
        return ExitCode::from(1);
    }

    let observer: Arc<dyn ConversionObserver> = Arc::new(BroadcastObserver::new(vec![
        Box::new(LoggingObserver),
        Box::new(FailuresLog::new(config.output_root.clone())),
    ]));

    let summary = run_batch(input_dir, &config.output_root, config.format, config.jobs, observer);
    println!(
        "Batch complete: {} successful, {} failed",
        summary.successes, summary.failures
    );

    if summary.failures > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
