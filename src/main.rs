use clap::{Parser, Subcommand};
use mediastamp::batch::{self, BatchOptions};
use mediastamp::config::{self, Generation, ToolConfig};
use mediastamp::merge::{self, MergeScope};
use mediastamp::output;
use mediastamp::timesource::{FileTimeSource, Ffprobe, NoProbe, TimeSource};
use mediastamp::types::CameraAndDataType;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mediastamp")]
#[command(about = "Rename camera media into sortable date_time_camera names, and back")]
#[command(long_about = "\
Rename camera media into sortable date_time_camera names, and back

Recognized device names:
  GH020007.MP4  GX010001.MP4  GP010001.MP4    action camera (codex, chapter, sequence)
  IMG_0042.MOV  IMG_0042.HEIC                 phone video / image
  MVI_0042.MOV                                camera video
  DSCF0042.JPG                                camera image

Canonical names:
  20240615_143000_11Mini-GH020007.MP4         current (original stem kept)
  20240615_143000_11Mini_02-GH020007.MP4      same fields, second file
  20240615_143000_GV_11Mini_0007_02_GH.MP4    legacy (--generation legacy)

Capture time is the modification time; for videos the duration reported by
ffprobe is subtracted. 'recover' turns canonical names back into the device
names; 'rename-camera OLD NEW' swaps a camera ID in names already produced.
Files that cannot be handled are reported and left alone; the exit
status is non-zero if any file failed.

Run 'mediastamp gen-config' to generate a documented mediastamp.toml.")]
#[command(version)]
struct Cli {
    /// Folder containing the media files
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Folder to move renamed files into (defaults to the source folder)
    #[arg(long, global = true)]
    destination: Option<PathBuf>,

    /// Config file (defaults to mediastamp.toml in the source folder)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug diagnostics (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by commands that rename files.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Report what would happen without touching any file
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Rename device files into the canonical layout
    Process {
        /// Camera ID for every device file, replacing the per-family default
        #[arg(long)]
        camera_id: Option<String>,
        /// Camera/type code for every device file (GV, GI, IV, II, CV, CI)
        #[arg(long, value_parser = parse_camera_type)]
        camera_type: Option<CameraAndDataType>,
        /// Default camera ID for action-camera files
        #[arg(long)]
        gopro_id: Option<String>,
        /// Default camera ID for IMG_ files
        #[arg(long)]
        iphone_id: Option<String>,
        /// Canonical layout to write: current or legacy
        #[arg(long, value_parser = parse_generation)]
        generation: Option<Generation>,
        /// Keep hundredths of a second in the time field
        #[arg(long)]
        hundredths: bool,
        /// Use the modification time as-is, without probing video duration
        #[arg(long)]
        no_probe: bool,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Rename canonical files back to their original device names
    Recover(RunArgs),
    /// Replace one camera ID with another in already renamed files
    RenameCamera {
        /// Camera ID currently in the names
        old_id: String,
        /// Camera ID to put in its place
        new_id: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Classify files without renaming anything
    List {
        /// One line per recognized file
        #[arg(long)]
        detailed: bool,
        /// Print the inventory as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move files out of single-file subfolders (AirDrop) and remove the folders
    Merge {
        /// Flatten every subfolder, not just single-file ones
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Print a stock mediastamp.toml with all options documented
    GenConfig,
}

fn parse_camera_type(code: &str) -> Result<CameraAndDataType, String> {
    match CameraAndDataType::from_abbreviation(&code.to_ascii_uppercase()) {
        Some(CameraAndDataType::Unknown) | None => Err(format!(
            "unknown camera/type code {code:?}, expected one of GV, GI, IV, II, CV, CI"
        )),
        Some(t) => Ok(t),
    }
}

fn parse_generation(name: &str) -> Result<Generation, String> {
    match name.to_ascii_lowercase().as_str() {
        "current" => Ok(Generation::Current),
        "legacy" => Ok(Generation::Legacy),
        _ => Err(format!("unknown generation {name:?}, expected current or legacy")),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "mediastamp=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<ToolConfig, config::ConfigError> {
    match &cli.config {
        Some(path) => config::load_config_file(path),
        None => config::load_config(&cli.source),
    }
}

fn time_source(config: &ToolConfig) -> Box<dyn TimeSource> {
    let hundredths = config.naming.hundredths;
    if config.probe.enabled {
        Box::new(FileTimeSource::new(
            Ffprobe::new(config.probe.command.clone()),
            hundredths,
        ))
    } else {
        Box::new(FileTimeSource::new(NoProbe, hundredths))
    }
}

fn exit_status(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = load_config(&cli)?;
    let source: &Path = &cli.source;
    let destination = cli.destination.clone().unwrap_or_else(|| source.to_path_buf());

    match &cli.command {
        Command::Process {
            camera_id,
            camera_type,
            gopro_id,
            iphone_id,
            generation,
            hundredths,
            no_probe,
            run,
        } => {
            if let Some(id) = gopro_id {
                config.cameras.gopro_id = id.clone();
            }
            if let Some(id) = iphone_id {
                config.cameras.iphone_id = id.clone();
            }
            if let Some(generation) = generation {
                config.naming.generation = *generation;
            }
            config.naming.hundredths |= *hundredths;
            config.probe.enabled &= !*no_probe;
            config.validate()?;

            let mut options = BatchOptions::from_config(&config, &destination);
            options.camera_id = camera_id.clone();
            options.camera_type = *camera_type;
            options.dry_run = run.dry_run;

            let clock = time_source(&config);
            let report =
                batch::process_folder(source, &options, &*clock, output::print_outcome)?;
            output::print_summary(&report.stats, run.dry_run);
            Ok(exit_status(report.has_failures()))
        }
        Command::Recover(run) => {
            let mut options = BatchOptions::from_config(&config, &destination);
            options.dry_run = run.dry_run;
            let report = batch::recover_folder(source, &options, output::print_outcome)?;
            output::print_summary(&report.stats, run.dry_run);
            Ok(exit_status(report.has_failures()))
        }
        Command::RenameCamera {
            old_id,
            new_id,
            run,
        } => {
            let mut options = BatchOptions::from_config(&config, &destination);
            options.dry_run = run.dry_run;
            let report = batch::rename_camera_folder(
                source,
                old_id,
                new_id,
                &options,
                output::print_outcome,
            )?;
            output::print_summary(&report.stats, run.dry_run);
            Ok(exit_status(report.has_failures()))
        }
        Command::List { detailed, json } => {
            let options = BatchOptions::from_config(&config, &destination);
            let inventory = batch::inventory(source, &options)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&inventory)?);
            } else {
                output::print_inventory(&inventory, *detailed);
            }
            Ok(exit_status(inventory.has_failures()))
        }
        Command::Merge { all, run } => {
            let scope = if *all {
                MergeScope::All
            } else {
                MergeScope::SingleFile
            };
            let report = merge::merge_subfolders(source, &destination, scope, run.dry_run)?;
            output::print_merge(&report, run.dry_run);
            Ok(exit_status(report.has_failures()))
        }
        Command::GenConfig => Ok(ExitCode::SUCCESS),
    }
}
