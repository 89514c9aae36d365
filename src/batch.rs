//! Batch driver: applies the naming engine to every file in a folder.
//!
//! Three modes share the same listing and the same per-file isolation:
//!
//! - **process** renames device files (and older generations of the tool's
//!   own names) into the configured canonical layout
//! - **recover** turns canonical names back into the original device names
//! - **rename-camera** swaps one camera ID for another in the tool's own
//!   names, keeping everything else
//! - **inventory** classifies everything without touching the disk
//!
//! Files are handled one at a time in file-name order. Whatever goes wrong
//! with one file (an unreadable name, an exhausted counter, a failed rename,
//! even a panic) becomes a [`Outcome::Failed`] for that file and the batch
//! moves on. Nothing is rolled back.

use crate::config::{CamerasConfig, Generation, ToolConfig, is_valid_camera_id};
use crate::extract::{ExtractError, FileRecord, split_name};
use crate::fsops::{self, FsError, Occupant};
use crate::grammar::GrammarId;
use crate::invert::{self, InversionError};
use crate::synthesize::{self, Synthesis, SynthesisError};
use crate::timesource::{TimeSource, TimeSourceError};
use crate::types::{CameraAndDataType, CaptureStamp};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Folder-level failure: the batch could not start.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("invalid camera ID override {0:?}: use ASCII letters and digits only")]
    InvalidOverride(String),
}

/// Why one file failed. Never stops the batch.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Extraction(#[from] ExtractError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Inversion(#[from] InversionError),
    #[error(transparent)]
    TimeSource(#[from] TimeSourceError),
    #[error(transparent)]
    Filesystem(#[from] FsError),
    #[error("unexpected failure: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No grammar matched the name.
    Unrecognized,
    /// Already in the configured canonical layout.
    AlreadyCanonical,
    /// A name straight off the device, with no canonical fields to change.
    AlreadyOriginal,
    /// Camera ID replacement found a name carrying some other camera ID.
    OtherCamera,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unrecognized => "unrecognized name",
            Self::AlreadyCanonical => "already canonical",
            Self::AlreadyOriginal => "already original",
            Self::OtherCamera => "different camera ID",
        })
    }
}

/// What happened to one file.
#[derive(Debug)]
pub enum Outcome {
    Renamed { from: PathBuf, to: PathBuf },
    Unchanged { path: PathBuf },
    Skipped { path: PathBuf, reason: SkipReason },
    Failed { path: PathBuf, error: FileError },
}

impl Outcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Renamed { from, .. } => from,
            Self::Unchanged { path } | Self::Skipped { path, .. } | Self::Failed { path, .. } => {
                path
            }
        }
    }
}

/// Tally of outcomes for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub renamed: u32,
    pub unchanged: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl BatchStats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Renamed { .. } => self.renamed += 1,
            Outcome::Unchanged { .. } => self.unchanged += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.renamed + self.unchanged + self.skipped + self.failed
    }
}

impl fmt::Display for BatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} renamed, {} unchanged, {} skipped, {} failed ({} total)",
                self.renamed,
                self.unchanged,
                self.skipped,
                self.failed,
                self.total()
            )
        } else {
            write!(
                f,
                "{} renamed, {} unchanged, {} skipped ({} total)",
                self.renamed,
                self.unchanged,
                self.skipped,
                self.total()
            )
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    fn push(&mut self, outcome: Outcome) {
        self.stats.record(&outcome);
        self.outcomes.push(outcome);
    }

    pub fn has_failures(&self) -> bool {
        self.stats.failed > 0
    }
}

/// Everything a run needs besides the time source.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Where renamed files go. Usually the source folder itself.
    pub destination: PathBuf,
    pub generation: Generation,
    pub cameras: CamerasConfig,
    /// Replaces the default camera ID of device files.
    pub camera_id: Option<String>,
    /// Replaces the camera/type code of device files.
    pub camera_type: Option<CameraAndDataType>,
    pub skip_hidden: bool,
    /// Lowercase extensions without the dot.
    pub ignore_extensions: Vec<String>,
    pub dry_run: bool,
}

impl BatchOptions {
    pub fn from_config(config: &ToolConfig, destination: &Path) -> Self {
        Self {
            destination: destination.to_path_buf(),
            generation: config.naming.generation,
            cameras: config.cameras.clone(),
            camera_id: None,
            camera_type: None,
            skip_hidden: config.batch.skip_hidden,
            ignore_extensions: config
                .batch
                .ignore_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            dry_run: false,
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if self.skip_hidden && name.starts_with('.') {
            return true;
        }
        let (_, ext) = split_name(path);
        self.ignore_extensions.contains(&ext.to_ascii_lowercase())
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Regular files directly inside `dir`, sorted by name, minus ignored ones.
pub fn collect_entries(dir: &Path, options: &BatchOptions) -> Result<Vec<PathBuf>, BatchError> {
    if !dir.is_dir() {
        return Err(BatchError::NotADirectory(dir.to_path_buf()));
    }
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && !options.is_ignored(entry.path()) {
            entries.push(entry.into_path());
        }
    }
    Ok(entries)
}

fn run_isolated(path: &Path, step: impl FnOnce() -> Outcome) -> Outcome {
    let outcome = panic::catch_unwind(AssertUnwindSafe(step)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        Outcome::Failed {
            path: path.to_path_buf(),
            error: FileError::Panicked(message),
        }
    });
    if let Outcome::Failed { path, error } = &outcome {
        tracing::error!("{}: {error}", path.display());
    }
    outcome
}

fn validate_overrides(options: &BatchOptions) -> Result<(), BatchError> {
    match &options.camera_id {
        Some(id) if !is_valid_camera_id(id) => Err(BatchError::InvalidOverride(id.clone())),
        _ => Ok(()),
    }
}

fn prepare_destination(options: &BatchOptions) -> Result<(), BatchError> {
    if !options.dry_run {
        std::fs::create_dir_all(&options.destination)?;
    }
    Ok(())
}

// =============================================================================
// Process mode
// =============================================================================

/// Rename every recognized file in `source` into the canonical layout.
///
/// `on_outcome` sees each outcome as soon as the file is done.
pub fn process_folder(
    source: &Path,
    options: &BatchOptions,
    time_source: &dyn TimeSource,
    mut on_outcome: impl FnMut(&Outcome),
) -> Result<BatchReport, BatchError> {
    validate_overrides(options)?;
    prepare_destination(options)?;
    let mut report = BatchReport::default();
    for path in collect_entries(source, options)? {
        let outcome = run_isolated(&path, || process_file(&path, options, time_source));
        on_outcome(&outcome);
        report.push(outcome);
    }
    Ok(report)
}

/// Rename a single file. Errors are folded into the outcome.
pub fn process_file(path: &Path, options: &BatchOptions, time_source: &dyn TimeSource) -> Outcome {
    match try_process(path, options, time_source) {
        Ok(outcome) => outcome,
        Err(error) => Outcome::Failed {
            path: path.to_path_buf(),
            error,
        },
    }
}

fn is_canonical(grammar: GrammarId, generation: Generation) -> bool {
    match generation {
        Generation::Current => grammar == GrammarId::Current,
        Generation::Legacy => grammar == GrammarId::Legacy7,
    }
}

fn try_process(
    path: &Path,
    options: &BatchOptions,
    time_source: &dyn TimeSource,
) -> Result<Outcome, FileError> {
    let mut record = match FileRecord::inspect(path, &options.cameras) {
        Ok(record) => record,
        Err(ExtractError::Unrecognized(_)) => {
            tracing::debug!("{}: no grammar matched", path.display());
            return Ok(Outcome::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::Unrecognized,
            });
        }
        Err(e) => return Err(e.into()),
    };
    tracing::debug!("{}: {} layout", path.display(), record.grammar);

    if is_canonical(record.grammar, options.generation) {
        return Ok(Outcome::Skipped {
            path: path.to_path_buf(),
            reason: SkipReason::AlreadyCanonical,
        });
    }

    if record.grammar.is_device() {
        if let Some(id) = &options.camera_id {
            record.fields.camera_id = id.clone();
        }
        if let Some(camera_type) = options.camera_type {
            record.fields.camera_and_type = camera_type;
        }
        record.fields.captured = Some(time_source.captured_at(path)?);
    }

    match synthesize::synthesize(&record, &options.destination, options.generation)? {
        Synthesis::Unchanged(path) => Ok(Outcome::Unchanged { path }),
        Synthesis::Rename(to) => {
            if !options.dry_run {
                fsops::move_file(path, &to)?;
            }
            Ok(Outcome::Renamed {
                from: path.to_path_buf(),
                to,
            })
        }
    }
}

// =============================================================================
// Recover mode
// =============================================================================

/// Rename every canonical file in `source` back to its original device name.
pub fn recover_folder(
    source: &Path,
    options: &BatchOptions,
    mut on_outcome: impl FnMut(&Outcome),
) -> Result<BatchReport, BatchError> {
    prepare_destination(options)?;
    let mut report = BatchReport::default();
    for path in collect_entries(source, options)? {
        let outcome = run_isolated(&path, || recover_file(&path, options));
        on_outcome(&outcome);
        report.push(outcome);
    }
    Ok(report)
}

/// Restore a single file's original name.
pub fn recover_file(path: &Path, options: &BatchOptions) -> Outcome {
    match try_recover(path, options) {
        Ok(outcome) => outcome,
        Err(error) => Outcome::Failed {
            path: path.to_path_buf(),
            error,
        },
    }
}

fn try_recover(path: &Path, options: &BatchOptions) -> Result<Outcome, FileError> {
    let record = match FileRecord::inspect(path, &options.cameras) {
        Ok(record) => record,
        Err(ExtractError::Unrecognized(_)) => {
            return Ok(Outcome::Skipped {
                path: path.to_path_buf(),
                reason: SkipReason::Unrecognized,
            });
        }
        Err(e) => return Err(e.into()),
    };
    if record.grammar.is_device() {
        return Ok(Outcome::Skipped {
            path: path.to_path_buf(),
            reason: SkipReason::AlreadyOriginal,
        });
    }

    let original = invert::invert(&record.fields, record.grammar)?;
    let name = if record.extension.is_empty() {
        original
    } else {
        format!("{original}.{}", record.extension)
    };
    let to = options.destination.join(name);
    match fsops::occupant(&to, path).map_err(FsError::from)? {
        Occupant::SameFile => Ok(Outcome::Unchanged { path: to }),
        Occupant::Other => Err(FsError::Conflict(to).into()),
        Occupant::Vacant => {
            if !options.dry_run {
                fsops::move_file(path, &to)?;
            }
            Ok(Outcome::Renamed {
                from: path.to_path_buf(),
                to,
            })
        }
    }
}

// =============================================================================
// Camera ID replacement
// =============================================================================

/// Replace camera ID `old_id` with `new_id` in every canonical name in `source`.
///
/// Only the camera ID changes; the capture time and the embedded original
/// come from the existing name. Legacy 7-field names stay in that layout,
/// every other tool layout is written in the current one. The counter is
/// chosen afresh against the destination.
pub fn rename_camera_folder(
    source: &Path,
    old_id: &str,
    new_id: &str,
    options: &BatchOptions,
    mut on_outcome: impl FnMut(&Outcome),
) -> Result<BatchReport, BatchError> {
    if !is_valid_camera_id(new_id) {
        return Err(BatchError::InvalidOverride(new_id.to_string()));
    }
    prepare_destination(options)?;
    let mut report = BatchReport::default();
    for path in collect_entries(source, options)? {
        let outcome =
            run_isolated(&path, || rename_camera_file(&path, old_id, new_id, options));
        on_outcome(&outcome);
        report.push(outcome);
    }
    Ok(report)
}

/// Replace the camera ID of a single file.
pub fn rename_camera_file(
    path: &Path,
    old_id: &str,
    new_id: &str,
    options: &BatchOptions,
) -> Outcome {
    match try_rename_camera(path, old_id, new_id, options) {
        Ok(outcome) => outcome,
        Err(error) => Outcome::Failed {
            path: path.to_path_buf(),
            error,
        },
    }
}

fn try_rename_camera(
    path: &Path,
    old_id: &str,
    new_id: &str,
    options: &BatchOptions,
) -> Result<Outcome, FileError> {
    let skipped = |reason| {
        Ok(Outcome::Skipped {
            path: path.to_path_buf(),
            reason,
        })
    };
    let mut record = match FileRecord::inspect(path, &options.cameras) {
        Ok(record) => record,
        Err(ExtractError::Unrecognized(_)) => return skipped(SkipReason::Unrecognized),
        Err(e) => return Err(e.into()),
    };
    if record.grammar.is_device() {
        return skipped(SkipReason::AlreadyOriginal);
    }
    if record.fields.camera_id != old_id {
        return skipped(SkipReason::OtherCamera);
    }

    record.fields.camera_id = new_id.to_string();
    let generation = if record.grammar == GrammarId::Legacy7 {
        Generation::Legacy
    } else {
        Generation::Current
    };
    match synthesize::synthesize(&record, &options.destination, generation)? {
        Synthesis::Unchanged(path) => Ok(Outcome::Unchanged { path }),
        Synthesis::Rename(to) => {
            if !options.dry_run {
                fsops::move_file(path, &to)?;
            }
            Ok(Outcome::Renamed {
                from: path.to_path_buf(),
                to,
            })
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct InventoryEntry {
    pub path: PathBuf,
    pub grammar: GrammarId,
    pub camera_and_type: CameraAndDataType,
    pub camera_id: String,
    pub captured: Option<CaptureStamp>,
}

/// Action-camera files sharing a sequence number but split into chapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterGroup {
    pub codex: String,
    pub sequence_id: String,
    pub chapters: Vec<String>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Classification of a whole folder.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Inventory {
    pub files: Vec<InventoryEntry>,
    pub by_grammar: BTreeMap<GrammarId, usize>,
    pub by_type: BTreeMap<CameraAndDataType, usize>,
    /// Only sequences spanning more than one chapter.
    pub chapter_groups: Vec<ChapterGroup>,
    pub unknown: Vec<PathBuf>,
    pub failures: Vec<InventoryFailure>,
}

impl Inventory {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Classify every file in `source` without renaming anything.
pub fn inventory(source: &Path, options: &BatchOptions) -> Result<Inventory, BatchError> {
    let mut inv = Inventory::default();
    let mut sequences: BTreeMap<(String, String), Vec<(String, PathBuf)>> = BTreeMap::new();

    for path in collect_entries(source, options)? {
        let record = match FileRecord::inspect(&path, &options.cameras) {
            Ok(record) => record,
            Err(ExtractError::Unrecognized(_)) => {
                inv.unknown.push(path);
                continue;
            }
            Err(e) => {
                inv.failures.push(InventoryFailure {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };
        let fields = &record.fields;
        *inv.by_grammar.entry(record.grammar).or_default() += 1;
        *inv.by_type.entry(fields.camera_and_type).or_default() += 1;
        if fields.camera_and_type == CameraAndDataType::GoProVideo {
            sequences
                .entry((fields.codex.clone(), fields.sequence_id.clone()))
                .or_default()
                .push((fields.chapter_id.clone(), record.path.clone()));
        }
        inv.files.push(InventoryEntry {
            path: record.path.clone(),
            grammar: record.grammar,
            camera_and_type: fields.camera_and_type,
            camera_id: fields.camera_id.clone(),
            captured: fields.captured.clone(),
        });
    }

    for ((codex, sequence_id), mut members) in sequences {
        members.sort();
        let mut chapters: Vec<String> = members.iter().map(|(c, _)| c.clone()).collect();
        chapters.dedup();
        if chapters.len() > 1 {
            inv.chapter_groups.push(ChapterGroup {
                codex,
                sequence_id,
                chapters,
                files: members.into_iter().map(|(_, p)| p).collect(),
            });
        }
    }
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FixedTimeSource, file_names, touch};
    use tempfile::TempDir;

    fn options(dest: &Path) -> BatchOptions {
        BatchOptions::from_config(&ToolConfig::default(), dest)
    }

    #[test]
    fn collect_entries_sorts_and_filters() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.MOV");
        touch(tmp.path(), "a.MOV");
        touch(tmp.path(), ".DS_Store");
        touch(tmp.path(), "mediastamp.toml");
        touch(tmp.path(), "script.PY");
        touch(tmp.path(), "sub/c.MOV");
        let names: Vec<String> = collect_entries(tmp.path(), &options(tmp.path()))
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.MOV", "b.MOV"]);
    }

    #[test]
    fn collect_entries_rejects_missing_folder() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            collect_entries(&missing, &options(tmp.path())),
            Err(BatchError::NotADirectory(_))
        ));
    }

    #[test]
    fn process_renames_device_files_and_skips_others() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "GH020007.MP4");
        touch(tmp.path(), "IMG_0042.HEIC");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "20240101_120000_Cid-IMG_0001.MOV");
        let source = FixedTimeSource::at("20240615", "143000");

        let report = process_folder(tmp.path(), &options(tmp.path()), &source, |_| {}).unwrap();
        assert_eq!(report.stats.renamed, 2);
        assert_eq!(report.stats.skipped, 2);
        assert!(!report.has_failures());
        assert_eq!(
            file_names(tmp.path()),
            vec![
                "20240101_120000_Cid-IMG_0001.MOV",
                "20240615_143000_11Mini-GH020007.MP4",
                "20240615_143000_iPhone13-IMG_0042.HEIC",
                "notes.txt",
            ]
        );
    }

    #[test]
    fn process_applies_camera_id_override_to_device_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "DSCF0001.JPG");
        touch(tmp.path(), "20240101_120000_GV_Hero9_0001_01_GX.MP4");
        let mut opts = options(tmp.path());
        opts.camera_id = Some("XT4".into());
        let source = FixedTimeSource::at("20240615", "143000");

        process_folder(tmp.path(), &opts, &source, |_| {}).unwrap();
        assert_eq!(
            file_names(tmp.path()),
            vec![
                "20240101_120000_Hero9-GX010001.MP4",
                "20240615_143000_XT4-DSCF0001.JPG",
            ]
        );
    }

    #[test]
    fn invalid_override_stops_before_any_file() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "DSCF0001.JPG");
        let mut opts = options(tmp.path());
        opts.camera_id = Some("X T4".into());
        let source = FixedTimeSource::at("20240615", "143000");
        assert!(matches!(
            process_folder(tmp.path(), &opts, &source, |_| {}),
            Err(BatchError::InvalidOverride(_))
        ));
        assert_eq!(file_names(tmp.path()), vec!["DSCF0001.JPG"]);
    }

    #[test]
    fn process_upgrades_older_generations() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "20240615_143000_11Mini(GH020007).MP4");
        touch(tmp.path(), "20240615_143100_11Mini__GH030007__.MP4");
        touch(tmp.path(), "20240615_11Mini_0007_04_143200_GH.MP4");
        let source = FixedTimeSource::at("19990101", "000000");

        let report = process_folder(tmp.path(), &options(tmp.path()), &source, |_| {}).unwrap();
        assert_eq!(report.stats.renamed, 3);
        assert_eq!(
            file_names(tmp.path()),
            vec![
                "20240615_143000_11Mini-GH020007.MP4",
                "20240615_143100_11Mini-GH030007.MP4",
                "20240615_143200_11Mini-GH040007.MP4",
            ]
        );
    }

    #[test]
    fn process_into_legacy_generation() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "IMG_0042.MOV");
        touch(tmp.path(), "20240101_120000_GV_11Mini_0007_02_GH.MP4");
        let mut opts = options(tmp.path());
        opts.generation = Generation::Legacy;
        let source = FixedTimeSource::at("20240615", "143000");

        let report = process_folder(tmp.path(), &opts, &source, |_| {}).unwrap();
        assert_eq!(report.stats.renamed, 1);
        assert_eq!(report.stats.skipped, 1);
        assert!(
            file_names(tmp.path())
                .contains(&"20240615_143000_IV_iPhone13_0042_00_IMG.MOV".to_string())
        );
    }

    #[test]
    fn dry_run_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("out");
        touch(tmp.path(), "GH020007.MP4");
        let mut opts = options(&dest);
        opts.dry_run = true;
        let source = FixedTimeSource::at("20240615", "143000");

        let mut seen = Vec::new();
        let report = process_folder(tmp.path(), &opts, &source, |o| {
            seen.push(o.path().to_path_buf())
        })
        .unwrap();
        assert_eq!(report.stats.renamed, 1);
        assert_eq!(seen, vec![tmp.path().join("GH020007.MP4")]);
        assert_eq!(file_names(tmp.path()), vec!["GH020007.MP4"]);
        assert!(!dest.exists());
    }

    #[test]
    fn rename_camera_swaps_only_matching_ids() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "20240615_143000_11Mini-GH020007.MP4");
        touch(tmp.path(), "20240615_143000_11Mini_02-GH020007.MP4");
        touch(tmp.path(), "20240615_143000_11Mini(GH030007).MP4");
        touch(tmp.path(), "20240101_120000_GV_11Mini_0003_01_GX.MP4");
        touch(tmp.path(), "20240615_143100_iPhone13-IMG_0042.HEIC");
        touch(tmp.path(), "GH010001.MP4");

        let report =
            rename_camera_folder(tmp.path(), "11Mini", "Hero12", &options(tmp.path()), |_| {})
                .unwrap();
        assert_eq!(report.stats.renamed, 4);
        assert_eq!(report.stats.skipped, 2);
        assert!(report.outcomes.iter().any(|o| matches!(
            o,
            Outcome::Skipped {
                reason: SkipReason::OtherCamera,
                ..
            }
        )));
        assert_eq!(
            file_names(tmp.path()),
            vec![
                "20240101_120000_GV_Hero12_0003_01_GX.MP4",
                "20240615_143000_Hero12-GH020007.MP4",
                "20240615_143000_Hero12-GH030007.MP4",
                "20240615_143000_Hero12_02-GH020007.MP4",
                "20240615_143100_iPhone13-IMG_0042.HEIC",
                "GH010001.MP4",
            ]
        );
    }

    #[test]
    fn rename_camera_rejects_bad_id_and_honours_dry_run() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "20240615_143000_11Mini-GH020007.MP4");
        assert!(matches!(
            rename_camera_folder(tmp.path(), "11Mini", "Hero_12", &options(tmp.path()), |_| {}),
            Err(BatchError::InvalidOverride(_))
        ));

        let mut opts = options(tmp.path());
        opts.dry_run = true;
        let report = rename_camera_folder(tmp.path(), "11Mini", "Hero12", &opts, |_| {}).unwrap();
        assert_eq!(report.stats.renamed, 1);
        assert_eq!(
            file_names(tmp.path()),
            vec!["20240615_143000_11Mini-GH020007.MP4"]
        );
    }

    #[test]
    fn malformed_name_fails_without_stopping_batch() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "20240101_120000_IV_cam_0001_00_GX.MOV");
        touch(tmp.path(), "IMG_0001.MOV");
        let source = FixedTimeSource::at("20240615", "143000");

        let report = process_folder(tmp.path(), &options(tmp.path()), &source, |_| {}).unwrap();
        assert_eq!(report.stats.renamed, 1);
        assert_eq!(report.stats.failed, 1);
        assert!(report.has_failures());
        let failed = report
            .outcomes
            .iter()
            .find(|o| matches!(o, Outcome::Failed { .. }))
            .unwrap();
        assert!(matches!(
            failed,
            Outcome::Failed {
                error: FileError::Extraction(ExtractError::UnknownCameraAndType { .. }),
                ..
            }
        ));
    }

    struct PanickingSource;

    impl TimeSource for PanickingSource {
        fn captured_at(&self, _path: &Path) -> Result<CaptureStamp, TimeSourceError> {
            panic!("clock on fire")
        }
    }

    #[test]
    fn panics_become_failures() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "IMG_0001.MOV");
        touch(tmp.path(), "20240101_120000_GV_11Mini_0007_02_GH.MP4");
        let report =
            process_folder(tmp.path(), &options(tmp.path()), &PanickingSource, |_| {}).unwrap();
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.renamed, 1);
        assert!(report.outcomes.iter().any(|o| matches!(
            o,
            Outcome::Failed { error: FileError::Panicked(m), .. } if m == "clock on fire"
        )));
    }

    #[test]
    fn recover_restores_original_names() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "20240615_143000_11Mini-GH020007.MP4");
        touch(tmp.path(), "20240615_143000_iPhone13_02(IMG_0042).HEIC");
        touch(tmp.path(), "20240615_143000_CV_Camera_1234_00_MVI.MOV");
        touch(tmp.path(), "DSCF0001.JPG");

        let report = recover_folder(tmp.path(), &options(tmp.path()), |_| {}).unwrap();
        assert_eq!(report.stats.renamed, 3);
        assert_eq!(report.stats.skipped, 1);
        assert_eq!(
            file_names(tmp.path()),
            vec!["DSCF0001.JPG", "GH020007.MP4", "IMG_0042.HEIC", "MVI_1234.MOV"]
        );
    }

    #[test]
    fn recover_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "IMG_0001.MOV");
        touch(tmp.path(), "20240101_120000_Cid-IMG_0001.MOV");
        let report = recover_folder(tmp.path(), &options(tmp.path()), |_| {}).unwrap();
        assert_eq!(report.stats.failed, 1);
        assert!(report.outcomes.iter().any(|o| matches!(
            o,
            Outcome::Failed {
                error: FileError::Filesystem(FsError::Conflict(_)),
                ..
            }
        )));
        assert_eq!(file_names(tmp.path()).len(), 2);
    }

    #[test]
    fn recover_gopro_image_is_undefined() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "20240101_120000_GI_11Mini_0007_00_GS.JPG");
        let report = recover_folder(tmp.path(), &options(tmp.path()), |_| {}).unwrap();
        assert!(matches!(
            report.outcomes[0],
            Outcome::Failed {
                error: FileError::Inversion(InversionError::Undefined { .. }),
                ..
            }
        ));
    }

    #[test]
    fn inventory_counts_and_groups_chapters() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "GH010007.MP4");
        touch(tmp.path(), "GH020007.MP4");
        touch(tmp.path(), "GH010008.MP4");
        touch(tmp.path(), "IMG_0001.HEIC");
        touch(tmp.path(), "holiday.jpg");
        touch(tmp.path(), "20240101_120000_IV_cam_0001_00_GX.MOV");

        let inv = inventory(tmp.path(), &options(tmp.path())).unwrap();
        assert_eq!(inv.files.len(), 4);
        assert_eq!(inv.by_grammar[&GrammarId::ActionCam], 3);
        assert_eq!(inv.by_grammar[&GrammarId::PhoneImg], 1);
        assert_eq!(inv.by_type[&CameraAndDataType::GoProVideo], 3);
        assert_eq!(inv.by_type[&CameraAndDataType::IPhoneImage], 1);
        assert_eq!(inv.unknown, vec![tmp.path().join("holiday.jpg")]);
        assert_eq!(inv.failures.len(), 1);
        assert_eq!(
            inv.chapter_groups,
            vec![ChapterGroup {
                codex: "GH".into(),
                sequence_id: "0007".into(),
                chapters: vec!["01".into(), "02".into()],
                files: vec![
                    tmp.path().join("GH010007.MP4"),
                    tmp.path().join("GH020007.MP4")
                ],
            }]
        );
        // Nothing moved
        assert_eq!(file_names(tmp.path()).len(), 6);
    }

    #[test]
    fn stats_display() {
        let stats = BatchStats {
            renamed: 9,
            unchanged: 0,
            skipped: 2,
            failed: 1,
        };
        assert_eq!(
            stats.to_string(),
            "9 renamed, 0 unchanged, 2 skipped, 1 failed (12 total)"
        );
        let clean = BatchStats {
            failed: 0,
            ..stats
        };
        assert_eq!(clean.to_string(), "9 renamed, 0 unchanged, 2 skipped (11 total)");
    }
}
