//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Process / Recover
//!
//! One line per file, in processing order, then a summary:
//!
//! ```text
//! renamed   GH020007.MP4 → 20240615_143000_11Mini-GH020007.MP4
//! unchanged 20240101_120000_Cid-IMG_0001.MOV
//! skipped   notes.txt (unrecognized name)
//! failed    20240101_120000_IV_cam_0001_00_GX.MOV: unknown camera and data type IV with codex GX in ...
//!
//! 1 renamed, 1 unchanged, 1 skipped, 1 failed (4 total)
//! ```
//!
//! ## List
//!
//! ```text
//! By layout
//!     action-camera: 3
//!     IMG_: 1
//! By type
//!     GoPro video: 3
//!     iPhone image: 1
//! Chapters
//!     GH 0007: chapters 01, 02
//! Unrecognized (1)
//!     holiday.jpg
//! ```
//!
//! `--detailed` adds a numbered line per recognized file before the counts.
//!
//! ## Merge
//!
//! ```text
//! moved     IMG_0042/IMG_0042.HEIC → IMG_0042.HEIC
//! removed   IMG_0042/
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>` or `String`)
//! for testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::batch::{BatchStats, Inventory, Outcome};
use crate::merge::MergeReport;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Last path component, or the whole path if there is none.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Destination shown as a bare name when it stays next to the source.
fn display_target(from: &Path, to: &Path) -> String {
    if from.parent() == to.parent() {
        display_name(to)
    } else {
        to.display().to_string()
    }
}

/// `parent/name` for entries inside a subfolder.
fn display_nested(path: &Path) -> String {
    match path.parent().and_then(|p| p.file_name()) {
        Some(parent) => format!("{}/{}", parent.to_string_lossy(), display_name(path)),
        None => display_name(path),
    }
}

fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

// ============================================================================
// Process / Recover
// ============================================================================

/// Format the outcome of one file as a single line.
pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Renamed { from, to } => format!(
            "renamed   {} → {}",
            display_name(from),
            display_target(from, to)
        ),
        Outcome::Unchanged { path } => format!("unchanged {}", display_name(path)),
        Outcome::Skipped { path, reason } => {
            format!("skipped   {} ({})", display_name(path), reason)
        }
        Outcome::Failed { path, error } => format!("failed    {}: {}", display_name(path), error),
    }
}

pub fn print_outcome(outcome: &Outcome) {
    println!("{}", format_outcome(outcome));
}

/// Summary line after a run. Dry runs say so up front.
pub fn format_summary(stats: &BatchStats, dry_run: bool) -> String {
    if dry_run {
        format!("Dry run: {stats}")
    } else {
        stats.to_string()
    }
}

pub fn print_summary(stats: &BatchStats, dry_run: bool) {
    println!();
    println!("{}", format_summary(stats, dry_run));
}

// ============================================================================
// List
// ============================================================================

/// Format a folder inventory.
///
/// ```text
/// 001 GH010007.MP4
///     action-camera, GoPro video, 11Mini
/// ```
pub fn format_inventory(inventory: &Inventory, detailed: bool) -> Vec<String> {
    let mut lines = Vec::new();

    if detailed && !inventory.files.is_empty() {
        lines.push("Files".to_string());
        for (i, entry) in inventory.files.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), display_name(&entry.path)));
            let mut context = format!(
                "    {}, {}, {}",
                entry.grammar, entry.camera_and_type, entry.camera_id
            );
            if let Some(stamp) = &entry.captured {
                context.push_str(&format!(", {stamp}"));
            }
            lines.push(context);
        }
    }

    lines.push("By layout".to_string());
    if inventory.by_grammar.is_empty() {
        lines.push("    (none)".to_string());
    }
    for (grammar, count) in &inventory.by_grammar {
        lines.push(format!("    {grammar}: {count}"));
    }

    lines.push("By type".to_string());
    if inventory.by_type.is_empty() {
        lines.push("    (none)".to_string());
    }
    for (camera_and_type, count) in &inventory.by_type {
        lines.push(format!("    {camera_and_type}: {count}"));
    }

    if !inventory.chapter_groups.is_empty() {
        lines.push("Chapters".to_string());
        for group in &inventory.chapter_groups {
            lines.push(format!(
                "    {} {}: chapters {}",
                group.codex,
                group.sequence_id,
                group.chapters.join(", ")
            ));
            if detailed {
                for file in &group.files {
                    lines.push(format!("        {}", display_name(file)));
                }
            }
        }
    }

    if !inventory.unknown.is_empty() {
        lines.push(format!("Unrecognized ({})", inventory.unknown.len()));
        for path in &inventory.unknown {
            lines.push(format!("    {}", display_name(path)));
        }
    }

    if !inventory.failures.is_empty() {
        lines.push(format!("Failed ({})", inventory.failures.len()));
        for failure in &inventory.failures {
            lines.push(format!("    {}: {}", display_name(&failure.path), failure.error));
        }
    }

    lines
}

pub fn print_inventory(inventory: &Inventory, detailed: bool) {
    for line in format_inventory(inventory, detailed) {
        println!("{}", line);
    }
}

// ============================================================================
// Merge
// ============================================================================

pub fn format_merge(report: &MergeReport, dry_run: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for (from, to) in &report.moved {
        lines.push(format!("moved     {} → {}", display_nested(from), display_name(to)));
    }
    for dir in &report.removed_dirs {
        lines.push(format!("removed   {}/", display_name(dir)));
    }
    for failure in &report.failures {
        lines.push(format!(
            "failed    {}: {}",
            display_nested(&failure.path),
            failure.error
        ));
    }
    let summary = format!(
        "{} moved, {} folders removed, {} failed",
        report.moved.len(),
        report.removed_dirs.len(),
        report.failures.len()
    );
    lines.push(String::new());
    lines.push(if dry_run {
        format!("Dry run: {summary}")
    } else {
        summary
    });
    lines
}

pub fn print_merge(report: &MergeReport, dry_run: bool) {
    for line in format_merge(report, dry_run) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
