//! Capture-time lookup for files whose names carry no date.
//!
//! Images are stamped with their modification time. Cameras write the
//! modification time of a video when recording stops, so for videos the
//! duration reported by a [`DurationProbe`] is subtracted first. A probe that
//! is missing or talks nonsense degrades to the plain modification time with
//! a warning; it never fails the file.

use crate::types::{CaptureStamp, MediaKind};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeSourceError {
    #[error("duration probe {command:?} could not be run: {source}")]
    ProbeUnavailable {
        command: String,
        source: std::io::Error,
    },
    #[error("duration probe gave unusable output for {path}: {output:?}")]
    ProbeOutput { path: PathBuf, output: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reports the playing time of a media file.
pub trait DurationProbe {
    fn duration(&self, path: &Path) -> Result<Duration, TimeSourceError>;
}

/// Resolves the capture date and time of a file.
pub trait TimeSource {
    fn captured_at(&self, path: &Path) -> Result<CaptureStamp, TimeSourceError>;
}

// =============================================================================
// ffprobe
// =============================================================================

/// Runs an ffprobe-compatible binary and reads `format=duration`.
#[derive(Debug, Clone)]
pub struct Ffprobe {
    pub command: String,
}

impl Ffprobe {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl DurationProbe for Ffprobe {
    fn duration(&self, path: &Path) -> Result<Duration, TimeSourceError> {
        let output = Command::new(&self.command)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path)
            .output()
            .map_err(|source| TimeSourceError::ProbeUnavailable {
                command: self.command.clone(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            return Err(TimeSourceError::ProbeOutput {
                path: path.to_path_buf(),
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_duration(&stdout).ok_or_else(|| TimeSourceError::ProbeOutput {
            path: path.to_path_buf(),
            output: stdout.trim().to_string(),
        })
    }
}

/// Parse seconds as printed by ffprobe (`"12.345000"`).
pub fn parse_duration(text: &str) -> Option<Duration> {
    let secs: f64 = text.lines().next()?.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Probe used when probing is disabled: every video is treated as zero length.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbe;

impl DurationProbe for NoProbe {
    fn duration(&self, _path: &Path) -> Result<Duration, TimeSourceError> {
        Ok(Duration::ZERO)
    }
}

// =============================================================================
// Modification-time source
// =============================================================================

/// Modification time, corrected by video duration.
pub struct FileTimeSource<P> {
    probe: P,
    hundredths: bool,
}

impl<P: DurationProbe> FileTimeSource<P> {
    pub fn new(probe: P, hundredths: bool) -> Self {
        Self { probe, hundredths }
    }

    fn start_of(&self, path: &Path, modified: SystemTime) -> SystemTime {
        if MediaKind::of_path(path) != MediaKind::Video {
            return modified;
        }
        match self.probe.duration(path) {
            Ok(duration) => modified.checked_sub(duration).unwrap_or(modified),
            Err(e) => {
                tracing::warn!(
                    "{}: {e}; using modification time as capture time",
                    path.display()
                );
                modified
            }
        }
    }
}

impl<P: DurationProbe> TimeSource for FileTimeSource<P> {
    fn captured_at(&self, path: &Path) -> Result<CaptureStamp, TimeSourceError> {
        let modified = fs::metadata(path)?.modified()?;
        let start: DateTime<Local> = self.start_of(path, modified).into();
        Ok(CaptureStamp::from_datetime(&start, self.hundredths))
    }
}
