//! Shared test utilities for the mediastamp test suite.
//!
//! Provides file creation and listing helpers plus stand-ins for the
//! time-source collaborators, so batch tests never spawn a real probe.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! touch(tmp.path(), "GH020007.MP4");
//! let source = FixedTimeSource::at("20240615", "143000");
//!
//! // ... run a batch ...
//!
//! assert_eq!(file_names(tmp.path()), vec!["20240615_143000_11Mini-GH020007.MP4"]);
//! ```

use crate::timesource::{DurationProbe, TimeSource, TimeSourceError};
use crate::types::CaptureStamp;
use chrono::{DateTime, Local};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =========================================================================
// Files
// =========================================================================

/// Create a small file named `name` in `dir`. Contents are the name, so
/// distinct files never compare equal by content.
pub fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, name.as_bytes()).unwrap();
    path
}

/// Sorted names of the regular files directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Pin the modification time of `path`.
pub fn set_mtime(path: &Path, at: DateTime<Local>) {
    let ft = FileTime::from_unix_time(at.timestamp(), at.timestamp_subsec_nanos());
    filetime::set_file_mtime(path, ft).unwrap();
}

// =========================================================================
// Time-source stand-ins
// =========================================================================

/// Returns the same stamp for every file.
pub struct FixedTimeSource(pub CaptureStamp);

impl FixedTimeSource {
    pub fn at(date: &str, time: &str) -> Self {
        Self(CaptureStamp::new(date, time).unwrap())
    }
}

impl TimeSource for FixedTimeSource {
    fn captured_at(&self, _path: &Path) -> Result<CaptureStamp, TimeSourceError> {
        Ok(self.0.clone())
    }
}

/// Probe with a canned answer.
pub struct StubProbe(Option<Duration>);

impl StubProbe {
    pub fn seconds(secs: u64) -> Self {
        Self(Some(Duration::from_secs(secs)))
    }

    /// Behaves like a probe that prints garbage.
    pub fn failing() -> Self {
        Self(None)
    }
}

impl DurationProbe for StubProbe {
    fn duration(&self, path: &Path) -> Result<Duration, TimeSourceError> {
        self.0.ok_or_else(|| TimeSourceError::ProbeOutput {
            path: path.to_path_buf(),
            output: "N/A".to_string(),
        })
    }
}
