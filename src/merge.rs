//! Flattening subfolders into their parent.
//!
//! AirDrop delivers each received file inside its own folder named after the
//! file (`IMG_0042/IMG_0042.HEIC`). [`merge_subfolders`] moves the contents
//! of such folders up one level so the batch driver sees them, then removes
//! the emptied folder. With [`MergeScope::All`] every subfolder is flattened.
//!
//! Moves never overwrite: an entry whose name is already taken at the
//! destination stays where it is, and so does its folder.

use crate::fsops::{self, FsError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeScope {
    /// Only folders holding a single entry named like the folder.
    SingleFile,
    All,
}

#[derive(Debug)]
pub struct MergeFailure {
    pub path: PathBuf,
    pub error: FsError,
}

#[derive(Debug, Default)]
pub struct MergeReport {
    /// `(from, to)` for every entry moved up.
    pub moved: Vec<(PathBuf, PathBuf)>,
    pub removed_dirs: Vec<PathBuf>,
    pub failures: Vec<MergeFailure>,
}

impl MergeReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

fn sorted_children(dir: &Path) -> Result<Vec<walkdir::DirEntry>, MergeError> {
    let mut children = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        children.push(entry?);
    }
    Ok(children)
}

/// A folder whose only entry is a file whose stem equals the folder name.
pub fn is_single_file_subfolder(dir: &Path) -> Result<bool, MergeError> {
    let children = sorted_children(dir)?;
    let [only] = children.as_slice() else {
        return Ok(false);
    };
    Ok(only.file_type().is_file() && only.path().file_stem() == dir.file_name())
}

/// Move the contents of matching subfolders of `source` into `destination`.
pub fn merge_subfolders(
    source: &Path,
    destination: &Path,
    scope: MergeScope,
    dry_run: bool,
) -> Result<MergeReport, MergeError> {
    let mut report = MergeReport::default();
    let children = sorted_children(source)?;
    if !dry_run {
        fs::create_dir_all(destination)?;
    }
    // A destination nested in the source is never merged into itself.
    let target = fs::canonicalize(destination).ok();

    for sub in children {
        if !sub.file_type().is_dir() {
            continue;
        }
        let dir = sub.path();
        if target.is_some() && fs::canonicalize(dir).ok() == target {
            continue;
        }
        if scope == MergeScope::SingleFile && !is_single_file_subfolder(dir)? {
            tracing::debug!("{}: not a single-file folder", dir.display());
            continue;
        }

        let mut emptied = true;
        for entry in sorted_children(dir)? {
            let from = entry.path().to_path_buf();
            let to = destination.join(entry.file_name());
            let moved = if dry_run {
                if to.exists() {
                    Err(FsError::Conflict(to.clone()))
                } else {
                    Ok(())
                }
            } else {
                fsops::move_file(&from, &to)
            };
            match moved {
                Ok(()) => report.moved.push((from, to)),
                Err(error) => {
                    tracing::error!("{}: {error}", from.display());
                    emptied = false;
                    report.failures.push(MergeFailure { path: from, error });
                }
            }
        }

        if emptied {
            if !dry_run {
                fs::remove_dir(dir)?;
            }
            report.removed_dirs.push(dir.to_path_buf());
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{file_names, touch};
    use tempfile::TempDir;

    #[test]
    fn detects_single_file_subfolders() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "IMG_0042/IMG_0042.HEIC");
        touch(tmp.path(), "trip/IMG_0043.HEIC");
        touch(tmp.path(), "pair/pair.MOV");
        touch(tmp.path(), "pair/pair.AAE");
        assert!(is_single_file_subfolder(&tmp.path().join("IMG_0042")).unwrap());
        assert!(!is_single_file_subfolder(&tmp.path().join("trip")).unwrap());
        assert!(!is_single_file_subfolder(&tmp.path().join("pair")).unwrap());
    }

    #[test]
    fn merges_only_single_file_folders_by_default() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "IMG_0042/IMG_0042.HEIC");
        touch(tmp.path(), "IMG_0043/IMG_0043.MOV");
        touch(tmp.path(), "trip/DSCF0001.JPG");

        let report =
            merge_subfolders(tmp.path(), tmp.path(), MergeScope::SingleFile, false).unwrap();
        assert_eq!(report.moved.len(), 2);
        assert_eq!(report.removed_dirs.len(), 2);
        assert_eq!(file_names(tmp.path()), vec!["IMG_0042.HEIC", "IMG_0043.MOV"]);
        assert!(!tmp.path().join("IMG_0042").exists());
        assert!(tmp.path().join("trip/DSCF0001.JPG").exists());
    }

    #[test]
    fn merge_all_flattens_every_folder() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("flat");
        touch(tmp.path(), "trip/DSCF0001.JPG");
        touch(tmp.path(), "trip/DSCF0002.JPG");
        touch(tmp.path(), "IMG_0042/IMG_0042.HEIC");

        let report = merge_subfolders(tmp.path(), &dest, MergeScope::All, false).unwrap();
        assert!(!report.has_failures());
        assert_eq!(
            file_names(&dest),
            vec!["DSCF0001.JPG", "DSCF0002.JPG", "IMG_0042.HEIC"]
        );
        assert!(!tmp.path().join("trip").exists());
    }

    #[test]
    fn existing_nested_destination_is_left_alone() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("flat");
        touch(tmp.path(), "flat/DSCF0009.JPG");
        touch(tmp.path(), "IMG_0042/IMG_0042.HEIC");

        let report = merge_subfolders(tmp.path(), &dest, MergeScope::All, false).unwrap();
        assert!(!report.has_failures());
        assert_eq!(report.removed_dirs, vec![tmp.path().join("IMG_0042")]);
        assert_eq!(file_names(&dest), vec!["DSCF0009.JPG", "IMG_0042.HEIC"]);

        // An empty nested destination survives a second pass too
        let empty = tmp.path().join("empty");
        std::fs::create_dir(&empty).unwrap();
        let report = merge_subfolders(tmp.path(), &empty, MergeScope::All, false).unwrap();
        assert!(!report.has_failures());
        assert!(empty.is_dir());
        assert_eq!(file_names(&empty), vec!["DSCF0009.JPG", "IMG_0042.HEIC"]);
    }

    #[test]
    fn name_clash_keeps_file_and_folder() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "IMG_0042.HEIC");
        touch(tmp.path(), "IMG_0042/IMG_0042.HEIC");

        let report =
            merge_subfolders(tmp.path(), tmp.path(), MergeScope::SingleFile, false).unwrap();
        assert!(report.has_failures());
        assert!(report.removed_dirs.is_empty());
        assert!(tmp.path().join("IMG_0042/IMG_0042.HEIC").exists());
        assert_eq!(
            std::fs::read(tmp.path().join("IMG_0042.HEIC")).unwrap(),
            b"IMG_0042.HEIC"
        );
    }

    #[test]
    fn dry_run_reports_without_moving() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "IMG_0042/IMG_0042.HEIC");
        let report =
            merge_subfolders(tmp.path(), tmp.path(), MergeScope::SingleFile, true).unwrap();
        assert_eq!(report.moved.len(), 1);
        assert!(tmp.path().join("IMG_0042/IMG_0042.HEIC").exists());
    }
}
