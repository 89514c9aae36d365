//! Filesystem collaborator: identity checks and no-clobber moves.
//!
//! Every rename in the crate goes through [`move_file`], which refuses to
//! replace an existing file. Collision probing uses [`occupant`] to tell an
//! empty slot from the source file itself and from some other file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("destination {0} already exists")]
    Conflict(PathBuf),
    #[error("failed to move {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What currently sits at a candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupant {
    Vacant,
    /// The candidate is the source file (same filesystem identity).
    SameFile,
    Other,
}

/// Probe `candidate` against `source`. Always hits the filesystem.
pub fn occupant(candidate: &Path, source: &Path) -> io::Result<Occupant> {
    match fs::symlink_metadata(candidate) {
        Ok(_) if same_file(candidate, source)? => Ok(Occupant::SameFile),
        Ok(_) => Ok(Occupant::Other),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Occupant::Vacant),
        Err(e) => Err(e),
    }
}

/// True if both paths name the same file on disk.
#[cfg(unix)]
pub fn same_file(a: &Path, b: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;
    let (ma, mb) = match (fs::metadata(a), fs::metadata(b)) {
        (Ok(ma), Ok(mb)) => (ma, mb),
        _ => return Ok(false),
    };
    Ok(ma.dev() == mb.dev() && ma.ino() == mb.ino())
}

#[cfg(not(unix))]
pub fn same_file(a: &Path, b: &Path) -> io::Result<bool> {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(ca), Ok(cb)) => Ok(ca == cb),
        _ => Ok(false),
    }
}

/// Move `from` to `to` without ever replacing an existing file.
///
/// A plain rename is tried first; when the destination is on another
/// filesystem the file is copied and the source removed.
pub fn move_file(from: &Path, to: &Path) -> Result<(), FsError> {
    if to.symlink_metadata().is_ok() {
        return Err(FsError::Conflict(to.to_path_buf()));
    }
    let rename_err = |source| FsError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to).map_err(rename_err)?;
            fs::remove_file(from).map_err(rename_err)?;
            Ok(())
        }
        Err(e) => Err(rename_err(e)),
    }
}
