//! Name synthesis: building the canonical filename for a record.
//!
//! ## Current generation
//!
//! ```text
//! 20240615_143000_11Mini-GH020007.MP4
//! 20240615_143000_11Mini_02-GH020007.MP4     second file with the same fields
//! ```
//!
//! Date, time and camera ID are joined with `_`, the original stem follows a
//! `-` verbatim. Before a name is returned the destination is probed: an
//! empty slot is taken, the source file itself means nothing needs to
//! happen, and any other file bumps the `_NN` counter (2 through 99).
//!
//! ## Legacy generation
//!
//! ```text
//! 20240615_143000_GV_11Mini_0007_02_GH.MP4
//! ```
//!
//! Seven fixed-width fields, no counter. Only combinations that can be read
//! back are written.

use crate::config::{Generation, is_valid_camera_id};
use crate::extract::{FieldSet, FileRecord};
use crate::fsops::{self, Occupant};
use crate::grammar::{OriginShape, legacy7_origin};
use crate::invert::{self, InversionError};
use crate::types::CaptureStamp;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest disambiguation counter; the counter never grows to three digits.
pub const MAX_UNIQUE_ID: u8 = 99;

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("no capture time for {0}")]
    MissingCaptureTime(PathBuf),
    #[error("invalid camera ID {0:?}: use ASCII letters and digits only")]
    InvalidCameraId(String),
    #[error("cannot disambiguate {0}: counters 02 to 99 are all taken")]
    DisambiguationExhausted(PathBuf),
    #[error("{code} files with codex {codex:?} cannot be written in the legacy layout")]
    IrreversibleLegacyName { code: String, codex: String },
    #[error(transparent)]
    Inversion(#[from] InversionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of synthesis against a destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    /// Move the source to this path.
    Rename(PathBuf),
    /// The canonical name is already the source file.
    Unchanged(PathBuf),
}

/// Stem of a current-generation name. `unique_id` 1 means no counter segment.
pub fn current_stem(stamp: &CaptureStamp, camera_id: &str, unique_id: u8, original: &str) -> String {
    if unique_id <= 1 {
        format!("{}_{}_{}-{}", stamp.date, stamp.time, camera_id, original)
    } else {
        format!(
            "{}_{}_{}_{:02}-{}",
            stamp.date, stamp.time, camera_id, unique_id, original
        )
    }
}

/// Stem of a legacy 7-field name.
pub fn legacy_stem(stamp: &CaptureStamp, fields: &FieldSet) -> Result<String, SynthesisError> {
    let code = fields.camera_and_type.abbreviation();
    match legacy7_origin(fields.camera_and_type, &fields.codex) {
        Some(OriginShape::Undefined) | None => {
            return Err(SynthesisError::IrreversibleLegacyName {
                code: code.to_string(),
                codex: fields.codex.clone(),
            });
        }
        Some(_) => {}
    }
    // The 7-field layout has no room for hundredths
    let time = stamp.time.get(..6).unwrap_or(&stamp.time);
    Ok(format!(
        "{}_{}_{}_{}_{:0>4}_{:0>2}_{}",
        stamp.date, time, code, fields.camera_id, fields.sequence_id, fields.chapter_id, fields.codex
    ))
}

fn with_extension(stem: String, ext: &str) -> String {
    if ext.is_empty() {
        stem
    } else {
        format!("{stem}.{ext}")
    }
}

/// Build the canonical name for `record` and resolve collisions in `destination`.
///
/// The record's capture time must already be filled in. The destination
/// listing is probed on every attempt, never cached.
pub fn synthesize(
    record: &FileRecord,
    destination: &Path,
    generation: Generation,
) -> Result<Synthesis, SynthesisError> {
    let fields = &record.fields;
    let stamp = fields
        .captured
        .as_ref()
        .ok_or_else(|| SynthesisError::MissingCaptureTime(record.path.clone()))?;
    if !is_valid_camera_id(&fields.camera_id) {
        return Err(SynthesisError::InvalidCameraId(fields.camera_id.clone()));
    }

    match generation {
        Generation::Legacy => {
            let name = with_extension(legacy_stem(stamp, fields)?, &record.extension);
            let candidate = destination.join(name);
            // Fields are assumed unique; an occupied slot is left to the mover
            match fsops::occupant(&candidate, &record.path)? {
                Occupant::SameFile => Ok(Synthesis::Unchanged(candidate)),
                _ => Ok(Synthesis::Rename(candidate)),
            }
        }
        Generation::Current => {
            let original = invert::invert(fields, record.grammar)?;
            for unique_id in std::iter::once(1).chain(2..=MAX_UNIQUE_ID) {
                let stem = current_stem(stamp, &fields.camera_id, unique_id, &original);
                let candidate = destination.join(with_extension(stem, &record.extension));
                match fsops::occupant(&candidate, &record.path)? {
                    Occupant::Vacant => return Ok(Synthesis::Rename(candidate)),
                    Occupant::SameFile => return Ok(Synthesis::Unchanged(candidate)),
                    Occupant::Other => {
                        tracing::debug!("{} is taken, trying next counter", candidate.display());
                    }
                }
            }
            Err(SynthesisError::DisambiguationExhausted(record.path.clone()))
        }
    }
}
