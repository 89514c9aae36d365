//! Field extraction: turning a classified stem into semantic fields.
//!
//! Device grammars are sliced at fixed offsets or split once on `_`; the
//! tool's own layouts are split into their declared field count or taken
//! apart with the registry's capture groups. Whatever the layout, the result
//! is a [`FieldSet`] or a typed [`ExtractError`], never a half-filled record.
//!
//! [`FileRecord::inspect`] wraps the whole step for a path on disk: it
//! classifies the stem, extracts the fields, and fills in what only the
//! extension and the configured camera IDs can tell (video or image, which
//! camera ID a bare `IMG_0042` belongs to).

use crate::config::CamerasConfig;
use crate::grammar::{
    self, CURRENT_RE, GrammarId, MANGLED_RE, PARENTHESIZED_RE, legacy7_origin,
};
use crate::types::{CameraAndDataType, CaptureStamp, MediaKind};
use regex::Captures;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("unrecognized filename: {0}")]
    Unrecognized(String),
    #[error("unknown camera and data type {code} with codex {codex} in {stem}")]
    UnknownCameraAndType {
        stem: String,
        code: String,
        codex: String,
    },
    #[error("{stem} does not fit the {grammar} layout")]
    Malformed { stem: String, grammar: GrammarId },
}

/// Semantic fields carried by a filename.
///
/// Which fields are meaningful depends on the grammar: device stems carry
/// codex/sequence/chapter but no capture time, the 7-field layout carries
/// everything, the free-form layouts carry a capture time, a camera ID and
/// the verbatim original stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSet {
    pub captured: Option<CaptureStamp>,
    pub camera_and_type: CameraAndDataType,
    pub camera_id: String,
    /// 4-digit sequence number.
    pub sequence_id: String,
    /// 2-digit chapter number, `"00"` when not applicable.
    pub chapter_id: String,
    pub codex: String,
    /// Disambiguation counter; 1 means no `_NN` segment.
    pub unique_id: u8,
    /// Original device stem embedded verbatim by the free-form layouts.
    pub original_stem: Option<String>,
}

impl Default for FieldSet {
    fn default() -> Self {
        Self {
            captured: None,
            camera_and_type: CameraAndDataType::Unknown,
            camera_id: String::new(),
            sequence_id: "0000".to_string(),
            chapter_id: "00".to_string(),
            codex: String::new(),
            unique_id: 1,
            original_stem: None,
        }
    }
}

/// Extract the fields of `stem` under an already-chosen grammar.
pub fn extract(stem: &str, grammar: GrammarId) -> Result<FieldSet, ExtractError> {
    let row = grammar::lookup(grammar).ok_or_else(|| ExtractError::Unrecognized(stem.to_string()))?;
    if !(row.matches)(stem) {
        return Err(ExtractError::Malformed {
            stem: stem.to_string(),
            grammar,
        });
    }
    (row.decompose)(stem)
}

/// Classify and extract in one go.
pub fn classify_and_extract(stem: &str) -> Result<(GrammarId, FieldSet), ExtractError> {
    let id = grammar::classify(stem);
    extract(stem, id).map(|fields| (id, fields))
}

// ============================================================================
// Device grammars
// ============================================================================

/// Fixed-width field of a positional device stem.
fn field(
    stem: &str,
    range: std::ops::Range<usize>,
    grammar: GrammarId,
) -> Result<String, ExtractError> {
    stem.get(range)
        .map(str::to_string)
        .ok_or_else(|| malformed_as(stem, grammar))
}

pub fn decompose_action_cam(stem: &str) -> Result<FieldSet, ExtractError> {
    if stem.len() != 8 {
        return Err(malformed_as(stem, GrammarId::ActionCam));
    }
    Ok(FieldSet {
        camera_and_type: CameraAndDataType::GoProVideo,
        codex: field(stem, 0..2, GrammarId::ActionCam)?,
        chapter_id: field(stem, 2..4, GrammarId::ActionCam)?,
        sequence_id: field(stem, 4..8, GrammarId::ActionCam)?,
        original_stem: Some(stem.to_string()),
        ..FieldSet::default()
    })
}

/// `IMG_0042`, `MVI_0042`: the part before `_` plays the codex.
pub fn decompose_prefixed(stem: &str) -> Result<FieldSet, ExtractError> {
    let (codex, sequence) = stem
        .split_once('_')
        .ok_or_else(|| ExtractError::Unrecognized(stem.to_string()))?;
    let camera_and_type = if codex == "MVI" {
        CameraAndDataType::CameraVideo
    } else {
        CameraAndDataType::Unknown
    };
    Ok(FieldSet {
        camera_and_type,
        codex: codex.to_string(),
        sequence_id: sequence.to_string(),
        original_stem: Some(stem.to_string()),
        ..FieldSet::default()
    })
}

pub fn decompose_dscf(stem: &str) -> Result<FieldSet, ExtractError> {
    if stem.len() != 8 {
        return Err(malformed_as(stem, GrammarId::CameraDscf));
    }
    Ok(FieldSet {
        codex: field(stem, 0..4, GrammarId::CameraDscf)?,
        sequence_id: field(stem, 4..8, GrammarId::CameraDscf)?,
        original_stem: Some(stem.to_string()),
        ..FieldSet::default()
    })
}

// ============================================================================
// Legacy split layouts
// ============================================================================

/// `date_cameraID_sequence_chapter_time_codex`
pub fn decompose_legacy6(stem: &str) -> Result<FieldSet, ExtractError> {
    let parts: Vec<&str> = stem.split('_').collect();
    let [date, camera_id, sequence, chapter, time, codex] = parts[..] else {
        return Err(malformed_as(stem, GrammarId::Legacy6));
    };
    let captured =
        CaptureStamp::new(date, time).ok_or_else(|| malformed_as(stem, GrammarId::Legacy6))?;
    let camera_and_type = match codex {
        c if grammar::ACTION_CAM_CODICES.contains(&c) => CameraAndDataType::GoProVideo,
        "GS" => CameraAndDataType::GoProImage,
        "MVI" => CameraAndDataType::CameraVideo,
        _ => CameraAndDataType::Unknown,
    };
    Ok(FieldSet {
        captured: Some(captured),
        camera_and_type,
        camera_id: camera_id.to_string(),
        sequence_id: sequence.to_string(),
        chapter_id: chapter.to_string(),
        codex: codex.to_string(),
        ..FieldSet::default()
    })
}

/// `date_time_XY_cameraID_sequence_chapter_codex`
pub fn decompose_legacy7(stem: &str) -> Result<FieldSet, ExtractError> {
    let parts: Vec<&str> = stem.split('_').collect();
    let [date, time, code, camera_id, sequence, chapter, codex] = parts[..] else {
        return Err(malformed_as(stem, GrammarId::Legacy7));
    };
    let captured =
        CaptureStamp::new(date, time).ok_or_else(|| malformed_as(stem, GrammarId::Legacy7))?;
    let unknown = || ExtractError::UnknownCameraAndType {
        stem: stem.to_string(),
        code: code.to_string(),
        codex: codex.to_string(),
    };
    let camera_and_type = CameraAndDataType::from_abbreviation(code).ok_or_else(unknown)?;
    legacy7_origin(camera_and_type, codex).ok_or_else(unknown)?;
    Ok(FieldSet {
        captured: Some(captured),
        camera_and_type,
        camera_id: camera_id.to_string(),
        sequence_id: sequence.to_string(),
        chapter_id: chapter.to_string(),
        codex: codex.to_string(),
        ..FieldSet::default()
    })
}

// ============================================================================
// Free-form layouts
// ============================================================================

pub fn decompose_current(stem: &str) -> Result<FieldSet, ExtractError> {
    let caps = CURRENT_RE
        .captures(stem)
        .ok_or_else(|| malformed_as(stem, GrammarId::Current))?;
    let original = caps[5].to_string();
    free_form_fields(stem, GrammarId::Current, &caps, original)
}

/// The original stem is everything strictly between the first `(` and the last `)`.
pub fn decompose_parenthesized(stem: &str) -> Result<FieldSet, ExtractError> {
    let caps = PARENTHESIZED_RE
        .captures(stem)
        .ok_or_else(|| malformed_as(stem, GrammarId::Parenthesized))?;
    let (open, close) = match (stem.find('('), stem.rfind(')')) {
        (Some(open), Some(close)) if open + 1 < close => (open, close),
        _ => return Err(malformed_as(stem, GrammarId::Parenthesized)),
    };
    let original = stem[open + 1..close].to_string();
    free_form_fields(stem, GrammarId::Parenthesized, &caps, original)
}

/// Parentheses replaced by `__`: rejoin the segments after the fixed prefix
/// with `_`, then drop the two characters left by the closing delimiter.
pub fn decompose_mangled(stem: &str) -> Result<FieldSet, ExtractError> {
    let caps = MANGLED_RE
        .captures(stem)
        .ok_or_else(|| malformed_as(stem, GrammarId::Mangled))?;
    let segments: Vec<&str> = stem.split('_').collect();
    // date, time, camera, then either "" or NN + ""
    let rest_start = match segments.get(3) {
        Some(&"") => 4,
        Some(_) if segments.get(4) == Some(&"") => 5,
        _ => return Err(malformed_as(stem, GrammarId::Mangled)),
    };
    let rejoined = segments[rest_start..].join("_");
    let original = rejoined
        .strip_suffix("__")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed_as(stem, GrammarId::Mangled))?
        .to_string();
    free_form_fields(stem, GrammarId::Mangled, &caps, original)
}

fn free_form_fields(
    stem: &str,
    grammar: GrammarId,
    caps: &Captures<'_>,
    original: String,
) -> Result<FieldSet, ExtractError> {
    let captured = CaptureStamp::new(&caps[1], &caps[2]).ok_or_else(|| malformed_as(stem, grammar))?;
    let unique_id = match caps.get(4) {
        Some(m) => m
            .as_str()
            .parse::<u8>()
            .map_err(|_| malformed_as(stem, grammar))?,
        None => 1,
    };
    // Device fields ride along when the embedded stem is itself a device stem
    let device = match grammar::classify(&original) {
        id if id.is_device() => extract(&original, id).ok(),
        _ => None,
    };
    let mut fields = device.unwrap_or_default();
    fields.captured = Some(captured);
    fields.camera_id = caps[3].to_string();
    fields.unique_id = unique_id;
    fields.original_stem = Some(original);
    Ok(fields)
}

fn malformed_as(stem: &str, grammar: GrammarId) -> ExtractError {
    ExtractError::Malformed {
        stem: stem.to_string(),
        grammar,
    }
}

// ============================================================================
// File records
// ============================================================================

/// Everything known about one file, rebuilt from its name on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub grammar: GrammarId,
    /// Extension as found on disk, without the dot; empty if none.
    pub extension: String,
    pub kind: MediaKind,
    pub fields: FieldSet,
}

/// Split a path into its stem and extension (without the dot).
pub fn split_name(path: &Path) -> (String, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    (stem, ext)
}

impl FileRecord {
    /// Classify and extract a file by name, then resolve the camera family
    /// from the extension and the default camera IDs.
    pub fn inspect(path: &Path, cameras: &CamerasConfig) -> Result<Self, ExtractError> {
        let (stem, extension) = split_name(path);
        let (grammar, mut fields) = classify_and_extract(&stem)?;
        let kind = MediaKind::from_extension(&extension);
        resolve_camera_type(&mut fields, kind);
        if grammar.is_device() {
            fields.camera_id = default_camera_id(fields.camera_and_type, cameras).to_string();
        }
        Ok(Self {
            path: path.to_path_buf(),
            grammar,
            extension,
            kind,
            fields,
        })
    }
}

/// Fill in the camera/type code where only the extension can decide it.
fn resolve_camera_type(fields: &mut FieldSet, kind: MediaKind) {
    if fields.camera_and_type != CameraAndDataType::Unknown {
        return;
    }
    let video = kind == MediaKind::Video;
    fields.camera_and_type = match fields.codex.as_str() {
        c if grammar::ACTION_CAM_CODICES.contains(&c) => CameraAndDataType::GoProVideo,
        "IMG" if video => CameraAndDataType::IPhoneVideo,
        "IMG" => CameraAndDataType::IPhoneImage,
        "MVI" => CameraAndDataType::CameraVideo,
        "DSCF" if video => CameraAndDataType::CameraVideo,
        "DSCF" => CameraAndDataType::CameraImage,
        _ => CameraAndDataType::Unknown,
    };
}

fn default_camera_id(camera_and_type: CameraAndDataType, cameras: &CamerasConfig) -> &str {
    match camera_and_type {
        CameraAndDataType::GoProVideo | CameraAndDataType::GoProImage => &cameras.gopro_id,
        CameraAndDataType::IPhoneVideo | CameraAndDataType::IPhoneImage => &cameras.iphone_id,
        _ => &cameras.camera_id,
    }
}
