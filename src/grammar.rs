//! Pattern registry and classifier.
//!
//! Every filename convention the tool understands is a [`Grammar`]: a matcher
//! over the stem (filename without extension), a decomposition function that
//! pulls the stem apart into a [`FieldSet`], and a recomposition function that
//! rebuilds the original device-style stem from those fields.
//!
//! ## Registry Order
//!
//! ```text
//!  #  id             layout        shape
//!  1  ActionCam      positional    GH020007                      (codex, chapter, sequence)
//!  2  PhoneImg       2-part split  IMG_0042
//!  3  CameraMvi      2-part split  MVI_0042
//!  4  CameraDscf     positional    DSCF0042
//!  5  Legacy6        6-field split 20240615_11Mini_0007_02_143000_GH
//!  6  Legacy7        7-field split 20240615_143000_GV_11Mini_0007_02_GH
//!  7  Mangled        pattern       20240615_143000_11Mini__GH020007__
//!  8  Parenthesized  pattern       20240615_143000_11Mini(GH020007)
//!  9  Current        pattern       20240615_143000_11Mini-GH020007
//! ```
//!
//! [`classify`] walks the registry top to bottom and returns the first hit,
//! so rigid device shapes and the structured legacy layouts are tested
//! before the free-form ones. A legacy 7-field name whose camera ID happens
//! to contain a dash also satisfies the `Current` pattern; it still
//! classifies as `Legacy7`.
//!
//! Adding a device or a new output generation means adding a row to
//! [`REGISTRY`], not editing control flow.
//!
//! ## Mangled Names
//!
//! Some photo-library imports replace every parenthesis with a double
//! underscore, turning `…_11Mini(GH020007)` into `…_11Mini__GH020007__`.
//! The `Mangled` row recognises that shape so those files can still be
//! inverted. The `Current` generation uses a dash and survives the import.

use crate::extract::{self, ExtractError, FieldSet};
use crate::invert::{self, InversionError};
use crate::types::CameraAndDataType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Identifier of a registry row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GrammarId {
    ActionCam,
    PhoneImg,
    CameraMvi,
    CameraDscf,
    Legacy6,
    Legacy7,
    Mangled,
    Parenthesized,
    Current,
    Unknown,
}

impl GrammarId {
    /// Stems straight off a camera or phone.
    pub fn is_device(self) -> bool {
        matches!(
            self,
            Self::ActionCam | Self::PhoneImg | Self::CameraMvi | Self::CameraDscf
        )
    }

    /// Stems produced by some generation of this tool.
    pub fn is_tool_output(self) -> bool {
        matches!(
            self,
            Self::Legacy6 | Self::Legacy7 | Self::Mangled | Self::Parenthesized | Self::Current
        )
    }
}

impl fmt::Display for GrammarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ActionCam => "action-camera",
            Self::PhoneImg => "IMG_",
            Self::CameraMvi => "MVI_",
            Self::CameraDscf => "DSCF",
            Self::Legacy6 => "legacy 6-field",
            Self::Legacy7 => "legacy 7-field",
            Self::Mangled => "mangled parenthesized",
            Self::Parenthesized => "parenthesized",
            Self::Current => "current",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// How a grammar lays out its fields. Informational; the matcher is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Fixed-length stem sliced at fixed offsets.
    Positional { len: usize },
    /// Stem split on `_` into exactly this many parts.
    Split { parts: usize },
    /// Regular expression with capture groups.
    Pattern,
}

/// One filename convention: matcher plus decomposition/recomposition pair.
pub struct Grammar {
    pub id: GrammarId,
    pub layout: Layout,
    pub matches: fn(&str) -> bool,
    pub decompose: fn(&str) -> Result<FieldSet, ExtractError>,
    pub recompose: fn(&FieldSet) -> Result<String, InversionError>,
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("id", &self.id)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

pub static REGISTRY: [Grammar; 9] = [
    Grammar {
        id: GrammarId::ActionCam,
        layout: Layout::Positional { len: 8 },
        matches: is_action_cam,
        decompose: extract::decompose_action_cam,
        recompose: invert::recompose_action_cam,
    },
    Grammar {
        id: GrammarId::PhoneImg,
        layout: Layout::Split { parts: 2 },
        matches: is_phone_img,
        decompose: extract::decompose_prefixed,
        recompose: invert::recompose_prefixed,
    },
    Grammar {
        id: GrammarId::CameraMvi,
        layout: Layout::Split { parts: 2 },
        matches: is_camera_mvi,
        decompose: extract::decompose_prefixed,
        recompose: invert::recompose_prefixed,
    },
    Grammar {
        id: GrammarId::CameraDscf,
        layout: Layout::Positional { len: 8 },
        matches: is_camera_dscf,
        decompose: extract::decompose_dscf,
        recompose: invert::recompose_glued,
    },
    Grammar {
        id: GrammarId::Legacy6,
        layout: Layout::Split { parts: 6 },
        matches: is_legacy6,
        decompose: extract::decompose_legacy6,
        recompose: invert::recompose_legacy6,
    },
    Grammar {
        id: GrammarId::Legacy7,
        layout: Layout::Split { parts: 7 },
        matches: is_legacy7,
        decompose: extract::decompose_legacy7,
        recompose: invert::recompose_legacy7,
    },
    Grammar {
        id: GrammarId::Mangled,
        layout: Layout::Pattern,
        matches: is_mangled,
        decompose: extract::decompose_mangled,
        recompose: invert::recompose_embedded,
    },
    Grammar {
        id: GrammarId::Parenthesized,
        layout: Layout::Pattern,
        matches: is_parenthesized,
        decompose: extract::decompose_parenthesized,
        recompose: invert::recompose_embedded,
    },
    Grammar {
        id: GrammarId::Current,
        layout: Layout::Pattern,
        matches: is_current,
        decompose: extract::decompose_current,
        recompose: invert::recompose_embedded,
    },
];

/// Find the first grammar in registry order that accepts `stem`.
pub fn classify(stem: &str) -> GrammarId {
    REGISTRY
        .iter()
        .find(|g| (g.matches)(stem))
        .map(|g| g.id)
        .unwrap_or(GrammarId::Unknown)
}

/// Registry row for an id. `None` for [`GrammarId::Unknown`].
pub fn lookup(id: GrammarId) -> Option<&'static Grammar> {
    REGISTRY.iter().find(|g| g.id == id)
}

// ============================================================================
// Shared vocabulary
// ============================================================================

/// Action-camera video codices.
pub const ACTION_CAM_CODICES: &[&str] = &["GH", "GX", "GP"];

/// Codices accepted in the last field of the legacy 6-field layout.
pub const LEGACY_CODICES: &[&str] = &["GH", "GX", "GP", "GS", "IMG", "MVI", "DSCF"];

/// How the original stem is rebuilt from legacy fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginShape {
    /// `codex + chapter + sequence`, e.g. `GH020007`.
    Chaptered,
    /// `codex + "_" + sequence`, e.g. `IMG_0042`.
    Prefixed,
    /// `codex + sequence`, e.g. `DSCF0042`.
    Glued,
    /// Layout is known but no original shape is defined for it.
    Undefined,
}

/// Reconstruction rule for a legacy 7-field camera/type code and codex.
///
/// `None` means the combination is not one this tool ever produced, which
/// the extractor reports as an unknown camera and data type.
pub fn legacy7_origin(camera_and_type: CameraAndDataType, codex: &str) -> Option<OriginShape> {
    use CameraAndDataType::*;
    match (camera_and_type, codex) {
        (GoProVideo, c) if ACTION_CAM_CODICES.contains(&c) => Some(OriginShape::Chaptered),
        (GoProImage, _) => Some(OriginShape::Undefined),
        (IPhoneVideo | IPhoneImage, "IMG") => Some(OriginShape::Prefixed),
        (CameraVideo, "MVI") => Some(OriginShape::Prefixed),
        (CameraImage, "DSCF") => Some(OriginShape::Glued),
        _ => None,
    }
}

/// Reconstruction rule for a legacy 6-field codex.
pub fn legacy6_origin(codex: &str) -> OriginShape {
    match codex {
        c if ACTION_CAM_CODICES.contains(&c) => OriginShape::Chaptered,
        "IMG" | "MVI" => OriginShape::Prefixed,
        "DSCF" => OriginShape::Glued,
        _ => OriginShape::Undefined,
    }
}

// ============================================================================
// Matchers
// ============================================================================

pub(crate) fn is_digits(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_action_cam(stem: &str) -> bool {
    let b = stem.as_bytes();
    b.len() == 8
        && b[0] == b'G'
        && matches!(b[1], b'H' | b'X' | b'P')
        && b[2..].iter().all(u8::is_ascii_digit)
}

fn is_prefixed(stem: &str, prefix: &str) -> bool {
    match stem.split_once('_') {
        Some((head, seq)) => head == prefix && is_digits(seq, 4),
        None => false,
    }
}

fn is_phone_img(stem: &str) -> bool {
    is_prefixed(stem, "IMG")
}

fn is_camera_mvi(stem: &str) -> bool {
    is_prefixed(stem, "MVI")
}

fn is_camera_dscf(stem: &str) -> bool {
    stem.len() == 8 && stem.starts_with("DSCF") && is_digits(&stem[4..], 4)
}

fn is_legacy6(stem: &str) -> bool {
    let parts: Vec<&str> = stem.split('_').collect();
    parts.len() == 6
        && is_digits(parts[0], 8)
        && !parts[1].is_empty()
        && is_digits(parts[2], 4)
        && is_digits(parts[3], 2)
        && is_digits(parts[4], 6)
        && LEGACY_CODICES.contains(&parts[5])
}

fn is_legacy7(stem: &str) -> bool {
    let parts: Vec<&str> = stem.split('_').collect();
    parts.len() == 7
        && is_digits(parts[0], 8)
        && is_digits(parts[1], 6)
        && CameraAndDataType::from_abbreviation(parts[2]).is_some()
        && !parts[3].is_empty()
        && is_digits(parts[4], 4)
        && is_digits(parts[5], 2)
        && (2..=4).contains(&parts[6].len())
        && parts[6].bytes().all(|b| b.is_ascii_uppercase())
}

// date _ time _ camera [_ NN] <delimiter> original <closing>
pub(crate) static MANGLED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{8})_(\d{6}(?:\d{2})?)_([A-Za-z0-9]+)(?:_(\d{2}))?__(.+)__$")
        .expect("mangled pattern compiles")
});

pub(crate) static PARENTHESIZED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{8})_(\d{6}(?:\d{2})?)_([A-Za-z0-9]+)(?:_(\d{2}))?\((.+)\)$")
        .expect("parenthesized pattern compiles")
});

pub(crate) static CURRENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{8})_(\d{6}(?:\d{2})?)_([A-Za-z0-9]+)(?:_(\d{2}))?-(.+)$")
        .expect("current pattern compiles")
});

fn is_mangled(stem: &str) -> bool {
    MANGLED_RE.is_match(stem)
}

fn is_parenthesized(stem: &str) -> bool {
    PARENTHESIZED_RE.is_match(stem)
}

fn is_current(stem: &str) -> bool {
    CURRENT_RE.is_match(stem)
}
