//! Name inversion: rebuilding the original device stem from extracted fields.
//!
//! The recomposition functions here are the second half of each registry
//! row. For device grammars they are the device-format builders
//! (`GH020007` from codex, chapter and sequence), so `extract` followed by
//! recomposition reproduces the stem exactly. For the tool's own layouts they
//! undo the rename: the legacy layouts go through the same
//! [`OriginShape`](crate::grammar::OriginShape) tables the extractor uses,
//! the free-form layouts simply hand back the embedded original.

use crate::extract::FieldSet;
use crate::grammar::{self, GrammarId, OriginShape};
use crate::types::CameraAndDataType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InversionError {
    #[error("no original name is defined for {camera_and_type} files in the {grammar} layout")]
    Undefined {
        grammar: GrammarId,
        camera_and_type: CameraAndDataType,
    },
    #[error("cannot invert a filename in an unrecognized layout")]
    Unknown,
}

/// Reconstruct the pre-rename stem for fields extracted under `grammar`.
pub fn invert(fields: &FieldSet, grammar: GrammarId) -> Result<String, InversionError> {
    let row = grammar::lookup(grammar).ok_or(InversionError::Unknown)?;
    (row.recompose)(fields)
}

fn render(shape: OriginShape, fields: &FieldSet, grammar: GrammarId) -> Result<String, InversionError> {
    let seq = format!("{:0>4}", fields.sequence_id);
    match shape {
        OriginShape::Chaptered => Ok(format!(
            "{}{:0>2}{}",
            fields.codex, fields.chapter_id, seq
        )),
        OriginShape::Prefixed => Ok(format!("{}_{}", fields.codex, seq)),
        OriginShape::Glued => Ok(format!("{}{}", fields.codex, seq)),
        OriginShape::Undefined => Err(InversionError::Undefined {
            grammar,
            camera_and_type: fields.camera_and_type,
        }),
    }
}

pub fn recompose_action_cam(fields: &FieldSet) -> Result<String, InversionError> {
    render(OriginShape::Chaptered, fields, GrammarId::ActionCam)
}

pub fn recompose_prefixed(fields: &FieldSet) -> Result<String, InversionError> {
    render(OriginShape::Prefixed, fields, GrammarId::PhoneImg)
}

pub fn recompose_glued(fields: &FieldSet) -> Result<String, InversionError> {
    render(OriginShape::Glued, fields, GrammarId::CameraDscf)
}

pub fn recompose_legacy6(fields: &FieldSet) -> Result<String, InversionError> {
    render(grammar::legacy6_origin(&fields.codex), fields, GrammarId::Legacy6)
}

pub fn recompose_legacy7(fields: &FieldSet) -> Result<String, InversionError> {
    let shape = grammar::legacy7_origin(fields.camera_and_type, &fields.codex)
        .unwrap_or(OriginShape::Undefined);
    render(shape, fields, GrammarId::Legacy7)
}

/// Free-form layouts carry the original stem verbatim.
pub fn recompose_embedded(fields: &FieldSet) -> Result<String, InversionError> {
    fields
        .original_stem
        .clone()
        .filter(|s| !s.is_empty())
        .ok_or(InversionError::Undefined {
            grammar: GrammarId::Current,
            camera_and_type: fields.camera_and_type,
        })
}
