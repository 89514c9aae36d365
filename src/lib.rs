//! # mediastamp
//!
//! Renames camera media into a sortable, reversible naming scheme and back.
//! Everything the tool knows about a file comes from its name, its
//! modification time and (for videos) its duration; there is no database.
//!
//! # Architecture: Classify, Extract, Synthesize, Invert
//!
//! ```text
//! GH020007.MP4 ──classify──▶ ActionCam ──extract──▶ {codex GH, chapter 02, sequence 0007}
//!                                                        │  + capture time + camera ID
//!                                                        ▼
//!                                      synthesize ─▶ 20240615_143000_11Mini-GH020007.MP4
//!                                                        │
//!                                            invert ◀────┘  ─▶ GH020007.MP4
//! ```
//!
//! Each step is a plain function over values. Only the synthesizer (collision
//! probing), the time source and the batch driver touch the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`grammar`] | Ordered registry of filename grammars and the first-match classifier |
//! | [`extract`] | Grammar-specific decomposition into a `FieldSet`; `FileRecord` per file |
//! | [`invert`] | Rebuilds original device stems; the device-format builders |
//! | [`synthesize`] | Canonical names for both generations, collision counter `_02`..`_99` |
//! | [`timesource`] | Capture time from mtime, corrected by an injectable duration probe |
//! | [`fsops`] | Same-file identity checks and no-clobber moves |
//! | [`batch`] | Process / recover / rename-camera / inventory over a folder, one file at a time |
//! | [`merge`] | Flattens AirDrop-style single-file subfolders |
//! | [`config`] | `mediastamp.toml` loading, merging and validation |
//! | [`types`] | Shared value types (`CameraAndDataType`, `CaptureStamp`, `MediaKind`) |
//! | [`output`] | CLI output formatting: pure `format_*` plus `print_*` wrappers |
//!
//! # Design Decisions
//!
//! ## Grammars Are Data
//!
//! Each naming convention is one row of [`grammar::REGISTRY`]: a matcher, a
//! decomposition function and a recomposition function. The classifier walks
//! the rows in order and stops at the first match, so precedence is the row
//! order and nothing else. Structured layouts sit above the free-form ones.
//!
//! ## Two Canonical Generations
//!
//! ```text
//! current  20240615_143000_11Mini-GH020007.MP4        original stem kept verbatim
//! legacy   20240615_143000_GV_11Mini_0007_02_GH.MP4   seven fixed-width fields
//! ```
//!
//! The current generation can carry any original name and so can always be
//! inverted; the legacy one rebuilds the original from a table keyed by the
//! camera/type code and codex. Older tool outputs (the 6-field layout, the
//! parenthesized layout and its underscore-mangled form) are still recognized
//! so they can be upgraded or recovered.
//!
//! ## Collisions Never Overwrite
//!
//! Before a name is used the destination is probed on disk. The source file
//! itself means "nothing to do"; anything else bumps a two-digit counter
//! inserted after the camera ID. Past `_99` the file fails instead of growing
//! a third digit. The final move refuses to replace an existing file as well.
//!
//! ## One Bad File Never Stops a Batch
//!
//! The batch driver turns every per-file error, and any panic, into a failed
//! outcome for that file and carries on. The binary exits non-zero if any
//! file failed.

pub mod batch;
pub mod config;
pub mod extract;
pub mod fsops;
pub mod grammar;
pub mod invert;
pub mod merge;
pub mod output;
pub mod synthesize;
pub mod timesource;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
