//! Original name → canonical name → original name, through the public API.

use mediastamp::config::{CamerasConfig, Generation};
use mediastamp::extract::{FileRecord, extract};
use mediastamp::grammar::{GrammarId, classify};
use mediastamp::invert::invert;
use mediastamp::synthesize::{Synthesis, synthesize};
use mediastamp::types::CaptureStamp;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const DEVICE_FILES: &[&str] = &[
    "GH020007.MP4",
    "GX010123.MP4",
    "GP019999.mp4",
    "IMG_0042.MOV",
    "IMG_0043.HEIC",
    "MVI_1234.MOV",
    "DSCF0042.JPG",
];

fn create(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, name).unwrap();
    path
}

/// Synthesize, perform the rename, then read the new name back.
fn rename_and_recover(dir: &Path, name: &str, generation: Generation) -> (String, String) {
    let path = create(dir, name);
    let mut record = FileRecord::inspect(&path, &CamerasConfig::default()).unwrap();
    record.fields.captured = CaptureStamp::new("20240615", "143000");

    let Synthesis::Rename(target) = synthesize(&record, dir, generation).unwrap() else {
        panic!("{name} should need a rename");
    };
    fs::rename(&path, &target).unwrap();

    let renamed = FileRecord::inspect(&target, &CamerasConfig::default()).unwrap();
    let original = invert(&renamed.fields, renamed.grammar).unwrap();
    let canonical = target.file_name().unwrap().to_string_lossy().to_string();
    (canonical, format!("{original}.{}", renamed.extension))
}

#[test]
fn device_stems_round_trip_through_extraction() {
    for name in DEVICE_FILES {
        let stem = name.split('.').next().unwrap();
        let grammar = classify(stem);
        assert!(grammar.is_device(), "{stem} classified as {grammar}");
        let fields = extract(stem, grammar).unwrap();
        assert_eq!(invert(&fields, grammar).unwrap(), stem);
    }
}

#[test]
fn current_generation_round_trip() {
    let tmp = TempDir::new().unwrap();
    for name in DEVICE_FILES {
        let (canonical, recovered) = rename_and_recover(tmp.path(), name, Generation::Current);
        assert_eq!(classify(canonical.split('.').next().unwrap()), GrammarId::Current);
        assert_eq!(&recovered, name, "via {canonical}");
    }
}

#[test]
fn legacy_generation_round_trip() {
    let tmp = TempDir::new().unwrap();
    for name in DEVICE_FILES {
        let (canonical, recovered) = rename_and_recover(tmp.path(), name, Generation::Legacy);
        assert_eq!(classify(canonical.split('.').next().unwrap()), GrammarId::Legacy7);
        assert_eq!(&recovered, name, "via {canonical}");
    }
}

#[test]
fn documented_examples() {
    let tmp = TempDir::new().unwrap();
    let (canonical, _) = rename_and_recover(tmp.path(), "GH020007.mp4", Generation::Current);
    assert_eq!(canonical, "20240615_143000_11Mini-GH020007.mp4");

    let fields = extract("20240615_143000_IV_iPhone13_0042_00_IMG", GrammarId::Legacy7).unwrap();
    assert_eq!(invert(&fields, GrammarId::Legacy7).unwrap(), "IMG_0042");
}

#[test]
fn collision_counter_round_trips() {
    let tmp = TempDir::new().unwrap();
    create(tmp.path(), "20240615_143000_11Mini-GH020007.MP4");
    let (canonical, recovered) = rename_and_recover(tmp.path(), "GH020007.MP4", Generation::Current);
    assert_eq!(canonical, "20240615_143000_11Mini_02-GH020007.MP4");
    assert_eq!(recovered, "GH020007.MP4");
}

#[test]
fn mangled_import_still_inverts() {
    // What a photo-library import makes of the parenthesized layout
    for (stem, original) in [
        ("20240615_143000_11Mini__GH020007__", "GH020007"),
        ("20240615_143000_11Mini_02__IMG_0042__", "IMG_0042"),
        ("20240615_143000_Cam__my_clip___", "my_clip_"),
    ] {
        let grammar = classify(stem);
        assert_eq!(grammar, GrammarId::Mangled, "{stem}");
        let fields = extract(stem, grammar).unwrap();
        assert_eq!(invert(&fields, grammar).unwrap(), original);
    }
}
