//! Value types shared by the extractor, synthesizer, inverter and batch driver.
//!
//! None of these types carry filesystem state. A [`CaptureStamp`] is the
//! textual `YYYYMMDD` / `HHMMSS[TT]` pair that ends up in a canonical name,
//! [`CameraAndDataType`] is the two-letter family code used by the legacy
//! 7-field layout, and [`MediaKind`] is what the file extension says.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Camera family and data type, abbreviated as a two-letter code in legacy names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CameraAndDataType {
    GoProVideo,
    GoProImage,
    #[serde(rename = "iPhoneVideo")]
    IPhoneVideo,
    #[serde(rename = "iPhoneImage")]
    IPhoneImage,
    CameraVideo,
    CameraImage,
    Unknown,
}

impl CameraAndDataType {
    pub const ALL: [CameraAndDataType; 7] = [
        Self::GoProVideo,
        Self::GoProImage,
        Self::IPhoneVideo,
        Self::IPhoneImage,
        Self::CameraVideo,
        Self::CameraImage,
        Self::Unknown,
    ];

    /// Two-letter code used in the legacy 7-field layout.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::GoProVideo => "GV",
            Self::GoProImage => "GI",
            Self::IPhoneVideo => "IV",
            Self::IPhoneImage => "II",
            Self::CameraVideo => "CV",
            Self::CameraImage => "CI",
            Self::Unknown => "XX",
        }
    }

    pub fn from_abbreviation(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.abbreviation() == code)
    }
}

impl fmt::Display for CameraAndDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::GoProVideo => "GoPro video",
            Self::GoProImage => "GoPro image",
            Self::IPhoneVideo => "iPhone video",
            Self::IPhoneImage => "iPhone image",
            Self::CameraVideo => "camera video",
            Self::CameraImage => "camera image",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "avi", "mts"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "heic", "png", "raf", "cr2", "dng"];

/// What the file extension says about a file's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MediaKind {
    Video,
    Image,
    Other,
}

impl MediaKind {
    /// Classify an extension (without the dot), case-insensitively.
    pub fn from_extension(ext: &str) -> Self {
        let lower = ext.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&lower.as_str()) {
            MediaKind::Video
        } else if IMAGE_EXTENSIONS.contains(&lower.as_str()) {
            MediaKind::Image
        } else {
            MediaKind::Other
        }
    }

    pub fn of_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(MediaKind::Other)
    }
}

/// Capture date and time as they appear in a canonical filename.
///
/// `date` is always 8 digits (`YYYYMMDD`); `time` is 6 digits (`HHMMSS`) or
/// 8 digits when hundredths of a second are kept (`HHMMSSTT`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureStamp {
    pub date: String,
    pub time: String,
}

impl CaptureStamp {
    /// Build a stamp from already-formatted parts, rejecting anything that
    /// is not the expected run of ASCII digits.
    pub fn new(date: &str, time: &str) -> Option<Self> {
        let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        let date_ok = date.len() == 8 && digits(date);
        let time_ok = (time.len() == 6 || time.len() == 8) && digits(time);
        (date_ok && time_ok).then(|| Self {
            date: date.to_string(),
            time: time.to_string(),
        })
    }

    /// Format a local timestamp, optionally keeping hundredths of a second.
    pub fn from_datetime<Tz: chrono::TimeZone>(dt: &chrono::DateTime<Tz>, hundredths: bool) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        let date = dt.format("%Y%m%d").to_string();
        let mut time = dt.format("%H%M%S").to_string();
        if hundredths {
            let centis = chrono::Timelike::nanosecond(dt) / 10_000_000;
            // Leap-second nanos can exceed 1e9
            time.push_str(&format!("{:02}", centis.min(99)));
        }
        Self { date, time }
    }
}

impl fmt::Display for CaptureStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.date, self.time)
    }
}
