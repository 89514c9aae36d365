//! Tool configuration.
//!
//! Handles loading, validating, and merging `mediastamp.toml`. Stock defaults
//! are overridden by a config file in the source directory, or by the file
//! given with `--config`. Command-line overrides are applied on top by the
//! binary.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [cameras]
//! gopro_id = "11Mini"        # Camera ID for action-camera files (GH/GX/GP)
//! iphone_id = "iPhone13"     # Camera ID for IMG_ files
//! camera_id = "Camera"       # Camera ID for MVI_ and DSCF files
//!
//! [naming]
//! generation = "current"     # "current" or "legacy"
//! hundredths = false         # HHMMSSTT instead of HHMMSS
//!
//! [probe]
//! enabled = true             # Subtract video duration from mtime
//! command = "ffprobe"
//!
//! [batch]
//! skip_hidden = true
//! ignore_extensions = ["py", "toml"]
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "mediastamp.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `mediastamp.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Default camera IDs per camera family.
    pub cameras: CamerasConfig,
    /// Which canonical layout to write.
    pub naming: NamingConfig,
    /// Video duration probing.
    pub probe: ProbeConfig,
    /// Directory listing filters.
    pub batch: BatchConfig,
}

impl ToolConfig {
    /// Validate config values are usable in filenames.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("cameras.gopro_id", &self.cameras.gopro_id),
            ("cameras.iphone_id", &self.cameras.iphone_id),
            ("cameras.camera_id", &self.cameras.camera_id),
        ] {
            if !is_valid_camera_id(value) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be non-empty ASCII letters and digits, got {value:?}"
                )));
            }
        }
        if self.probe.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "probe.command must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Camera IDs end up between `_` and `-` delimiters, so only letters and digits.
pub fn is_valid_camera_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CamerasConfig {
    pub gopro_id: String,
    pub iphone_id: String,
    pub camera_id: String,
}

impl Default for CamerasConfig {
    fn default() -> Self {
        Self {
            gopro_id: "11Mini".to_string(),
            iphone_id: "iPhone13".to_string(),
            camera_id: "Camera".to_string(),
        }
    }
}

/// Canonical filename generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generation {
    /// `YYYYMMDD_HHMMSS[TT]_cameraID[_NN]-originalStem`
    #[default]
    Current,
    /// `YYYYMMDD_HHMMSS_XY_cameraID_SSSS_CC_codex`
    Legacy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub generation: Generation,
    /// Keep hundredths of a second in the time field.
    pub hundredths: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    pub enabled: bool,
    pub command: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "ffprobe".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Leave dotfiles alone.
    pub skip_hidden: bool,
    /// Extensions (without the dot, case-insensitive) never touched.
    pub ignore_extensions: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            skip_hidden: true,
            ignore_extensions: vec!["py".to_string(), "toml".to_string()],
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(ToolConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` if the file is absent.
pub fn load_raw_config(file: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !file.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(file)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `mediastamp.toml` from a directory, falling back to stock defaults.
pub fn load_config(dir: &Path) -> Result<ToolConfig, ConfigError> {
    resolve_config(load_raw_config(&dir.join(CONFIG_FILENAME))?)
}

/// Load an explicitly named config file. The file must exist.
pub fn load_config_file(file: &Path) -> Result<ToolConfig, ConfigError> {
    let content = fs::read_to_string(file)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `mediastamp.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# mediastamp configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the source folder as mediastamp.toml, or pass it with
# --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Default camera IDs
# ---------------------------------------------------------------------------
# Letters and digits only: the ID sits between delimiters in the new name.
[cameras]
# Action-camera video (GH010001.MP4, GX010001.MP4, GP010001.MP4)
gopro_id = "11Mini"
# Phone media (IMG_0001.MOV, IMG_0001.HEIC)
iphone_id = "iPhone13"
# Dedicated cameras (MVI_0001.MOV, DSCF0001.JPG)
camera_id = "Camera"

# ---------------------------------------------------------------------------
# Naming
# ---------------------------------------------------------------------------
[naming]
# "current": 20240615_143000_11Mini-GH020007.MP4
# "legacy":  20240615_143000_GV_11Mini_0007_02_GH.MP4
generation = "current"

# Append hundredths of a second to the time field (HHMMSSTT).
hundredths = false

# ---------------------------------------------------------------------------
# Video duration probe
# ---------------------------------------------------------------------------
# Video files are stamped when recording ended; the probe reports the
# duration so the start time can be recovered. Without it the modification
# time is used as-is.
[probe]
enabled = true
command = "ffprobe"

# ---------------------------------------------------------------------------
# Directory listing
# ---------------------------------------------------------------------------
[batch]
# Skip files whose name starts with a dot.
skip_hidden = true
# Never touch files with these extensions.
ignore_extensions = ["py", "toml"]
"##
}
