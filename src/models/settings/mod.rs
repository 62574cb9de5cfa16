// Settings module
// Grid behavior knobs loaded from an optional TOML file

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable behavior for the week grid and its sync window.
///
/// Every field has a default so a partial (or missing) config file still
/// yields a working set of settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// Snap step for drag gestures, in minutes. Must divide an hour evenly.
    #[serde(default = "default_snap_step")]
    pub snap_step_minutes: u32,

    /// Pointer travel (px) before a press becomes a drag.
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold_px: f32,

    /// IANA zone id for wall-clock display, e.g. "Australia/Sydney".
    /// `None` means use the machine's local zone.
    #[serde(default)]
    pub time_zone: Option<String>,

    /// Days of padding added on each side of a visible range when
    /// planning a provider resync.
    #[serde(default = "default_resync_pad")]
    pub resync_pad_days: i64,
}

fn default_snap_step() -> u32 {
    15
}

fn default_drag_threshold() -> f32 {
    5.0
}

fn default_resync_pad() -> i64 {
    7
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            snap_step_minutes: default_snap_step(),
            drag_threshold_px: default_drag_threshold(),
            time_zone: None,
            resync_pad_days: default_resync_pad(),
        }
    }
}

impl GridSettings {
    /// Parse settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let settings: GridSettings =
            toml::from_str(content).map_err(|e| format!("Invalid settings TOML: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string(self).map_err(|e| format!("Failed to serialize settings: {}", e))
    }

    /// Load settings from a file, falling back to defaults if the file
    /// does not exist.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_toml(&content)
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Write settings to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = self
            .to_toml()
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to serialize settings")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        Ok(())
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<(), String> {
        if self.snap_step_minutes == 0 || self.snap_step_minutes > 60 {
            return Err(format!(
                "snap_step_minutes must be between 1 and 60, got {}",
                self.snap_step_minutes
            ));
        }
        if 60 % self.snap_step_minutes != 0 {
            return Err(format!(
                "snap_step_minutes must divide an hour evenly, got {}",
                self.snap_step_minutes
            ));
        }
        if !self.drag_threshold_px.is_finite() || self.drag_threshold_px < 0.0 {
            return Err(format!(
                "drag_threshold_px must be a non-negative number, got {}",
                self.drag_threshold_px
            ));
        }
        if self.resync_pad_days < 0 {
            return Err(format!(
                "resync_pad_days must not be negative, got {}",
                self.resync_pad_days
            ));
        }
        Ok(())
    }
}
