//! Engine settings, persisted as JSON.
//!
//! Every field has a default, so a partial (or missing) file is fine.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::widgets::timetable::segments::DEFAULT_MAX_SEGMENTS;
use crate::widgets::timetable::Orientation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pointer travel (either axis) after which a press on an item is a drag, not a click.
    pub drag_tolerance_px: f64,
    /// Cap on points a segment rule may generate.
    pub max_segments: usize,
    /// Orientation for timetables that don't choose one.
    pub orientation: Orientation,
    /// Offset the content of items hanging off the view start so it stays visible.
    pub keep_item_content_in_view: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            drag_tolerance_px: 10.0,
            max_segments: DEFAULT_MAX_SEGMENTS,
            orientation: Orientation::Vertical,
            keep_item_content_in_view: true,
        }
    }
}

impl Settings {
    /// Load from a JSON file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings: {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::paths::ensure_parent(path)?;
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("Failed to write settings: {}", path.display()))?;
        Ok(())
    }
}
