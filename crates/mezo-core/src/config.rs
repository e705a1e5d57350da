//! Editor configuration.
//!
//! Every field has a default matching the desktop application, so an empty
//! JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

// ─── Viewport ────────────────────────────────────────────────────────────

/// Space taken by window chrome around the viewer, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeInsets {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Default for ChromeInsets {
    fn default() -> Self {
        // Menubar (40) and status bar (26) plus 5px padding on every side.
        Self {
            left: 5.0,
            top: 45.0,
            right: 5.0,
            bottom: 31.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub chrome: ChromeInsets,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 15.0,
            chrome: ChromeInsets::default(),
        }
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

/// How a mezophase is drawn into the mask. Colors are straight RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MezoStyle {
    pub fill: [u8; 4],
    pub outline: [u8; 4],
    pub outline_width: f32,
    /// Radius of the solid center dot.
    pub dot_radius: f32,
    /// Color of the pending manual-select center marker.
    pub marker: [u8; 4],
}

impl Default for MezoStyle {
    fn default() -> Self {
        Self {
            fill: [191, 255, 0, 128],
            outline: [191, 255, 0, 255],
            outline_width: 3.0,
            dot_radius: 2.0,
            marker: [255, 0, 0, 255],
        }
    }
}

// ─── Editor ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub viewport: ViewportConfig,
    pub style: MezoStyle,
    /// Number of mask snapshots kept for undo.
    pub undo_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            style: MezoStyle::default(),
            undo_capacity: 3,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let config: EditorConfig =
            serde_json::from_str(text).map_err(|e| format!("invalid config: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<(), String> {
        let v = &self.viewport;
        if !(v.min_scale > 0.0 && v.min_scale <= v.max_scale) {
            return Err(format!(
                "invalid scale range {} ..= {}",
                v.min_scale, v.max_scale
            ));
        }
        if self.undo_capacity == 0 {
            return Err("undo_capacity must be at least 1".to_string());
        }
        Ok(())
    }
}
