//! Configuration loaded from `trace-tutor.toml`.
//!
//! Every field has a default, so a missing file (or a partial one) is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::coverage::PASS_THRESHOLD;
use crate::error::Result;
use crate::glyph::PANEL_HEIGHT;
use crate::ink::{STROKE_WIDTH, StrokeStyle};
use crate::session::{AUTO_CLEAR_DELAY, SessionSettings};

pub const DEFAULT_CONFIG_FILE: &str = "trace-tutor.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub panel: PanelConfig,
    pub scoring: ScoringConfig,
    pub ink: InkConfig,
    pub session: SessionConfig,
    pub font: FontConfig,
    pub progress: ProgressConfig,
    /// Words offered for tracing, in order.
    pub words: Vec<String>,
}

/// Initial panel geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Minimum coverage percent (inclusive) for a pass
    pub pass_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InkConfig {
    pub stroke_width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay before a successful trace is wiped, in milliseconds
    pub auto_clear_ms: u64,
    /// Start in dark mode
    pub dark_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FontConfig {
    /// Path to a .ttf/.otf used for reference glyphs
    pub path: Option<PathBuf>,
    /// Look for a bold sans-serif among system fonts when `path` is unset or unusable
    pub use_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProgressConfig {
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            panel: PanelConfig::default(),
            scoring: ScoringConfig::default(),
            ink: InkConfig::default(),
            session: SessionConfig::default(),
            font: FontConfig::default(),
            progress: ProgressConfig::default(),
            words: vec!["cat".into(), "house".into(), "book".into()],
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self { width: 600, height: PANEL_HEIGHT }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { pass_threshold: PASS_THRESHOLD }
    }
}

impl Default for InkConfig {
    fn default() -> Self {
        Self { stroke_width: STROKE_WIDTH }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { auto_clear_ms: AUTO_CLEAR_DELAY.as_millis() as u64, dark_mode: false }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { path: None, use_system: true }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("handwriting-progress.json") }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Session knobs derived from this config.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            stroke: StrokeStyle { width: self.ink.stroke_width },
            pass_threshold: self.scoring.pass_threshold,
            auto_clear_delay: Duration::from_millis(self.session.auto_clear_ms),
            panel_height: self.panel.height,
        }
    }
}
