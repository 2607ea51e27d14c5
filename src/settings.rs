use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::audio::BackgroundSound;
use crate::pattern::{PatternDef, PatternTable, DEFAULT_PATTERN};
use crate::render::{Canvas, DEFAULT_RING_RADIUS};
use crate::timer::{DEFAULT_FRAME_RATE, DEFAULT_VOLUME};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioSettings {
    pub sound: BackgroundSound,
    pub volume: f32,
    /// Start the background sound as soon as the pacer opens.
    pub autoplay: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sound: BackgroundSound::default(),
            volume: DEFAULT_VOLUME,
            autoplay: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PacerSettings {
    pub pattern: String,
    pub frame_rate: u32,
    pub ring_radius: f64,
    pub canvas: Canvas,
    pub audio: AudioSettings,
    /// Extra patterns; an id that matches a built-in replaces it.
    pub patterns: Vec<PatternDef>,
}

impl Default for PacerSettings {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.into(),
            frame_rate: DEFAULT_FRAME_RATE,
            ring_radius: DEFAULT_RING_RADIUS,
            canvas: Canvas::default(),
            audio: AudioSettings::default(),
            patterns: Vec::new(),
        }
    }
}

impl PacerSettings {
    /// Reads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            bail!("frameRate must be at least 1");
        }
        if !self.ring_radius.is_finite() || self.ring_radius <= 0.0 {
            bail!("ringRadius must be a positive number, got {}", self.ring_radius);
        }
        let Canvas { width, height } = self.canvas;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            bail!("canvas must have a positive size, got {width}x{height}");
        }
        if !self.audio.volume.is_finite() {
            bail!("audio volume must be a number");
        }
        Ok(())
    }

    /// Built-in patterns plus the ones defined here.
    pub fn pattern_table(&self) -> Result<PatternTable> {
        PatternTable::builtin().with_custom(self.patterns.iter().cloned())
    }
}
