//! Shared configuration for ductus
//!
//! This crate provides the single source of truth for canvas dimensions,
//! pixel density, angle units and the random seed used by renderers and
//! the sketch tool.

use serde::{Deserialize, Serialize};

/// Default canvas width in pixels
pub const DEFAULT_WIDTH: u32 = 1000;

/// Default canvas height in pixels
pub const DEFAULT_HEIGHT: u32 = 1000;

/// Default pixel density (1.0 = one surface pixel per canvas unit)
pub const DEFAULT_DENSITY: f32 = 1.0;

/// Errors raised while reading a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid canvas size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Unit used for caller-supplied angles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleMode {
    #[default]
    Degrees,
    Radians,
}

impl AngleMode {
    /// Convert a caller angle into degrees
    #[inline]
    pub fn to_degrees(self, angle: f32) -> f32 {
        match self {
            AngleMode::Degrees => angle,
            AngleMode::Radians => angle.to_degrees(),
        }
    }

    /// Convert an internal angle in degrees back to the caller's unit
    #[inline]
    pub fn from_degrees(self, degrees: f32) -> f32 {
        match self {
            AngleMode::Degrees => degrees,
            AngleMode::Radians => degrees.to_radians(),
        }
    }
}

/// Canvas configuration for a renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Canvas width in canvas units
    pub width: u32,
    /// Canvas height in canvas units
    pub height: u32,
    /// Pixel density; brush weights scale with it
    pub density: f32,
    /// Fixed random seed, or None to seed from entropy
    pub seed: Option<u64>,
    /// Unit of caller-supplied angles
    pub angle_mode: AngleMode,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            density: DEFAULT_DENSITY,
            seed: None,
            angle_mode: AngleMode::Degrees,
        }
    }
}

impl CanvasConfig {
    /// Create a new canvas config with the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Parse a config from JSON, filling missing fields with defaults
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: CanvasConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Use a fixed random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Use a different unit for caller angles
    pub fn with_angle_mode(mut self, mode: AngleMode) -> Self {
        self.angle_mode = mode;
        self
    }

    /// Reject zero-sized canvases
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Get width as f32 for calculations
    pub fn width_f32(&self) -> f32 {
        self.width as f32
    }

    /// Get height as f32 for calculations
    pub fn height_f32(&self) -> f32 {
        self.height as f32
    }

    /// Get surface width in physical pixels
    pub fn pixel_width(&self) -> u32 {
        (self.width as f32 * self.density) as u32
    }

    /// Get surface height in physical pixels
    pub fn pixel_height(&self) -> u32 {
        (self.height as f32 * self.density) as u32
    }
}
