//! Sketch configuration read from the environment

use std::path::PathBuf;
use std::str::FromStr;

use ductus_config::CanvasConfig;
use tracing::warn;

/// Output file used when DUCTUS_OUTPUT is unset
pub const DEFAULT_OUTPUT: &str = "sketch.png";

/// Sketch configuration
#[derive(Debug, Clone)]
pub struct SketchConfig {
    pub canvas: CanvasConfig,
    pub output: PathBuf,
}

impl SketchConfig {
    /// Read DUCTUS_SEED, DUCTUS_OUTPUT, DUCTUS_WIDTH and DUCTUS_HEIGHT
    pub fn from_env() -> Self {
        let mut canvas = CanvasConfig::default();
        if let Some(width) = parse_var("DUCTUS_WIDTH") {
            canvas.width = width;
        }
        if let Some(height) = parse_var("DUCTUS_HEIGHT") {
            canvas.height = height;
        }
        canvas.seed = parse_var("DUCTUS_SEED");
        let output = std::env::var("DUCTUS_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT));
        Self { canvas, output }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number", name, value);
            None
        }
    }
}
