//! Error types for renderer operations.

use crate::validation::ValidationError;

/// Errors returned by fallible renderer calls.
///
/// Drawing itself degrades silently (logged); these cover catalog lookups,
/// out-of-order begin/vertex/end calls, and resource loading.
#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("Unknown brush: {0}")]
    UnknownBrush(String),

    #[error("Unknown flow field: {0}")]
    UnknownField(String),

    #[error("Invalid sequence: {operation} while {state}")]
    InvalidSequence {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ductus_config::ConfigError),

    #[error("Failed to load tip image: {0}")]
    Image(#[from] image::ImageError),
}
