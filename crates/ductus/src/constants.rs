/// Entries in the sine/cosine lookup table (quarter-degree resolution).
pub const TRIG_TABLE_SIZE: usize = 1440;

/// Lookup table entries per degree.
pub const TRIG_STEPS_PER_DEGREE: f32 = 4.0;

/// Flow field cell size as a fraction of canvas width.
pub const FIELD_RESOLUTION_FACTOR: f32 = 0.01;

/// Alpha ceiling used by brush opacities (0..255 scale).
pub const OPACITY_CEILING: f32 = 255.0;

/// Pressure exponent for marker-like tips.
pub const MARKER_PRESSURE_EXPONENT: f32 = 1.0;

/// Pressure exponent for ink and graphite tips.
pub const INK_PRESSURE_EXPONENT: f32 = 1.5;

/// Pressure fractions used to build the soft footprint at the end of a blended stroke.
pub const BLEND_CAP_STEPS: u32 = 5;

/// Number of watercolor layers per fill.
pub const FILL_LAYERS: usize = 18;

/// Default watercolor bleed strength.
pub const DEFAULT_BLEED: f32 = 0.07;

/// Maximum watercolor bleed strength.
pub const MAX_BLEED: f32 = 0.6;

/// Mask alpha above which the pigment shader darkens the mix.
pub const DARKEN_THRESHOLD: f32 = 0.8;

/// Amplitude of per-pixel color noise added by the pigment shader.
pub const PIGMENT_NOISE: f32 = 0.012;

/// Tips whose alpha falls below this are skipped (under half an 8-bit step).
pub const MIN_TIP_ALPHA: f32 = 1.0 / 512.0;

/// Upper bound on spray squares per tip, as a multiple of brush quality.
pub const SPRAY_MAX_ITERATION_FACTOR: f32 = 10.0;
