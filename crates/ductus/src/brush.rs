//! Brush definitions, pressure curves and the brush catalog
//!
//! A brush is an immutable parameter record registered by name. The tip
//! kind is resolved once at registration into a closed set of variants,
//! so placing a tip never dispatches on strings.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::constants::{INK_PRESSURE_EXPONENT, MARKER_PRESSURE_EXPONENT};
use crate::error::DrawError;
use crate::random::{Random, map};
use crate::surface::TipPainter;

/// User procedure that draws one tip in local coordinates
pub type TipProcedure = Arc<dyn Fn(&mut dyn TipPainter) + Send + Sync>;

/// User pressure function over normalized path position (0..1)
pub type PressureFn = Arc<dyn Fn(f32) -> f32 + Send + Sync>;

/// Decoded tip image, white-tinted: dark source pixels become opaque
#[derive(Debug, Clone, PartialEq)]
pub struct TipImage {
    pub width: u32,
    pub height: u32,
    /// Coverage per pixel, row-major
    pub alpha: Vec<f32>,
}

impl TipImage {
    /// Convert any decoded image into a coverage map
    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let alpha = rgba
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                let luminance = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
                (1.0 - luminance) * (a as f32 / 255.0)
            })
            .collect();
        Self {
            width,
            height,
            alpha,
        }
    }

    /// Decode an image file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DrawError> {
        let image = image::open(path)?;
        Ok(Self::from_dynamic(&image))
    }

    /// Nearest-neighbour coverage at normalized coordinates (0..1), 0 outside
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
            return 0.0;
        }
        let x = ((u * self.width as f32) as u32).min(self.width.saturating_sub(1));
        let y = ((v * self.height as f32) as u32).min(self.height.saturating_sub(1));
        self.alpha
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Image tip source; decoded by [`BrushCatalog::preload`]
#[derive(Debug, Clone)]
pub struct ImageTip {
    pub path: PathBuf,
    image: Option<Arc<TipImage>>,
}

impl ImageTip {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            image: None,
        }
    }

    /// Tip with an already decoded image
    pub fn from_image(image: TipImage) -> Self {
        Self {
            path: PathBuf::new(),
            image: Some(Arc::new(image)),
        }
    }

    pub fn image(&self) -> Option<&TipImage> {
        self.image.as_deref()
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    /// Decode the image if it is not loaded yet
    pub fn load(&mut self) -> Result<(), DrawError> {
        if self.image.is_none() {
            self.image = Some(Arc::new(TipImage::open(&self.path)?));
        }
        Ok(())
    }
}

/// What a single tip placement draws
#[derive(Clone, Default)]
pub enum TipKind {
    /// Pencil-like jittered circle
    #[default]
    Default,
    /// Scatter of tiny squares inside a jittered disk
    Spray,
    /// One soft circle
    Marker,
    Custom(TipProcedure),
    Image(ImageTip),
}

impl fmt::Debug for TipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TipKind::Default => write!(f, "Default"),
            TipKind::Spray => write!(f, "Spray"),
            TipKind::Marker => write!(f, "Marker"),
            TipKind::Custom(_) => write!(f, "Custom(..)"),
            TipKind::Image(tip) => f.debug_tuple("Image").field(&tip.path).finish(),
        }
    }
}

impl TipKind {
    /// Exponent applied to pressure when deriving tip alpha
    pub fn pressure_exponent(&self) -> f32 {
        match self {
            TipKind::Marker | TipKind::Custom(_) | TipKind::Image(_) => MARKER_PRESSURE_EXPONENT,
            TipKind::Default | TipKind::Spray => INK_PRESSURE_EXPONENT,
        }
    }

    /// Marker-like tips composite through the pigment mixer unless told otherwise
    pub fn blends_by_default(&self) -> bool {
        matches!(self, TipKind::Marker | TipKind::Custom(_) | TipKind::Image(_))
    }
}

/// How a custom or image tip is oriented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationMode {
    #[default]
    None,
    Random,
    /// Aligned with the stroke heading
    Natural,
}

/// Pressure along a stroke
#[derive(Clone)]
pub enum PressureCurve {
    /// Bell curve; `curve` shapes center and width, `min_max` gives the
    /// pressure at the stroke ends and at the peak
    Gauss { curve: [f32; 2], min_max: [f32; 2] },
    /// User function of normalized position, remapped into `min_max`
    Custom { func: PressureFn, min_max: [f32; 2] },
}

impl Default for PressureCurve {
    fn default() -> Self {
        PressureCurve::Gauss {
            curve: [0.35, 0.25],
            min_max: [1.2, 0.9],
        }
    }
}

impl fmt::Debug for PressureCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PressureCurve::Gauss { curve, min_max } => f
                .debug_struct("Gauss")
                .field("curve", curve)
                .field("min_max", min_max)
                .finish(),
            PressureCurve::Custom { min_max, .. } => f
                .debug_struct("Custom")
                .field("min_max", min_max)
                .finish_non_exhaustive(),
        }
    }
}

/// Generalized bell: `min` far from the center, `max` at `length * a`
pub fn bell(x: f32, length: f32, a: f32, b: f32, c: f32, min: f32, max: f32) -> f32 {
    let width = b * length * 0.5;
    if width.abs() <= f32::EPSILON {
        return max;
    }
    let u = 1.0 / (1.0 + ((x - length * a) / width).abs().powf(2.0 * c));
    map(u, 0.0, 1.0, min, max, false)
}

/// Pressure curve parameters drawn once per stroke
#[derive(Clone)]
pub struct PressureProfile {
    a: f32,
    b: f32,
    c: f32,
    min: f32,
    max: f32,
    func: Option<PressureFn>,
}

impl fmt::Debug for PressureProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PressureProfile")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("c", &self.c)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("custom", &self.func.is_some())
            .finish()
    }
}

impl PressureProfile {
    /// Draw the taper for one stroke
    pub fn sample(curve: &PressureCurve, rng: &mut Random) -> Self {
        match curve {
            PressureCurve::Gauss { curve, min_max } => Self {
                a: 0.5 + curve[0] * rng.range(-1.0, 1.0),
                b: 1.0 - curve[1] * rng.range(1.0, 1.5),
                c: rng.range(3.0, 3.5),
                min: min_max[0],
                max: min_max[1],
                func: None,
            },
            PressureCurve::Custom { func, min_max } => Self {
                a: 0.5,
                b: 1.0,
                c: 3.0,
                min: min_max[0],
                max: min_max[1],
                func: Some(func.clone()),
            },
        }
    }

    /// Pressure after travelling `plotted` along a path of `length`
    pub fn pressure(&self, plotted: f32, length: f32) -> f32 {
        match &self.func {
            Some(func) => {
                let t = if length > 0.0 { plotted / length } else { 0.0 };
                map(func(t), 0.0, 1.0, self.min, self.max, true)
            }
            None => bell(plotted, length, self.a, self.b, self.c, self.min, self.max),
        }
    }

    #[inline]
    pub fn is_custom(&self) -> bool {
        self.func.is_some()
    }
}

/// Immutable brush parameter record
#[derive(Debug, Clone)]
pub struct BrushDefinition {
    pub kind: TipKind,
    /// Base tip size multiplier
    pub weight: f32,
    /// Jitter magnitude
    pub vibration: f32,
    /// Texture irregularity, 0 grainy to 1 clean
    pub definition: f32,
    /// Iterations per tip for spray and default tips
    pub quality: f32,
    /// Alpha ceiling on a 0-255 scale
    pub opacity: f32,
    /// Distance between tips as a fraction of the stroke weight
    pub spacing: f32,
    pub pressure: PressureCurve,
    /// Composite through the pigment mixer
    pub blend: bool,
    pub rotation: RotationMode,
}

impl Default for BrushDefinition {
    fn default() -> Self {
        Self {
            kind: TipKind::Default,
            weight: 1.0,
            vibration: 0.0,
            definition: 0.5,
            quality: 8.0,
            opacity: 150.0,
            spacing: 0.3,
            pressure: PressureCurve::default(),
            blend: false,
            rotation: RotationMode::None,
        }
    }
}

impl BrushDefinition {
    /// Definition for a tip kind with its default blend behaviour
    pub fn new(kind: TipKind) -> Self {
        Self {
            blend: kind.blends_by_default(),
            kind,
            ..Default::default()
        }
    }

    #[inline]
    pub fn pressure_exponent(&self) -> f32 {
        self.kind.pressure_exponent()
    }
}

#[allow(clippy::too_many_arguments)]
fn pencil(
    weight: f32,
    vibration: f32,
    definition: f32,
    quality: f32,
    opacity: f32,
    spacing: f32,
    curve: [f32; 2],
    min_max: [f32; 2],
) -> BrushDefinition {
    BrushDefinition {
        kind: TipKind::Default,
        weight,
        vibration,
        definition,
        quality,
        opacity,
        spacing,
        pressure: PressureCurve::Gauss { curve, min_max },
        blend: false,
        rotation: RotationMode::None,
    }
}

fn square_tip(painter: &mut dyn TipPainter) {
    use glam::Vec2;
    painter.rect(Vec2::splat(-1.5), Vec2::splat(3.0));
    painter.rect(Vec2::splat(1.0), Vec2::splat(1.0));
}

/// Brushes registered on every catalog, in listing order
pub fn built_in_brushes() -> Vec<(&'static str, BrushDefinition)> {
    vec![
        ("pen", pencil(0.35, 0.12, 0.5, 8.0, 200.0, 0.3, [0.15, 0.2], [1.4, 0.9])),
        ("rotring", pencil(0.2, 0.05, 0.5, 300.0, 250.0, 0.15, [0.05, 0.2], [1.7, 0.8])),
        ("2B", pencil(0.35, 0.6, 0.1, 8.0, 180.0, 0.1, [0.15, 0.2], [1.2, 0.9])),
        ("HB", pencil(0.3, 0.5, 0.4, 4.0, 180.0, 0.5, [0.15, 0.2], [1.2, 0.9])),
        ("2H", pencil(0.2, 0.4, 0.3, 2.0, 150.0, 0.2, [0.15, 0.2], [1.2, 0.9])),
        ("cpencil", pencil(0.4, 0.6, 0.8, 7.0, 120.0, 0.15, [0.15, 0.2], [0.95, 1.2])),
        ("charcoal", pencil(0.35, 1.5, 0.5, 300.0, 110.0, 0.07, [0.15, 0.2], [1.3, 0.8])),
        ("hatch_brush", pencil(0.2, 0.4, 0.3, 2.0, 150.0, 0.15, [0.5, 0.7], [1.2, 0.9])),
        (
            "spray",
            BrushDefinition {
                kind: TipKind::Spray,
                weight: 0.3,
                vibration: 12.0,
                definition: 15.0,
                quality: 40.0,
                opacity: 120.0,
                spacing: 0.65,
                pressure: PressureCurve::Gauss {
                    curve: [0.0, 0.1],
                    min_max: [0.15, 1.2],
                },
                blend: false,
                rotation: RotationMode::None,
            },
        ),
        (
            "marker",
            BrushDefinition {
                weight: 2.5,
                vibration: 0.08,
                opacity: 30.0,
                spacing: 0.4,
                pressure: PressureCurve::Gauss {
                    curve: [0.35, 0.25],
                    min_max: [1.5, 1.0],
                },
                ..BrushDefinition::new(TipKind::Marker)
            },
        ),
        (
            "marker2",
            BrushDefinition {
                weight: 2.5,
                vibration: 0.08,
                opacity: 23.0,
                spacing: 0.6,
                pressure: PressureCurve::Gauss {
                    curve: [0.35, 0.25],
                    min_max: [1.5, 1.0],
                },
                rotation: RotationMode::Natural,
                ..BrushDefinition::new(TipKind::Custom(Arc::new(square_tip)))
            },
        ),
    ]
}

struct BrushEntry {
    name: String,
    definition: BrushDefinition,
    built_in: bool,
}

/// Named brushes in registration order
pub struct BrushCatalog {
    entries: Vec<BrushEntry>,
}

impl fmt::Debug for BrushCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrushCatalog")
            .field("brushes", &self.names())
            .finish()
    }
}

impl Default for BrushCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl BrushCatalog {
    /// Catalog holding the built-in brushes
    pub fn new() -> Self {
        let entries = built_in_brushes()
            .into_iter()
            .map(|(name, definition)| BrushEntry {
                name: name.to_string(),
                definition,
                built_in: true,
            })
            .collect();
        Self { entries }
    }

    /// Register or replace a brush
    pub fn add(&mut self, name: impl Into<String>, definition: BrushDefinition) {
        let name = name.into();
        debug!("BrushCatalog::add: '{}' ({:?})", name, definition.kind);
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.definition = definition;
                entry.built_in = false;
            }
            None => self.entries.push(BrushEntry {
                name,
                definition,
                built_in: false,
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&BrushDefinition> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.definition)
    }

    /// Look up a brush, failing on unknown names
    pub fn require(&self, name: &str) -> Result<&BrushDefinition, DrawError> {
        self.get(name)
            .ok_or_else(|| DrawError::UnknownBrush(name.to_string()))
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Rescale weight, vibration and spacing of the built-in brushes
    pub fn scale(&mut self, factor: f32) {
        for entry in self.entries.iter_mut().filter(|e| e.built_in) {
            entry.definition.weight *= factor;
            entry.definition.vibration *= factor;
            entry.definition.spacing *= factor;
        }
        debug!("BrushCatalog::scale: built-ins scaled by {:.3}", factor);
    }

    /// Decode every image tip that is not loaded yet.
    ///
    /// Tips that fail to load stay unloaded and are skipped when drawn.
    /// Returns the number of tips loaded by this call.
    pub fn preload(&mut self) -> usize {
        let mut loaded = 0;
        for entry in &mut self.entries {
            let TipKind::Image(tip) = &mut entry.definition.kind else {
                continue;
            };
            if tip.is_loaded() {
                continue;
            }
            match tip.load() {
                Ok(()) => loaded += 1,
                Err(e) => warn!(
                    "BrushCatalog::preload: '{}' from {}: {}",
                    entry.name,
                    tip.path.display(),
                    e
                ),
            }
        }
        info!("BrushCatalog::preload: {} image tips loaded", loaded);
        loaded
    }
}
