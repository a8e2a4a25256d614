//! The renderer: brush selection, strokes, shapes, hatching and fills
//!
//! [`Renderer`] owns everything a drawing session needs:
//! - the host [`Canvas`] and the [`PigmentMixer`] mask next to it
//! - the [`BrushCatalog`] and the [`FlowField`] set
//! - a single seedable [`Random`] source
//! - a [`DrawContext`] holding the current selections and transform
//! - the [`RecordingState`] for begin/vertex/end and begin/move/end calls
//!
//! Every call runs to completion before returning.

mod fill;
mod hatch;
mod shapes;
mod stroke;
mod tips;

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ductus_config::CanvasConfig;

use crate::brush::{BrushCatalog, BrushDefinition};
use crate::error::DrawError;
use crate::field::{FieldGenerator, FlowField};
use crate::fill::FillSettings;
use crate::hatch::HatchOptions;
use crate::mixer::PigmentMixer;
use crate::plot::{Plot, SplinePoint};
use crate::random::Random;
use crate::surface::Canvas;
use crate::types::{Color, Rect};

/// Brush used by strokes until another one is picked
pub const DEFAULT_BRUSH: &str = "HB";

/// Brush used by hatching until another one is set
pub const DEFAULT_HATCH_BRUSH: &str = "hatch_brush";

/// Brush, color and weight used for a family of marks
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeSelection {
    pub brush: String,
    pub color: Color,
    pub weight: f32,
}

impl StrokeSelection {
    pub fn new(brush: impl Into<String>, color: Color, weight: f32) -> Self {
        Self {
            brush: brush.into(),
            color,
            weight,
        }
    }
}

/// Hatching applied to shapes
#[derive(Debug, Clone, PartialEq)]
pub struct HatchSelection {
    pub spacing: f32,
    /// Degrees
    pub angle: f32,
    pub options: HatchOptions,
    pub brush: StrokeSelection,
}

/// Current selections consumed by drawing calls
#[derive(Debug, Clone, PartialEq)]
pub struct DrawContext {
    /// None after `no_stroke`
    pub stroke: Option<StrokeSelection>,
    pub fill: Option<FillSettings>,
    pub hatch: Option<HatchSelection>,
    /// Brush for hatch lines, kept across `no_hatch`
    pub hatch_brush: StrokeSelection,
    /// Tips outside this canvas-space rectangle are skipped
    pub clip: Option<Rect>,
    pub transform: Affine2,
}

impl Default for DrawContext {
    fn default() -> Self {
        Self {
            stroke: Some(StrokeSelection::new(DEFAULT_BRUSH, Color::BLACK, 1.0)),
            fill: None,
            hatch: None,
            hatch_brush: StrokeSelection::new(DEFAULT_HATCH_BRUSH, Color::BLACK, 1.0),
            clip: None,
            transform: Affine2::IDENTITY,
        }
    }
}

/// Runtime overrides
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RenderOptions {
    /// Restart randomness from this seed
    pub seed: Option<u64>,
}

/// Open recording between a begin call and its matching end
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    Shape {
        curvature: f32,
        points: Vec<SplinePoint>,
    },
    Stroke {
        start: Vec2,
        plot: Plot,
    },
}

impl RecordingState {
    pub fn name(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Shape { .. } => "recording a shape",
            RecordingState::Stroke { .. } => "recording a stroke",
        }
    }
}

/// Tip counts for one drawing call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrokeSummary {
    /// Tip positions visited
    pub tips: usize,
    /// Tips that produced a mark
    pub drawn: usize,
}

impl std::ops::AddAssign for StrokeSummary {
    fn add_assign(&mut self, other: Self) {
        self.tips += other.tips;
        self.drawn += other.drawn;
    }
}

/// Procedural brush renderer bound to one canvas
pub struct Renderer<C: Canvas> {
    /// Host canvas receiving the final pixels
    pub canvas: C,
    pub(crate) mixer: PigmentMixer<C::Buffer>,
    pub(crate) catalog: BrushCatalog,
    pub(crate) field: FlowField,
    pub(crate) rng: Random,
    pub(crate) ctx: DrawContext,
    pub(crate) state: RecordingState,
    pub(crate) config: CanvasConfig,
}

impl<C: Canvas> Renderer<C> {
    /// Bind a renderer to a canvas. Allocates the pigment mask and the flow field grid.
    pub fn new(canvas: C, config: CanvasConfig) -> Result<Self, DrawError> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => Random::seeded(seed),
            None => Random::from_entropy(),
        };
        let field = FlowField::new(config.width_f32(), config.height_f32(), &mut rng);
        let mixer = PigmentMixer::load(&canvas);
        info!(
            "Renderer::new: {}x{} canvas, density {}, seed {:?}",
            config.width, config.height, config.density, config.seed
        );
        Ok(Self {
            canvas,
            mixer,
            catalog: BrushCatalog::new(),
            field,
            rng,
            ctx: DrawContext::default(),
            state: RecordingState::Idle,
            config,
        })
    }

    /// Apply runtime overrides
    pub fn configure(&mut self, options: RenderOptions) {
        if let Some(seed) = options.seed {
            self.rng.reseed(seed);
            debug!("Renderer::configure: reseeded with {}", seed);
        }
    }

    /// Decode image tips registered so far
    pub fn preload(&mut self) -> usize {
        self.catalog.preload()
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn context(&self) -> &DrawContext {
        &self.ctx
    }

    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    pub fn catalog(&self) -> &BrushCatalog {
        &self.catalog
    }

    pub fn flow_field(&self) -> &FlowField {
        &self.field
    }

    pub fn mixer(&self) -> &PigmentMixer<C::Buffer> {
        &self.mixer
    }

    /// Consume the renderer, returning the canvas
    pub fn into_canvas(self) -> C {
        self.canvas
    }

    /// Caller angle in degrees
    #[inline]
    pub(crate) fn degrees(&self, angle: f32) -> f32 {
        self.config.angle_mode.to_degrees(angle)
    }

    // Brush catalog and selection

    pub fn add_brush(&mut self, name: impl Into<String>, definition: BrushDefinition) {
        self.catalog.add(name, definition);
    }

    /// Switch brush, keeping color and weight
    pub fn pick(&mut self, name: &str) -> Result<(), DrawError> {
        self.catalog.require(name)?;
        let selection = self.ctx.stroke.get_or_insert_with(|| {
            StrokeSelection::new(DEFAULT_BRUSH, Color::BLACK, 1.0)
        });
        selection.brush = name.to_string();
        Ok(())
    }

    /// Select brush, color and weight at once
    pub fn set(&mut self, name: &str, color: Color, weight: f32) -> Result<(), DrawError> {
        self.catalog.require(name)?;
        self.ctx.stroke = Some(StrokeSelection::new(name, color, weight));
        Ok(())
    }

    /// Set the stroke color, re-enabling strokes after `no_stroke`
    pub fn stroke(&mut self, color: Color) {
        match &mut self.ctx.stroke {
            Some(selection) => selection.color = color,
            None => self.ctx.stroke = Some(StrokeSelection::new(DEFAULT_BRUSH, color, 1.0)),
        }
    }

    pub fn stroke_weight(&mut self, weight: f32) {
        if let Some(selection) = &mut self.ctx.stroke {
            selection.weight = weight;
        }
    }

    pub fn no_stroke(&mut self) {
        self.ctx.stroke = None;
    }

    /// Restrict tips to a canvas-space rectangle
    pub fn clip(&mut self, rect: Rect) {
        self.ctx.clip = Some(rect);
    }

    pub fn no_clip(&mut self) {
        self.ctx.clip = None;
    }

    /// Registered brush names in registration order
    pub fn brush_names(&self) -> Vec<&str> {
        self.catalog.names()
    }

    /// Rescale the built-in brushes
    pub fn scale(&mut self, factor: f32) {
        self.catalog.scale(factor);
    }

    // Transform

    pub fn translate(&mut self, x: f32, y: f32) {
        self.ctx.transform = self.ctx.transform * Affine2::from_translation(Vec2::new(x, y));
    }

    pub fn rotate(&mut self, angle: f32) {
        let radians = self.degrees(angle).to_radians();
        self.ctx.transform = self.ctx.transform * Affine2::from_angle(radians);
    }

    pub fn reset_transform(&mut self) {
        self.ctx.transform = Affine2::IDENTITY;
    }

    // Flow fields

    /// Register a field and make it active
    pub fn add_field(&mut self, name: impl Into<String>, generator: impl FieldGenerator + 'static) {
        self.field.add(name, generator);
    }

    /// Activate a registered field
    pub fn field(&mut self, name: &str) -> Result<(), DrawError> {
        self.field.select(name)
    }

    pub fn no_field(&mut self) {
        self.field.disable();
    }

    /// Regenerate the active field at time `t`
    pub fn refresh_field(&mut self, t: f32) {
        self.field.refresh(t);
    }

    pub fn list_fields(&self) -> Vec<&str> {
        self.field.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldGrid;
    use crate::testing::RecordingCanvas;
    use ductus_config::AngleMode;

    fn renderer() -> Renderer<RecordingCanvas> {
        Renderer::new(
            RecordingCanvas::new(200.0, 200.0),
            CanvasConfig::new(200, 200).with_seed(7),
        )
        .unwrap()
    }

    #[test]
    fn test_renderer_creation() {
        let r = renderer();
        assert_eq!(r.config().width, 200);
        assert_eq!(r.state(), &RecordingState::Idle);
        assert_eq!(r.context().stroke.as_ref().unwrap().brush, DEFAULT_BRUSH);
        assert_eq!(r.list_fields(), FlowField::BUILT_IN.to_vec());
        assert_eq!(r.brush_names().len(), 11);
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let result = Renderer::new(RecordingCanvas::new(0.0, 0.0), CanvasConfig::new(0, 10));
        assert!(matches!(result, Err(DrawError::Config(_))));
    }

    #[test]
    fn test_selection() {
        let mut r = renderer();
        r.set("pen", Color::WHITE, 2.0).unwrap();
        assert!(matches!(r.set("nope", Color::BLACK, 1.0), Err(DrawError::UnknownBrush(_))));
        r.pick("charcoal").unwrap();
        r.stroke_weight(3.0);
        let s = r.context().stroke.clone().unwrap();
        assert_eq!(s, StrokeSelection::new("charcoal", Color::WHITE, 3.0));

        r.no_stroke();
        assert!(r.context().stroke.is_none());
        r.stroke(Color::rgb8(10, 20, 30));
        assert_eq!(r.context().stroke.as_ref().unwrap().brush, DEFAULT_BRUSH);
    }

    #[test]
    fn test_field_selection() {
        let mut r = renderer();
        r.field("waves").unwrap();
        assert_eq!(r.flow_field().active(), Some("waves"));
        assert!(matches!(r.field("nope"), Err(DrawError::UnknownField(_))));
        r.add_field("flat", |_t: f32, g: &mut FieldGrid| g.fill_with(|_, _| 0.0));
        assert_eq!(r.flow_field().active(), Some("flat"));
        r.refresh_field(1.0);
        r.no_field();
        assert!(!r.flow_field().is_active());
    }

    #[test]
    fn test_transform_and_angle_mode() {
        let mut r = Renderer::new(
            RecordingCanvas::new(100.0, 100.0),
            CanvasConfig::new(100, 100).with_seed(1).with_angle_mode(AngleMode::Radians),
        )
        .unwrap();
        r.translate(10.0, 0.0);
        r.rotate(std::f32::consts::FRAC_PI_2);
        let p = r.context().transform.transform_point2(Vec2::new(1.0, 0.0));
        assert!((p - Vec2::new(10.0, 1.0)).length() < 1e-5);
        r.reset_transform();
        assert_eq!(r.context().transform, Affine2::IDENTITY);
    }

    #[test]
    fn test_configure_reseeds() {
        let mut a = renderer();
        let mut b = renderer();
        a.rng.random();
        a.configure(RenderOptions { seed: Some(3) });
        b.configure(RenderOptions { seed: Some(3) });
        assert_eq!(a.rng.random(), b.rng.random());
    }
}
