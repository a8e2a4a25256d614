//! Strokes: tip placement along straight, flow-guided and plotted paths

use glam::{Affine2, Vec2};
use tracing::{debug, warn};

use crate::brush::{BrushDefinition, PressureProfile, TipKind};
use crate::constants::BLEND_CAP_STEPS;
use crate::error::DrawError;
use crate::field::FlowField;
use crate::plot::{Plot, PlotKind};
use crate::position::Position;
use crate::random::{Random, bearing};
use crate::surface::{Canvas, Surface, transform_scale};
use crate::types::{Color, Rect};
use crate::validation::validate_spacing;

use super::tips::{Tip, render_tip, sample_pressure, tip_alpha};
use super::{RecordingState, Renderer, StrokeSelection, StrokeSummary};

/// How a stroke moves between tips
#[derive(Debug, Clone, Copy)]
pub(crate) enum StrokePath<'a> {
    /// Fixed heading, optionally bent by the active field
    Straight { direction: f32, flow: bool },
    /// Follow a plot stretched by `scale`
    Plotted { plot: &'a Plot, scale: f32 },
}

/// Per-stroke constants shared by every tip
struct StrokeRun<'a> {
    def: &'a BrushDefinition,
    field: &'a FlowField,
    clip: Option<Rect>,
    transform: Affine2,
    /// Color the tips are drawn with before alpha
    color: Color,
    /// Selection weight times transform scale
    weight: f32,
    /// Transform rotation, degrees
    turn: f32,
    spacing: f32,
    steps: usize,
    /// Path length in the units `Position::plotted` advances in
    length: f32,
}

impl StrokeRun<'_> {
    /// Walk the path placing tips on `target`. Returns counts and the last placed tip.
    fn trace<S: Surface + ?Sized>(
        &self,
        target: &mut S,
        start: Vec2,
        path: StrokePath<'_>,
        rng: &mut Random,
    ) -> (StrokeSummary, Option<Tip>) {
        let profile = PressureProfile::sample(&self.def.pressure, rng);
        let mut position = Position::new(start, self.transform);
        let mut summary = StrokeSummary::default();
        let mut last = None;

        for _ in 0..self.steps {
            let plotted = position.plotted;
            let (pressure, heading) = match path {
                StrokePath::Straight { direction, flow } => {
                    let heading = if flow {
                        position.angle(self.field) + direction
                    } else {
                        direction
                    };
                    (sample_pressure(&profile, plotted, self.length, None), heading)
                }
                StrokePath::Plotted { plot, .. } => (
                    sample_pressure(&profile, plotted, self.length, Some(plot.pressure(plotted))),
                    position.angle(self.field) + plot.angle(plotted),
                ),
            };

            let center = position.canvas_point();
            summary.tips += 1;
            if self.clip.is_none_or(|clip| clip.contains(center)) {
                let tip = Tip {
                    center,
                    pressure,
                    heading: heading + self.turn,
                    weight: self.weight,
                    color: self.color.with_alpha(tip_alpha(self.def, pressure)),
                    plotted,
                    length: self.length,
                };
                if render_tip(target, self.def, &tip, true, rng) {
                    summary.drawn += 1;
                }
                last = Some(tip);
            }

            match path {
                StrokePath::Straight { direction, flow } => {
                    position.move_to(self.field, self.spacing, direction, self.spacing, flow)
                }
                StrokePath::Plotted { plot, scale } => {
                    position.plot_to(self.field, plot, self.spacing, self.spacing, scale)
                }
            }
        }
        (summary, last)
    }

    /// Soft footprint at the end of a blended stroke: unjittered tips at rising pressure
    fn cap<S: Surface + ?Sized>(&self, target: &mut S, last: &Tip, rng: &mut Random) {
        for step in 1..=BLEND_CAP_STEPS {
            let pressure = last.pressure * step as f32 / BLEND_CAP_STEPS as f32;
            let tip = Tip {
                pressure,
                color: self.color.with_alpha(tip_alpha(self.def, pressure)),
                ..*last
            };
            render_tip(target, self.def, &tip, false, rng);
        }
    }
}

/// Heading of a transform's x axis, degrees
fn transform_turn(transform: &Affine2) -> f32 {
    let axis = transform.matrix2.x_axis;
    axis.y.atan2(axis.x).to_degrees()
}

impl<C: Canvas> Renderer<C> {
    /// Straight stroke between two points with the current selection
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> StrokeSummary {
        let Some(selection) = self.ctx.stroke.clone() else {
            return StrokeSummary::default();
        };
        let (from, to) = (Vec2::new(x1, y1), Vec2::new(x2, y2));
        let path = StrokePath::Straight {
            direction: bearing(from, to),
            flow: false,
        };
        self.draw_stroke(&selection, from, from.distance(to), path)
    }

    /// Stroke of `length` starting at (x, y), heading `direction` relative to the active field
    pub fn flow_line(&mut self, x: f32, y: f32, length: f32, direction: f32) -> StrokeSummary {
        let Some(selection) = self.ctx.stroke.clone() else {
            return StrokeSummary::default();
        };
        let path = StrokePath::Straight {
            direction: self.degrees(direction),
            flow: true,
        };
        self.draw_stroke(&selection, Vec2::new(x, y), length, path)
    }

    /// Stroke following `plot` from (x, y), stretched by `scale`
    pub fn flow_shape(&mut self, plot: &Plot, x: f32, y: f32, scale: f32) -> StrokeSummary {
        let Some(selection) = self.ctx.stroke.clone() else {
            return StrokeSummary::default();
        };
        self.draw_plot(&selection, plot, Vec2::new(x, y), scale)
    }

    pub(crate) fn draw_plot(
        &mut self,
        selection: &StrokeSelection,
        plot: &Plot,
        start: Vec2,
        scale: f32,
    ) -> StrokeSummary {
        if scale <= 0.0 || plot.segment_count() == 0 {
            return StrokeSummary::default();
        }
        let length = plot.total_length() * scale;
        self.draw_stroke(selection, start, length, StrokePath::Plotted { plot, scale })
    }

    /// Place tips along one path. `length` is in user units.
    pub(crate) fn draw_stroke(
        &mut self,
        selection: &StrokeSelection,
        start: Vec2,
        length: f32,
        path: StrokePath<'_>,
    ) -> StrokeSummary {
        let Self {
            canvas,
            mixer,
            catalog,
            field,
            rng,
            ctx,
            ..
        } = self;
        let Some(def) = catalog.get(&selection.brush) else {
            warn!("draw_stroke: unknown brush '{}', skipping", selection.brush);
            return StrokeSummary::default();
        };
        let spacing = def.spacing * selection.weight;
        if let Err(e) = validate_spacing(spacing) {
            warn!("draw_stroke: {}, skipping", e);
            return StrokeSummary::default();
        }
        if !length.is_finite() || length <= 0.0 {
            return StrokeSummary::default();
        }

        let profile_length = match path {
            StrokePath::Straight { .. } => length,
            StrokePath::Plotted { plot, .. } => plot.total_length(),
        };
        let run = StrokeRun {
            def,
            field: &*field,
            clip: ctx.clip,
            transform: ctx.transform,
            color: if def.blend { Color::MASK_RED } else { selection.color },
            weight: selection.weight * transform_scale(&ctx.transform),
            turn: transform_turn(&ctx.transform),
            spacing,
            steps: (length / spacing).round() as usize,
            length: profile_length,
        };

        let summary = if def.blend {
            let mask = mixer.mask_mut();
            let (summary, last) = run.trace(mask, start, path, rng);
            let capped = matches!(
                def.kind,
                TipKind::Marker | TipKind::Custom(_) | TipKind::Image(_)
            );
            if let (true, Some(last)) = (capped, last) {
                run.cap(mask, &last, rng);
            }
            mixer.blend(canvas, selection.color);
            summary
        } else {
            run.trace(canvas, start, path, rng).0
        };

        if summary.tips > 0 && summary.drawn == 0 {
            if let TipKind::Image(tip) = &def.kind {
                if !tip.is_loaded() {
                    warn!(
                        "draw_stroke: image tip '{}' for brush '{}' not loaded yet",
                        tip.path.display(),
                        selection.brush
                    );
                }
            }
        }
        debug!(
            "draw_stroke: brush '{}', length {:.1}, {} tips, {} drawn",
            selection.brush, length, summary.tips, summary.drawn
        );
        summary
    }

    // Freehand strokes

    /// Open a freehand stroke at (x, y)
    pub fn begin_stroke(&mut self, kind: PlotKind, x: f32, y: f32) -> Result<(), DrawError> {
        self.require_idle("begin_stroke")?;
        self.state = RecordingState::Stroke {
            start: Vec2::new(x, y),
            plot: Plot::new(kind),
        };
        Ok(())
    }

    /// Append a segment to the open stroke
    pub fn move_stroke(&mut self, angle: f32, length: f32, pressure: f32) -> Result<(), DrawError> {
        let angle = self.degrees(angle);
        match &mut self.state {
            RecordingState::Stroke { plot, .. } => {
                plot.add_segment(angle, length, pressure);
                Ok(())
            }
            other => Err(DrawError::InvalidSequence {
                operation: "move_stroke",
                state: other.name(),
            }),
        }
    }

    /// Close the open stroke and draw it as a shape
    pub fn end_stroke(&mut self, angle: f32, pressure: f32) -> Result<StrokeSummary, DrawError> {
        let angle = self.degrees(angle);
        match std::mem::take(&mut self.state) {
            RecordingState::Stroke { start, mut plot } => {
                plot.end_plot(angle, pressure);
                Ok(self.paint_plot(&plot, start))
            }
            other => {
                let state = other.name();
                self.state = other;
                Err(DrawError::InvalidSequence {
                    operation: "end_stroke",
                    state,
                })
            }
        }
    }

    pub(crate) fn require_idle(&self, operation: &'static str) -> Result<(), DrawError> {
        match self.state {
            RecordingState::Idle => Ok(()),
            ref other => Err(DrawError::InvalidSequence {
                operation,
                state: other.name(),
            }),
        }
    }
}
