//! Closed and open shapes: fill, then hatch, then stroke

use std::f32::consts::PI;

use glam::Vec2;
use tracing::{debug, warn};

use crate::constants::DEFAULT_BLEED;
use crate::error::DrawError;
use crate::plot::{Plot, PlotKind, Spline, SplinePoint};
use crate::random::{cos, sin};
use crate::surface::Canvas;
use crate::validation::validate_polygon;

use super::{RecordingState, Renderer, StrokeSummary};

/// Step used when tracing a plot into an outline
const OUTLINE_STEP: f32 = 1.0;

impl<C: Canvas> Renderer<C> {
    /// Whether a shape needs its outline for fill or hatch
    fn wants_outline(&self) -> bool {
        self.ctx.fill.is_some() || self.ctx.hatch.is_some()
    }

    /// Fill and hatch `outline`, then stroke with `stroke`
    fn paint_shape(
        &mut self,
        outline: &[Vec2],
        stroke: impl FnOnce(&mut Self) -> StrokeSummary,
    ) -> StrokeSummary {
        if self.ctx.fill.is_some() {
            self.fill_outline(outline);
        }
        let mut summary = StrokeSummary::default();
        if self.ctx.hatch.is_some() {
            summary += self.hatch_outline(outline);
        }
        if self.ctx.stroke.is_some() {
            summary += stroke(self);
        }
        summary
    }

    /// Outline traced along `plot` from `start`
    fn plot_outline(&self, plot: &Plot, start: Vec2) -> Vec<Vec2> {
        let bleed = self.ctx.fill.map_or(DEFAULT_BLEED, |f| f.bleed);
        plot.gen_polygon(
            start,
            &self.field,
            self.ctx.transform,
            OUTLINE_STEP,
            0.25 * (1.0 + bleed),
        )
    }

    /// Fill, hatch and stroke a plot starting at `start`
    pub(crate) fn paint_plot(&mut self, plot: &Plot, start: Vec2) -> StrokeSummary {
        let outline = if self.wants_outline() {
            self.plot_outline(plot, start)
        } else {
            Vec::new()
        };
        self.paint_shape(&outline, |r| match r.ctx.stroke.clone() {
            Some(selection) => r.draw_plot(&selection, plot, start, 1.0),
            None => StrokeSummary::default(),
        })
    }

    /// Closed polygon through `points`, each edge stroked as a line
    pub fn polygon(&mut self, points: &[Vec2]) -> StrokeSummary {
        if let Err(e) = validate_polygon(points) {
            warn!("polygon: {}, skipping", e);
            return StrokeSummary::default();
        }
        self.paint_shape(points, |r| {
            let mut summary = StrokeSummary::default();
            for (i, a) in points.iter().enumerate() {
                let b = points[(i + 1) % points.len()];
                summary += r.line(a.x, a.y, b.x, b.y);
            }
            summary
        })
    }

    /// Axis-aligned rectangle with its top-left corner at (x, y)
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) -> StrokeSummary {
        let corners = [
            Vec2::new(x, y),
            Vec2::new(x + w, y),
            Vec2::new(x + w, y + h),
            Vec2::new(x, y + h),
        ];
        self.polygon(&corners)
    }

    /// Circle of radius `r` as four curved quarter segments.
    ///
    /// With `irregular`, each quarter's length varies by up to 15% so the
    /// loop does not close perfectly, like a hand-drawn circle.
    pub fn circle(&mut self, x: f32, y: f32, r: f32, irregular: bool) -> StrokeSummary {
        if !(r.is_finite() && r > 0.0) {
            warn!("circle: invalid radius {}, skipping", r);
            return StrokeSummary::default();
        }
        let center = Vec2::new(x, y);
        let angle = self.rng.range(0.0, 360.0);
        let quarter = PI * r / 2.0;
        let mut plot = Plot::new(PlotKind::Curve);
        for k in 0..4 {
            let length = if irregular {
                quarter * self.rng.range(0.85, 1.15)
            } else {
                quarter
            };
            plot.add_segment(angle + 90.0 * k as f32, length, 1.0);
        }
        plot.end_plot(angle + 360.0, 1.0);
        let start = center - r * Vec2::new(cos(angle + 90.0), sin(angle + 90.0));
        debug!("circle: center ({:.1}, {:.1}) radius {:.1}", x, y, r);
        self.paint_plot(&plot, start)
    }

    /// Smooth path through `points`; see [`Spline::new`] for `curvature`
    pub fn spline(&mut self, points: &[SplinePoint], curvature: f32) -> StrokeSummary {
        let plot = match Spline::new(points, curvature) {
            Ok(plot) => plot,
            Err(e) => {
                warn!("spline: {}, skipping", e);
                return StrokeSummary::default();
            }
        };
        let start = plot.origin().unwrap_or(points[0].pos);
        self.paint_plot(&plot, start)
    }

    // Recorded shapes

    /// Start recording vertices for a shape with the given spline curvature
    pub fn begin_shape(&mut self, curvature: f32) -> Result<(), DrawError> {
        self.require_idle("begin_shape")?;
        self.state = RecordingState::Shape {
            curvature: curvature.clamp(0.0, 1.0),
            points: Vec::new(),
        };
        Ok(())
    }

    /// Record a vertex with optional pressure
    pub fn vertex(&mut self, x: f32, y: f32, pressure: Option<f32>) -> Result<(), DrawError> {
        match &mut self.state {
            RecordingState::Shape { points, .. } => {
                let point = match pressure {
                    Some(p) => SplinePoint::with_pressure(x, y, p),
                    None => SplinePoint::new(x, y),
                };
                points.push(point);
                Ok(())
            }
            other => Err(DrawError::InvalidSequence {
                operation: "vertex",
                state: other.name(),
            }),
        }
    }

    /// Finish the recorded shape. With `close`, the path returns to its first vertex.
    pub fn end_shape(&mut self, close: bool) -> Result<StrokeSummary, DrawError> {
        let (curvature, mut points) = match std::mem::take(&mut self.state) {
            RecordingState::Shape { curvature, points } => (curvature, points),
            other => {
                let state = other.name();
                self.state = other;
                return Err(DrawError::InvalidSequence {
                    operation: "end_shape",
                    state,
                });
            }
        };
        if close {
            if let Some(first) = points.first().copied() {
                points.push(first);
            }
        }
        let plot = match Spline::new(&points, curvature) {
            Ok(plot) => plot,
            Err(e) => {
                warn!("end_shape: {}, skipping", e);
                return Ok(StrokeSummary::default());
            }
        };
        let outline: Vec<Vec2> = points.iter().map(|p| p.pos).collect();
        let start = outline[0];
        Ok(self.paint_shape(&outline, |r| match r.ctx.stroke.clone() {
            Some(selection) => r.draw_plot(&selection, &plot, start, 1.0),
            None => StrokeSummary::default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::FillSettings;
    use crate::hatch::HatchOptions;
    use crate::testing::RecordingCanvas;
    use crate::types::Color;
    use ductus_config::CanvasConfig;

    fn renderer() -> Renderer<RecordingCanvas> {
        let mut r = Renderer::new(
            RecordingCanvas::new(300.0, 300.0),
            CanvasConfig::new(300, 300).with_seed(21),
        )
        .unwrap();
        r.set("pen", Color::BLACK, 1.0).unwrap();
        r
    }

    #[test]
    fn test_rect_strokes_four_edges() {
        let mut r = renderer();
        let summary = r.rect(10.0, 10.0, 60.0, 30.0);
        // 60/0.3 = 200 and 30/0.3 = 100 tips per edge
        assert_eq!(summary.tips, 600);
    }

    #[test]
    fn test_degenerate_polygon_is_skipped() {
        let mut r = renderer();
        let summary = r.polygon(&[Vec2::ZERO, Vec2::ONE]);
        assert_eq!(summary, StrokeSummary::default());
        assert!(r.canvas.calls.is_empty());
    }

    #[test]
    fn test_circle_tip_count() {
        let mut r = renderer();
        let summary = r.circle(150.0, 150.0, 30.0, false);
        let expected = (2.0 * PI * 30.0 / 0.3).round() as usize;
        assert!(summary.tips.abs_diff(expected) <= 1);
    }

    #[test]
    fn test_circle_stays_near_its_rim() {
        let mut r = renderer();
        r.circle(150.0, 150.0, 40.0, false);
        for call in &r.canvas.calls {
            if let crate::testing::Primitive::Circle { center, .. } = call {
                let distance = center.distance(Vec2::splat(150.0));
                assert!((distance - 40.0).abs() < 4.0, "tip at {distance}");
            }
        }
    }

    #[test]
    fn test_spline_strokes_through_points() {
        let mut r = renderer();
        let points = [
            SplinePoint::new(20.0, 20.0),
            SplinePoint::new(80.0, 20.0),
            SplinePoint::new(80.0, 80.0),
        ];
        let summary = r.spline(&points, 0.0);
        assert_eq!(summary.tips, 400);
        assert_eq!(r.spline(&points[..1], 0.5), StrokeSummary::default());
    }

    #[test]
    fn test_shape_fill_hatch_stroke_order() {
        let mut r = renderer();
        r.fill(Color::rgb8(30, 80, 160), 60.0);
        r.set_hatch(10.0, 0.0, HatchOptions::default()).unwrap();
        let summary = r.rect(50.0, 50.0, 100.0, 100.0);
        // The fill blended first, through the mixer
        assert_eq!(r.mixer().blends(), 1);
        assert_eq!(r.canvas.shader_runs.len(), 1);
        // Hatch lines plus the outline
        assert!(summary.tips > 4 * 333);
        assert!(!r.canvas.calls.is_empty());
    }

    #[test]
    fn test_fill_only_shape() {
        let mut r = renderer();
        r.no_stroke();
        r.fill(Color::rgb8(200, 40, 40), 120.0);
        let summary = r.circle(100.0, 100.0, 30.0, true);
        assert_eq!(summary, StrokeSummary::default());
        assert_eq!(r.mixer().blends(), 1);
        assert!(!r.canvas.shader_runs[0].is_empty());
        assert!(r.canvas.calls.is_empty());
    }

    #[test]
    fn test_recorded_shape() {
        let mut r = renderer();
        assert!(matches!(
            r.vertex(0.0, 0.0, None),
            Err(DrawError::InvalidSequence { operation: "vertex", .. })
        ));
        r.begin_shape(0.0).unwrap();
        assert!(r.begin_stroke(PlotKind::Curve, 0.0, 0.0).is_err());
        r.vertex(10.0, 10.0, None).unwrap();
        r.vertex(70.0, 10.0, Some(0.5)).unwrap();
        r.vertex(70.0, 70.0, None).unwrap();
        let summary = r.end_shape(true).unwrap();
        assert_eq!(r.state(), &RecordingState::Idle);
        // Three sides of 60, 60 and 60*sqrt(2)
        let expected = ((120.0 + 60.0 * 2f32.sqrt()) / 0.3).round() as usize;
        assert!(summary.tips.abs_diff(expected) <= 1);
        assert!(r.end_shape(false).is_err());
    }

    #[test]
    fn test_recorded_shape_needs_two_points() {
        let mut r = renderer();
        r.begin_shape(0.5).unwrap();
        r.vertex(10.0, 10.0, None).unwrap();
        assert_eq!(r.end_shape(false).unwrap(), StrokeSummary::default());
        assert_eq!(r.state(), &RecordingState::Idle);
    }

    #[test]
    fn test_fill_settings_reach_outline() {
        let mut r = renderer();
        r.fill(Color::BLACK, 100.0);
        r.bleed(0.3, crate::fill::BleedDirection::Out);
        let plot = {
            let mut p = Plot::new(PlotKind::Curve);
            p.add_segment(0.0, 50.0, 1.0);
            p.end_plot(90.0, 1.0);
            p
        };
        let outline = r.plot_outline(&plot, Vec2::new(10.0, 10.0));
        assert!(outline.len() >= 2);
        assert_eq!(outline[0], Vec2::new(10.0, 10.0));
        assert_eq!(r.context().fill.map(|f: FillSettings| f.bleed), Some(0.3));
    }
}
