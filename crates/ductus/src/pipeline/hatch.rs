//! Hatch selection and drawing hatch lines with the hatch brush

use glam::Vec2;
use tracing::{debug, warn};

use crate::error::DrawError;
use crate::hatch::{HatchOptions, hatch_lines};
use crate::polygon::Polygon;
use crate::random::bearing;
use crate::surface::Canvas;
use crate::types::Color;
use crate::validation::validate_spacing;

use super::stroke::StrokePath;
use super::{HatchSelection, Renderer, StrokeSelection, StrokeSummary};

impl<C: Canvas> Renderer<C> {
    /// Hatch `polygons` now with the hatch brush
    pub fn hatch(
        &mut self,
        polygons: &[Polygon],
        spacing: f32,
        angle: f32,
        options: &HatchOptions,
    ) -> Result<StrokeSummary, DrawError> {
        let angle = self.degrees(angle);
        let brush = self.ctx.hatch_brush.clone();
        self.draw_hatch(polygons, spacing, angle, options, &brush)
    }

    /// Hatch every following shape
    pub fn set_hatch(
        &mut self,
        spacing: f32,
        angle: f32,
        options: HatchOptions,
    ) -> Result<(), DrawError> {
        validate_spacing(spacing)?;
        self.ctx.hatch = Some(HatchSelection {
            spacing,
            angle: self.degrees(angle),
            options,
            brush: self.ctx.hatch_brush.clone(),
        });
        Ok(())
    }

    /// Brush, color and weight for hatch lines
    pub fn set_hatch_brush(
        &mut self,
        name: &str,
        color: Color,
        weight: f32,
    ) -> Result<(), DrawError> {
        self.catalog.require(name)?;
        let selection = StrokeSelection::new(name, color, weight);
        if let Some(hatch) = &mut self.ctx.hatch {
            hatch.brush = selection.clone();
        }
        self.ctx.hatch_brush = selection;
        Ok(())
    }

    pub fn no_hatch(&mut self) {
        self.ctx.hatch = None;
    }

    /// Hatch a shape outline with the active hatch selection
    pub(crate) fn hatch_outline(&mut self, outline: &[Vec2]) -> StrokeSummary {
        let Some(selection) = self.ctx.hatch.clone() else {
            return StrokeSummary::default();
        };
        let polygon = match Polygon::new(outline.to_vec()) {
            Ok(polygon) => polygon,
            Err(e) => {
                warn!("hatch: {}, skipping", e);
                return StrokeSummary::default();
            }
        };
        self.draw_hatch(
            &[polygon],
            selection.spacing,
            selection.angle,
            &selection.options,
            &selection.brush,
        )
        .unwrap_or_else(|e| {
            warn!("hatch: {}, skipping", e);
            StrokeSummary::default()
        })
    }

    fn draw_hatch(
        &mut self,
        polygons: &[Polygon],
        spacing: f32,
        angle: f32,
        options: &HatchOptions,
        brush: &StrokeSelection,
    ) -> Result<StrokeSummary, DrawError> {
        let lines = hatch_lines(polygons, spacing, angle, options, &mut self.rng)?;
        let mut summary = StrokeSummary::default();
        for line in &lines {
            let path = StrokePath::Straight {
                direction: bearing(line.from, line.to),
                flow: false,
            };
            summary += self.draw_stroke(brush, line.from, line.from.distance(line.to), path);
        }
        debug!("hatch: {} lines, {} tips", lines.len(), summary.tips);
        Ok(summary)
    }
}
