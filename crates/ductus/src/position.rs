//! Stroke position and movement through a flow field

use glam::{Affine2, Vec2};

use crate::field::FlowField;
use crate::plot::Plot;
use crate::random::{cos, sin};

/// A point travelling along a stroke.
///
/// Coordinates are in user space; field lookups go through the transform
/// active when the stroke began. `plotted` is the distance travelled along
/// the current path and drives pressure and plot sampling, so it advances
/// even when the point has left the drawable region.
#[derive(Debug, Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub plotted: f32,
    transform: Affine2,
}

impl Position {
    pub fn new(point: Vec2, transform: Affine2) -> Self {
        Self {
            x: point.x,
            y: point.y,
            plotted: 0.0,
            transform,
        }
    }

    #[inline]
    pub fn point(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Position in canvas space
    #[inline]
    pub fn canvas_point(&self) -> Vec2 {
        self.transform.transform_point2(self.point())
    }

    /// Restart distance tracking
    pub fn reset(&mut self) {
        self.plotted = 0.0;
    }

    /// Grid cell under this position, if a field is active and covers it
    pub fn cell(&self, field: &FlowField) -> Option<(usize, usize)> {
        if !field.is_active() {
            return None;
        }
        field.cell(self.canvas_point())
    }

    /// Whether movement can continue from here
    pub fn is_in(&self, field: &FlowField) -> bool {
        if field.is_active() {
            self.cell(field).is_some()
        } else {
            field.contains_canvas(self.canvas_point())
        }
    }

    /// Field angle under this position, 0 when not in a field
    pub fn angle(&self, field: &FlowField) -> f32 {
        field.angle_at(self.canvas_point()).unwrap_or(0.0)
    }

    fn step(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Advance `length` in increments of `step`, heading along `direction`.
    ///
    /// With `use_flow`, the heading is re-read from the field at every
    /// increment (field angle + direction), which is what makes strokes curve.
    pub fn move_to(
        &mut self,
        field: &FlowField,
        length: f32,
        direction: f32,
        step: f32,
        use_flow: bool,
    ) {
        if step <= 0.0 {
            return;
        }
        if !self.is_in(field) {
            self.plotted += step;
            return;
        }
        let fixed = Vec2::new(cos(direction), sin(direction));
        let increments = (length / step).ceil() as usize;
        for _ in 0..increments {
            let delta = if use_flow {
                let heading = self.angle(field) + direction;
                Vec2::new(cos(heading), sin(heading))
            } else {
                fixed
            };
            self.plotted += step;
            self.step(delta * step);
        }
    }

    /// Advance following a plot's recorded headings, superposed on the field.
    ///
    /// `scale` stretches the plot: distance along the plot advances by
    /// `step / scale` per increment.
    pub fn plot_to(&mut self, field: &FlowField, plot: &Plot, length: f32, step: f32, scale: f32) {
        if step <= 0.0 || scale <= 0.0 {
            return;
        }
        let inverse_scale = 1.0 / scale;
        if !self.is_in(field) {
            self.plotted += step * inverse_scale;
            return;
        }
        let increments = (length / step).ceil() as usize;
        for _ in 0..increments {
            let heading = self.angle(field) + plot.angle(self.plotted);
            self.plotted += step * inverse_scale;
            self.step(Vec2::new(cos(heading), sin(heading)) * step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldGrid;
    use crate::plot::PlotKind;
    use crate::random::Random;

    fn field() -> FlowField {
        FlowField::new(100.0, 100.0, &mut Random::seeded(1))
    }

    #[test]
    fn test_straight_move() {
        let f = field();
        let mut p = Position::new(Vec2::new(10.0, 10.0), Affine2::IDENTITY);
        p.move_to(&f, 10.0, 0.0, 1.0, false);
        assert!((p.x - 20.0).abs() < 1e-3);
        assert!((p.y - 10.0).abs() < 1e-3);
        assert!((p.plotted - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_direction_ninety_moves_down() {
        let f = field();
        let mut p = Position::new(Vec2::ZERO, Affine2::IDENTITY);
        p.move_to(&f, 5.0, 90.0, 1.0, false);
        assert!(p.x.abs() < 1e-3);
        assert!((p.y - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_flow_bends_heading() {
        let mut f = field();
        f.add("down", |_t: f32, g: &mut FieldGrid| g.fill_with(|_, _| 90.0));
        let mut p = Position::new(Vec2::new(50.0, 50.0), Affine2::IDENTITY);
        p.move_to(&f, 10.0, 0.0, 1.0, true);
        assert!((p.x - 50.0).abs() < 1e-3);
        assert!((p.y - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_outside_only_advances_plotted() {
        let f = field();
        let mut p = Position::new(Vec2::new(-1000.0, 0.0), Affine2::IDENTITY);
        p.move_to(&f, 1.0, 0.0, 1.0, false);
        assert_eq!(p.x, -1000.0);
        assert!((p.plotted - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_transform_shifts_field_lookup() {
        let mut f = field();
        f.add("flat", |_t: f32, g: &mut FieldGrid| g.fill_with(|_, _| 45.0));
        let shifted = Position::new(Vec2::ZERO, Affine2::from_translation(Vec2::new(-5000.0, 0.0)));
        assert!(!shifted.is_in(&f));
        let inside = Position::new(Vec2::ZERO, Affine2::IDENTITY);
        assert_eq!(inside.angle(&f), 45.0);
    }

    #[test]
    fn test_plot_to_follows_plot() {
        let f = field();
        let mut plot = Plot::new(PlotKind::Segments);
        plot.add_segment(90.0, 10.0, 1.0);
        plot.end_plot(90.0, 1.0);
        let mut p = Position::new(Vec2::ZERO, Affine2::IDENTITY);
        p.plot_to(&f, &plot, 4.0, 1.0, 2.0);
        assert!((p.y - 4.0).abs() < 1e-3);
        assert!((p.plotted - 2.0).abs() < 1e-5);
    }
}
