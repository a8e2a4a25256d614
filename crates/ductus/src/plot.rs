//! Turtle-style paths: angle/length/pressure segments and spline building

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};

use crate::field::FlowField;
use crate::polygon::intersect_lines;
use crate::position::Position;
use crate::random::{bearing, normalize_degrees};
use crate::validation::{ValidationError, validate_point};

/// How values are read between recorded nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    /// Constant angle and pressure within each segment
    Segments,
    /// Linear interpolation between nodes, shortest way around for angles
    #[default]
    Curve,
}

/// A path described independently of absolute position.
///
/// N segments carry N+1 angle nodes. Until [`Plot::end_plot`] runs, the
/// trailing node mirrors the last segment's angle and pressure.
#[derive(Debug, Clone, PartialEq)]
pub struct Plot {
    kind: PlotKind,
    lengths: Vec<f32>,
    angles: Vec<f32>,
    pressures: Vec<f32>,
    total: f32,
    rotation: f32,
    origin: Option<Vec2>,
    ended: bool,
}

impl Plot {
    pub fn new(kind: PlotKind) -> Self {
        Self {
            kind,
            lengths: Vec::new(),
            angles: Vec::new(),
            pressures: Vec::new(),
            total: 0.0,
            rotation: 0.0,
            origin: None,
            ended: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> PlotKind {
        self.kind
    }

    /// Append a segment. Negative lengths count as zero.
    pub fn add_segment(&mut self, angle: f32, length: f32, pressure: f32) {
        let angle = normalize_degrees(angle);
        if self.ended {
            self.pressures.pop();
            self.ended = false;
        }
        self.angles.pop();
        self.angles.push(angle);
        self.angles.push(angle);
        self.pressures.push(pressure);
        let length = length.max(0.0);
        self.lengths.push(length);
        self.total += length;
    }

    /// Record the final node
    pub fn end_plot(&mut self, angle: f32, pressure: f32) {
        if self.lengths.is_empty() {
            return;
        }
        self.angles.pop();
        self.angles.push(normalize_degrees(angle));
        if self.ended {
            self.pressures.pop();
        }
        self.pressures.push(pressure);
        self.ended = true;
    }

    /// Fixed offset added to every sampled angle
    pub fn rotate(&mut self, degrees: f32) {
        self.rotation = normalize_degrees(degrees);
    }

    pub fn set_origin(&mut self, origin: Vec2) {
        self.origin = Some(origin);
    }

    #[inline]
    pub fn origin(&self) -> Option<Vec2> {
        self.origin
    }

    #[inline]
    pub fn total_length(&self) -> f32 {
        self.total
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.lengths.len()
    }

    /// Segment lengths in order
    pub fn lengths(&self) -> &[f32] {
        &self.lengths
    }

    /// Node angles before rotation
    pub fn node_angles(&self) -> &[f32] {
        &self.angles
    }

    /// Segment index and distance into it for a path distance
    fn locate(&self, distance: f32) -> (usize, f32) {
        let mut remaining = distance.max(0.0);
        for (i, len) in self.lengths.iter().enumerate() {
            if remaining < *len {
                return (i, remaining);
            }
            remaining -= len;
        }
        let last = self.lengths.len().saturating_sub(1);
        (last, self.lengths.get(last).copied().unwrap_or(0.0))
    }

    /// Heading at `distance` along the path, rotation included
    pub fn angle(&self, distance: f32) -> f32 {
        let Some(last) = self.angles.last().copied() else {
            return self.rotation;
        };
        if distance >= self.total {
            return normalize_degrees(last + self.rotation);
        }
        let (index, into) = self.locate(distance);
        let start = self.angles[index];
        let value = match self.kind {
            PlotKind::Segments => start,
            PlotKind::Curve => {
                let end = self.angles.get(index + 1).copied().unwrap_or(start);
                lerp_angle(start, end, into / self.lengths[index])
            }
        };
        normalize_degrees(value + self.rotation)
    }

    /// Pressure at `distance` along the path
    pub fn pressure(&self, distance: f32) -> f32 {
        let Some(last) = self.pressures.last().copied() else {
            return 1.0;
        };
        if distance >= self.total {
            return last;
        }
        let (index, into) = self.locate(distance);
        let start = self.pressures[index];
        match self.kind {
            PlotKind::Segments => start,
            PlotKind::Curve => {
                let end = self.pressures.get(index + 1).copied().unwrap_or(start);
                start + (end - start) * (into / self.lengths[index])
            }
        }
    }

    /// Coarse outline of the path as drawn from `start`.
    ///
    /// Walks the path at `step` and keeps a vertex every "side length",
    /// the mean of the longest and shortest segment scaled by `side_factor`.
    pub fn gen_polygon(
        &self,
        start: Vec2,
        field: &FlowField,
        transform: Affine2,
        step: f32,
        side_factor: f32,
    ) -> Vec<Vec2> {
        if self.lengths.is_empty() || step <= 0.0 {
            return Vec::new();
        }
        let longest = self.lengths.iter().copied().fold(0.0, f32::max);
        let shortest = self.lengths.iter().copied().fold(f32::INFINITY, f32::min);
        let side = (0.5 * (longest + shortest) * side_factor).max(step);

        let mut position = Position::new(start, transform);
        let mut vertices = vec![start];
        let mut since_vertex = 0.0;
        let steps = (self.total / step).round() as usize;
        for _ in 0..steps {
            position.plot_to(field, self, step, step, 1.0);
            since_vertex += step;
            if since_vertex >= side {
                vertices.push(position.point());
                since_vertex = 0.0;
            }
        }
        vertices
    }
}

/// Interpolate two angles the short way around, result in [0, 360)
pub fn lerp_angle(a0: f32, a1: f32, t: f32) -> f32 {
    let (mut a0, mut a1) = (a0, a1);
    if (a1 - a0).abs() > 180.0 {
        if a1 > a0 {
            a1 -= 360.0;
        } else {
            a0 -= 360.0;
        }
    }
    normalize_degrees(a0 + (a1 - a0) * t)
}

/// Signed smallest turn from `from` to `to`, in (-180, 180]
fn turn_between(from: f32, to: f32) -> f32 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

/// Raw input point for a spline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplinePoint {
    pub pos: Vec2,
    pub pressure: Option<f32>,
}

impl SplinePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            pressure: None,
        }
    }

    pub fn with_pressure(x: f32, y: f32, pressure: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            pressure: Some(pressure),
        }
    }

    #[inline]
    fn pressure_or_default(&self) -> f32 {
        self.pressure.unwrap_or(1.0)
    }
}

impl From<Vec2> for SplinePoint {
    fn from(pos: Vec2) -> Self {
        Self {
            pos,
            pressure: None,
        }
    }
}

/// Builds a [`Plot`] from raw points
pub struct Spline;

impl Spline {
    /// Build a path through `points`.
    ///
    /// With `curvature` 0 every point pair becomes one straight segment.
    /// Above 0, each interior corner is cut back on both sides by
    /// `curvature * min(incoming, outgoing) / 2` and replaced by an arc
    /// tangent to both sides. The plot's origin is the first point.
    pub fn new(points: &[SplinePoint], curvature: f32) -> Result<Plot, ValidationError> {
        if points.len() < 2 {
            return Err(ValidationError::TooFewPoints(points.len()));
        }
        points.iter().try_for_each(|p| validate_point(p.pos))?;
        let curvature = curvature.clamp(0.0, 1.0);

        let kind = if curvature > 0.0 {
            PlotKind::Curve
        } else {
            PlotKind::Segments
        };
        let mut plot = Plot::new(kind);
        plot.set_origin(points[0].pos);

        // Length already consumed at the start of the current segment by the previous arc
        let mut done = 0.0;
        let last = points.len() - 2;
        for j in 0..=last {
            let (p1, p2) = (points[j], points[j + 1]);
            let d1 = p1.pos.distance(p2.pos);
            let a1 = bearing(p1.pos, p2.pos);

            let corner = if curvature > 0.0 && j < last {
                corner_arc(p1, p2, points[j + 2], d1 - done, curvature)
            } else {
                None
            };

            match corner {
                Some((cut, arc)) => {
                    plot.add_segment(a1, d1 - done - cut, p1.pressure_or_default());
                    plot.add_segment(a1, arc, p2.pressure_or_default());
                    done = cut;
                }
                None => {
                    plot.add_segment(a1, d1 - done, p1.pressure_or_default());
                    done = 0.0;
                }
            }
            if j == last {
                plot.end_plot(a1, p2.pressure_or_default());
            }
        }
        Ok(plot)
    }
}

/// Cut-back distance and arc length for the corner at `p2`, None for a straight join
fn corner_arc(
    p1: SplinePoint,
    p2: SplinePoint,
    p3: SplinePoint,
    available: f32,
    curvature: f32,
) -> Option<(f32, f32)> {
    let d2 = p2.pos.distance(p3.pos);
    let a1 = bearing(p1.pos, p2.pos);
    let a2 = bearing(p2.pos, p3.pos);
    let turn = turn_between(a1, a2);
    let cut = curvature * 0.5 * available.min(d2).max(0.0);
    if turn.abs() < 1e-3 || cut <= f32::EPSILON {
        return None;
    }

    let u1 = Vec2::from_angle(a1.to_radians());
    let u2 = Vec2::from_angle(a2.to_radians());
    let t1 = p2.pos - u1 * cut;
    let t2 = p2.pos + u2 * cut;
    let center = intersect_lines(t1, u1.perp(), t2, u2.perp())?;
    let radius = center.distance(t1);
    Some((cut, radius * turn.abs().to_radians()))
}
