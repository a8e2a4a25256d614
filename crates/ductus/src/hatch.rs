//! Parallel hatch lines clipped against polygons

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::polygon::Polygon;
use crate::random::{Random, map};
use crate::types::Rect;
use crate::validation::{ValidationError, validate_spacing};

/// Hard stop on probe count for extreme spacing/extent ratios
const MAX_PROBES: usize = 100_000;

/// Hatch modifiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HatchOptions {
    /// Endpoint jitter as a fraction of spacing
    pub rand: f32,
    /// Join consecutive lines into one zig-zag
    pub continuous: bool,
    /// 0..1; spacing grows by up to 10% per line
    pub gradient: f32,
}

/// One straight hatch stroke
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HatchLine {
    pub from: Vec2,
    pub to: Vec2,
}

fn union_bounds(polygons: &[Polygon]) -> Option<Rect> {
    polygons
        .iter()
        .map(Polygon::bounds)
        .reduce(|a, b| Rect {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        })
}

/// Lines at `angle` degrees, `spacing` apart, covering the inside of `polygons`.
///
/// Probes sweep across the joint bounding box; on each probe the boundary
/// crossings of every polygon are sorted by their distance along the probe
/// (left to right, or top to bottom when vertical) and joined in pairs,
/// which yields the inside spans for concave shapes and holes alike.
pub fn hatch_lines(
    polygons: &[Polygon],
    spacing: f32,
    angle: f32,
    options: &HatchOptions,
    rng: &mut Random,
) -> Result<Vec<HatchLine>, ValidationError> {
    validate_spacing(spacing)?;
    let Some(bounds) = union_bounds(polygons) else {
        return Ok(Vec::new());
    };

    let theta = angle.rem_euclid(180.0).to_radians();
    let direction = Vec2::new(theta.cos(), theta.sin());
    let normal = direction.perp();
    let (min_proj, max_proj) = bounds
        .corners()
        .iter()
        .map(|c| normal.dot(*c))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p), hi.max(p))
        });
    let center = (bounds.min + bounds.max) * 0.5;
    let reach = 2.0 * bounds.size().length().max(spacing);
    let frame = Polygon::from_rect(bounds);
    let gradient = map(options.gradient, 0.0, 1.0, 1.0, 1.1, true);

    let mut lines = Vec::new();
    let mut previous_end: Option<Vec2> = None;
    let mut offset = min_proj + spacing * 0.5;
    let mut step = spacing;
    for _ in 0..MAX_PROBES {
        if offset > max_proj {
            break;
        }
        let base = center + normal * (offset - normal.dot(center));
        let a = base - direction * reach;
        let b = base + direction * reach;
        if frame.intersect(a, b).is_empty() {
            break;
        }

        let mut points: Vec<Vec2> = polygons.iter().flat_map(|p| p.intersect(a, b)).collect();
        points.sort_by(|p, q| (*p - a).dot(direction).total_cmp(&(*q - a).dot(direction)));

        let mut jitter = |p: Vec2| {
            if options.rand > 0.0 {
                let amount = options.rand * spacing;
                p + Vec2::new(rng.range(-amount, amount), rng.range(-amount, amount))
            } else {
                p
            }
        };

        let mut first = true;
        for pair in points.chunks_exact(2) {
            let from = jitter(pair[0]);
            let to = jitter(pair[1]);
            if first {
                if let (true, Some(end)) = (options.continuous, previous_end) {
                    lines.push(HatchLine { from: end, to: from });
                }
                first = false;
            }
            lines.push(HatchLine { from, to });
            previous_end = Some(to);
        }

        offset += step;
        step *= gradient;
    }
    debug!(
        "hatch_lines: {} polygons, spacing {:.2}, angle {:.1} -> {} lines",
        polygons.len(),
        spacing,
        angle,
        lines.len()
    );
    Ok(lines)
}
