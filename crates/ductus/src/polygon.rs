//! Polygons with memoized segment intersection queries

use std::cell::RefCell;
use std::collections::HashMap;

use glam::Vec2;

use crate::types::Rect;
use crate::validation::{ValidationError, validate_polygon};

/// Tolerance on the query segment parameter
const SEGMENT_EPSILON: f32 = 1e-5;

/// Closed polygon with an intersection cache.
///
/// Queries through a vertex follow a half-open crossing rule (a vertex on
/// the query line counts as lying on its positive side), so a probe that
/// passes through the boundary yields an even number of points and sorted
/// pairs reconstruct the inside spans.
#[derive(Debug, Clone)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    cache: RefCell<HashMap<[u32; 4], Vec<Vec2>>>,
}

impl Polygon {
    /// Build a polygon from at least three finite vertices
    pub fn new(vertices: Vec<Vec2>) -> Result<Self, ValidationError> {
        validate_polygon(&vertices)?;
        Ok(Self {
            vertices,
            cache: RefCell::new(HashMap::new()),
        })
    }

    /// Axis-aligned rectangle as a polygon
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            vertices: rect.corners().to_vec(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edges in order, closing back to the first vertex
    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn bounds(&self) -> Rect {
        bounds_of(&self.vertices)
    }

    /// Shoelace area; positive when vertices run clockwise on a y-down canvas
    pub fn signed_area(&self) -> f32 {
        signed_area(&self.vertices)
    }

    /// Mean of the vertices
    pub fn centroid(&self) -> Vec2 {
        self.vertices.iter().copied().sum::<Vec2>() / self.vertices.len() as f32
    }

    /// All points where segment `a`-`b` crosses the boundary.
    ///
    /// Results are memoized per segment and do not depend on the order of
    /// the endpoints.
    pub fn intersect(&self, a: Vec2, b: Vec2) -> Vec<Vec2> {
        let (a, b) = canonical(a, b);
        let key = [a.x.to_bits(), a.y.to_bits(), b.x.to_bits(), b.y.to_bits()];
        if let Some(hit) = self.cache.borrow().get(&key) {
            return hit.clone();
        }
        let points = self.compute_intersections(a, b);
        self.cache.borrow_mut().insert(key, points.clone());
        points
    }

    fn compute_intersections(&self, a: Vec2, b: Vec2) -> Vec<Vec2> {
        let dir = b - a;
        let len_sq = dir.length_squared();
        if len_sq <= f32::EPSILON {
            return Vec::new();
        }
        let normal = dir.perp();
        let mut points = Vec::new();
        for (p, q) in self.edges() {
            let sp = normal.dot(p - a);
            let sq = normal.dot(q - a);
            if (sp >= 0.0) == (sq >= 0.0) {
                continue;
            }
            let u = sp / (sp - sq);
            let point = p + (q - p) * u;
            let t = (point - a).dot(dir) / len_sq;
            if (-SEGMENT_EPSILON..=1.0 + SEGMENT_EPSILON).contains(&t) {
                points.push(point);
            }
        }
        points
    }

    /// Number of memoized queries
    pub fn cached_queries(&self) -> usize {
        self.cache.borrow().len()
    }
}

fn canonical(a: Vec2, b: Vec2) -> (Vec2, Vec2) {
    if (a.x, a.y) <= (b.x, b.y) { (a, b) } else { (b, a) }
}

/// Bounding rectangle of a point set
pub fn bounds_of(points: &[Vec2]) -> Rect {
    let min = points.iter().copied().fold(Vec2::splat(f32::INFINITY), Vec2::min);
    let max = points.iter().copied().fold(Vec2::splat(f32::NEG_INFINITY), Vec2::max);
    Rect { min, max }
}

/// Shoelace signed area of a closed point list
pub fn signed_area(points: &[Vec2]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    0.5 * (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f32>()
}

/// Intersection of two infinite lines given as point + direction
pub fn intersect_lines(p1: Vec2, d1: Vec2, p2: Vec2, d2: Vec2) -> Option<Vec2> {
    let denom = d1.perp_dot(d2);
    if denom.abs() <= 1e-9 {
        return None;
    }
    let t = (p2 - p1).perp_dot(d2) / denom;
    Some(p1 + d1 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ])
        .unwrap()
    }

    fn sorted(mut v: Vec<Vec2>) -> Vec<Vec2> {
        v.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        v
    }

    #[test]
    fn test_rejects_two_points() {
        assert_eq!(
            Polygon::new(vec![Vec2::ZERO, Vec2::ONE]).unwrap_err(),
            ValidationError::DegeneratePolygon(2)
        );
    }

    #[test]
    fn test_horizontal_probe() {
        let pts = sorted(square().intersect(Vec2::new(-5.0, 5.0), Vec2::new(15.0, 5.0)));
        assert_eq!(pts.len(), 2);
        assert!((pts[0] - Vec2::new(0.0, 5.0)).length() < 1e-5);
        assert!((pts[1] - Vec2::new(10.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn test_short_segment_misses() {
        let pts = square().intersect(Vec2::new(2.0, 5.0), Vec2::new(8.0, 5.0));
        assert!(pts.is_empty());
    }

    #[test]
    fn test_symmetric_under_reversal() {
        let poly = Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(20.0, 3.0),
            Vec2::new(12.0, 9.0),
            Vec2::new(25.0, 18.0),
            Vec2::new(-2.0, 15.0),
        ])
        .unwrap();
        let a = Vec2::new(-10.0, 2.0);
        let b = Vec2::new(30.0, 14.0);
        let forward = sorted(poly.intersect(a, b));
        let backward = sorted(Polygon::new(poly.vertices().to_vec()).unwrap().intersect(b, a));
        assert_eq!(forward, backward);
        assert_eq!(forward.len() % 2, 0);
    }

    #[test]
    fn test_memoized() {
        let poly = square();
        poly.intersect(Vec2::new(-1.0, 1.0), Vec2::new(11.0, 1.0));
        poly.intersect(Vec2::new(11.0, 1.0), Vec2::new(-1.0, 1.0));
        assert_eq!(poly.cached_queries(), 1);
    }

    #[test]
    fn test_probe_through_vertex_yields_pair() {
        let diamond = Polygon::new(vec![
            Vec2::new(0.0, -5.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(0.0, 5.0),
            Vec2::new(-5.0, 0.0),
        ])
        .unwrap();
        let pts = diamond.intersect(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0));
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn test_area_and_centroid() {
        let sq = square();
        assert!((sq.signed_area().abs() - 100.0).abs() < 1e-4);
        assert_eq!(sq.centroid(), Vec2::new(5.0, 5.0));
        assert_eq!(sq.bounds().max, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn test_intersect_lines() {
        let p = intersect_lines(Vec2::ZERO, Vec2::X, Vec2::new(3.0, -2.0), Vec2::Y).unwrap();
        assert!((p - Vec2::new(3.0, 0.0)).length() < 1e-6);
        assert!(intersect_lines(Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::X).is_none());
    }
}
