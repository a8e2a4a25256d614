//! Watercolor fills: perturbed polygon growth layered into the pigment mask

use glam::{Affine2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{DEFAULT_BLEED, FILL_LAYERS, MAX_BLEED, OPACITY_CEILING};
use crate::polygon::{bounds_of, signed_area};
use crate::random::{Random, map, rotate};
use crate::surface::{Paint, Surface, transform_scale};
use crate::types::{BlendMode, Color};

/// Which way a fill bleeds past its outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BleedDirection {
    #[default]
    Out,
    In,
}

/// Active fill selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillSettings {
    pub color: Color,
    /// 0-255
    pub opacity: f32,
    pub bleed: f32,
    pub direction: BleedDirection,
    /// Strength of the paper-absorption holes, 0..1
    pub texture: f32,
    /// Weight of the darker rim, 0..1
    pub border: f32,
}

impl FillSettings {
    pub fn new(color: Color, opacity: f32) -> Self {
        Self {
            color,
            opacity: opacity.clamp(0.0, OPACITY_CEILING),
            bleed: DEFAULT_BLEED,
            direction: BleedDirection::Out,
            texture: 0.4,
            border: 0.4,
        }
    }

    /// Set bleed strength, capped at [`MAX_BLEED`]
    pub fn with_bleed(mut self, strength: f32, direction: BleedDirection) -> Self {
        self.bleed = strength.clamp(0.0, MAX_BLEED);
        self.direction = direction;
        self
    }

    pub fn with_texture(mut self, texture: f32, border: f32) -> Self {
        self.texture = texture.clamp(0.0, 1.0);
        self.border = border.clamp(0.0, 1.0);
        self
    }

    /// Opacity as a 0..1 alpha
    #[inline]
    pub fn intensity(&self) -> f32 {
        self.opacity / OPACITY_CEILING
    }
}

/// Polygon with per-vertex bleed, the unit of watercolor growth.
///
/// Growth never mutates: every [`FillPolygon::grow`] returns a new polygon
/// that shares the source's centroid and size.
#[derive(Debug, Clone, PartialEq)]
pub struct FillPolygon {
    vertices: Vec<Vec2>,
    multipliers: Vec<f32>,
    centroid: Vec2,
    size: f32,
    direction: BleedDirection,
}

impl FillPolygon {
    /// Seed a fill shape from an outline.
    ///
    /// A random prefix of "fluid" vertices bleeds harder than the rest, and
    /// the vertex list is rotated by a random shift so the seam moves.
    pub fn from_polygon(
        vertices: &[Vec2],
        bleed: f32,
        direction: BleedDirection,
        rng: &mut Random,
    ) -> Self {
        let n = vertices.len();
        let fluid = (n as f32 * rng.range(0.0, 0.4)).floor() as usize;
        let multipliers = (0..n)
            .map(|i| {
                if i < fluid {
                    bleed * rng.range(1.2, 1.8)
                } else {
                    bleed * rng.range(0.8, 1.2)
                }
            })
            .collect();

        let mut shifted = vertices.to_vec();
        if n > 0 {
            let shift = rng.int(0, n as i32).clamp(0, n as i32 - 1) as usize;
            shifted.rotate_left(shift);
        }

        let bounds = bounds_of(vertices);
        let size = bounds.size().max_element();
        let centroid = if n > 0 {
            vertices.iter().copied().sum::<Vec2>() / n as f32
        } else {
            Vec2::ZERO
        };
        Self {
            vertices: shifted,
            multipliers,
            centroid,
            size,
            direction,
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[inline]
    pub fn multipliers(&self) -> &[f32] {
        &self.multipliers
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn centroid(&self) -> Vec2 {
        self.centroid
    }

    /// Characteristic size: the larger side of the source bounds
    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Drop `floor((1 - factor) * len)` vertices from the middle of the list
    pub fn trim(&self, factor: f32) -> (Vec<Vec2>, Vec<f32>) {
        let len = self.vertices.len();
        let remove = (((1.0 - factor.clamp(0.0, 1.0)) * len as f32).floor() as usize)
            .min(len.saturating_sub(3));
        let start = (len - remove) / 2;
        let keep = |i: &usize| *i < start || *i >= start + remove;
        let vertices = (0..len).filter(keep).map(|i| self.vertices[i]).collect();
        let multipliers = (0..len)
            .filter(keep)
            .map(|i| self.multipliers.get(i).copied().unwrap_or(0.0))
            .collect();
        (vertices, multipliers)
    }

    /// One growth generation.
    ///
    /// Each processed edge gets a new vertex near its middle, pushed away
    /// from the outline by the edge rotated toward the bleed side, scaled by
    /// the vertex multiplier. Degrowing pulls inward at half strength. With
    /// `factor >= 0.2` on larger shapes only a trimmed subset is processed.
    pub fn grow(&self, factor: f32, degrow: bool, rng: &mut Random) -> FillPolygon {
        let (vertices, multipliers) = if self.vertices.len() > 10 && factor >= 0.2 {
            self.trim(factor)
        } else {
            (self.vertices.clone(), self.multipliers.clone())
        };
        let n = vertices.len();
        let change = if degrow { -0.5 } else { 1.0 };
        let mut outward = if signed_area(&vertices) > 0.0 { -90.0 } else { 90.0 };
        if self.direction == BleedDirection::In {
            outward = -outward;
        }

        let mut grown = Vec::with_capacity(n * 2);
        let mut grown_multipliers = Vec::with_capacity(n * 2);
        for i in 0..n {
            let current = vertices[i];
            let next = vertices[(i + 1) % n];
            let bleed = multipliers.get(i).copied().unwrap_or(0.0);
            grown.push(current);
            grown_multipliers.push(bleed);

            let t = rng.gaussian(0.5, 0.2).clamp(0.1, 0.9);
            let edge = next - current;
            let offset = rotate(edge, outward + rng.gaussian(0.0, 20.0)) * bleed * change;
            grown.push(current.lerp(next, t) + offset);
            let next_bleed = multipliers.get((i + 1) % n).copied().unwrap_or(bleed);
            grown_multipliers.push(0.5 * (bleed + next_bleed));
        }

        FillPolygon {
            vertices: grown,
            multipliers: grown_multipliers,
            centroid: self.centroid,
            size: self.size,
            direction: self.direction,
        }
    }

    /// Fill and outline this shape in placeholder ink at `alpha`
    pub fn layer<S: Surface + ?Sized>(&self, surface: &mut S, alpha: f32, border: f32) {
        if self.vertices.len() < 3 {
            return;
        }
        let ink = Color::MASK_RED.with_alpha(alpha);
        surface.polygon(&self.vertices, &Paint::fill_and_stroke(ink, border));
    }

    /// Punch 70-100 soft holes around the centroid, radius 3-20% of the shape size
    pub fn erase<S: Surface + ?Sized>(&self, surface: &mut S, strength: f32, rng: &mut Random) {
        let previous = surface.blend_mode();
        surface.set_blend_mode(BlendMode::Erase);
        let count = rng.int(70, 101);
        let ink = Color::MASK_RED.with_alpha(strength);
        for _ in 0..count {
            let center = Vec2::new(
                rng.gaussian(self.centroid.x, self.size * 0.5),
                rng.gaussian(self.centroid.y, self.size * 0.5),
            );
            let radius = self.size * rng.range(0.03, 0.2);
            surface.circle(center, 2.0 * radius, ink);
        }
        surface.set_blend_mode(previous);
    }
}

/// The layered watercolor composite
pub struct Watercolor;

impl Watercolor {
    /// Draw a watercolor fill of `outline` (user space) into `mask`.
    ///
    /// Four growth chains of different aggressiveness are layered
    /// [`FILL_LAYERS`] times, with holes punched after every layer. The
    /// caller blends the mask with the fill color afterwards. Returns the
    /// number of polygons drawn.
    pub fn composite<S: Surface + ?Sized>(
        outline: &[Vec2],
        transform: Affine2,
        settings: &FillSettings,
        rng: &mut Random,
        mask: &mut S,
    ) -> usize {
        if outline.len() < 3 {
            warn!("Watercolor::composite: outline has {} vertices, skipping", outline.len());
            return 0;
        }
        let vertices: Vec<Vec2> = outline
            .iter()
            .map(|p| transform.transform_point2(*p))
            .collect();
        let base = FillPolygon::from_polygon(&vertices, settings.bleed, settings.direction, rng);

        let intensity = settings.intensity();
        let border = (0.5 + 1.5 * settings.border) * transform_scale(&transform);
        let erase_strength = map(settings.texture, 0.0, 1.0, 0.05, 0.35, true);

        let mut primary = base.grow(1.0, false, rng);
        let shrunk = base.grow(0.6, false, rng);
        let mut wide = base
            .grow(1.0, false, rng)
            .grow(1.0, false, rng)
            .grow(0.9, false, rng);
        let corona = wide.grow(0.75, false, rng);

        let mut drawn = 0;
        for i in 0..FILL_LAYERS {
            if i == FILL_LAYERS / 3 || i == 2 * FILL_LAYERS / 3 {
                primary = primary.grow(1.0, false, rng);
                wide = wide.grow(1.0, false, rng);
            }
            primary.grow(0.1, false, rng).layer(mask, intensity / 2.0, border);
            shrunk.grow(0.1, true, rng).layer(mask, intensity / 4.0, border);
            wide.grow(0.1, false, rng).layer(mask, intensity / 3.0, border);
            corona
                .grow(0.8, false, rng)
                .grow(0.1, true, rng)
                .layer(mask, intensity / 3.0, border);
            drawn += 4;
            base.erase(mask, erase_strength, rng);
        }
        debug!(
            "Watercolor::composite: {} vertices, {} layers, bleed {:.2}",
            vertices.len(),
            drawn,
            settings.bleed
        );
        drawn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterCanvas;

    fn square(side: f32) -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(side, 0.0),
            Vec2::new(side, side),
            Vec2::new(0.0, side),
        ]
    }

    #[test]
    fn test_settings_clamp_bleed() {
        let s = FillSettings::new(Color::BLACK, 80.0).with_bleed(2.0, BleedDirection::In);
        assert_eq!(s.bleed, MAX_BLEED);
        assert_eq!(s.direction, BleedDirection::In);
        assert!((s.intensity() - 80.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_polygon_keeps_vertices() {
        let mut rng = Random::seeded(4);
        let pts = square(10.0);
        let poly = FillPolygon::from_polygon(&pts, 0.1, BleedDirection::Out, &mut rng);
        assert_eq!(poly.len(), 4);
        assert_eq!(poly.multipliers().len(), 4);
        assert!(pts.iter().all(|p| poly.vertices().contains(p)));
        assert_eq!(poly.centroid(), Vec2::new(5.0, 5.0));
        assert_eq!(poly.size(), 10.0);
        assert!(poly.multipliers().iter().all(|m| (0.079..=0.181).contains(m)));
    }

    #[test]
    fn test_small_growth_never_loses_vertices() {
        let mut rng = Random::seeded(8);
        let poly = FillPolygon::from_polygon(&square(50.0), 0.07, BleedDirection::Out, &mut rng);
        let once = poly.grow(0.0, false, &mut rng);
        let twice = once.grow(0.0, false, &mut rng);
        assert!(once.len() >= poly.len());
        assert!(twice.len() >= once.len());
        assert_eq!(twice.len(), 16);
    }

    #[test]
    fn test_grow_does_not_mutate_source() {
        let mut rng = Random::seeded(2);
        let poly = FillPolygon::from_polygon(&square(20.0), 0.2, BleedDirection::Out, &mut rng);
        let before = poly.clone();
        let _ = poly.grow(1.0, false, &mut rng);
        assert_eq!(poly, before);
    }

    #[test]
    fn test_grow_pushes_outward() {
        let mut rng = Random::seeded(12);
        let poly = FillPolygon::from_polygon(&square(100.0), 0.3, BleedDirection::Out, &mut rng);
        let grown = poly.grow(1.0, false, &mut rng);
        let area_before = signed_area(poly.vertices()).abs();
        let area_after = signed_area(grown.vertices()).abs();
        assert!(area_after > area_before, "{area_after} <= {area_before}");

        let inward = FillPolygon::from_polygon(&square(100.0), 0.3, BleedDirection::In, &mut rng);
        let shrunk = inward.grow(1.0, false, &mut rng);
        assert!(signed_area(shrunk.vertices()).abs() < area_before);
    }

    #[test]
    fn test_trim_removes_middle() {
        let mut rng = Random::seeded(3);
        let pts: Vec<Vec2> = (0..20)
            .map(|i| {
                let a = i as f32 / 20.0 * std::f32::consts::TAU;
                Vec2::new(a.cos(), a.sin()) * 30.0
            })
            .collect();
        let poly = FillPolygon::from_polygon(&pts, 0.07, BleedDirection::Out, &mut rng);
        let (kept, multipliers) = poly.trim(0.5);
        assert_eq!(kept.len(), 10);
        assert_eq!(multipliers.len(), 10);
        assert_eq!(kept[0], poly.vertices()[0]);
        assert_eq!(kept[9], poly.vertices()[19]);
        assert_eq!(poly.grow(0.5, false, &mut rng).len(), 20);
    }

    #[test]
    fn test_erase_restores_blend_mode() {
        let mut rng = Random::seeded(6);
        let mut mask = RasterCanvas::new(60, 60);
        mask.fill_background(Color::MASK_RED);
        let poly = FillPolygon::from_polygon(&square(40.0), 0.07, BleedDirection::Out, &mut rng);
        poly.erase(&mut mask, 0.5, &mut rng);
        assert_eq!(mask.blend_mode(), BlendMode::Normal);
        assert!(mask.pixels().iter().any(|p| p[3] < 1.0));
    }

    #[test]
    fn test_erase_hole_radius_follows_size() {
        use crate::testing::{Primitive, RecordingCanvas};
        let mut rng = Random::seeded(6);
        let mut mask = RecordingCanvas::new(60.0, 60.0);
        let poly = FillPolygon::from_polygon(&square(40.0), 0.07, BleedDirection::Out, &mut rng);
        poly.erase(&mut mask, 0.5, &mut rng);
        let diameters: Vec<f32> = mask
            .calls
            .iter()
            .filter_map(|call| match call {
                Primitive::Circle { diameter, .. } => Some(*diameter),
                _ => None,
            })
            .collect();
        assert!((70..=100).contains(&diameters.len()));
        assert_eq!(mask.erased, diameters.len());
        for d in &diameters {
            let (low, high) = (2.0 * 0.03 * poly.size, 2.0 * 0.2 * poly.size);
            assert!(*d >= low - 1e-4 && *d <= high + 1e-4, "{d}");
        }
        assert!(diameters.iter().any(|d| *d > 0.2 * poly.size));
    }

    #[test]
    fn test_composite_draws_into_mask() {
        let mut rng = Random::seeded(10);
        let mut mask = RasterCanvas::new(100, 100);
        let settings = FillSettings::new(Color::rgb8(30, 90, 200), 120.0);
        let outline: Vec<Vec2> = square(50.0).iter().map(|p| *p + Vec2::splat(25.0)).collect();
        let drawn =
            Watercolor::composite(&outline, Affine2::IDENTITY, &settings, &mut rng, &mut mask);
        assert_eq!(drawn, 4 * FILL_LAYERS);
        assert!(mask.coverage(50, 50) > 0.0);
        assert_eq!(mask.coverage(0, 0), 0.0);
    }

    #[test]
    fn test_composite_rejects_degenerate_outline() {
        let mut rng = Random::seeded(10);
        let mut mask = RasterCanvas::new(10, 10);
        let settings = FillSettings::new(Color::BLACK, 100.0);
        let drawn = Watercolor::composite(
            &[Vec2::ZERO, Vec2::ONE],
            Affine2::IDENTITY,
            &settings,
            &mut rng,
            &mut mask,
        );
        assert_eq!(drawn, 0);
        assert_eq!(mask.painted_pixels(), 0);
    }
}
