//! Flow fields: grids of directions that bend strokes passing through them
//!
//! A [`FlowField`] covers the canvas extended by half its size on every side
//! so strokes that start near an edge still feel the field. Each registered
//! field owns a [`FieldGenerator`] and, once selected, its own generated
//! [`FieldGrid`]. Grid dimensions are fixed when the field set is created;
//! refreshing only rewrites cell contents.

use glam::Vec2;
use noise::{NoiseFn, Perlin};
use tracing::debug;

use crate::constants::FIELD_RESOLUTION_FACTOR;
use crate::error::DrawError;
use crate::random::{Random, cos, map, sin};

/// Column-major grid of angles in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGrid {
    columns: usize,
    rows: usize,
    values: Vec<f32>,
}

impl FieldGrid {
    /// Create a zeroed grid
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            values: vec![0.0; columns * rows],
        }
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Angle at a cell, None outside the grid
    #[inline]
    pub fn get(&self, column: usize, row: usize) -> Option<f32> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some(self.values[column * self.rows + row])
    }

    /// Set a cell; out-of-range writes are ignored
    #[inline]
    pub fn set(&mut self, column: usize, row: usize, angle: f32) {
        if column >= self.columns || row >= self.rows {
            return;
        }
        self.values[column * self.rows + row] = angle;
    }

    /// Set every cell from a function of (column, row)
    pub fn fill_with(&mut self, mut f: impl FnMut(usize, usize) -> f32) {
        for column in 0..self.columns {
            for row in 0..self.rows {
                self.values[column * self.rows + row] = f(column, row);
            }
        }
    }
}

/// Produces field contents for a point in time
pub trait FieldGenerator {
    fn generate(&self, t: f32, grid: &mut FieldGrid);
}

impl<F> FieldGenerator for F
where
    F: Fn(f32, &mut FieldGrid),
{
    fn generate(&self, t: f32, grid: &mut FieldGrid) {
        self(t, grid)
    }
}

/// Perlin noise remapped to [0, 1]
fn noise01(perlin: &Perlin, x: f32, y: f32) -> f32 {
    ((perlin.get([x as f64, y as f64]) as f32) + 1.0) * 0.5
}

/// Pick a magnitude from one of two ranges with equal odds
fn signed_range(rng: &mut Random, negative: (i32, i32), positive: (i32, i32)) -> f32 {
    if rng.chance(0.5) {
        rng.int(positive.0, positive.1) as f32
    } else {
        rng.int(negative.0, negative.1) as f32
    }
}

/// Smooth noise-driven bends
#[derive(Debug, Clone)]
pub struct Curved {
    perlin: Perlin,
    range: f32,
}

impl Curved {
    pub fn new(rng: &mut Random) -> Self {
        Self {
            perlin: Perlin::new(rng.int(0, i32::MAX) as u32),
            range: signed_range(rng, (-20, -10), (10, 15)),
        }
    }
}

impl FieldGenerator for Curved {
    fn generate(&self, t: f32, grid: &mut FieldGrid) {
        grid.fill_with(|column, row| {
            let n = noise01(
                &self.perlin,
                column as f32 * 0.02 + t * 0.03,
                row as f32 * 0.02 + t * 0.03,
            );
            map(n, 0.0, 1.0, -self.range, self.range, false)
        });
    }
}

/// Noise bends quantized into discrete steps
#[derive(Debug, Clone)]
pub struct Truncated {
    perlin: Perlin,
    range: f32,
    step: f32,
}

impl Truncated {
    pub fn new(rng: &mut Random) -> Self {
        Self {
            perlin: Perlin::new(rng.int(0, i32::MAX) as u32),
            range: signed_range(rng, (-25, -15), (15, 25)),
            step: rng.int(5, 10) as f32,
        }
    }
}

impl FieldGenerator for Truncated {
    fn generate(&self, t: f32, grid: &mut FieldGrid) {
        let range = self.range + self.range.signum() * 5.0 * sin(t);
        grid.fill_with(|column, row| {
            let n = noise01(&self.perlin, column as f32 * 0.02, row as f32 * 0.02);
            let angle = map(n, 0.0, 1.0, -range, range, false);
            (angle / self.step).round() * self.step
        });
    }
}

/// Alternating diagonal directions
#[derive(Debug, Clone)]
pub struct Zigzag {
    range: f32,
}

impl Zigzag {
    pub fn new(rng: &mut Random) -> Self {
        Self {
            range: signed_range(rng, (-30, -15), (15, 30)),
        }
    }
}

impl FieldGenerator for Zigzag {
    fn generate(&self, t: f32, grid: &mut FieldGrid) {
        let swing = (44.0 * sin(t)).abs();
        let range = self.range - self.range.signum() * swing.min(self.range.abs());
        let mut angle = 0.0;
        let mut diff = range;
        for column in 0..grid.columns() {
            for row in 0..grid.rows() {
                grid.set(column, row, angle);
                angle += diff;
                diff = -diff;
            }
            angle += diff;
            diff = -diff;
        }
    }
}

/// Rolling sinusoidal waves
#[derive(Debug, Clone)]
pub struct Waves {
    sin_range: f32,
    cos_range: f32,
    base_angle: f32,
    seed: u32,
}

impl Waves {
    pub fn new(rng: &mut Random) -> Self {
        Self {
            sin_range: rng.int(10, 15) as f32,
            cos_range: rng.int(3, 6) as f32,
            base_angle: rng.int(20, 35) as f32,
            seed: rng.int(0, i32::MAX) as u32,
        }
    }
}

impl FieldGenerator for Waves {
    fn generate(&self, t: f32, grid: &mut FieldGrid) {
        let sin_range = self.sin_range + 5.0 * sin(t);
        let cos_range = self.cos_range + 3.0 * cos(t);
        grid.fill_with(|column, row| {
            let wave =
                sin(sin_range * column as f32) * (self.base_angle * cos(row as f32 * cos_range));
            wave + cell_jitter(self.seed, column, row) * 3.0
        });
    }
}

/// Slow ripples like sand under water
#[derive(Debug, Clone)]
pub struct Seabed {
    base_size: f32,
    base_angle: f32,
    addition: f32,
}

impl Seabed {
    pub fn new(rng: &mut Random) -> Self {
        Self {
            base_size: rng.range(0.4, 0.8),
            base_angle: rng.int(18, 26) as f32,
            addition: rng.int(15, 20) as f32,
        }
    }
}

impl FieldGenerator for Seabed {
    fn generate(&self, t: f32, grid: &mut FieldGrid) {
        grid.fill_with(|column, row| {
            let ripple = sin(self.base_size * (row as f32 * 8.0 + t) + column as f32 * 2.0);
            let drift = cos(self.base_size * column as f32 * 6.0 + t);
            self.base_angle * ripple + self.addition * drift * 0.5
        });
    }
}

/// Stable pseudo-random value in [-1, 1] for a grid cell
fn cell_jitter(seed: u32, column: usize, row: usize) -> f32 {
    let mut h = seed
        ^ (column as u32).wrapping_mul(0x9E37_79B1)
        ^ (row as u32).wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    (h as f32 / u32::MAX as f32) * 2.0 - 1.0
}

struct FieldEntry {
    name: String,
    generator: Box<dyn FieldGenerator>,
    grid: Option<FieldGrid>,
}

/// Registry of named flow fields over a fixed grid
pub struct FlowField {
    resolution: f32,
    origin: Vec2,
    canvas: Vec2,
    columns: usize,
    rows: usize,
    fields: Vec<FieldEntry>,
    active: Option<usize>,
}

impl std::fmt::Debug for FlowField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowField")
            .field("resolution", &self.resolution)
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("fields", &self.names())
            .field("active", &self.active())
            .finish()
    }
}

impl FlowField {
    /// Names of the fields registered on creation
    pub const BUILT_IN: [&'static str; 5] = ["curved", "truncated", "zigzag", "waves", "seabed"];

    /// Create the field set for a canvas and register the built-in generators.
    ///
    /// Built-in styles draw their random parameters here, once, so later
    /// refreshes animate around a fixed look. No field is active yet.
    pub fn new(width: f32, height: f32, rng: &mut Random) -> Self {
        let resolution = (width * FIELD_RESOLUTION_FACTOR).max(f32::EPSILON);
        let columns = ((2.0 * width / resolution).round() as usize).max(1);
        let rows = ((2.0 * height / resolution).round() as usize).max(1);

        let mut field = Self {
            resolution,
            origin: Vec2::new(-0.5 * width, -0.5 * height),
            canvas: Vec2::new(width, height),
            columns,
            rows,
            fields: Vec::new(),
            active: None,
        };
        field.register("curved", Box::new(Curved::new(rng)));
        field.register("truncated", Box::new(Truncated::new(rng)));
        field.register("zigzag", Box::new(Zigzag::new(rng)));
        field.register("waves", Box::new(Waves::new(rng)));
        field.register("seabed", Box::new(Seabed::new(rng)));
        field
    }

    fn register(&mut self, name: &str, generator: Box<dyn FieldGenerator>) -> usize {
        let entry = FieldEntry {
            name: name.to_string(),
            generator,
            grid: None,
        };
        match self.fields.iter().position(|f| f.name == name) {
            Some(index) => {
                self.fields[index] = entry;
                index
            }
            None => {
                self.fields.push(entry);
                self.fields.len() - 1
            }
        }
    }

    fn generate(&mut self, index: usize, t: f32) {
        let (columns, rows) = (self.columns, self.rows);
        let entry = &mut self.fields[index];
        let grid = entry.grid.get_or_insert_with(|| FieldGrid::new(columns, rows));
        entry.generator.generate(t, grid);
        debug!(
            "FlowField: generated '{}' ({}x{}) at t={:.2}",
            entry.name, columns, rows, t
        );
    }

    /// Register a field, generate it, and make it active
    pub fn add(&mut self, name: impl Into<String>, generator: impl FieldGenerator + 'static) {
        let name = name.into();
        let index = self.register(&name, Box::new(generator));
        self.generate(index, 0.0);
        self.active = Some(index);
    }

    /// Activate a field, generating it on first use
    pub fn select(&mut self, name: &str) -> Result<(), DrawError> {
        let index = self
            .fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| DrawError::UnknownField(name.to_string()))?;
        if self.fields[index].grid.is_none() {
            self.generate(index, 0.0);
        }
        self.active = Some(index);
        Ok(())
    }

    /// Turn off field influence
    pub fn disable(&mut self) {
        self.active = None;
    }

    /// Regenerate the active field at time `t`
    pub fn refresh(&mut self, t: f32) {
        if let Some(index) = self.active {
            self.generate(index, t);
        }
    }

    /// Registered field names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Name of the active field
    pub fn active(&self) -> Option<&str> {
        self.active.map(|i| self.fields[i].name.as_str())
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Cell size in canvas units
    #[inline]
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Grid dimensions (columns, rows)
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Cell indices for a canvas point, None outside the grid
    pub fn cell(&self, point: Vec2) -> Option<(usize, usize)> {
        let offset = (point - self.origin) / self.resolution;
        let column = offset.x.round();
        let row = offset.y.round();
        if column < 0.0 || row < 0.0 || !column.is_finite() || !row.is_finite() {
            return None;
        }
        let (column, row) = (column as usize, row as usize);
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some((column, row))
    }

    /// Field angle at a canvas point; None when no field is active or the point is outside
    pub fn angle_at(&self, point: Vec2) -> Option<f32> {
        let grid = self.fields[self.active?].grid.as_ref()?;
        let (column, row) = self.cell(point)?;
        grid.get(column, row)
    }

    /// Whether a canvas point lies within the region strokes may travel
    pub fn contains_canvas(&self, point: Vec2) -> bool {
        let max = self.origin + self.canvas * 2.0;
        point.x >= self.origin.x && point.y >= self.origin.y && point.x <= max.x && point.y <= max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> FlowField {
        let mut rng = Random::seeded(5);
        FlowField::new(200.0, 100.0, &mut rng)
    }

    #[test]
    fn test_dimensions_cover_extended_canvas() {
        let f = field();
        assert!((f.resolution() - 2.0).abs() < 1e-6);
        assert_eq!(f.dimensions(), (200, 100));
        assert_eq!(f.names(), FlowField::BUILT_IN.to_vec());
        assert!(!f.is_active());
    }

    #[test]
    fn test_no_influence_until_selected() {
        let mut f = field();
        assert_eq!(f.angle_at(Vec2::new(50.0, 50.0)), None);
        f.select("curved").unwrap();
        assert_eq!(f.active(), Some("curved"));
        assert!(f.angle_at(Vec2::new(50.0, 50.0)).is_some());
        f.disable();
        assert_eq!(f.angle_at(Vec2::new(50.0, 50.0)), None);
    }

    #[test]
    fn test_unknown_field() {
        let mut f = field();
        assert!(matches!(f.select("nope"), Err(DrawError::UnknownField(_))));
    }

    #[test]
    fn test_outside_grid_is_not_in_field() {
        let mut f = field();
        f.select("zigzag").unwrap();
        assert_eq!(f.angle_at(Vec2::new(-500.0, 0.0)), None);
        assert_eq!(f.angle_at(Vec2::new(0.0, 10_000.0)), None);
    }

    #[test]
    fn test_add_activates_custom_generator() {
        let mut f = field();
        f.add("flat", |_t: f32, grid: &mut FieldGrid| grid.fill_with(|_, _| 12.5));
        assert_eq!(f.active(), Some("flat"));
        assert_eq!(f.angle_at(Vec2::new(10.0, 10.0)), Some(12.5));
        assert!(f.names().contains(&"flat"));
    }

    #[test]
    fn test_refresh_keeps_dimensions_and_animates() {
        let mut f = field();
        f.add("clock", |t: f32, grid: &mut FieldGrid| grid.fill_with(|_, _| t));
        f.refresh(3.0);
        assert_eq!(f.angle_at(Vec2::new(0.0, 0.0)), Some(3.0));
        assert_eq!(f.dimensions(), (200, 100));
    }

    #[test]
    fn test_builtins_stay_in_plausible_ranges() {
        let mut f = field();
        for name in FlowField::BUILT_IN {
            f.select(name).unwrap();
            f.refresh(10.0);
            for (x, y) in [(0.0, 0.0), (120.0, 40.0), (199.0, 99.0)] {
                let a = f.angle_at(Vec2::new(x, y)).unwrap();
                assert!(a.is_finite() && a.abs() < 120.0, "{name}: {a}");
            }
        }
    }

    #[test]
    fn test_reselect_does_not_regenerate() {
        let mut f = field();
        f.select("curved").unwrap();
        let before = f.angle_at(Vec2::new(30.0, 30.0));
        f.select("waves").unwrap();
        f.select("curved").unwrap();
        assert_eq!(f.angle_at(Vec2::new(30.0, 30.0)), before);
    }

    #[test]
    fn test_contains_canvas_margin() {
        let f = field();
        assert!(f.contains_canvas(Vec2::new(-99.0, -49.0)));
        assert!(!f.contains_canvas(Vec2::new(-101.0, 0.0)));
        assert!(f.contains_canvas(Vec2::new(299.0, 149.0)));
    }
}
