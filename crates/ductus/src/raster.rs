//! CPU reference host: straight-alpha RGBA f32 pixels

use std::path::Path;

use glam::Vec2;
use tracing::debug;

use crate::brush::TipImage;
use crate::random::{cos, sin};
use crate::surface::{Canvas, Paint, PixelShader, Surface};
use crate::types::{BlendMode, Color};

/// CPU canvas storing straight (non-premultiplied) RGBA as `[f32; 4]`
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    /// Pixel dimensions
    pub width: u32,
    pub height: u32,
    /// Pixels per canvas unit
    density: f32,
    blend_mode: BlendMode,
    pixels: Vec<[f32; 4]>,
}

impl RasterCanvas {
    /// Transparent canvas, one pixel per unit
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_density(width, height, 1.0)
    }

    /// Transparent canvas of `width` x `height` units at `density` pixels per unit
    pub fn with_density(width: u32, height: u32, density: f32) -> Self {
        let density = if density > 0.0 { density } else { 1.0 };
        let pw = (width as f32 * density) as u32;
        let ph = (height as f32 * density) as u32;
        Self {
            width: pw,
            height: ph,
            density,
            blend_mode: BlendMode::Normal,
            pixels: vec![[0.0; 4]; (pw as usize) * (ph as usize)],
        }
    }

    /// Canvas sized from a configuration
    pub fn from_config(config: &ductus_config::CanvasConfig) -> Self {
        Self::with_density(config.width, config.height, config.density)
    }

    #[inline]
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Fill every pixel with one color
    pub fn fill_background(&mut self, color: Color) {
        self.pixels.fill(color.0);
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    /// Composite `color` at `coverage` onto one pixel according to the blend mode
    #[inline]
    fn apply(&mut self, x: u32, y: u32, color: Color, coverage: f32) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        let amount = (color.alpha() * coverage).clamp(0.0, 1.0);
        if amount <= 0.0 {
            return;
        }
        let dst = self.pixels[index];
        self.pixels[index] = match self.blend_mode {
            BlendMode::Normal => {
                let out_alpha = amount + dst[3] * (1.0 - amount);
                if out_alpha <= f32::EPSILON {
                    [0.0; 4]
                } else {
                    let mix =
                        |c: f32, d: f32| (c * amount + d * dst[3] * (1.0 - amount)) / out_alpha;
                    [
                        mix(color.0[0], dst[0]),
                        mix(color.0[1], dst[1]),
                        mix(color.0[2], dst[2]),
                        out_alpha,
                    ]
                }
            }
            // Destination-out: only alpha is reduced for straight color
            BlendMode::Erase => [dst[0], dst[1], dst[2], dst[3] * (1.0 - amount)],
        };
    }

    /// Pixel bounds (inclusive min, exclusive max) of a canvas-unit box
    fn pixel_box(&self, min: Vec2, max: Vec2) -> Option<(u32, u32, u32, u32)> {
        let min = (min * self.density).floor().max(Vec2::ZERO);
        let max = (max * self.density).ceil();
        let x_max = max.x.min(self.width as f32);
        let y_max = max.y.min(self.height as f32);
        if !(min.x < x_max && min.y < y_max) {
            return None;
        }
        Some((min.x as u32, min.y as u32, x_max as u32, y_max as u32))
    }

    /// Canvas-unit position of a pixel center
    #[inline]
    fn center_of(&self, x: u32, y: u32) -> Vec2 {
        Vec2::new(x as f32 + 0.5, y as f32 + 0.5) / self.density
    }

    /// Distance-based coverage for a shape edge, one pixel of antialiasing
    #[inline]
    fn edge_coverage(&self, signed_inside: f32) -> f32 {
        (signed_inside * self.density + 0.5).clamp(0.0, 1.0)
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Color) {
        let min = points.iter().copied().fold(Vec2::splat(f32::INFINITY), Vec2::min);
        let max = points.iter().copied().fold(Vec2::splat(f32::NEG_INFINITY), Vec2::max);
        let Some((x0, y0, x1, y1)) = self.pixel_box(min, max) else {
            return;
        };
        let n = points.len();
        let mut crossings = Vec::new();
        for py in y0..y1 {
            let y = (py as f32 + 0.5) / self.density;
            crossings.clear();
            for i in 0..n {
                let (a, b) = (points[i], points[(i + 1) % n]);
                if (a.y <= y) != (b.y <= y) {
                    crossings.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
            crossings.sort_by(f32::total_cmp);
            for span in crossings.chunks_exact(2) {
                for px in x0..x1 {
                    let x = (px as f32 + 0.5) / self.density;
                    if x >= span[0] && x < span[1] {
                        self.apply(px, py, color, 1.0);
                    }
                }
            }
        }
    }

    /// Raw pixel data as bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[inline]
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    /// Pixels with nonzero alpha
    pub fn painted_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] > 0.0).count()
    }

    /// 8-bit RGBA copy
    pub fn to_rgba8(&self) -> image::RgbaImage {
        let bytes: Vec<u8> = self
            .pixels
            .iter()
            .flat_map(|p| p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect();
        image::RgbaImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| image::RgbaImage::new(self.width, self.height))
    }

    /// Encode the canvas as a PNG file
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), image::ImageError> {
        let path = path.as_ref();
        debug!("RasterCanvas::save_png: {}x{} -> {}", self.width, self.height, path.display());
        self.to_rgba8().save_with_format(path, image::ImageFormat::Png)
    }
}

impl Surface for RasterCanvas {
    fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) / self.density
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    fn circle(&mut self, center: Vec2, diameter: f32, color: Color) {
        let radius = diameter * 0.5;
        if radius.is_nan() || radius <= 0.0 || !center.is_finite() {
            return;
        }
        let pad = Vec2::splat(radius + 1.0 / self.density);
        let Some((x0, y0, x1, y1)) = self.pixel_box(center - pad, center + pad) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let d = self.center_of(px, py).distance(center);
                let coverage = self.edge_coverage(radius - d);
                if coverage > 0.0 {
                    self.apply(px, py, color, coverage);
                }
            }
        }
    }

    fn rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        let min = origin.min(origin + size);
        let max = origin.max(origin + size);
        let Some((x0, y0, x1, y1)) = self.pixel_box(min, max) else {
            return;
        };
        for py in y0..y1 {
            for px in x0..x1 {
                let p = self.center_of(px, py);
                if p.x >= min.x && p.x < max.x && p.y >= min.y && p.y < max.y {
                    self.apply(px, py, color, 1.0);
                }
            }
        }
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        let half = width * 0.5;
        if half.is_nan() || half <= 0.0 || !from.is_finite() || !to.is_finite() {
            return;
        }
        let pad = Vec2::splat(half + 1.0 / self.density);
        let Some((x0, y0, x1, y1)) = self.pixel_box(from.min(to) - pad, from.max(to) + pad) else {
            return;
        };
        let dir = to - from;
        let len_sq = dir.length_squared();
        for py in y0..y1 {
            for px in x0..x1 {
                let p = self.center_of(px, py);
                let t = if len_sq > 0.0 {
                    ((p - from).dot(dir) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let d = p.distance(from + dir * t);
                let coverage = self.edge_coverage(half - d);
                if coverage > 0.0 {
                    self.apply(px, py, color, coverage);
                }
            }
        }
    }

    fn polygon(&mut self, points: &[Vec2], paint: &Paint) {
        if points.len() < 3 || points.iter().any(|p| !p.is_finite()) {
            return;
        }
        if let Some(color) = paint.fill {
            self.fill_polygon(points, color);
        }
        if let Some((color, width)) = paint.stroke {
            for i in 0..points.len() {
                self.line(points[i], points[(i + 1) % points.len()], width, color);
            }
        }
    }

    fn stamp(&mut self, image: &TipImage, center: Vec2, size: f32, rotation: f32, tint: Color) {
        if size.is_nan() || size <= 0.0 || image.width == 0 || image.height == 0 {
            return;
        }
        // Half diagonal bounds any rotation of the square stamp
        let reach = Vec2::splat(size * std::f32::consts::FRAC_1_SQRT_2);
        let Some((x0, y0, x1, y1)) = self.pixel_box(center - reach, center + reach) else {
            return;
        };
        let (s, c) = (sin(rotation), cos(rotation));
        for py in y0..y1 {
            for px in x0..x1 {
                let d = self.center_of(px, py) - center;
                let local = Vec2::new(d.x * c + d.y * s, -d.x * s + d.y * c);
                let coverage = image.sample(local.x / size + 0.5, local.y / size + 0.5);
                if coverage > 0.0 {
                    self.apply(px, py, tint, coverage);
                }
            }
        }
    }

    fn clear(&mut self) {
        self.pixels.fill([0.0; 4]);
    }

    fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        self.index(x, y).map(|i| self.pixels[i])
    }
}

impl Canvas for RasterCanvas {
    type Buffer = RasterCanvas;

    fn offscreen(&self) -> RasterCanvas {
        RasterCanvas {
            width: self.width,
            height: self.height,
            density: self.density,
            blend_mode: BlendMode::Normal,
            pixels: vec![[0.0; 4]; self.pixels.len()],
        }
    }

    fn run_shader(&mut self, mask: &RasterCanvas, shader: &dyn PixelShader) {
        let width = self.width;
        for (i, dst) in self.pixels.iter_mut().enumerate() {
            let (x, y) = ((i as u32) % width, (i as u32) / width);
            let sample = mask.pixel(x, y).unwrap_or([0.0; 4]);
            *dst = shader.shade(*dst, sample, x, y);
        }
    }
}
