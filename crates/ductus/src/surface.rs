//! Host drawing surface abstraction
//!
//! The engine never touches pixels itself. It asks a [`Surface`] to draw
//! primitives in canvas units and a [`Canvas`] to hand out offscreen buffers
//! and run a per-pixel shader over them. [`crate::raster::RasterCanvas`] is
//! the CPU reference host.

use glam::{Affine2, Vec2};

use crate::brush::TipImage;
use crate::types::{BlendMode, Color};

/// Fill and outline for a closed path
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Paint {
    pub fill: Option<Color>,
    /// Outline color and width
    pub stroke: Option<(Color, f32)>,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
        }
    }

    pub fn fill_and_stroke(color: Color, width: f32) -> Self {
        Self {
            fill: Some(color),
            stroke: Some((color, width)),
        }
    }
}

/// Primitive drawing services of a host surface.
///
/// Coordinates are canvas units; the host maps them to its own pixels.
/// In [`BlendMode::Erase`] every primitive subtracts its alpha from the
/// destination instead of painting.
pub trait Surface {
    /// Logical size in canvas units
    fn size(&self) -> Vec2;

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn blend_mode(&self) -> BlendMode;

    fn circle(&mut self, center: Vec2, diameter: f32, color: Color);

    fn rect(&mut self, origin: Vec2, size: Vec2, color: Color);

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color);

    /// Closed path through `points`
    fn polygon(&mut self, points: &[Vec2], paint: &Paint);

    /// Draw an image tip centered on `center`, `size` units across, rotated
    /// by `rotation` degrees and tinted with `tint`
    fn stamp(&mut self, image: &TipImage, center: Vec2, size: f32, rotation: f32, tint: Color);

    /// Reset every pixel to transparent
    fn clear(&mut self);

    /// Pixel grid dimensions
    fn pixel_size(&self) -> (u32, u32);

    /// Straight RGBA at a pixel, None out of bounds
    fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]>;

    /// Alpha at a pixel, 0 out of bounds
    fn coverage(&self, x: u32, y: u32) -> f32 {
        self.pixel(x, y).map(|p| p[3]).unwrap_or(0.0)
    }
}

/// Per-pixel program run by [`Canvas::run_shader`]
pub trait PixelShader {
    /// New canvas color from the current one and the mask sample at the same pixel
    fn shade(&self, dst: [f32; 4], mask: [f32; 4], x: u32, y: u32) -> [f32; 4];
}

/// The main drawing surface, able to allocate offscreen buffers and composite them
pub trait Canvas: Surface {
    type Buffer: Surface;

    /// Transparent buffer matching this canvas in size and density
    fn offscreen(&self) -> Self::Buffer;

    /// Run `shader` over every canvas pixel with `mask` bound as its second input
    fn run_shader(&mut self, mask: &Self::Buffer, shader: &dyn PixelShader);
}

/// Drawing interface handed to custom tip procedures.
///
/// Coordinates are local to the tip: origin at the tip position, x along
/// the rotation, one unit per unit of tip scale.
pub trait TipPainter {
    fn circle(&mut self, center: Vec2, diameter: f32);
    fn rect(&mut self, origin: Vec2, size: Vec2);
    fn line(&mut self, from: Vec2, to: Vec2, width: f32);
}

/// [`TipPainter`] that maps local tip coordinates onto a surface
pub struct LocalPainter<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
    transform: Affine2,
    color: Color,
    scale: f32,
}

impl<'a, S: Surface + ?Sized> LocalPainter<'a, S> {
    pub fn new(surface: &'a mut S, transform: Affine2, color: Color) -> Self {
        Self {
            surface,
            scale: transform_scale(&transform),
            transform,
            color,
        }
    }
}

impl<S: Surface + ?Sized> TipPainter for LocalPainter<'_, S> {
    fn circle(&mut self, center: Vec2, diameter: f32) {
        let center = self.transform.transform_point2(center);
        self.surface.circle(center, diameter * self.scale, self.color);
    }

    fn rect(&mut self, origin: Vec2, size: Vec2) {
        let corners = [
            origin,
            origin + Vec2::new(size.x, 0.0),
            origin + size,
            origin + Vec2::new(0.0, size.y),
        ]
        .map(|p| self.transform.transform_point2(p));
        self.surface.polygon(&corners, &Paint::fill(self.color));
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32) {
        let from = self.transform.transform_point2(from);
        let to = self.transform.transform_point2(to);
        self.surface.line(from, to, width * self.scale, self.color);
    }
}

/// Uniform scale carried by a transform
pub fn transform_scale(transform: &Affine2) -> f32 {
    transform.matrix2.determinant().abs().sqrt()
}
