//! Recording host used by unit tests

use glam::Vec2;

use crate::brush::TipImage;
use crate::surface::{Canvas, Paint, PixelShader, Surface};
use crate::types::{BlendMode, Color};

/// One primitive call received by a [`RecordingCanvas`]
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Circle {
        center: Vec2,
        diameter: f32,
        color: Color,
    },
    Rect {
        origin: Vec2,
        size: Vec2,
        color: Color,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f32,
        color: Color,
    },
    Polygon {
        points: Vec<Vec2>,
        paint: Paint,
    },
    Stamp {
        center: Vec2,
        size: f32,
        rotation: f32,
        tint: Color,
    },
}

/// Surface that records calls instead of drawing
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    size: Vec2,
    blend_mode: BlendMode,
    pub calls: Vec<Primitive>,
    /// Calls made in erase mode
    pub erased: usize,
    /// Mask contents at every shader pass
    pub shader_runs: Vec<Vec<Primitive>>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            blend_mode: BlendMode::Normal,
            calls: Vec::new(),
            erased: 0,
            shader_runs: Vec::new(),
        }
    }

    fn record(&mut self, primitive: Primitive) {
        if self.blend_mode == BlendMode::Erase {
            self.erased += 1;
        }
        self.calls.push(primitive);
    }
}

impl Surface for RecordingCanvas {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    fn circle(&mut self, center: Vec2, diameter: f32, color: Color) {
        self.record(Primitive::Circle {
            center,
            diameter,
            color,
        });
    }

    fn rect(&mut self, origin: Vec2, size: Vec2, color: Color) {
        self.record(Primitive::Rect {
            origin,
            size,
            color,
        });
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Color) {
        self.record(Primitive::Line {
            from,
            to,
            width,
            color,
        });
    }

    fn polygon(&mut self, points: &[Vec2], paint: &Paint) {
        self.record(Primitive::Polygon {
            points: points.to_vec(),
            paint: *paint,
        });
    }

    fn stamp(&mut self, _image: &TipImage, center: Vec2, size: f32, rotation: f32, tint: Color) {
        self.record(Primitive::Stamp {
            center,
            size,
            rotation,
            tint,
        });
    }

    fn clear(&mut self) {
        self.calls.clear();
        self.erased = 0;
    }

    fn pixel_size(&self) -> (u32, u32) {
        (self.size.x.round() as u32, self.size.y.round() as u32)
    }

    fn pixel(&self, _x: u32, _y: u32) -> Option<[f32; 4]> {
        None
    }
}

impl Canvas for RecordingCanvas {
    type Buffer = RecordingCanvas;

    fn offscreen(&self) -> Self::Buffer {
        RecordingCanvas::new(self.size.x, self.size.y)
    }

    fn run_shader(&mut self, mask: &Self::Buffer, _shader: &dyn PixelShader) {
        self.shader_runs.push(mask.calls.clone());
    }
}
