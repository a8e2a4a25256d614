//! Fill selection and the watercolor pass through the mixer

use glam::Vec2;
use tracing::debug;

use crate::fill::{BleedDirection, FillSettings, Watercolor};
use crate::surface::Canvas;
use crate::types::Color;

use super::Renderer;

impl<C: Canvas> Renderer<C> {
    /// Enable watercolor fills. Bleed and texture carry over from the previous fill.
    pub fn fill(&mut self, color: Color, opacity: f32) {
        let settings = match self.ctx.fill {
            Some(previous) => FillSettings {
                color,
                opacity: FillSettings::new(color, opacity).opacity,
                ..previous
            },
            None => FillSettings::new(color, opacity),
        };
        self.ctx.fill = Some(settings);
    }

    /// Bleed strength and direction of the active fill
    pub fn bleed(&mut self, strength: f32, direction: BleedDirection) {
        match &mut self.ctx.fill {
            Some(settings) => *settings = settings.with_bleed(strength, direction),
            None => debug!("bleed: no active fill, ignored"),
        }
    }

    /// Paper texture and rim weight of the active fill, both 0..1
    pub fn fill_texture(&mut self, texture: f32, border: f32) {
        match &mut self.ctx.fill {
            Some(settings) => *settings = settings.with_texture(texture, border),
            None => debug!("fill_texture: no active fill, ignored"),
        }
    }

    pub fn no_fill(&mut self) {
        self.ctx.fill = None;
    }

    /// Composite a watercolor fill of `outline` and blend it into the canvas.
    /// Returns the number of layer polygons drawn.
    pub(crate) fn fill_outline(&mut self, outline: &[Vec2]) -> usize {
        let Some(settings) = self.ctx.fill else {
            return 0;
        };
        let Self {
            canvas,
            mixer,
            rng,
            ctx,
            ..
        } = self;
        let drawn = Watercolor::composite(outline, ctx.transform, &settings, rng, mixer.mask_mut());
        if drawn > 0 {
            mixer.blend(canvas, settings.color);
        }
        drawn
    }
}
