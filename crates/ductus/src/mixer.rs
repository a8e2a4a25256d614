//! Pigment mixing through an offscreen mask
//!
//! Strokes and fills that blend draw their coverage into the mask with a
//! placeholder color. [`PigmentMixer::blend`] then runs [`PigmentShader`]
//! over the canvas, mixing the true color into every covered pixel with a
//! subtractive Kubelka-Munk model, and clears the mask.

use tracing::debug;

use crate::constants::{DARKEN_THRESHOLD, PIGMENT_NOISE};
use crate::surface::{Canvas, PixelShader, Surface};
use crate::types::Color;

/// Reflectance bounds keeping K/S finite
const MIN_REFLECTANCE: f32 = 0.001;
const MAX_REFLECTANCE: f32 = 0.999;

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

/// Absorption over scattering for a reflectance
#[inline]
fn k_over_s(reflectance: f32) -> f32 {
    let r = reflectance.clamp(MIN_REFLECTANCE, MAX_REFLECTANCE);
    (1.0 - r) * (1.0 - r) / (2.0 * r)
}

#[inline]
fn reflectance(ks: f32) -> f32 {
    1.0 + ks - (ks * ks + 2.0 * ks).sqrt()
}

/// Mix two linear-light colors as pigments; `t` is the share of `b`
pub fn mix_pigments(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    std::array::from_fn(|i| {
        let ks = k_over_s(a[i]) * (1.0 - t) + k_over_s(b[i]) * t;
        reflectance(ks).clamp(0.0, 1.0)
    })
}

/// Deterministic per-pixel value in [-1, 1]
#[inline]
fn pixel_noise(x: u32, y: u32, seed: u32) -> f32 {
    let mut h = x.wrapping_mul(0x8da6_b343)
        ^ y.wrapping_mul(0xd816_3841)
        ^ seed.wrapping_mul(0xcb1a_b31f);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    (h as f32 / u32::MAX as f32) * 2.0 - 1.0
}

/// Shader mixing one target color into the canvas under the mask
#[derive(Debug, Clone, Copy)]
pub struct PigmentShader {
    /// Target color in linear light
    target: [f32; 3],
    seed: u32,
}

impl PigmentShader {
    pub fn new(color: Color, seed: u32) -> Self {
        Self {
            target: color.rgb().map(srgb_to_linear),
            seed,
        }
    }
}

impl PixelShader for PigmentShader {
    fn shade(&self, dst: [f32; 4], mask: [f32; 4], x: u32, y: u32) -> [f32; 4] {
        let coverage = mask[3].clamp(0.0, 1.0);
        if coverage <= 0.0 {
            return dst;
        }
        // Transparent canvas shows white paper
        let paper = std::array::from_fn(|i| srgb_to_linear(dst[i] * dst[3] + (1.0 - dst[3])));
        let mut mixed = mix_pigments(paper, self.target, coverage);
        if coverage > DARKEN_THRESHOLD {
            let dark = self.target.map(|c| c * 0.5);
            mixed = mix_pigments(mixed, dark, (coverage - DARKEN_THRESHOLD) * 0.5);
        }
        let noise = pixel_noise(x, y, self.seed) * PIGMENT_NOISE;
        let [r, g, b] = mixed.map(|c| (linear_to_srgb(c) + noise).clamp(0.0, 1.0));
        [r, g, b, 1.0]
    }
}

/// Offscreen mask plus the pigment shader pass
pub struct PigmentMixer<B: Surface> {
    mask: B,
    blends: u32,
}

impl<B: Surface> std::fmt::Debug for PigmentMixer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PigmentMixer")
            .field("blends", &self.blends)
            .finish_non_exhaustive()
    }
}

impl<B: Surface> PigmentMixer<B> {
    /// Allocate the mask for a canvas
    pub fn load<C: Canvas<Buffer = B>>(canvas: &C) -> Self {
        let mask = canvas.offscreen();
        let (w, h) = mask.pixel_size();
        debug!("PigmentMixer::load: mask {}x{}", w, h);
        Self { mask, blends: 0 }
    }

    pub fn mask(&self) -> &B {
        &self.mask
    }

    /// Surface that blended strokes and fills draw their coverage into
    pub fn mask_mut(&mut self) -> &mut B {
        &mut self.mask
    }

    /// Number of blend passes run so far
    #[inline]
    pub fn blends(&self) -> u32 {
        self.blends
    }

    /// Mix `color` into the canvas wherever the mask has coverage, then clear the mask
    pub fn blend<C: Canvas<Buffer = B>>(&mut self, canvas: &mut C, color: Color) {
        self.blends = self.blends.wrapping_add(1);
        let shader = PigmentShader::new(color, self.blends);
        canvas.run_shader(&self.mask, &shader);
        self.mask.clear();
        debug!("PigmentMixer::blend: pass {} color {:?}", self.blends, color.rgb());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterCanvas;
    use glam::Vec2;

    #[test]
    fn test_mixing_is_subtractive() {
        let yellow = [1.0, 1.0, 0.0].map(srgb_to_linear);
        let blue = [0.0, 0.0, 1.0].map(srgb_to_linear);
        let mixed = mix_pigments(yellow, blue, 0.5);
        // Paint mixing darkens instead of averaging to grey
        assert!(mixed.iter().all(|c| *c < 0.5));
    }

    #[test]
    fn test_mix_endpoints() {
        let a = [0.8, 0.3, 0.1];
        let b = [0.1, 0.5, 0.9];
        let start = mix_pigments(a, b, 0.0);
        let end = mix_pigments(a, b, 1.0);
        for i in 0..3 {
            assert!((start[i] - a[i]).abs() < 1e-3);
            assert!((end[i] - b[i]).abs() < 1e-3);
        }
    }

    #[test]
    fn test_uncovered_pixels_untouched() {
        let shader = PigmentShader::new(Color::rgb8(200, 30, 30), 1);
        let dst = [0.2, 0.4, 0.6, 0.3];
        assert_eq!(shader.shade(dst, [1.0, 0.0, 0.0, 0.0], 3, 4), dst);
    }

    #[test]
    fn test_full_coverage_reaches_target() {
        let shader = PigmentShader::new(Color::rgb8(0, 0, 255), 7);
        let out = shader.shade([1.0, 1.0, 1.0, 1.0], [1.0, 0.0, 0.0, 0.75], 0, 0);
        assert!(out[2] > 0.9);
        assert!(out[0] < 0.5);
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn test_noise_is_small_and_deterministic() {
        for (x, y) in [(0, 0), (10, 3), (999, 512)] {
            let n = pixel_noise(x, y, 2);
            assert!((-1.0..=1.0).contains(&n));
            assert_eq!(n, pixel_noise(x, y, 2));
        }
    }

    #[test]
    fn test_blend_clears_mask() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_background(Color::WHITE);
        let mut mixer = PigmentMixer::load(&canvas);
        mixer
            .mask_mut()
            .circle(Vec2::new(5.0, 5.0), 6.0, Color::MASK_RED.with_alpha(0.6));
        mixer.blend(&mut canvas, Color::rgb8(20, 60, 200));
        assert_eq!(mixer.mask().painted_pixels(), 0);
        assert_eq!(mixer.blends(), 1);
        let center = canvas.pixel(5, 5).unwrap();
        assert!(center[0] < 0.9);
        let corner = canvas.pixel(0, 0).unwrap();
        assert_eq!(corner, [1.0, 1.0, 1.0, 1.0]);
    }
}
