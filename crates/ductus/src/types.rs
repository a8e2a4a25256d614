use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Compositing mode for primitives drawn on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum BlendMode {
    #[default]
    Normal = 0,
    /// Drawn shapes subtract alpha from the destination
    Erase = 1,
}

/// Straight (non-premultiplied) RGBA color, components in 0..1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color([0.0, 0.0, 0.0, 1.0]);
    pub const WHITE: Color = Color([1.0, 1.0, 1.0, 1.0]);
    /// Placeholder ink used for mask passes; only its alpha is read back
    pub const MASK_RED: Color = Color([1.0, 0.0, 0.0, 1.0]);

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Color([r, g, b, a])
    }

    /// Color from 8-bit channels
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Color([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0])
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic color name
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if let Some(hex) = trimmed.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| ValidationError::InvalidColor(text.to_string()));
        }
        let named = match trimmed.to_ascii_lowercase().as_str() {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::rgb8(255, 0, 0),
            "green" => Color::rgb8(0, 128, 0),
            "blue" => Color::rgb8(0, 0, 255),
            "yellow" => Color::rgb8(255, 255, 0),
            "orange" => Color::rgb8(255, 165, 0),
            "purple" => Color::rgb8(128, 0, 128),
            "gray" | "grey" => Color::rgb8(128, 128, 128),
            _ => return Err(ValidationError::InvalidColor(text.to_string())),
        };
        Ok(named)
    }

    #[inline]
    pub fn rgb(&self) -> [f32; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.0[3]
    }

    /// Same color with a different alpha
    #[inline]
    pub fn with_alpha(&self, alpha: f32) -> Self {
        Color([self.0[0], self.0[1], self.0[2], alpha.clamp(0.0, 1.0)])
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    let short = |c: char| c.to_digit(16).map(|d| (d * 17) as u8);
    match hex.len() {
        3 => {
            let mut chars = hex.chars();
            let r = short(chars.next()?)?;
            let g = short(chars.next()?)?;
            let b = short(chars.next()?)?;
            Some(Color::rgb8(r, g, b))
        }
        6 | 8 => {
            let r = channel(hex.get(0..2)?)?;
            let g = channel(hex.get(2..4)?)?;
            let b = channel(hex.get(4..6)?)?;
            let a = if hex.len() == 8 {
                channel(hex.get(6..8)?)? as f32 / 255.0
            } else {
                1.0
            };
            Some(Color::rgb8(r, g, b).with_alpha(a))
        }
        _ => None,
    }
}

impl From<[f32; 4]> for Color {
    fn from(value: [f32; 4]) -> Self {
        Color(value)
    }
}

/// Axis-aligned rectangle in canvas units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Rectangle from two corners in any order
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::from_corners(origin, origin + size)
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Corners in clockwise canvas order starting at `min`
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Color::parse("#000").unwrap(), Color::BLACK);
        assert_eq!(Color::parse("#ffffff").unwrap(), Color::WHITE);
        let c = Color::parse("#ff000080").unwrap();
        assert!((c.alpha() - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c.rgb(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_parse_named_and_invalid() {
        assert_eq!(Color::parse("Black").unwrap(), Color::BLACK);
        assert!(Color::parse("#12").is_err());
        assert!(Color::parse("#zzzzzz").is_err());
        assert!(Color::parse("#+f+f+f").is_err());
        assert!(Color::parse("#+fff+ff").is_err());
        assert!(Color::parse("chartreuse-ish").is_err());
    }

    #[test]
    fn test_rect_from_json() {
        let rect: Rect = serde_json::from_str(r#"{"min":[0.0,5.0],"max":[10.0,20.0]}"#).unwrap();
        assert_eq!(rect, Rect::from_corners(Vec2::new(0.0, 5.0), Vec2::new(10.0, 20.0)));
        let text = serde_json::to_string(&rect).unwrap();
        assert_eq!(serde_json::from_str::<Rect>(&text).unwrap(), rect);
    }

    #[test]
    fn test_rect_corners_and_contains() {
        let r = Rect::from_corners(Vec2::new(10.0, 20.0), Vec2::new(0.0, 0.0));
        assert_eq!(r.min, Vec2::ZERO);
        assert!(r.contains(Vec2::new(5.0, 5.0)));
        assert!(!r.contains(Vec2::new(11.0, 5.0)));
        assert_eq!(r.corners()[2], Vec2::new(10.0, 20.0));
    }
}
