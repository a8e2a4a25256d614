//! Rendering of a single tip for each tip kind

use glam::{Affine2, Vec2};

use crate::brush::{BrushDefinition, PressureProfile, RotationMode, TipKind, bell};
use crate::constants::{MIN_TIP_ALPHA, SPRAY_MAX_ITERATION_FACTOR};
use crate::random::Random;
use crate::surface::{LocalPainter, Surface};
use crate::types::Color;

/// Everything one tip placement needs
pub(crate) struct Tip {
    /// Canvas-space position
    pub center: Vec2,
    pub pressure: f32,
    /// Canvas-space heading, degrees
    pub heading: f32,
    /// Selection weight times transform scale
    pub weight: f32,
    pub color: Color,
    /// Distance along the path and its length, for the secondary bell
    pub plotted: f32,
    pub length: f32,
}

/// Draw one tip onto `target`. Returns whether anything was drawn.
pub(crate) fn render_tip<S: Surface + ?Sized>(
    target: &mut S,
    def: &BrushDefinition,
    tip: &Tip,
    vibrate: bool,
    rng: &mut Random,
) -> bool {
    if tip_alpha(def, tip.pressure) < MIN_TIP_ALPHA {
        return false;
    }
    match &def.kind {
        TipKind::Default => pencil_tip(target, def, tip, rng),
        TipKind::Spray => spray_tip(target, def, tip, rng),
        TipKind::Marker => marker_tip(target, def, tip, vibrate, rng),
        TipKind::Custom(procedure) => {
            let transform = tip_transform(def, tip, rng);
            let mut painter = LocalPainter::new(target, transform, tip.color);
            procedure(&mut painter);
            true
        }
        TipKind::Image(image_tip) => {
            let Some(image) = image_tip.image() else {
                return false;
            };
            let rotation = tip_rotation(def.rotation, tip.heading, rng);
            let size = def.weight * tip.weight * tip.pressure;
            target.stamp(image, tip.center, size, rotation, tip.color);
            true
        }
    }
}

/// Alpha for a tip: opacity ceiling shaped by pressure
pub(crate) fn tip_alpha(def: &BrushDefinition, pressure: f32) -> f32 {
    let pressure = pressure.max(0.0);
    (def.opacity * pressure.powf(def.pressure_exponent()) / crate::constants::OPACITY_CEILING)
        .clamp(0.0, 1.0)
}

/// Jittered circle whose jitter follows a secondary bell, skipped at random for grain
fn pencil_tip<S: Surface + ?Sized>(
    target: &mut S,
    def: &BrushDefinition,
    tip: &Tip,
    rng: &mut Random,
) -> bool {
    let pressure = tip.pressure.max(f32::EPSILON);
    let taper = bell(tip.plotted, tip.length, 0.5, 0.9, 5.0, 0.2, 1.2);
    let vibration = tip.weight
        * def.vibration
        * (def.definition + (1.0 - def.definition) * rng.gaussian(0.0, 1.0) * taper / pressure);
    if rng.range(0.0, def.quality * pressure) <= 0.4 {
        return false;
    }
    let offset = Vec2::new(
        0.7 * vibration * rng.range(-1.0, 1.0),
        vibration * rng.range(-1.0, 1.0),
    );
    let diameter = pressure * def.weight * tip.weight * rng.range(0.85, 1.15);
    target.circle(tip.center + offset, diameter, tip.color);
    true
}

/// Tiny squares scattered over a disk, more of them at low pressure
fn spray_tip<S: Surface + ?Sized>(
    target: &mut S,
    def: &BrushDefinition,
    tip: &Tip,
    rng: &mut Random,
) -> bool {
    let pressure = tip.pressure.max(f32::EPSILON);
    let vibration = tip.weight * def.vibration * pressure
        + tip.weight * rng.gaussian(0.0, 1.0) * def.vibration / 3.0;
    let side = def.weight * rng.range(0.9, 1.1);
    let iterations = (def.quality / pressure)
        .ceil()
        .clamp(1.0, (def.quality * SPRAY_MAX_ITERATION_FACTOR).max(1.0)) as usize;
    for _ in 0..iterations {
        let r = rng.random() * vibration;
        let rx = r * rng.range(-1.0, 1.0);
        let ry = (r * r - rx * rx).max(0.0).sqrt() * rng.range(-1.0, 1.0);
        let origin = tip.center + Vec2::new(rx, ry) - Vec2::splat(side * 0.5);
        target.rect(origin, Vec2::splat(side), tip.color);
    }
    true
}

fn marker_tip<S: Surface + ?Sized>(
    target: &mut S,
    def: &BrushDefinition,
    tip: &Tip,
    vibrate: bool,
    rng: &mut Random,
) -> bool {
    let jitter = if vibrate {
        let amount = tip.weight * def.vibration;
        Vec2::new(amount * rng.range(-1.0, 1.0), amount * rng.range(-1.0, 1.0))
    } else {
        Vec2::ZERO
    };
    let diameter = tip.weight * def.weight * tip.pressure;
    target.circle(tip.center + jitter, diameter, tip.color);
    true
}

fn tip_rotation(mode: RotationMode, heading: f32, rng: &mut Random) -> f32 {
    match mode {
        RotationMode::None => 0.0,
        RotationMode::Random => rng.range(0.0, 360.0),
        RotationMode::Natural => heading,
    }
}

/// Local frame for a custom tip: at the tip, rotated, scaled by weight and pressure
fn tip_transform(def: &BrushDefinition, tip: &Tip, rng: &mut Random) -> Affine2 {
    let rotation = tip_rotation(def.rotation, tip.heading, rng);
    Affine2::from_scale_angle_translation(
        Vec2::splat(tip.weight * tip.pressure),
        rotation.to_radians(),
        tip.center,
    )
}

/// Pressure sample for one tip on a path
pub(crate) fn sample_pressure(
    profile: &PressureProfile,
    plotted: f32,
    length: f32,
    plot_pressure: Option<f32>,
) -> f32 {
    let base = profile.pressure(plotted, length);
    match plot_pressure {
        Some(p) => base * p,
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::BrushCatalog;
    use crate::testing::{Primitive, RecordingCanvas};

    fn tip(pressure: f32) -> Tip {
        Tip {
            center: Vec2::new(50.0, 50.0),
            pressure,
            heading: 30.0,
            weight: 1.0,
            color: Color::BLACK,
            plotted: 50.0,
            length: 100.0,
        }
    }

    #[test]
    fn test_alpha_exponents() {
        let catalog = BrushCatalog::new();
        let pen = catalog.get("pen").unwrap();
        let marker = catalog.get("marker").unwrap();
        assert!((tip_alpha(pen, 1.0) - 200.0 / 255.0).abs() < 1e-6);
        let half_pen = tip_alpha(pen, 0.5);
        assert!((half_pen - 200.0 * 0.5f32.powf(1.5) / 255.0).abs() < 1e-6);
        assert!((tip_alpha(marker, 0.5) - 15.0 / 255.0).abs() < 1e-6);
        assert_eq!(tip_alpha(pen, 5.0), 1.0);
    }

    #[test]
    fn test_marker_without_vibration_is_centered() {
        let catalog = BrushCatalog::new();
        let marker = catalog.get("marker").unwrap();
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        let mut rng = Random::seeded(1);
        assert!(render_tip(&mut canvas, marker, &tip(0.8), false, &mut rng));
        match &canvas.calls[..] {
            [Primitive::Circle { center, diameter, .. }] => {
                assert_eq!(*center, Vec2::new(50.0, 50.0));
                assert!((diameter - 2.0).abs() < 1e-5);
            }
            other => panic!("unexpected calls {other:?}"),
        }
    }

    #[test]
    fn test_spray_scatters_more_at_low_pressure() {
        let catalog = BrushCatalog::new();
        let spray = catalog.get("spray").unwrap();
        let mut rng = Random::seeded(2);
        let mut light = RecordingCanvas::new(100.0, 100.0);
        render_tip(&mut light, spray, &tip(0.5), true, &mut rng);
        let mut heavy = RecordingCanvas::new(100.0, 100.0);
        render_tip(&mut heavy, spray, &tip(1.0), true, &mut rng);
        assert_eq!(light.calls.len(), 80);
        assert_eq!(heavy.calls.len(), 40);
    }

    #[test]
    fn test_spray_count_is_bounded_at_low_pressure() {
        let catalog = BrushCatalog::new();
        let spray = catalog.get("spray").unwrap();
        let mut rng = Random::seeded(2);
        let mut faint = RecordingCanvas::new(100.0, 100.0);
        assert!(render_tip(&mut faint, spray, &tip(0.05), true, &mut rng));
        assert_eq!(faint.calls.len(), 400);
    }

    #[test]
    fn test_zero_pressure_tip_is_skipped() {
        let catalog = BrushCatalog::new();
        let mut rng = Random::seeded(2);
        for name in ["spray", "pen", "marker"] {
            let def = catalog.get(name).unwrap();
            let mut canvas = RecordingCanvas::new(100.0, 100.0);
            assert!(!render_tip(&mut canvas, def, &tip(0.0), true, &mut rng), "{name}");
            assert!(canvas.calls.is_empty(), "{name}");
        }
    }

    #[test]
    fn test_custom_tip_uses_natural_rotation() {
        let catalog = BrushCatalog::new();
        let marker2 = catalog.get("marker2").unwrap();
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        let mut rng = Random::seeded(3);
        let mut t = tip(1.0);
        t.heading = 90.0;
        render_tip(&mut canvas, marker2, &t, true, &mut rng);
        assert_eq!(canvas.calls.len(), 2);
        let Primitive::Polygon { points, .. } = &canvas.calls[0] else {
            panic!("expected polygon");
        };
        // Local (-1.5, -1.5) rotated a quarter turn clockwise
        assert!((points[0] - Vec2::new(51.5, 48.5)).length() < 1e-4);
    }

    #[test]
    fn test_unloaded_image_draws_nothing() {
        use crate::brush::{ImageTip, TipKind};
        let def = BrushDefinition::new(TipKind::Image(ImageTip::new("missing.png")));
        let mut canvas = RecordingCanvas::new(10.0, 10.0);
        let mut rng = Random::seeded(3);
        assert!(!render_tip(&mut canvas, &def, &tip(1.0), true, &mut rng));
        assert!(canvas.calls.is_empty());
    }

    #[test]
    fn test_sample_pressure_scales_by_plot() {
        let mut rng = Random::seeded(4);
        let profile = PressureProfile::sample(&crate::brush::PressureCurve::default(), &mut rng);
        let base = sample_pressure(&profile, 10.0, 100.0, None);
        let scaled = sample_pressure(&profile, 10.0, 100.0, Some(0.5));
        assert!((scaled - base * 0.5).abs() < 1e-6);
    }
}
