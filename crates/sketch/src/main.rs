//! ductus-sketch - renders a demonstration page to PNG

use std::sync::Arc;

use ductus::{
    BleedDirection, BrushDefinition, Color, DrawError, FlowField, HatchOptions, PlotKind, Polygon,
    PressureCurve, RasterCanvas, Rect, Renderer, RotationMode, SplinePoint, TipKind, TipPainter,
};
use glam::Vec2;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::SketchConfig;

type Page = Renderer<RasterCanvas>;

fn main() -> Result<(), DrawError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SketchConfig::from_env();
    info!(
        "Starting ductus-sketch: {}x{}, seed {:?}",
        config.canvas.width, config.canvas.height, config.canvas.seed
    );

    let mut canvas = RasterCanvas::from_config(&config.canvas);
    canvas.fill_background(Color::parse("#f7f3ea")?);
    let mut page = Renderer::new(canvas, config.canvas.clone())?;
    register_brushes(&mut page);
    page.preload();

    let size = Vec2::new(config.canvas.width as f32, config.canvas.height as f32);
    pencils(&mut page, size)?;
    flow_lines(&mut page, size)?;
    splines(&mut page, size)?;
    hatching(&mut page, size)?;
    watercolor(&mut page, size)?;
    markers(&mut page, size)?;
    recorded(&mut page, size)?;

    let canvas = page.into_canvas();
    canvas.save_png(&config.output)?;
    info!("Wrote {}", config.output.display());
    Ok(())
}

fn ring_tip(painter: &mut dyn TipPainter) {
    painter.circle(Vec2::ZERO, 2.0);
    painter.line(Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0), 0.5);
}

fn register_brushes(page: &mut Page) {
    page.add_brush(
        "ring",
        BrushDefinition {
            weight: 4.0,
            vibration: 0.3,
            opacity: 60.0,
            spacing: 1.5,
            rotation: RotationMode::Random,
            blend: false,
            ..BrushDefinition::new(TipKind::Custom(Arc::new(ring_tip)))
        },
    );
    page.add_brush(
        "fade",
        BrushDefinition {
            pressure: PressureCurve::Custom {
                func: Arc::new(|t: f32| 1.0 - t),
                min_max: [0.2, 1.4],
            },
            ..BrushDefinition::new(TipKind::Default)
        },
    );
}

/// One ruled line per pencil brush
fn pencils(page: &mut Page, size: Vec2) -> Result<(), DrawError> {
    let ink = Color::parse("#2b2b2b")?;
    let names = ["pen", "rotring", "2B", "HB", "2H", "cpencil", "charcoal", "fade"];
    for (i, name) in names.iter().enumerate() {
        page.set(name, ink, 1.0)?;
        let y = size.y * (0.05 + 0.02 * i as f32);
        page.line(size.x * 0.05, y, size.x * 0.45, y);
    }
    page.set("spray", Color::parse("#7a4b9c")?, 1.0)?;
    page.line(size.x * 0.05, size.y * 0.23, size.x * 0.45, size.y * 0.23);
    page.set("ring", Color::parse("#1d5c63")?, 1.0)?;
    page.line(size.x * 0.05, size.y * 0.26, size.x * 0.45, size.y * 0.26);
    Ok(())
}

/// A bundle of flow lines over each built-in field
fn flow_lines(page: &mut Page, size: Vec2) -> Result<(), DrawError> {
    page.set("HB", Color::parse("#33415c")?, 1.0)?;
    for (i, name) in FlowField::BUILT_IN.iter().enumerate() {
        page.field(name)?;
        let x = size.x * (0.52 + 0.09 * i as f32);
        for k in 0..6 {
            let y = size.y * (0.05 + 0.035 * k as f32);
            page.flow_line(x, y, size.y * 0.08, 90.0);
        }
    }
    page.refresh_field(0.5);
    page.no_field();
    Ok(())
}

fn splines(page: &mut Page, size: Vec2) -> Result<(), DrawError> {
    page.set("2B", Color::parse("#3d405b")?, 1.2)?;
    let points: Vec<SplinePoint> = (0..6)
        .map(|i| {
            let x = size.x * (0.05 + 0.08 * i as f32);
            let y = size.y * if i % 2 == 0 { 0.32 } else { 0.40 };
            SplinePoint::with_pressure(x, y, 0.6 + 0.1 * i as f32)
        })
        .collect();
    page.spline(&points, 0.0);
    let lifted: Vec<SplinePoint> = points
        .iter()
        .map(|p| SplinePoint::new(p.pos.x, p.pos.y + size.y * 0.1))
        .collect();
    page.spline(&lifted, 0.7);
    Ok(())
}

fn hatching(page: &mut Page, size: Vec2) -> Result<(), DrawError> {
    let ink = Color::parse("#264653")?;
    page.set_hatch_brush("hatch_brush", ink, 1.0)?;
    let options = HatchOptions {
        rand: 0.1,
        continuous: false,
        gradient: 0.3,
    };
    let square = Polygon::from_rect(Rect::from_origin_size(
        Vec2::new(size.x * 0.55, size.y * 0.32),
        Vec2::splat(size.x * 0.15),
    ));
    page.hatch(&[square], size.x * 0.01, 30.0, &options)?;

    page.set("pen", ink, 1.0)?;
    page.set_hatch(
        size.x * 0.008,
        120.0,
        HatchOptions {
            continuous: true,
            ..Default::default()
        },
    )?;
    page.translate(size.x * 0.85, size.y * 0.4);
    page.rotate(15.0);
    page.rect(-size.x * 0.06, -size.y * 0.06, size.x * 0.12, size.y * 0.12);
    page.reset_transform();
    page.no_hatch();
    Ok(())
}

fn watercolor(page: &mut Page, size: Vec2) -> Result<(), DrawError> {
    page.no_stroke();
    page.fill(Color::parse("#e76f51")?, 90.0);
    page.bleed(0.25, BleedDirection::Out);
    page.fill_texture(0.6, 0.5);
    page.circle(size.x * 0.15, size.y * 0.65, size.x * 0.09, true);

    page.fill(Color::parse("#2a9d8f")?, 80.0);
    page.bleed(0.1, BleedDirection::In);
    page.polygon(&[
        Vec2::new(size.x * 0.22, size.y * 0.58),
        Vec2::new(size.x * 0.42, size.y * 0.6),
        Vec2::new(size.x * 0.36, size.y * 0.76),
        Vec2::new(size.x * 0.24, size.y * 0.72),
    ]);

    page.set("cpencil", Color::parse("#264653")?, 1.0)?;
    page.fill(Color::parse("#e9c46a")?, 110.0);
    page.circle(size.x * 0.3, size.y * 0.85, size.x * 0.07, false);
    page.no_fill();
    Ok(())
}

fn markers(page: &mut Page, size: Vec2) -> Result<(), DrawError> {
    page.set("marker", Color::parse("#f4a261")?, 1.0)?;
    page.line(size.x * 0.5, size.y * 0.6, size.x * 0.95, size.y * 0.62);
    page.set("marker", Color::parse("#457b9d")?, 1.0)?;
    page.line(size.x * 0.5, size.y * 0.64, size.x * 0.95, size.y * 0.6);
    page.set("marker2", Color::parse("#9d0208")?, 1.0)?;
    page.clip(Rect::from_corners(
        Vec2::new(size.x * 0.5, size.y * 0.66),
        Vec2::new(size.x * 0.8, size.y * 0.72),
    ));
    page.line(size.x * 0.5, size.y * 0.69, size.x * 0.95, size.y * 0.69);
    page.no_clip();
    Ok(())
}

/// Freehand stroke and a recorded shape
fn recorded(page: &mut Page, size: Vec2) -> Result<(), DrawError> {
    page.set("charcoal", Color::parse("#2b2d42")?, 1.0)?;
    page.field("curved")?;
    page.begin_stroke(PlotKind::Curve, size.x * 0.55, size.y * 0.8)?;
    page.move_stroke(0.0, size.x * 0.1, 1.0)?;
    page.move_stroke(-40.0, size.x * 0.1, 0.7)?;
    page.move_stroke(30.0, size.x * 0.1, 1.2)?;
    page.end_stroke(0.0, 0.8)?;
    page.no_field();

    page.set("pen", Color::parse("#14213d")?, 1.0)?;
    page.fill(Color::parse("#8ecae6")?, 70.0);
    page.begin_shape(0.4)?;
    for (x, y) in [(0.62, 0.86), (0.78, 0.84), (0.9, 0.9), (0.74, 0.96), (0.6, 0.93)] {
        page.vertex(size.x * x, size.y * y, None)?;
    }
    page.end_shape(true)?;
    page.no_fill();
    Ok(())
}
