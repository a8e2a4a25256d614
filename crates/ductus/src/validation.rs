use glam::Vec2;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Polygon needs at least 3 vertices, got {0}")]
    DegeneratePolygon(usize),
    #[error("Non-finite coordinate ({x}, {y})")]
    NonFinite { x: f32, y: f32 },
    #[error("Invalid color: {0}")]
    InvalidColor(String),
    #[error("Path needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("Invalid brush spacing: {0}")]
    InvalidSpacing(f32),
}

/// Check that a point is usable as geometry
pub fn validate_point(p: Vec2) -> Result<(), ValidationError> {
    if !p.is_finite() {
        return Err(ValidationError::NonFinite { x: p.x, y: p.y });
    }
    Ok(())
}

/// Check a vertex list before building a polygon from it
pub fn validate_polygon(points: &[Vec2]) -> Result<(), ValidationError> {
    if points.len() < 3 {
        return Err(ValidationError::DegeneratePolygon(points.len()));
    }
    points.iter().try_for_each(|p| validate_point(*p))
}

/// Spacing must be positive or a stroke would never advance
pub fn validate_spacing(spacing: f32) -> Result<(), ValidationError> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(ValidationError::InvalidSpacing(spacing));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_needs_three_points() {
        let two = [Vec2::ZERO, Vec2::ONE];
        assert_eq!(
            validate_polygon(&two),
            Err(ValidationError::DegeneratePolygon(2))
        );
        let three = [Vec2::ZERO, Vec2::X, Vec2::Y];
        assert!(validate_polygon(&three).is_ok());
    }

    #[test]
    fn test_rejects_nan() {
        let pts = [Vec2::ZERO, Vec2::new(f32::NAN, 1.0), Vec2::Y];
        assert!(matches!(
            validate_polygon(&pts),
            Err(ValidationError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_spacing() {
        assert!(validate_spacing(0.3).is_ok());
        assert!(validate_spacing(0.0).is_err());
        assert!(validate_spacing(f32::INFINITY).is_err());
    }
}
