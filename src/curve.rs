//! Piecewise response curves.
//!
//! A [`ResponseCurve`] maps a scalar input to a multiplier through an ordered
//! list of control points. The rider uses two of them: one maps the dot
//! product between the previous and current move input to an acceleration
//! multiplier, the other maps normalized horizontal speed to a damping
//! coefficient.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a [`ResponseCurve`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// A curve needs at least one control point.
    #[error("response curve has no control points")]
    Empty,
    /// A control point contains NaN or infinity.
    #[error("control point {index} is not finite: ({x}, {y})")]
    NonFinite { index: usize, x: f32, y: f32 },
    /// Control point x values must be strictly increasing.
    #[error("control point {index} has x = {x}, which does not follow the previous x = {previous}")]
    Unsorted { index: usize, previous: f32, x: f32 },
}

/// How values between two control points are blended.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Interpolation {
    /// Straight-line blend.
    #[default]
    Linear,
    /// Smoothstep-eased blend: flat tangents at every control point.
    Smooth,
}

impl Interpolation {
    #[inline]
    fn ease(self, t: f32) -> f32 {
        match self {
            Interpolation::Linear => t,
            Interpolation::Smooth => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// A single `(x, y)` control point.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

impl CurvePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for CurvePoint {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// A piecewise curve over a bounded domain.
///
/// Inputs outside `[first.x, last.x]` clamp to the end values, so callers do
/// not need to pre-clamp dot products or normalized speeds.
///
/// # Example
///
/// ```rust
/// use ground_rider::curve::{Interpolation, ResponseCurve};
///
/// let curve = ResponseCurve::new([(-1.0, 5.0), (1.0, 1.0)], Interpolation::Linear).unwrap();
/// assert_eq!(curve.evaluate(-1.0), 5.0);
/// assert_eq!(curve.evaluate(0.0), 3.0);
/// assert_eq!(curve.evaluate(4.0), 1.0);
/// ```
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "ResponseCurveDef", into = "ResponseCurveDef")]
pub struct ResponseCurve {
    points: Vec<CurvePoint>,
    interpolation: Interpolation,
}

#[derive(Serialize, Deserialize)]
struct ResponseCurveDef {
    points: Vec<CurvePoint>,
    #[serde(default)]
    interpolation: Interpolation,
}

impl TryFrom<ResponseCurveDef> for ResponseCurve {
    type Error = CurveError;

    fn try_from(def: ResponseCurveDef) -> Result<Self, Self::Error> {
        ResponseCurve::new(def.points, def.interpolation)
    }
}

impl From<ResponseCurve> for ResponseCurveDef {
    fn from(curve: ResponseCurve) -> Self {
        Self {
            points: curve.points,
            interpolation: curve.interpolation,
        }
    }
}

impl ResponseCurve {
    /// Build a curve from control points sorted by strictly increasing x.
    pub fn new<I, P>(points: I, interpolation: Interpolation) -> Result<Self, CurveError>
    where
        I: IntoIterator<Item = P>,
        P: Into<CurvePoint>,
    {
        let points: Vec<CurvePoint> = points.into_iter().map(Into::into).collect();
        check_points(&points)?;
        Ok(Self {
            points,
            interpolation,
        })
    }

    /// A curve that returns `value` everywhere.
    pub fn constant(value: f32) -> Self {
        Self {
            points: vec![CurvePoint::new(0.0, value)],
            interpolation: Interpolation::Linear,
        }
    }

    /// Default acceleration-direction curve: 5x on full reversal, 2x on a
    /// perpendicular turn, 1x when holding the same direction.
    pub fn reversal_boost() -> Self {
        Self {
            points: vec![
                CurvePoint::new(-1.0, 5.0),
                CurvePoint::new(0.0, 2.0),
                CurvePoint::new(1.0, 1.0),
            ],
            interpolation: Interpolation::Linear,
        }
    }

    /// Default damping curve: strong damping near standstill for crisp stops,
    /// tapering off at full speed to preserve momentum.
    pub fn speed_damping() -> Self {
        Self {
            points: vec![CurvePoint::new(0.0, 8.0), CurvePoint::new(1.0, 0.5)],
            interpolation: Interpolation::Smooth,
        }
    }

    /// The control points, ordered by x.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Re-run the construction checks.
    ///
    /// Reflection can edit a curve in place, so configs validate their curves
    /// again when they are added.
    pub fn validate(&self) -> Result<(), CurveError> {
        check_points(&self.points)
    }

    /// Evaluate the curve at `x`.
    pub fn evaluate(&self, x: f32) -> f32 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return 0.0;
        };
        if x.is_nan() || x <= first.x {
            return first.y;
        }
        if x >= last.x {
            return last.y;
        }

        // First point strictly right of x; guaranteed in 1..len by the checks above.
        let upper = self.points.partition_point(|p| p.x <= x);
        let a = self.points[upper - 1];
        let b = self.points[upper];
        let t = self.interpolation.ease((x - a.x) / (b.x - a.x));
        a.y + (b.y - a.y) * t
    }
}

fn check_points(points: &[CurvePoint]) -> Result<(), CurveError> {
    if points.is_empty() {
        return Err(CurveError::Empty);
    }
    for (index, point) in points.iter().enumerate() {
        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(CurveError::NonFinite {
                index,
                x: point.x,
                y: point.y,
            });
        }
        if index > 0 && point.x <= points[index - 1].x {
            return Err(CurveError::Unsorted {
                index,
                previous: points[index - 1].x,
                x: point.x,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_interpolates_between_points() {
        let curve = ResponseCurve::new([(0.0, 0.0), (1.0, 10.0), (3.0, 20.0)], Interpolation::Linear)
            .unwrap();

        assert_eq!(curve.evaluate(0.5), 5.0);
        assert_eq!(curve.evaluate(1.0), 10.0);
        assert_eq!(curve.evaluate(2.0), 15.0);
    }

    #[test]
    fn clamps_outside_domain() {
        let curve = ResponseCurve::reversal_boost();

        assert_eq!(curve.evaluate(-3.0), 5.0);
        assert_eq!(curve.evaluate(3.0), 1.0);
        assert_eq!(curve.evaluate(f32::NAN), 5.0);
    }

    #[test]
    fn smooth_matches_endpoints_and_midpoint() {
        let curve = ResponseCurve::new([(0.0, 0.0), (1.0, 1.0)], Interpolation::Smooth).unwrap();

        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(1.0), 1.0);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
        // Eased: slower than linear near the start
        assert!(curve.evaluate(0.1) < 0.1);
    }

    #[test]
    fn constant_curve() {
        let curve = ResponseCurve::constant(2.5);
        assert_eq!(curve.evaluate(-100.0), 2.5);
        assert_eq!(curve.evaluate(0.0), 2.5);
        assert_eq!(curve.evaluate(100.0), 2.5);
    }

    #[test]
    fn default_damping_curve_decreases_with_speed() {
        let curve = ResponseCurve::speed_damping();
        assert!(curve.evaluate(0.0) > curve.evaluate(0.5));
        assert!(curve.evaluate(0.5) > curve.evaluate(1.0));
    }

    #[test]
    fn rejects_empty() {
        let points: Vec<(f32, f32)> = Vec::new();
        assert_eq!(
            ResponseCurve::new(points, Interpolation::Linear),
            Err(CurveError::Empty)
        );
    }

    #[test]
    fn rejects_unsorted_and_duplicate_x() {
        let err = ResponseCurve::new([(0.0, 1.0), (0.0, 2.0)], Interpolation::Linear).unwrap_err();
        assert!(matches!(err, CurveError::Unsorted { index: 1, .. }));

        let err = ResponseCurve::new([(1.0, 1.0), (0.5, 2.0)], Interpolation::Linear).unwrap_err();
        assert!(matches!(err, CurveError::Unsorted { index: 1, .. }));
    }

    #[test]
    fn rejects_non_finite() {
        let err = ResponseCurve::new([(0.0, f32::INFINITY)], Interpolation::Linear).unwrap_err();
        assert!(matches!(err, CurveError::NonFinite { index: 0, .. }));
    }

    #[test]
    fn deserialize_validates_points() {
        let ok: ResponseCurve =
            serde_json::from_str(r#"{"points":[{"x":0.0,"y":1.0},{"x":1.0,"y":2.0}]}"#).unwrap();
        assert_eq!(ok.interpolation(), Interpolation::Linear);
        assert_eq!(ok.evaluate(0.5), 1.5);

        let bad = serde_json::from_str::<ResponseCurve>(r#"{"points":[]}"#);
        assert!(bad.is_err());
    }
}
