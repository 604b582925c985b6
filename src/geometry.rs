//! Fundamental geometric types for mooring line modelling.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Position in three dimensional space. The Z axis points up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
    /// Distance along the global Z axis.
    pub z: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Return `true` when every coordinate is finite.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<Vector3<f64>> for Point {
    fn from(value: Vector3<f64>) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Point> for Vector3<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

impl From<[f64; 3]> for Point {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Point> for [f64; 3] {
    fn from(value: Point) -> Self {
        [value.x, value.y, value.z]
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use rusty_mooring::point;
///
/// let anchor = point(1700.0, 10.0, -2000.0);
/// assert_eq!(anchor.z, -2000.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64, z: f64) -> Point {
    Point::new(x, y, z)
}

/// The vertical plane that contains both end points of a line.
///
/// Planar coordinates are `(s, z)`: `s` is the horizontal distance from the
/// bottom point measured along the azimuth towards the top point, and `z` is
/// the rise above the bottom point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarFrame {
    /// Origin of the plane.
    origin: Point,
    /// Cosine of the azimuth.
    cos_azimuth: f64,
    /// Sine of the azimuth.
    sin_azimuth: f64,
    /// Horizontal distance between the end points.
    horizontal_span: f64,
    /// Elevation of the top point above the bottom point.
    vertical_span: f64,
}

impl PlanarFrame {
    /// Build the frame spanned by `bottom` and `top`.
    ///
    /// A purely vertical span has no defined azimuth; the X axis is used.
    #[must_use]
    pub fn between(bottom: Point, top: Point) -> Self {
        let delta = top.to_vector() - bottom.to_vector();
        let horizontal_span = delta.x.hypot(delta.y);
        let (cos_azimuth, sin_azimuth) = if horizontal_span > 0.0 {
            (delta.x / horizontal_span, delta.y / horizontal_span)
        } else {
            (1.0, 0.0)
        };
        Self {
            origin: bottom,
            cos_azimuth,
            sin_azimuth,
            horizontal_span,
            vertical_span: delta.z,
        }
    }

    /// Horizontal distance between the two end points.
    #[must_use]
    pub fn horizontal_span(&self) -> f64 {
        self.horizontal_span
    }

    /// Elevation difference between the two end points.
    #[must_use]
    pub fn vertical_span(&self) -> f64 {
        self.vertical_span
    }

    /// Straight-line distance between the two end points.
    #[must_use]
    pub fn chord(&self) -> f64 {
        self.horizontal_span.hypot(self.vertical_span)
    }

    /// Azimuth of the plane in radians, measured from the global X axis.
    #[must_use]
    pub fn azimuth(&self) -> f64 {
        self.sin_azimuth.atan2(self.cos_azimuth)
    }

    /// Map a planar coordinate back into global 3D space.
    #[must_use]
    pub fn embed(&self, horizontal: f64, vertical: f64) -> Point {
        Point::new(
            self.origin.x + horizontal * self.cos_azimuth,
            self.origin.y + horizontal * self.sin_azimuth,
            self.origin.z + vertical,
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn point_to_vector_roundtrip() {
        let origin = Point::new(1.0, 2.0, 3.0);
        let vector: Vector3<f64> = origin.into();
        assert_eq!(vector, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(Point::from(vector), origin);
    }

    #[test]
    fn point_reads_from_coordinate_array() {
        let point = Point::from([30.0, 30.0, -25.0]);
        assert_eq!(point, Point::new(30.0, 30.0, -25.0));
    }

    #[test]
    fn frame_projects_span_onto_vertical_plane() {
        let frame = PlanarFrame::between(point(1700.0, 10.0, -2000.0), point(30.0, 30.0, -25.0));
        assert_relative_eq!(frame.horizontal_span(), 1670.0_f64.hypot(20.0));
        assert_relative_eq!(frame.vertical_span(), 1975.0);
        assert_relative_eq!(frame.azimuth(), 20.0_f64.atan2(-1670.0));
    }

    #[test]
    fn frame_embeds_end_points() {
        let bottom = point(-1700.0, -10.0, -2000.0);
        let top = point(-30.0, -30.0, -25.0);
        let frame = PlanarFrame::between(bottom, top);

        assert_eq!(frame.embed(0.0, 0.0), bottom);
        let end = frame.embed(frame.horizontal_span(), frame.vertical_span());
        assert_relative_eq!(end.x, top.x, epsilon = 1.0e-9);
        assert_relative_eq!(end.y, top.y, epsilon = 1.0e-9);
        assert_relative_eq!(end.z, top.z, epsilon = 1.0e-9);
    }

    #[test]
    fn vertical_frame_has_zero_horizontal_span() {
        let frame = PlanarFrame::between(point(5.0, 5.0, -100.0), point(5.0, 5.0, 0.0));
        assert_eq!(frame.horizontal_span(), 0.0);
        assert_eq!(frame.azimuth(), 0.0);
        assert_eq!(frame.embed(0.0, 40.0), point(5.0, 5.0, -60.0));
    }
}
