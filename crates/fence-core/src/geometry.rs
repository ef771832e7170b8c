//! Planar geometry on (longitude, latitude) degrees.
//!
//! Coordinates are treated as a flat plane; zones are small enough that
//! geodesic effects do not change containment results.
//!
//! Containment uses the even-odd ray-casting rule with an **inclusive
//! boundary**: a point lying on an edge or a vertex is contained. Two adjacent
//! zones therefore both claim a point on their shared edge, and the assignment
//! engine resolves that with its lowest-zone-id rule instead of leaving the
//! outcome to floating-point rounding.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Collinearity tolerance (squared degrees) for the on-edge test.
const BOUNDARY_EPSILON: f64 = 1e-12;

/// A position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Both coordinates are finite (no NaN or infinity).
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Inclusive containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.lon >= self.min.lon && p.lon <= self.max.lon && p.lat >= self.min.lat && p.lat <= self.max.lat
    }
}

/// A validated, explicitly closed polygon ring.
///
/// Invariants: at least three distinct vertices, every coordinate finite, and
/// the last vertex equals the first. Serializes as the closed vertex list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Ring {
    vertices: Vec<Point>,
    bounds: BoundingBox,
}

impl Ring {
    /// Normalize `vertices` into a closed ring.
    ///
    /// The input may or may not repeat the first vertex at the end. Consecutive
    /// duplicate vertices are collapsed before counting.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidGeometry` if any coordinate is non-finite or
    /// fewer than three distinct vertices remain.
    pub fn new(vertices: Vec<Point>) -> Result<Self, CoreError> {
        if let Some(bad) = vertices.iter().find(|p| !p.is_finite()) {
            return Err(CoreError::geometry(format!(
                "non-finite vertex ({}, {})",
                bad.lon, bad.lat
            )));
        }

        let mut open: Vec<Point> = Vec::with_capacity(vertices.len() + 1);
        for p in vertices {
            if open.last() != Some(&p) {
                open.push(p);
            }
        }
        while open.len() > 1 && open.first() == open.last() {
            open.pop();
        }

        if open.len() < 3 {
            return Err(CoreError::geometry(format!(
                "ring has {} distinct vertices, need at least 3",
                open.len()
            )));
        }

        let bounds = bounds_of(&open);
        open.push(open[0]);
        Ok(Self {
            vertices: open,
            bounds,
        })
    }

    /// Build a ring from `(lon, lat)` pairs.
    ///
    /// # Errors
    ///
    /// Same as [`Ring::new`].
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, CoreError> {
        Self::new(pairs.iter().map(|&(lon, lat)| Point::new(lon, lat)).collect())
    }

    /// Closed vertex list (first vertex repeated at the end).
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Number of distinct vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() - 1
    }

    #[must_use]
    pub const fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Even-odd ray casting with inclusive boundary.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        if !p.is_finite() || !self.bounds.contains(p) {
            return false;
        }

        let mut inside = false;
        for edge in self.vertices.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            if on_segment(a, b, p) {
                return true;
            }
            if (a.lat > p.lat) != (b.lat > p.lat) {
                let crossing = (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon;
                if p.lon < crossing {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

impl TryFrom<Vec<Point>> for Ring {
    type Error = CoreError;

    fn try_from(value: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ring> for Vec<Point> {
    fn from(ring: Ring) -> Self {
        ring.vertices
    }
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let cross = (b.lon - a.lon).mul_add(p.lat - a.lat, -((b.lat - a.lat) * (p.lon - a.lon)));
    if cross.abs() > BOUNDARY_EPSILON {
        return false;
    }
    p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

fn bounds_of(points: &[Point]) -> BoundingBox {
    let mut min = points[0];
    let mut max = points[0];
    for p in &points[1..] {
        min.lon = min.lon.min(p.lon);
        min.lat = min.lat.min(p.lat);
        max.lon = max.lon.max(p.lon);
        max.lat = max.lat.max(p.lat);
    }
    BoundingBox { min, max }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn unit_square() -> Ring {
        Ring::from_pairs(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]).unwrap()
    }

    #[test]
    fn open_ring_is_closed() {
        let ring = unit_square();
        assert_eq!(ring.vertex_count(), 4);
        assert_eq!(ring.vertices().first(), ring.vertices().last());
    }

    #[test]
    fn explicitly_closed_ring_is_not_double_closed() {
        let ring = Ring::from_pairs(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
            .unwrap();
        assert_eq!(ring.vertex_count(), 4);
        assert_eq!(ring.vertices().len(), 5);
    }

    #[test]
    fn two_vertices_rejected() {
        let err = Ring::from_pairs(&[(0.0, 0.0), (1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidGeometry { .. }));
    }

    #[test]
    fn repeated_vertices_do_not_count_twice() {
        let err = Ring::from_pairs(&[(0.0, 0.0), (0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidGeometry { .. }));
    }

    #[rstest]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    #[case(f64::NEG_INFINITY, 1.0)]
    fn non_finite_vertex_rejected(#[case] lon: f64, #[case] lat: f64) {
        let err = Ring::from_pairs(&[(0.0, 0.0), (1.0, 0.0), (lon, lat)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidGeometry { .. }));
    }

    #[rstest]
    #[case::center(0.5, 0.5, true)]
    #[case::outside_right(2.0, 0.5, false)]
    #[case::outside_diagonal(2.0, 2.0, false)]
    #[case::on_left_edge(0.0, 0.5, true)]
    #[case::on_right_edge(1.0, 0.5, true)]
    #[case::on_top_edge(0.5, 1.0, true)]
    #[case::on_vertex(1.0, 1.0, true)]
    #[case::just_outside(1.000_001, 0.5, false)]
    fn square_containment(#[case] lon: f64, #[case] lat: f64, #[case] expected: bool) {
        assert_eq!(unit_square().contains(Point::new(lon, lat)), expected);
    }

    #[test]
    fn concave_polygon_notch_is_outside() {
        // U shape: notch between x=1..2, y=1..3
        let ring = Ring::from_pairs(&[
            (0.0, 0.0),
            (3.0, 0.0),
            (3.0, 3.0),
            (2.0, 3.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 3.0),
            (0.0, 3.0),
        ])
        .unwrap();
        assert!(!ring.contains(Point::new(1.5, 2.0)));
        assert!(ring.contains(Point::new(0.5, 2.0)));
        assert!(ring.contains(Point::new(2.5, 2.0)));
        assert!(ring.contains(Point::new(1.5, 0.5)));
    }

    #[test]
    fn non_finite_point_is_never_contained() {
        assert!(!unit_square().contains(Point::new(f64::NAN, 0.5)));
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let ring = Ring::from_pairs(&[(-1.0, 2.0), (3.0, -4.0), (0.5, 5.0)]).unwrap();
        assert_eq!(
            ring.bounds(),
            BoundingBox {
                min: Point::new(-1.0, -4.0),
                max: Point::new(3.0, 5.0),
            }
        );
    }
}
