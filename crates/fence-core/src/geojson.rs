//! GeoJSON polygon extraction.
//!
//! Zone geometry is stored as GeoJSON, either a full `Feature` or a bare
//! geometry object. Only `Polygon` geometries are supported; the outer ring is
//! used and any holes are ignored. A coordinate tuple with fewer than two
//! elements rejects the whole zone; extra elements (altitude) are ignored.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::CoreError;
use crate::geometry::{Point, Ring};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Feature { geometry: Geometry },
    Geometry(Geometry),
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

/// Extract the outer ring of a GeoJSON `Polygon` (bare or wrapped in a `Feature`).
///
/// # Errors
///
/// Returns `CoreError::InvalidGeometry` if the document is not a polygon, the
/// outer ring is empty, a vertex has fewer than two coordinates, or the ring
/// fails [`Ring::new`] validation.
pub fn polygon_ring(document: &Value) -> Result<Ring, CoreError> {
    let doc: Document = serde_json::from_value(document.clone())
        .map_err(|e| CoreError::geometry(format!("not a GeoJSON geometry or feature: {e}")))?;
    let geometry = match doc {
        Document::Feature { geometry } | Document::Geometry(geometry) => geometry,
    };

    if geometry.kind != "Polygon" {
        return Err(CoreError::geometry(format!(
            "unsupported geometry type '{}', expected 'Polygon'",
            geometry.kind
        )));
    }

    let rings: Vec<Vec<Vec<f64>>> = serde_json::from_value(geometry.coordinates)
        .map_err(|e| CoreError::geometry(format!("malformed polygon coordinates: {e}")))?;
    let outer = rings
        .into_iter()
        .next()
        .filter(|ring| !ring.is_empty())
        .ok_or_else(|| CoreError::geometry("polygon has no outer ring"))?;

    let points = outer
        .iter()
        .enumerate()
        .map(|(position, coord)| match coord.as_slice() {
            [lon, lat, ..] => Ok(Point::new(*lon, *lat)),
            _ => Err(CoreError::geometry(format!(
                "vertex {position} has {} coordinate(s), expected at least 2",
                coord.len()
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ring::new(points)
}

/// Parse a GeoJSON string and extract its polygon ring.
///
/// # Errors
///
/// Returns `CoreError::InvalidGeometry` for invalid JSON or any error from
/// [`polygon_ring`].
pub fn parse_polygon(raw: &str) -> Result<Ring, CoreError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| CoreError::geometry(format!("invalid JSON: {e}")))?;
    polygon_ring(&value)
}

/// Render a ring as a bare GeoJSON `Polygon` geometry.
#[must_use]
pub fn to_polygon(ring: &Ring) -> Value {
    let coords: Vec<[f64; 2]> = ring.vertices().iter().map(|p| [p.lon, p.lat]).collect();
    serde_json::json!({
        "type": "Polygon",
        "coordinates": [coords],
    })
}
