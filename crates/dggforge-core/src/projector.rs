//! On-the-fly equal-area projection
//!
//! The estimator needs a planar area for arbitrary clip geometries. Each
//! call builds a local azimuthal-equidistant projection from the geometry's
//! bounding box and pushes every ring coordinate through it.

use geo::algorithm::bounding_rect::BoundingRect;
use geo::{Area, Coord, LineString, Polygon};
use proj::Proj;

use crate::error::{DggforgeError, Result};

/// Planar area of a geographic polygon, in square kilometers.
pub fn projected_area_km2(polygon: &Polygon<f64>) -> Result<f64> {
    let projected = project_to_plane(polygon)?;
    Ok(projected.unsigned_area() / 1_000_000.0)
}

/// Reproject a geographic polygon into a local azimuthal-equidistant plane
/// with meter units.
///
/// The projection origin is derived from the bounding box *extent*
/// (longitude and latitude spans), not its centroid.
pub fn project_to_plane(polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
    let bbox = polygon.bounding_rect().ok_or_else(|| DggforgeError::Projection {
        reason: "geometry has no bounding box".to_string(),
    })?;

    let lon_0 = bbox.max().x - bbox.min().x;
    let lat_0 = bbox.max().y - bbox.min().y;

    let definition = format!(
        "+proj=aeqd +lat_0={lat_0} +lon_0={lon_0} +x_0=0 +y_0=0 +ellps=WGS84 +datum=WGS84 +units=m +no_defs"
    );

    let proj = Proj::new(&definition).map_err(|e| DggforgeError::Projection {
        reason: format!("failed to build projection '{definition}': {e}"),
    })?;

    let exterior = project_ring(&proj, polygon.exterior())?;
    let interiors = polygon
        .interiors()
        .iter()
        .map(|ring| project_ring(&proj, ring))
        .collect::<Result<Vec<_>>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn project_ring(proj: &Proj, ring: &LineString<f64>) -> Result<LineString<f64>> {
    let coords = ring
        .coords()
        .map(|coord| {
            proj.convert((coord.x, coord.y))
                .map(|(x, y)| Coord { x, y })
                .map_err(|e| DggforgeError::Projection {
                    reason: format!("failed to project ({}, {}): {}", coord.x, coord.y, e),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LineString::from(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
        geo::Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y }).to_polygon()
    }

    #[test]
    fn test_one_degree_box_area_near_equator() {
        // A 1x1 degree box at the equator spans roughly 111 km per side.
        let area = projected_area_km2(&unit_box(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert!(
            area > 11_000.0 && area < 13_500.0,
            "1x1 degree box should be ~12,300 km^2, got {area}"
        );
    }

    #[test]
    fn test_degenerate_box_has_zero_area() {
        let area = projected_area_km2(&unit_box(10.0, 10.0, 10.0, 10.0)).unwrap();
        assert!(area.abs() < 1e-9, "degenerate box should have zero area, got {area}");
    }

    #[test]
    fn test_area_grows_with_extent() {
        let small = projected_area_km2(&unit_box(20.0, 20.0, 21.0, 21.0)).unwrap();
        let large = projected_area_km2(&unit_box(20.0, 20.0, 24.0, 24.0)).unwrap();
        assert!(large > small);
    }
}
