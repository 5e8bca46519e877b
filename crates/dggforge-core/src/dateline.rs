//! Antimeridian repair post-processor
//!
//! Cell polygons coming out of a global grid can span the +/-180 degree
//! longitude discontinuity. When repair is requested, each crossing
//! polygon is split into an eastern and a western fragment so the result
//! renders correctly; both fragments keep the original cell id.
//!
//! Coordinates are (x = longitude, y = latitude) throughout.

use geo::{Area, BooleanOps, Coord, LineString, Polygon, Translate};

use crate::cells::{Cell, CellCollection};
use crate::error::Result;
use crate::formats::OutputFormat;
use crate::vector;

/// Smallest fragment area worth emitting; boolean ops on touching
/// boundaries can yield degenerate slivers.
const MIN_FRAGMENT_AREA: f64 = 1.0e-9;

/// True when the exterior ring's longitudes jump across the dateline:
/// any vertex more than 180 degrees away from the first one.
pub fn crosses_dateline(polygon: &Polygon<f64>) -> bool {
    let mut coords = polygon.exterior().coords();
    let Some(first) = coords.next() else {
        return false;
    };
    coords.any(|c| (first.x - c.x).abs() > 180.0)
}

/// Split a crossing polygon into non-crossing fragments.
///
/// Western vertices (negative longitude) are shifted into the 180..360
/// domain, the closed ring is rebuilt, and the result is intersected with
/// the two half-globes: the eastern piece stays in place, the western
/// piece is translated back by -360 degrees. Returns `None` when the
/// boundary is malformed (too few vertices or non-finite coordinates) and
/// cannot be intersected.
pub fn split_at_dateline(polygon: &Polygon<f64>) -> Option<Vec<Polygon<f64>>> {
    if !crosses_dateline(polygon) {
        return Some(vec![polygon.clone()]);
    }

    let shifted = shift_western_vertices(polygon)?;

    let east = half_globe(0.0, 180.0);
    let west = half_globe(180.0, 360.0);

    let mut fragments = Vec::with_capacity(2);
    for piece in shifted.intersection(&east) {
        if piece.unsigned_area() > MIN_FRAGMENT_AREA {
            fragments.push(piece);
        }
    }
    for piece in shifted.intersection(&west).translate(-360.0, 0.0) {
        if piece.unsigned_area() > MIN_FRAGMENT_AREA {
            fragments.push(piece);
        }
    }

    Some(fragments)
}

/// Repair a whole collection. Malformed cells are dropped with a warning
/// rather than aborting the request; repaired cells may contribute several
/// entries under one id.
pub fn repair_collection(collection: &CellCollection) -> CellCollection {
    let mut repaired = CellCollection::with_capacity(collection.len());
    repaired.epsg = collection.epsg;

    for cell in collection.iter() {
        if !crosses_dateline(&cell.boundary) {
            repaired.push(cell.clone());
            continue;
        }

        match split_at_dateline(&cell.boundary) {
            Some(fragments) => {
                for boundary in fragments {
                    repaired.push(Cell {
                        id: cell.id.clone(),
                        boundary,
                    });
                }
            }
            None => {
                tracing::warn!(cell = %cell.id, "dropping cell with unsplittable boundary");
            }
        }
    }

    repaired
}

/// Read a generated vector file, repair it and rewrite it in place in the
/// same format.
pub fn repair_file(path: &std::path::Path, format: OutputFormat) -> Result<()> {
    let collection = vector::read_cells(path)?;
    let repaired = repair_collection(&collection);
    vector::remove_artifact(path, format)?;
    vector::write_cells(path, format, &repaired)
}

fn shift_western_vertices(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let ring = polygon.exterior();
    if ring.0.len() < 4 || ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return None;
    }

    let coords: Vec<Coord<f64>> = ring
        .coords()
        .map(|c| {
            if c.x < 0.0 {
                Coord {
                    x: c.x + 360.0,
                    y: c.y,
                }
            } else {
                *c
            }
        })
        .collect();

    Some(Polygon::new(LineString::from(coords), vec![]))
}

fn half_globe(min_x: f64, max_x: f64) -> Polygon<f64> {
    geo::Rect::new(
        Coord { x: min_x, y: -90.0 },
        Coord { x: max_x, y: 90.0 },
    )
    .to_polygon()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon(coords: &[(f64, f64)]) -> Polygon<f64> {
        Polygon::new(
            LineString::from(coords.iter().map(|&(x, y)| Coord { x, y }).collect::<Vec<_>>()),
            vec![],
        )
    }

    fn crossing_cell() -> Polygon<f64> {
        // Straddles the dateline: longitudes 170..-170 (i.e. 170..190).
        polygon(&[
            (170.0, 10.0),
            (-170.0, 10.0),
            (-170.0, 20.0),
            (170.0, 20.0),
            (170.0, 10.0),
        ])
    }

    #[test]
    fn test_detects_crossing() {
        assert!(crosses_dateline(&crossing_cell()));
    }

    #[test]
    fn test_ignores_regular_polygon() {
        let regular = polygon(&[
            (10.0, 10.0),
            (20.0, 10.0),
            (20.0, 20.0),
            (10.0, 20.0),
            (10.0, 10.0),
        ]);
        assert!(!crosses_dateline(&regular));
    }

    #[test]
    fn test_split_is_identity_on_non_crossing_polygon() {
        let regular = polygon(&[
            (10.0, 10.0),
            (20.0, 10.0),
            (20.0, 20.0),
            (10.0, 20.0),
            (10.0, 10.0),
        ]);

        let once = split_at_dateline(&regular).unwrap();
        assert_eq!(once.len(), 1);

        // Repairing twice yields the same single polygon.
        let twice = split_at_dateline(&once[0]).unwrap();
        assert_eq!(twice.len(), 1);
        assert_eq!(twice[0], regular);
    }

    #[test]
    fn test_split_yields_two_fragments_preserving_area() {
        let cell = crossing_cell();
        let fragments = split_at_dateline(&cell).unwrap();
        assert_eq!(fragments.len(), 2);

        // Neither fragment crosses anymore.
        for fragment in &fragments {
            assert!(!crosses_dateline(fragment));
        }

        // The original covers 20 x 10 degrees; the fragments together must
        // cover the same planar area.
        let total: f64 = fragments.iter().map(|f| f.unsigned_area()).sum();
        assert!((total - 200.0).abs() < 1.0e-6, "expected area 200, got {total}");
    }

    #[test]
    fn test_split_fragments_sit_on_either_side() {
        let fragments = split_at_dateline(&crossing_cell()).unwrap();
        let east = fragments.iter().find(|f| f.exterior().coords().all(|c| c.x <= 180.0 && c.x >= 0.0));
        let west = fragments.iter().find(|f| f.exterior().coords().all(|c| c.x <= -170.0));
        assert!(east.is_some(), "missing eastern fragment");
        assert!(west.is_some(), "missing western fragment");
    }

    #[test]
    fn test_malformed_boundary_is_rejected() {
        let broken = polygon(&[
            (170.0, 10.0),
            (-170.0, f64::NAN),
            (-170.0, 20.0),
            (170.0, 10.0),
        ]);
        assert!(crosses_dateline(&broken));
        assert!(split_at_dateline(&broken).is_none());
    }

    #[test]
    fn test_repair_collection_keeps_id_on_both_fragments() {
        let mut collection = CellCollection::new();
        collection.push(Cell {
            id: "edge".to_string(),
            boundary: crossing_cell(),
        });
        collection.push(Cell {
            id: "inland".to_string(),
            boundary: polygon(&[
                (10.0, 10.0),
                (20.0, 10.0),
                (20.0, 20.0),
                (10.0, 20.0),
                (10.0, 10.0),
            ]),
        });

        let repaired = repair_collection(&collection);
        assert_eq!(repaired.len(), 3);
        assert_eq!(repaired.cells.iter().filter(|c| c.id == "edge").count(), 2);
        assert_eq!(repaired.cells.iter().filter(|c| c.id == "inland").count(), 1);
    }
}
