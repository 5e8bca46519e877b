//! Round-trip and in-place repair tests over the GeoJSON driver.

use geo::{Coord, LineString, Polygon};

use dggforge_core::cells::{Cell, CellCollection};
use dggforge_core::dateline;
use dggforge_core::formats::OutputFormat;
use dggforge_core::vector;

fn polygon(coords: &[(f64, f64)]) -> Polygon<f64> {
    Polygon::new(
        LineString::from(coords.iter().map(|&(x, y)| Coord { x, y }).collect::<Vec<_>>()),
        vec![],
    )
}

fn sample_collection() -> CellCollection {
    let mut collection = CellCollection::new();
    collection.push(Cell {
        id: "a".to_string(),
        boundary: polygon(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]),
    });
    collection.push(Cell {
        id: "b".to_string(),
        boundary: polygon(&[
            (10.0, 10.0),
            (11.0, 10.0),
            (11.0, 11.0),
            (10.0, 11.0),
            (10.0, 10.0),
        ]),
    });
    collection
}

#[test]
fn test_write_read_round_trip_preserves_features() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cells.geojson");

    let written = sample_collection();
    vector::write_cells(&path, OutputFormat::GeoJson, &written).unwrap();

    let read = vector::read_cells(&path).unwrap();
    assert_eq!(read.len(), written.len());

    for (a, b) in written.iter().zip(read.iter()) {
        assert_eq!(a.id, b.id);
        let exterior_a: Vec<_> = a.boundary.exterior().coords().collect();
        let exterior_b: Vec<_> = b.boundary.exterior().coords().collect();
        assert_eq!(exterior_a.len(), exterior_b.len());
        for (ca, cb) in exterior_a.iter().zip(exterior_b.iter()) {
            assert!((ca.x - cb.x).abs() < 1.0e-9);
            assert!((ca.y - cb.y).abs() < 1.0e-9);
        }
    }
}

#[test]
fn test_empty_collection_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.geojson");

    vector::write_cells(&path, OutputFormat::GeoJson, &CellCollection::new()).unwrap();
    let read = vector::read_cells(&path).unwrap();
    assert!(read.is_empty());
}

#[test]
fn test_repair_file_splits_crossing_cell_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crossing.geojson");

    let mut collection = CellCollection::new();
    collection.push(Cell {
        id: "edge".to_string(),
        boundary: polygon(&[
            (170.0, 10.0),
            (-170.0, 10.0),
            (-170.0, 20.0),
            (170.0, 20.0),
            (170.0, 10.0),
        ]),
    });
    vector::write_cells(&path, OutputFormat::GeoJson, &collection).unwrap();

    dateline::repair_file(&path, OutputFormat::GeoJson).unwrap();

    let repaired = vector::read_cells(&path).unwrap();
    assert_eq!(repaired.len(), 2);
    assert!(repaired.iter().all(|c| c.id == "edge"));
    assert!(repaired.iter().all(|c| !dateline::crosses_dateline(&c.boundary)));
}
