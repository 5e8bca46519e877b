//! H3 hexagonal grid backend
//!
//! Enumeration and boundary lookup come from the `h3o` library; this
//! module only decides which indexes a request covers and turns them into
//! a cell collection.

use geo::Polygon;
use h3o::geom::{PolyfillConfig, ToCells, ToGeo};
use h3o::{CellIndex, Resolution};

use dggforge_core::cells::{Cell, CellCollection};
use dggforge_core::error::{DggforgeError, Result};
use dggforge_core::stats::{StatsRow, StatsTable};

const BACKEND: &str = "h3";

pub const MAX_RESOLUTION: u32 = 15;

fn resolution(value: u32) -> Result<Resolution> {
    u8::try_from(value)
        .ok()
        .and_then(|v| Resolution::try_from(v).ok())
        .ok_or_else(|| DggforgeError::ResolutionOutOfRange {
            family: "H3".to_string(),
            resolution: value,
            max: MAX_RESOLUTION,
        })
}

/// Enumerate the cells covering the clip region, or the whole globe when
/// no clip is given: the 122 base cells, expanded to their children for
/// resolutions above zero.
pub fn cells(target: u32, clip: Option<&Polygon<f64>>) -> Result<CellCollection> {
    let res = resolution(target)?;

    let indexes: Vec<CellIndex> = match clip {
        Some(polygon) => {
            let region = h3o::geom::Polygon::from_degrees(polygon.clone()).map_err(|err| {
                DggforgeError::GenerationFailed {
                    backend: BACKEND.to_string(),
                    diagnostic: format!("clip region rejected: {err}"),
                }
            })?;
            region.to_cells(PolyfillConfig::new(res)).collect()
        }
        None => {
            if res == Resolution::Zero {
                CellIndex::base_cells().collect()
            } else {
                CellIndex::base_cells().flat_map(|base| base.children(res)).collect()
            }
        }
    };

    let mut collection = CellCollection::with_capacity(indexes.len());
    for index in indexes {
        match index.to_geom(true) {
            Ok(boundary) => collection.push(Cell {
                id: index.to_string(),
                boundary,
            }),
            Err(err) => {
                tracing::warn!(cell = %index, error = %err, "skipping cell without boundary");
            }
        }
    }

    Ok(collection)
}

/// Closed-form statistics for resolutions 0..=`max_resolution`, capped at
/// the library's maximum.
pub fn stats_table(max_resolution: u32) -> StatsTable {
    let capped = max_resolution.min(MAX_RESOLUTION) as u8;

    let rows = (0..=capped)
        .filter_map(|value| Resolution::try_from(value).ok())
        .map(|res| StatsRow {
            resolution: u8::from(res) as u32,
            cells: res.cell_count(),
            avg_area_km2: res.area_km2(),
            avg_length_km: Some(res.edge_length_km()),
        })
        .collect();

    StatsTable::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, Rect};

    #[test]
    fn test_global_resolution_zero_has_122_cells() {
        let collection = cells(0, None).unwrap();
        assert_eq!(collection.len(), 122);
    }

    #[test]
    fn test_global_resolution_one_expands_children() {
        let collection = cells(1, None).unwrap();
        assert_eq!(collection.len(), 842);
    }

    #[test]
    fn test_clipped_enumeration_is_local() {
        let clip = Rect::new(Coord { x: 24.0, y: 58.0 }, Coord { x: 28.0, y: 60.0 })
            .to_polygon();
        let collection = cells(3, Some(&clip)).unwrap();

        assert!(!collection.is_empty());
        assert!(collection.len() < 1_000, "clip should cover a local subset");
    }

    #[test]
    fn test_resolution_out_of_range() {
        let err = cells(16, None).unwrap_err();
        assert!(matches!(err, DggforgeError::ResolutionOutOfRange { .. }));
    }

    #[test]
    fn test_stats_table_respects_max_resolution() {
        let table = stats_table(5);
        assert_eq!(table.len(), 6);
        assert_eq!(table.row(0).unwrap().cells, 122);
        assert_eq!(table.row(5).unwrap().cells, 2_016_842);
        assert!(table.row(6).is_none());
    }

    #[test]
    fn test_stats_table_caps_at_library_maximum() {
        let table = stats_table(40);
        assert_eq!(table.max_resolution(), Some(15));
    }
}
