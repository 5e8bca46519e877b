//! Equal-area grid backend
//!
//! Backed by the HEALPix tessellation from `cdshealpix`: 12 base cells,
//! each subdivided into four children per depth, all with equal spherical
//! area. Statistics come from that closed form rather than a lookup table.

use std::f64::consts::PI;

use geo::{Coord, LineString, Polygon, Rect};

use dggforge_core::cells::{Cell, CellCollection};
use dggforge_core::error::{DggforgeError, Result};
use dggforge_core::stats::{StatsRow, StatsTable};

pub const MAX_DEPTH: u32 = 29;

/// WGS84 authalic radius, km.
const EARTH_RADIUS_KM: f64 = 6_371.007_180_9;

fn earth_area_km2() -> f64 {
    4.0 * PI * EARTH_RADIUS_KM * EARTH_RADIUS_KM
}

fn cell_count(depth: u32) -> u64 {
    12u64 << (2 * depth)
}

fn depth(value: u32) -> Result<u8> {
    if value > MAX_DEPTH {
        return Err(DggforgeError::ResolutionOutOfRange {
            family: "RHEALPIX".to_string(),
            resolution: value,
            max: MAX_DEPTH,
        });
    }
    Ok(value as u8)
}

/// Enumerate cells at `target` depth: the full grid when no clip is given,
/// otherwise the cells covering the clip box.
///
/// Cell ids are `<depth>-<index>` in the nested numbering scheme. A cell
/// whose boundary cannot be constructed is logged and dropped rather than
/// failing the whole request.
pub fn cells(target: u32, clip: Option<&Rect<f64>>) -> Result<CellCollection> {
    let depth = depth(target)?;
    let layer = cdshealpix::nested::get(depth);

    let hashes: Vec<u64> = match clip {
        Some(rect) if rect.width() == 0.0 || rect.height() == 0.0 => {
            // Degenerate boxes still resolve to the cell under the point.
            vec![layer.hash(rect.min().x.to_radians(), rect.min().y.to_radians())]
        }
        Some(rect) => {
            let corners = [
                (rect.min().x.to_radians(), rect.min().y.to_radians()),
                (rect.max().x.to_radians(), rect.min().y.to_radians()),
                (rect.max().x.to_radians(), rect.max().y.to_radians()),
                (rect.min().x.to_radians(), rect.max().y.to_radians()),
            ];
            cdshealpix::nested::polygon_coverage(depth, &corners, true)
                .flat_iter()
                .collect()
        }
        None => (0..layer.n_hash()).collect(),
    };

    let mut collection = CellCollection::with_capacity(hashes.len());
    for hash in hashes {
        match cell_boundary(layer, hash) {
            Some(boundary) => collection.push(Cell {
                id: format!("{depth}-{hash}"),
                boundary,
            }),
            None => {
                tracing::warn!(cell = hash, depth, "skipping cell with degenerate boundary");
            }
        }
    }

    Ok(collection)
}

/// Closed-form statistics for depths 0..=`max_depth`, capped at the
/// library's maximum. Every cell at a depth has the same area; the length
/// column is the side of the equivalent square.
pub fn stats_table(max_depth: u32) -> StatsTable {
    let capped = max_depth.min(MAX_DEPTH);

    let rows = (0..=capped)
        .map(|depth| {
            let cells = cell_count(depth);
            let avg_area_km2 = earth_area_km2() / cells as f64;
            StatsRow {
                resolution: depth,
                cells,
                avg_area_km2,
                avg_length_km: Some(avg_area_km2.sqrt()),
            }
        })
        .collect();

    StatsTable::new(rows)
}

/// Boundary polygon from the cell's four vertices, (lon, lat) degrees with
/// longitudes normalized into [-180, 180).
fn cell_boundary(layer: &cdshealpix::nested::Layer, hash: u64) -> Option<Polygon<f64>> {
    let vertices = layer.vertices(hash);

    let mut coords = Vec::with_capacity(5);
    for (lon_rad, lat_rad) in vertices {
        let mut lon = lon_rad.to_degrees();
        let lat = lat_rad.to_degrees();
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        if lon >= 180.0 {
            lon -= 360.0;
        }
        coords.push(Coord { x: lon, y: lat });
    }
    coords.push(coords[0]);

    Some(Polygon::new(LineString::from(coords), vec![]))
}
