//! Pre-flight cell-count estimation
//!
//! Pure with respect to generation: only the family's statistics table and
//! the clip geometry's projected area are consulted. The result is an
//! estimate, not a bound; highly irregular clip regions may generate
//! somewhat more cells than predicted.

use geo::Polygon;

use crate::error::{DggforgeError, Result};
use crate::family::GridFamily;
use crate::projector;
use crate::stats::StatsTable;

/// Estimate how many cells generation would produce.
///
/// Without a clip region this is the table's exact whole-earth count; with
/// one it is the clip's projected area divided by the average cell area.
pub fn estimate(
    table: &StatsTable,
    family: GridFamily,
    resolution: u32,
    clip: Option<&Polygon<f64>>,
) -> Result<u64> {
    let row = table.row(resolution).ok_or_else(|| DggforgeError::ResolutionOutOfRange {
        family: family.name().to_string(),
        resolution,
        max: table.max_resolution().unwrap_or(0),
    })?;

    match clip {
        None => Ok(row.cells),
        Some(polygon) => {
            let area_km2 = projector::projected_area_km2(polygon)?;
            Ok(clipped_count(area_km2, row.avg_area_km2))
        }
    }
}

fn clipped_count(area_km2: f64, avg_area_km2: f64) -> u64 {
    (area_km2 / avg_area_km2).round() as u64
}
