//! Per-resolution grid statistics
//!
//! Each grid family publishes one row per resolution; the pre-flight
//! estimator consults these instead of touching the generators.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    pub resolution: u32,
    /// Whole-earth cell count at this resolution.
    pub cells: u64,
    pub avg_area_km2: f64,
    /// Average edge length for hexagonal grids, characteristic length
    /// scale for the external-engine family.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_length_km: Option<f64>,
}

/// Immutable once built for a family; ordered by resolution.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct StatsTable {
    rows: Vec<StatsRow>,
}

impl StatsTable {
    pub fn new(rows: Vec<StatsRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[StatsRow] {
        &self.rows
    }

    pub fn row(&self, resolution: u32) -> Option<&StatsRow> {
        self.rows.iter().find(|r| r.resolution == resolution)
    }

    pub fn max_resolution(&self) -> Option<u32> {
        self.rows.iter().map(|r| r.resolution).max()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tabular rendering for the CSV statistics response.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("resolution,cells,avg_area_km2,avg_length_km\n");
        for row in &self.rows {
            let length = row.avg_length_km.map(|v| v.to_string()).unwrap_or_default();
            out.push_str(&format!(
                "{},{},{},{}\n",
                row.resolution, row.cells, row.avg_area_km2, length
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StatsTable {
        StatsTable::new(vec![
            StatsRow {
                resolution: 0,
                cells: 12,
                avg_area_km2: 42_505_471.8,
                avg_length_km: None,
            },
            StatsRow {
                resolution: 1,
                cells: 42,
                avg_area_km2: 12_144_420.5,
                avg_length_km: Some(1_107.7),
            },
        ])
    }

    #[test]
    fn test_row_lookup() {
        let table = table();
        assert_eq!(table.row(0).unwrap().cells, 12);
        assert_eq!(table.row(1).unwrap().cells, 42);
        assert!(table.row(2).is_none());
        assert_eq!(table.max_resolution(), Some(1));
    }

    #[test]
    fn test_to_csv_has_header_and_one_line_per_row() {
        let csv = table().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "resolution,cells,avg_area_km2,avg_length_km");
        assert!(lines[1].starts_with("0,12,"));
        assert!(lines[1].ends_with(','));
        assert!(lines[2].ends_with("1107.7"));
    }
}
