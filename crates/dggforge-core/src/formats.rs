//! Output format registry
//!
//! Static mapping from a logical format name to the GDAL driver that writes
//! it and the file extension it gets on disk. Matching is case-insensitive
//! and has no side effects.

use std::fmt;

use serde::Serialize;

use crate::error::{DggforgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutputFormat {
    Gpkg,
    ShapeZip,
    FlatGeobuf,
    GeoJson,
    Gml,
    Kml,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Gpkg,
        OutputFormat::ShapeZip,
        OutputFormat::FlatGeobuf,
        OutputFormat::GeoJson,
        OutputFormat::Gml,
        OutputFormat::Kml,
    ];

    pub fn parse(name: &str) -> Result<Self> {
        let upper = name.to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == upper)
            .ok_or_else(|| DggforgeError::UnsupportedFormat {
                name: upper,
                supported: Self::supported_names(),
            })
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Gpkg => "GPKG",
            OutputFormat::ShapeZip => "SHAPEZIP",
            OutputFormat::FlatGeobuf => "FLATGEOBUF",
            OutputFormat::GeoJson => "GEOJSON",
            OutputFormat::Gml => "GML",
            OutputFormat::Kml => "KML",
        }
    }

    /// GDAL vector driver identifier.
    pub fn driver(&self) -> &'static str {
        match self {
            OutputFormat::Gpkg => "GPKG",
            OutputFormat::ShapeZip => "ESRI Shapefile",
            OutputFormat::FlatGeobuf => "FlatGeobuf",
            OutputFormat::GeoJson => "GeoJSON",
            OutputFormat::Gml => "GML",
            OutputFormat::Kml => "KML",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Gpkg => "gpkg",
            OutputFormat::ShapeZip => "shp",
            OutputFormat::FlatGeobuf => "fgb",
            OutputFormat::GeoJson => "geojson",
            OutputFormat::Gml => "gml",
            OutputFormat::Kml => "kml",
        }
    }

    pub fn supported_names() -> Vec<String> {
        Self::ALL.iter().map(|f| f.name().to_string()).collect()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
