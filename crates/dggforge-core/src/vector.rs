//! GDAL-backed vector I/O for cell collections
//!
//! One writer and one reader cover every registered output format; the
//! driver comes from the format registry. Geometries cross the GDAL
//! boundary as WKT.

use std::fs;
use std::path::Path;

use gdal::errors::GdalError;
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{
    FieldDefn, FieldValue, Geometry as GdalGeometry, LayerAccess, LayerOptions, OGRFieldType,
    OGRwkbGeometryType,
};
use gdal::{Dataset, DriverManager};
use wkt::{ToWkt, TryFromWkt};

use crate::cells::{Cell, CellCollection};
use crate::error::{DggforgeError, Result};
use crate::formats::OutputFormat;

const CELL_ID_FIELD: &str = "cell_id";
const LAYER_NAME: &str = "cells";

/// Convert GDAL errors to dggforge errors with context.
pub fn convert_gdal_error(err: GdalError, context: &str) -> DggforgeError {
    DggforgeError::VectorIo {
        context: context.to_string(),
        source: err,
    }
}

/// Write a cell collection to `path` with the format's GDAL driver.
///
/// The layer carries a single `cell_id` string field. An empty collection
/// produces a valid, featureless file.
pub fn write_cells(path: &Path, format: OutputFormat, cells: &CellCollection) -> Result<()> {
    let driver = DriverManager::get_driver_by_name(format.driver())
        .map_err(|e| convert_gdal_error(e, &format!("no driver {}", format.driver())))?;

    let mut dataset = driver
        .create_vector_only(path)
        .map_err(|e| convert_gdal_error(e, &format!("failed to create {}", path.display())))?;

    let srs = SpatialRef::from_epsg(cells.epsg)
        .map_err(|e| convert_gdal_error(e, "failed to build spatial reference"))?;

    let mut layer = dataset
        .create_layer(LayerOptions {
            name: LAYER_NAME,
            srs: Some(&srs),
            ty: OGRwkbGeometryType::wkbPolygon,
            ..Default::default()
        })
        .map_err(|e| convert_gdal_error(e, "failed to create layer"))?;

    let field = FieldDefn::new(CELL_ID_FIELD, OGRFieldType::OFTString)
        .map_err(|e| convert_gdal_error(e, "failed to define cell_id field"))?;
    field
        .add_to_layer(&layer)
        .map_err(|e| convert_gdal_error(e, "failed to add cell_id field"))?;

    for cell in cells.iter() {
        let geometry = GdalGeometry::from_wkt(&cell.boundary.wkt_string())
            .map_err(|e| convert_gdal_error(e, &format!("invalid boundary for {}", cell.id)))?;

        layer
            .create_feature_fields(
                geometry,
                &[CELL_ID_FIELD],
                &[FieldValue::StringValue(cell.id.clone())],
            )
            .map_err(|e| convert_gdal_error(e, &format!("failed to write cell {}", cell.id)))?;
    }

    dataset
        .flush_cache()
        .map_err(|e| convert_gdal_error(e, "failed to flush dataset"))?;

    Ok(())
}

/// Read a vector file back into a cell collection.
///
/// Accepts Polygon and MultiPolygon features; the id comes from the
/// `cell_id` or `name` field, falling back to the feature id. Geometries
/// of any other type are skipped.
pub fn read_cells(path: &Path) -> Result<CellCollection> {
    let dataset = Dataset::open(path)
        .map_err(|e| convert_gdal_error(e, &format!("failed to open {}", path.display())))?;

    let mut layer = dataset
        .layer(0)
        .map_err(|e| convert_gdal_error(e, "dataset has no layer"))?;

    let mut collection = CellCollection::new();
    for feature in layer.features() {
        let id = feature
            .field_as_string_by_name(CELL_ID_FIELD)
            .ok()
            .flatten()
            .or_else(|| feature.field_as_string_by_name("name").ok().flatten())
            .or_else(|| feature.fid().map(|fid| fid.to_string()))
            .unwrap_or_default();

        let Some(geometry) = feature.geometry() else {
            continue;
        };

        for boundary in polygons_of(geometry)? {
            collection.push(Cell {
                id: id.clone(),
                boundary,
            });
        }
    }

    Ok(collection)
}

/// Delete a generated artifact, including shapefile sidecars.
pub fn remove_artifact(path: &Path, format: OutputFormat) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }

    if format == OutputFormat::ShapeZip {
        for ext in ["shx", "dbf", "prj", "cpg"] {
            let sidecar = path.with_extension(ext);
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
    }

    Ok(())
}

fn polygons_of(geometry: &GdalGeometry) -> Result<Vec<geo::Polygon<f64>>> {
    let wkt = geometry
        .wkt()
        .map_err(|e| convert_gdal_error(e, "failed to export geometry as WKT"))?;

    match geo::Geometry::<f64>::try_from_wkt_str(&wkt) {
        Ok(geo::Geometry::Polygon(polygon)) => Ok(vec![polygon]),
        Ok(geo::Geometry::MultiPolygon(multi)) => Ok(multi.0),
        Ok(_) | Err(_) => Ok(Vec::new()),
    }
}
