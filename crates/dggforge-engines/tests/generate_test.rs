//! End-to-end generation tests for the in-process backends.
//!
//! The external-engine family needs the DGGRID executable and is covered
//! by its unit tests instead; everything here runs against the H3 and
//! equal-area backends plus the GDAL GeoJSON driver.

use std::path::PathBuf;

use dggforge_core::config::EngineConfig;
use dggforge_core::dateline;
use dggforge_core::vector;
use dggforge_engines::{Dispatcher, GridRequest};

fn dispatcher(scratch: &std::path::Path) -> Dispatcher {
    Dispatcher::new(EngineConfig {
        dggrid_path: PathBuf::from("/nonexistent/dggrid"),
        scratch_dir: scratch.to_path_buf(),
        max_cells: 100_000,
    })
}

#[test]
fn test_h3_global_generation_produces_artifact() {
    let scratch = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(scratch.path());

    let request = GridRequest::parse("H3", 0, None, None, false).unwrap();
    let artifact = dispatcher.generate(&request).unwrap();

    assert_eq!(artifact.filename, "H3_0.geojson");
    assert_eq!(artifact.media_type, "application/octet-stream");
    assert!(artifact.path.exists());

    let cells = vector::read_cells(&artifact.path).unwrap();
    assert_eq!(cells.len(), 122);
}

#[test]
fn test_h3_clipped_generation_is_local() {
    let scratch = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(scratch.path());

    let request =
        GridRequest::parse("h3", 4, Some("24,58,28,60"), Some("geojson"), false).unwrap();
    let artifact = dispatcher.generate(&request).unwrap();

    let cells = vector::read_cells(&artifact.path).unwrap();
    assert!(!cells.is_empty());
    assert!(cells.len() < 5_000);
}

#[test]
fn test_rhealpix_degenerate_bbox_is_not_an_error() {
    let scratch = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(scratch.path());

    let request =
        GridRequest::parse("RHEALPIX", 4, Some("10,10,10,10"), None, false).unwrap();
    let artifact = dispatcher.generate(&request).unwrap();

    let cells = vector::read_cells(&artifact.path).unwrap();
    assert!(cells.len() <= 1);
}

#[test]
fn test_repair_flag_removes_dateline_crossings() {
    let scratch = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(scratch.path());

    // Several resolution-0 cells straddle the dateline, so repair must
    // grow the feature count while keeping every boundary on one side.
    let request = GridRequest::parse("H3", 0, None, None, true).unwrap();
    let artifact = dispatcher.generate(&request).unwrap();

    let cells = vector::read_cells(&artifact.path).unwrap();
    assert!(cells.len() > 122);
    assert!(cells.iter().all(|cell| !dateline::crosses_dateline(&cell.boundary)));
}

#[test]
fn test_stats_csv_artifact_has_header_and_rows() {
    let scratch = tempfile::tempdir().unwrap();
    let dispatcher = dispatcher(scratch.path());

    let family = dggforge_core::family::GridFamily::H3;
    let artifact = dispatcher.stats_csv(family, 5).unwrap();

    assert_eq!(artifact.filename, "H3_5.csv");
    let contents = std::fs::read_to_string(&artifact.path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 7, "header plus resolutions 0..=5");
    assert!(lines[0].starts_with("resolution,cells,"));
}
