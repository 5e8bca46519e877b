//! External DGGRID engine backend
//!
//! The engine owns the grid mathematics; this module owns the construction
//! of its metafile input, the lifetime of the materialized clip file and
//! the interpretation of its exit status and statistics output. Every
//! scratch file is named with the caller's per-request token and removed
//! when the invocation ends, whichever way it ends.

use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use geo::Polygon;

use dggforge_core::cells::{Cell, CellCollection};
use dggforge_core::config::EngineConfig;
use dggforge_core::error::{DggforgeError, Result};
use dggforge_core::family::DggridType;
use dggforge_core::formats::OutputFormat;
use dggforge_core::stats::{StatsRow, StatsTable};
use dggforge_core::vector;

const BACKEND: &str = "dggrid";

/// Progress-report interval the engine logs at; also keeps its buffered
/// output bounded on whole-earth runs.
const UPDATE_FREQUENCY: u64 = 100_000;

/// Key/value lines in the engine's metafile syntax.
struct Metafile {
    lines: Vec<String>,
}

impl Metafile {
    fn new(operation: &str) -> Self {
        Self {
            lines: vec![format!("dggrid_operation {operation}")],
        }
    }

    fn push(&mut self, key: &str, value: impl Display) {
        self.lines.push(format!("{key} {value}"));
    }

    fn contents(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Scratch file removed on drop, so clip and metafile inputs never outlive
/// the invocation that needed them.
struct ScratchFile {
    path: PathBuf,
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), error = %err, "scratch file not removed");
        }
    }
}

/// Generate a grid with the external engine, returning the output file it
/// wrote. The clip region, when present, is materialized to a GeoJSON file
/// the engine subsets against; without one the whole earth is covered.
pub fn generate(
    config: &EngineConfig,
    dggs_type: DggridType,
    resolution: u32,
    mixed_aperture_level: Option<u32>,
    clip: Option<&Polygon<f64>>,
    format: OutputFormat,
    token: &str,
) -> Result<PathBuf> {
    let output_path = config.scratch_dir.join(format!(
        "temp_{}_{}_out_{}.{}",
        dggs_type.name(),
        resolution,
        token,
        format.extension()
    ));

    let mut meta = Metafile::new("GENERATE_GRID");
    meta.push("dggs_type", dggs_type.name());
    meta.push("dggs_res_spec", resolution);
    if dggs_type.is_mixed_aperture() {
        if let Some(level) = mixed_aperture_level {
            meta.push("dggs_num_aperture_4_res", level);
        }
    }
    meta.push("update_frequency", UPDATE_FREQUENCY);

    // Held until the engine exits; dropped (and deleted) on every path out.
    let _clip_file = match clip {
        Some(polygon) => {
            let clip_path = config.scratch_dir.join(format!("temp_clip_{token}.geojson"));
            let mut clip_cells = CellCollection::new();
            clip_cells.push(Cell {
                id: "clip".to_string(),
                boundary: polygon.clone(),
            });
            vector::write_cells(&clip_path, OutputFormat::GeoJson, &clip_cells)?;

            meta.push("clip_subset_type", "GDAL");
            meta.push("clip_region_files", clip_path.display());
            Some(ScratchFile { path: clip_path })
        }
        None => {
            meta.push("clip_subset_type", "WHOLE_EARTH");
            None
        }
    };

    meta.push("cell_output_type", "GDAL");
    meta.push("cell_output_gdal_format", format.driver());
    meta.push("cell_output_file_name", output_path.display());

    run(config, &meta, token)?;
    Ok(output_path)
}

/// Query the engine's per-resolution statistics for a grid type, up to and
/// including `max_resolution`.
pub fn stats_table(
    config: &EngineConfig,
    dggs_type: DggridType,
    max_resolution: u32,
    token: &str,
) -> Result<StatsTable> {
    let mut meta = Metafile::new("OUTPUT_STATS");
    meta.push("dggs_type", dggs_type.name());
    meta.push("dggs_res_spec", max_resolution);

    let stdout = run(config, &meta, token)?;
    let table = parse_stats(&stdout)?;
    tracing::debug!(
        dggs_type = %dggs_type,
        topology = dggs_type.topology(),
        aperture = ?dggs_type.aperture(),
        rows = table.len(),
        "engine statistics loaded"
    );
    Ok(table)
}

/// Write the metafile, run the engine on it and hand back its stdout.
fn run(config: &EngineConfig, meta: &Metafile, token: &str) -> Result<String> {
    let meta_path = config.scratch_dir.join(format!("temp_meta_{token}.meta"));
    fs::write(&meta_path, meta.contents())?;
    let _meta_file = ScratchFile {
        path: meta_path.clone(),
    };

    let output = Command::new(&config.dggrid_path)
        .arg(&meta_path)
        .current_dir(&config.scratch_dir)
        .output()
        .map_err(|err| DggforgeError::BackendUnavailable {
            backend: BACKEND.to_string(),
            reason: format!("{} could not be executed: {}", config.dggrid_path.display(), err),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DggforgeError::GenerationFailed {
            backend: BACKEND.to_string(),
            diagnostic: diagnostic_tail(&stdout, &stderr),
        });
    }

    Ok(stdout)
}

/// The engine reports errors on both streams; keep the informative tail.
fn diagnostic_tail(stdout: &str, stderr: &str) -> String {
    let combined = format!("{stdout}\n{stderr}");
    let lines: Vec<&str> = combined.lines().filter(|l| !l.trim().is_empty()).collect();
    let tail = lines.len().saturating_sub(10);
    lines[tail..].join("\n")
}

/// Parse the engine's OUTPUT_STATS table: a header naming the columns,
/// then one row per resolution with thousands separators in the numbers.
fn parse_stats(stdout: &str) -> Result<StatsTable> {
    let mut rows = Vec::new();
    let mut in_table = false;

    for line in stdout.lines() {
        let trimmed = line.trim();

        if !in_table {
            // The table follows the "Earth Radius" line in older releases
            // and a "# Cells" column header in newer ones.
            if trimmed.contains("# Cells") || trimmed.starts_with("Earth Radius") {
                in_table = true;
            }
            continue;
        }

        let fields: Vec<String> =
            trimmed.split_whitespace().map(|f| f.replace(',', "")).collect();
        if fields.len() < 4 {
            continue;
        }

        let (Ok(resolution), Ok(cells), Ok(area), Ok(cls)) = (
            fields[0].parse::<u32>(),
            fields[1].parse::<u64>(),
            fields[2].parse::<f64>(),
            fields[3].parse::<f64>(),
        ) else {
            continue;
        };

        rows.push(StatsRow {
            resolution,
            cells,
            avg_area_km2: area,
            avg_length_km: Some(cls),
        });
    }

    if rows.is_empty() {
        return Err(DggforgeError::GenerationFailed {
            backend: BACKEND.to_string(),
            diagnostic: "no statistics table in engine output".to_string(),
        });
    }

    Ok(StatsTable::new(rows))
}
