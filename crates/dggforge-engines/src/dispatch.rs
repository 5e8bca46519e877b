//! Request validation, estimation, backend dispatch and assembly
//!
//! The dispatcher walks one request through validating, estimating,
//! generating, optional dateline repair and artifact assembly. Rejections
//! happen before any generation side effect; backend failures are final,
//! never retried.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use geo::{Coord, Rect};
use uuid::Uuid;

use dggforge_core::config::EngineConfig;
use dggforge_core::dateline;
use dggforge_core::error::{DggforgeError, Result};
use dggforge_core::estimate;
use dggforge_core::family::GridFamily;
use dggforge_core::formats::OutputFormat;
use dggforge_core::stats::StatsTable;
use dggforge_core::vector;

use crate::{dggrid, healpix, hex, stats};

/// All artifacts download as opaque binary payloads.
pub const MEDIA_TYPE: &str = "application/octet-stream";

/// A validated grid-generation request.
#[derive(Debug, Clone)]
pub struct GridRequest {
    pub family: GridFamily,
    pub resolution: u32,
    pub clip: Option<Rect<f64>>,
    pub format: OutputFormat,
    pub split_dateline: bool,
    /// Aperture-switch resolution for mixed-aperture engine presets.
    pub mixed_aperture_level: Option<u32>,
}

impl GridRequest {
    /// Validate raw request parts. The output format defaults to GeoJSON.
    pub fn parse(
        family: &str,
        resolution: u32,
        bbox: Option<&str>,
        format: Option<&str>,
        split_dateline: bool,
    ) -> Result<Self> {
        let family = GridFamily::parse(family)?;
        let format = match format {
            Some(name) => OutputFormat::parse(name)?,
            None => OutputFormat::GeoJson,
        };
        let clip = bbox.map(parse_bbox).transpose()?;

        Ok(Self {
            family,
            resolution,
            clip,
            format,
            split_dateline,
            mixed_aperture_level: None,
        })
    }
}

/// Parse `minLon,minLat,maxLon,maxLat` into a clip box.
pub fn parse_bbox(raw: &str) -> Result<Rect<f64>> {
    let invalid = |reason: &str| DggforgeError::InvalidBoundingBox {
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(|_| invalid("bbox format must be comma-separated int or float: minLon,minLat,maxLon,maxLat"))?;

    if parts.len() != 4 {
        return Err(invalid("expected exactly four values: minLon,minLat,maxLon,maxLat"));
    }

    Ok(Rect::new(
        Coord {
            x: parts[0],
            y: parts[1],
        },
        Coord {
            x: parts[2],
            y: parts[3],
        },
    ))
}

/// A finished response payload: the file on disk plus the name and media
/// type it is served under.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub filename: String,
    pub media_type: &'static str,
}

/// Backend selector and request pipeline. Stateless across requests; all
/// scratch artifacts carry a per-request token so concurrent requests
/// never collide.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: EngineConfig,
}

impl Dispatcher {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full generation pipeline for one request.
    pub fn generate(&self, request: &GridRequest) -> Result<Artifact> {
        let token = Uuid::new_v4().to_string();
        let clip_polygon = request.clip.map(|rect| rect.to_polygon());

        let table =
            stats::stats_for(&self.config, request.family, request.resolution, &token)?;
        let estimated = estimate::estimate(
            &table,
            request.family,
            request.resolution,
            clip_polygon.as_ref(),
        )?;

        tracing::info!(
            family = %request.family,
            resolution = request.resolution,
            has_clip = request.clip.is_some(),
            estimated,
            ceiling = self.config.max_cells,
            "pre-flight estimate"
        );

        if estimated > self.config.max_cells {
            return Err(DggforgeError::TooManyCells {
                estimated,
                ceiling: self.config.max_cells,
            });
        }

        let output = match request.family {
            GridFamily::Dggrid(dggs_type) => dggrid::generate(
                &self.config,
                dggs_type,
                request.resolution,
                request.mixed_aperture_level,
                clip_polygon.as_ref(),
                request.format,
                &token,
            )?,
            GridFamily::H3 => {
                let collection = hex::cells(request.resolution, clip_polygon.as_ref())?;
                self.write_collection(request, &collection, &token)?
            }
            GridFamily::Rhealpix => {
                let collection = healpix::cells(request.resolution, request.clip.as_ref())?;
                self.write_collection(request, &collection, &token)?
            }
        };

        if request.split_dateline {
            dateline::repair_file(&output, request.format)?;
        }

        self.assemble(request, output)
    }

    /// Statistics table for a family, resolutions 0..=`max_resolution`.
    pub fn stats(&self, family: GridFamily, max_resolution: u32) -> Result<StatsTable> {
        let token = Uuid::new_v4().to_string();
        stats::stats_for(&self.config, family, max_resolution, &token)
    }

    /// Statistics rendered to a CSV artifact.
    pub fn stats_csv(&self, family: GridFamily, max_resolution: u32) -> Result<Artifact> {
        let table = self.stats(family, max_resolution)?;
        let token = Uuid::new_v4().to_string();

        let path = self
            .config
            .scratch_dir
            .join(format!("temp_{}_{}_out_{}.csv", family.name(), max_resolution, token));
        fs::write(&path, table.to_csv())?;

        Ok(Artifact {
            path,
            filename: format!("{}_{}.csv", family.name(), max_resolution),
            media_type: MEDIA_TYPE,
        })
    }

    fn write_collection(
        &self,
        request: &GridRequest,
        collection: &dggforge_core::cells::CellCollection,
        token: &str,
    ) -> Result<PathBuf> {
        let path = self.config.scratch_dir.join(format!(
            "temp_{}_{}_out_{}.{}",
            request.family.name(),
            request.resolution,
            token,
            request.format.extension()
        ));
        vector::write_cells(&path, request.format, collection)?;
        Ok(path)
    }

    fn assemble(&self, request: &GridRequest, output: PathBuf) -> Result<Artifact> {
        let stem = format!("{}_{}", request.family.name(), request.resolution);

        match request.format {
            OutputFormat::ShapeZip => {
                let zip_path = bundle_shapefile(&output, &stem)?;
                Ok(Artifact {
                    path: zip_path,
                    filename: format!("{stem}.zip"),
                    media_type: MEDIA_TYPE,
                })
            }
            format => Ok(Artifact {
                path: output,
                filename: format!("{stem}.{}", format.extension()),
                media_type: MEDIA_TYPE,
            }),
        }
    }
}

/// Bundle a shapefile's sidecar set into one zip next to it. The parts
/// keep the presentation stem inside the archive.
fn bundle_shapefile(shp_path: &Path, stem: &str) -> Result<PathBuf> {
    let zip_err = |err: zip::result::ZipError| DggforgeError::Io(io::Error::other(err));

    let zip_path = shp_path.with_extension("zip");
    let file = fs::File::create(&zip_path)?;
    let mut archive = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for ext in ["shp", "shx", "dbf", "prj", "cpg"] {
        let part = shp_path.with_extension(ext);
        if !part.exists() {
            continue;
        }

        archive.start_file(format!("{stem}.{ext}"), options).map_err(zip_err)?;
        io::copy(&mut fs::File::open(&part)?, &mut archive)?;
    }

    archive.finish().map_err(zip_err)?;
    Ok(zip_path)
}
