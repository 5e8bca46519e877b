//! Per-family statistics providers
//!
//! The hexagonal and equal-area families answer from closed forms; the
//! external-engine family has to ask the engine, which makes its
//! statistics an I/O boundary.

use dggforge_core::config::EngineConfig;
use dggforge_core::error::Result;
use dggforge_core::family::GridFamily;
use dggforge_core::stats::StatsTable;

use crate::{dggrid, healpix, hex};

/// Statistics table covering resolutions 0..=`max_resolution` for a
/// family, clamped to the family's own maximum where one exists.
pub fn stats_for(
    config: &EngineConfig,
    family: GridFamily,
    max_resolution: u32,
    token: &str,
) -> Result<StatsTable> {
    match family {
        GridFamily::Dggrid(dggs_type) => {
            dggrid::stats_table(config, dggs_type, max_resolution, token)
        }
        GridFamily::H3 => Ok(hex::stats_table(max_resolution)),
        GridFamily::Rhealpix => Ok(healpix::stats_table(max_resolution)),
    }
}
