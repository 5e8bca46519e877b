//! Grid family catalogue
//!
//! The three backend families form a closed enumeration: adding a family
//! means extending [`GridFamily`] and wiring a generator/statistics pair,
//! never subclassing.

use std::fmt;

use serde::Serialize;

use crate::error::{DggforgeError, Result};

/// Grid types served by the external DGGRID engine, each a preset naming
/// its icosahedral projection, cell topology and subdivision aperture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DggridType {
    Isea3h,
    Isea4h,
    Isea4t,
    Isea4d,
    Isea43h,
    Isea7h,
    Fuller3h,
    Fuller4h,
    Fuller4t,
    Fuller4d,
    Fuller43h,
    Fuller7h,
    Planetrisk,
    Superfund,
}

/// Subdivision scheme between consecutive resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aperture {
    Pure(u32),
    /// Aperture 4 down to a switch resolution, aperture 3 below it.
    Mixed43,
}

impl DggridType {
    pub const ALL: [DggridType; 14] = [
        DggridType::Isea3h,
        DggridType::Isea4h,
        DggridType::Isea4t,
        DggridType::Isea4d,
        DggridType::Isea43h,
        DggridType::Isea7h,
        DggridType::Fuller3h,
        DggridType::Fuller4h,
        DggridType::Fuller4t,
        DggridType::Fuller4d,
        DggridType::Fuller43h,
        DggridType::Fuller7h,
        DggridType::Planetrisk,
        DggridType::Superfund,
    ];

    /// The identifier the engine expects in its `dggs_type` parameter.
    pub fn name(&self) -> &'static str {
        match self {
            DggridType::Isea3h => "ISEA3H",
            DggridType::Isea4h => "ISEA4H",
            DggridType::Isea4t => "ISEA4T",
            DggridType::Isea4d => "ISEA4D",
            DggridType::Isea43h => "ISEA43H",
            DggridType::Isea7h => "ISEA7H",
            DggridType::Fuller3h => "FULLER3H",
            DggridType::Fuller4h => "FULLER4H",
            DggridType::Fuller4t => "FULLER4T",
            DggridType::Fuller4d => "FULLER4D",
            DggridType::Fuller43h => "FULLER43H",
            DggridType::Fuller7h => "FULLER7H",
            DggridType::Planetrisk => "PLANETRISK",
            DggridType::Superfund => "SUPERFUND",
        }
    }

    pub fn topology(&self) -> &'static str {
        match self {
            DggridType::Isea4t | DggridType::Fuller4t => "TRIANGLE",
            DggridType::Isea4d | DggridType::Fuller4d => "DIAMOND",
            _ => "HEXAGON",
        }
    }

    pub fn aperture(&self) -> Aperture {
        match self {
            DggridType::Isea3h | DggridType::Fuller3h => Aperture::Pure(3),
            DggridType::Isea7h | DggridType::Fuller7h => Aperture::Pure(7),
            DggridType::Isea43h
            | DggridType::Fuller43h
            | DggridType::Planetrisk
            | DggridType::Superfund => Aperture::Mixed43,
            _ => Aperture::Pure(4),
        }
    }

    /// Mixed-aperture presets accept an explicit aperture-switch resolution.
    pub fn is_mixed_aperture(&self) -> bool {
        matches!(self.aperture(), Aperture::Mixed43)
    }

    fn parse(upper: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == upper)
    }
}

impl fmt::Display for DggridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The closed set of grid families behind the request surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GridFamily {
    /// External-engine family, qualified by its DGGRID preset.
    Dggrid(DggridType),
    /// Hexagonal global grid.
    H3,
    /// Equal-area global grid.
    Rhealpix,
}

impl GridFamily {
    /// Case-insensitive lookup of a requested family name.
    ///
    /// `CUSTOM` is a name the engine catalogue reserves for user-defined
    /// grid parameterizations, which this service does not expose.
    pub fn parse(name: &str) -> Result<Self> {
        let upper = name.to_uppercase();
        match upper.as_str() {
            "H3" => Ok(GridFamily::H3),
            "RHEALPIX" => Ok(GridFamily::Rhealpix),
            "CUSTOM" => Err(DggforgeError::UnsupportedFeature {
                family: upper.clone(),
                feature: "User-defined grid parameterization".to_string(),
            }),
            other => DggridType::parse(other)
                .map(GridFamily::Dggrid)
                .ok_or_else(|| DggforgeError::UnknownGridFamily { name: upper.clone() }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GridFamily::Dggrid(t) => t.name(),
            GridFamily::H3 => "H3",
            GridFamily::Rhealpix => "RHEALPIX",
        }
    }
}

impl fmt::Display for GridFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
