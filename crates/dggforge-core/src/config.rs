//! Process-wide engine configuration
//!
//! Built once at startup and injected into the dispatcher; deep call paths
//! never read the environment themselves.

use std::env;
use std::path::PathBuf;

use crate::error::{DggforgeError, Result};

/// Default ceiling on the pre-flight cell-count estimate.
pub const DEFAULT_MAX_CELLS: u64 = 100_000;

/// Paths and limits shared by every generation request.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Location of the DGGRID executable.
    pub dggrid_path: PathBuf,
    /// Scratch directory for clip files and generated artifacts.
    pub scratch_dir: PathBuf,
    /// Requests estimated above this many cells are rejected before generation.
    pub max_cells: u64,
}

impl EngineConfig {
    /// Reads `DGGRID`, `TMP_DIR` and `MAX_CELLS` from the environment,
    /// falling back to a `PATH` lookup, the system temp dir and
    /// [`DEFAULT_MAX_CELLS`] respectively.
    pub fn from_env() -> Self {
        let dggrid_path = env::var("DGGRID").map(PathBuf::from).unwrap_or_else(|_| {
            find_in_path("dggrid").unwrap_or_else(|| PathBuf::from("dggrid"))
        });

        let scratch_dir =
            env::var("TMP_DIR").map(PathBuf::from).unwrap_or_else(|_| env::temp_dir());

        let max_cells = match env::var("MAX_CELLS") {
            Ok(raw) => match raw.parse::<u64>() {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!(
                        "Invalid MAX_CELLS value '{}': expected a positive integer",
                        raw
                    );
                    DEFAULT_MAX_CELLS
                }
            },
            Err(_) => DEFAULT_MAX_CELLS,
        };

        Self {
            dggrid_path,
            scratch_dir,
            max_cells,
        }
    }

    /// Verify the configured paths. A missing DGGRID executable only
    /// disables the external-engine family, so callers may choose to treat
    /// this as a warning rather than fatal.
    pub fn validate(&self) -> Result<()> {
        if !self.dggrid_path.is_file() {
            return Err(DggforgeError::ConfigInvalid {
                key: "DGGRID".to_string(),
                reason: format!("{} is not a file", self.dggrid_path.display()),
            });
        }

        if !self.scratch_dir.is_dir() {
            return Err(DggforgeError::ConfigInvalid {
                key: "TMP_DIR".to_string(),
                reason: format!("{} is not a directory", self.scratch_dir.display()),
            });
        }

        Ok(())
    }
}

/// Search `PATH` for an executable, mirroring `which`.
fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path).map(|dir| dir.join(name)).find(|candidate| candidate.is_file())
}
