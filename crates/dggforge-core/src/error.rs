//! Error types for dggforge

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DggforgeError {
    // Request validation errors
    #[error("Unknown grid family: {name}")]
    UnknownGridFamily { name: String },

    #[error("Unsupported output format {name}: current formats only {}", supported.join(","))]
    UnsupportedFormat { name: String, supported: Vec<String> },

    #[error("Invalid bounding box \"{value}\": {reason}")]
    InvalidBoundingBox { value: String, reason: String },

    #[error("Resolution {resolution} out of range for {family}: statistics cover resolutions up to {max}")]
    ResolutionOutOfRange {
        family: String,
        resolution: u32,
        max: u32,
    },

    // Pre-flight rejection
    #[error("Response too big: estimated {estimated} cells exceeds the ceiling of {ceiling}")]
    TooManyCells { estimated: u64, ceiling: u64 },

    // Recognized but unimplemented capability
    #[error("{feature} is not implemented for {family}")]
    UnsupportedFeature { family: String, feature: String },

    // Backend failures
    #[error("Backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("Generation failed in {backend}: {diagnostic}")]
    GenerationFailed { backend: String, diagnostic: String },

    // Projection errors
    #[error("Projection failed: {reason}")]
    Projection { reason: String },

    // Vector I/O errors
    #[error("Vector I/O error ({context}): {source}")]
    VectorIo {
        context: String,
        #[source]
        source: gdal::errors::GdalError,
    },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DggforgeError>;
