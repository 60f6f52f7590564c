//! Error handling for Geolayers
//!
//! Collaborators (project store, layer provider, drivers) report faults as
//! `LayerError`. The `ProjectManager` facade turns them into plain
//! absent/false/empty results and logs the message.

use std::path::PathBuf;

use thiserror::Error;

use crate::layers::LayerKind;

/// Result type alias for Geolayers operations
pub type Result<T> = std::result::Result<T, LayerError>;

/// Main error type for layer and project operations
#[derive(Error, Debug)]
pub enum LayerError {
    // Resolution Errors
    #[error("Layer not found: {name}")]
    NotFound { name: String },

    #[error("Layer '{name}' is a {found} layer, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: LayerKind,
        found: LayerKind,
    },

    // Source Errors
    #[error("Invalid layer source {path}: {reason}")]
    InvalidSource { path: PathBuf, reason: String },

    #[error("Duplicate layer id: {id}")]
    DuplicateLayerId { id: String },

    // Codec Errors
    #[error("Codec error: {reason}")]
    CodecError { reason: String },

    #[error("No driver registered for format: {format}")]
    UnknownDriver { format: String },

    // Project Errors
    #[error("No project path specified")]
    NoProjectPath,

    #[error("Invalid project file: {reason}")]
    ProjectFormat { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl LayerError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            LayerError::NotFound { .. } => "NOT_FOUND",
            LayerError::TypeMismatch { .. } => "TYPE_MISMATCH",
            LayerError::InvalidSource { .. } => "INVALID_SOURCE",
            LayerError::DuplicateLayerId { .. } => "DUPLICATE_LAYER_ID",
            LayerError::CodecError { .. } => "CODEC_ERROR",
            LayerError::UnknownDriver { .. } => "UNKNOWN_DRIVER",
            LayerError::NoProjectPath => "NO_PROJECT_PATH",
            LayerError::ProjectFormat { .. } => "PROJECT_FORMAT",
            LayerError::Io(_) => "IO_ERROR",
            LayerError::Json(_) => "JSON_ERROR",
            LayerError::GeoJson(_) => "GEOJSON_ERROR",
        }
    }

    /// Get a user-facing recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            LayerError::NotFound { .. } => Some("Run 'geolayers-cli list' to see layer names."),
            LayerError::TypeMismatch { .. } => {
                Some("This operation needs a vector layer; raster layers have no features.")
            }
            LayerError::InvalidSource { .. } => {
                Some("Check the file exists and has a supported extension (.geojson, .geojsonl, .asc).")
            }
            LayerError::UnknownDriver { .. } => {
                Some("Run 'geolayers-cli drivers' to see available export formats.")
            }
            LayerError::NoProjectPath => {
                Some("Pass --project <path> or set GEOLAYERS_PROJECT.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = LayerError::NotFound {
            name: "roads".to_string(),
        };
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "Layer not found: roads");
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = LayerError::TypeMismatch {
            name: "dem".to_string(),
            expected: LayerKind::Vector,
            found: LayerKind::Raster,
        };
        assert_eq!(err.to_string(), "Layer 'dem' is a raster layer, expected vector");
        assert!(err.recovery_suggestion().is_some());
    }
}
