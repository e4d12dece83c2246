//! Error types for the briefing canvas
//!
//! The dispatch path itself never fails: unmatched queries, missing records and
//! stale timers are all ordinary outcomes. Errors here come from the edges:
//! - Configuration: missing or malformed config, bad timing values
//! - IO: reading config from disk
//! - Driver: the engine task has gone away

use std::path::PathBuf;
use thiserror::Error;

/// Error types for configuration and the engine driver
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    #[error("Canvas engine is not running")]
    EngineUnavailable,
}

impl CanvasError {
    /// Returns true if the caller can carry on with defaults
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CanvasError::ConfigNotFound(_))
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CanvasError::ConfigurationError(_) => "Check your configuration in ~/.briefos/config.json",
            CanvasError::ConfigNotFound(_) => "Defaults are in use. Create ~/.briefos/config.json to customise.",
            CanvasError::ParseError(_) => "Check the file is valid JSON.",
            CanvasError::IoError(_) => "Check file permissions.",
            CanvasError::InvalidTiming(_) => "Tick intervals must be greater than zero.",
            CanvasError::EngineUnavailable => "Restart briefos.",
        }
    }
}

impl From<std::io::Error> for CanvasError {
    fn from(err: std::io::Error) -> Self {
        CanvasError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for CanvasError {
    fn from(err: serde_json::Error) -> Self {
        CanvasError::ParseError(err.to_string())
    }
}

/// Serializable error representation for the rendering layer
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasErrorReport {
    pub message: String,
    pub recoverable: bool,
    pub recovery_suggestion: String,
}

impl From<&CanvasError> for CanvasErrorReport {
    fn from(err: &CanvasError) -> Self {
        CanvasErrorReport {
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
