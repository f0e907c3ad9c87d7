use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AppError {
    ArtifactNotFound(String),
    ArtifactCorrupt(String),
    ArtifactsUnavailable(String),
    PredictionFailure(String),
    ValidationError(String),
    Internal(String),
    IoError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ArtifactNotFound(msg) => write!(f, "Artifact not found: {}", msg),
            AppError::ArtifactCorrupt(msg) => write!(f, "Artifact corrupt: {}", msg),
            AppError::ArtifactsUnavailable(msg) => write!(f, "Artifacts unavailable: {}", msg),
            AppError::PredictionFailure(msg) => write!(f, "Prediction failed: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
