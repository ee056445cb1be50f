use std::path::PathBuf;

use thiserror::Error;

/// Hard failures from level generation. These are programming or configuration
/// mistakes; degraded-capability conditions never show up here.
#[derive(Debug, Error)]
pub enum LevelGenError {
    #[error("unknown generation strategy: {0:?}")]
    UnknownStrategy(String),
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),
    #[error("invalid blend weights: {0}")]
    InvalidBlend(String),
    #[error("failed to parse level generation config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("failed to export training log: {0}")]
    Export(#[from] serde_json::Error),
}

/// Failures reported by a predictor plugin. The assembler treats every one of
/// these as "fall back to procedural".
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("failed to load model from {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
    #[error("predictor unavailable")]
    Unavailable,
    #[error("prediction failed: {0}")]
    Prediction(String),
}
