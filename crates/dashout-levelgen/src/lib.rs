//! Seeded level generation for Dashout.
//!
//! [`LevelAssembler`] is the entry point: it turns a [`GenerationConfig`] into
//! a [`dashout_core::Level`] using one of the procedural strategies, an
//! optional [`LevelPredictor`] plugin, or a mix of the two.

pub mod assembler;
pub mod config;
pub mod constraints;
pub mod error;
pub mod features;
pub mod predictor;
pub mod strategy;
pub mod training;

pub use assembler::{GenerationMode, LevelAssembler};
pub use config::{
    GenerationConfig, GenerationConstraints, GenerationStyle, LevelGenConfig, Strategy,
    difficulty_bucket,
};
pub use error::{LevelGenError, PredictorError};
pub use features::FeatureExtractor;
pub use predictor::{
    LevelPredictor, Prediction, PredictionContext, PredictorMetadata, segment_from_prediction,
    synthesize_objects,
};
pub use strategy::{SegmentTemplate, TemplateObject, TemplateRegistry};
pub use training::{GameplayMetrics, GenerationContext, TrainingExample, TrainingLog};
