//! Append-only log of generated segments for offline model training.

use serde::{Deserialize, Serialize};

use dashout_core::{GameObject, GenerationMethod, LevelSegment, SegmentFeatures};

use crate::config::GenerationStyle;
use crate::error::LevelGenError;

/// Inputs that produced a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationContext {
    pub difficulty: f32,
    pub style: GenerationStyle,
    pub seed: u64,
    pub segment_index: usize,
    pub start_x: f32,
    pub length: f32,
    pub method: Option<GenerationMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutput {
    pub features: SegmentFeatures,
    pub feature_vector: Vec<f32>,
    pub objects: Vec<GameObject>,
}

/// Outcome data attached after the segment was actually played.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameplayMetrics {
    pub completion_rate: f32,
    pub deaths: u32,
    pub jumps: u32,
    pub time_spent_secs: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub segment_id: String,
    pub input: GenerationContext,
    pub output: TrainingOutput,
    #[serde(default)]
    pub metrics: Option<GameplayMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    examples: Vec<TrainingExample>,
}

impl TrainingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        segment: &LevelSegment,
        input: GenerationContext,
        features: SegmentFeatures,
    ) {
        let feature_vector = features.to_vector();
        self.examples.push(TrainingExample {
            segment_id: segment.id.clone(),
            input,
            output: TrainingOutput {
                features,
                feature_vector,
                objects: segment.objects.clone(),
            },
            metrics: None,
        });
    }

    /// Attach metrics to the example for `segment_id`. Returns `false` when no
    /// such example exists.
    pub fn attach_metrics(&mut self, segment_id: &str, metrics: GameplayMetrics) -> bool {
        match self.examples.iter_mut().find(|e| e.segment_id == segment_id) {
            Some(example) => {
                example.metrics = Some(metrics);
                true
            },
            None => false,
        }
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn to_value(&self) -> Result<serde_json::Value, LevelGenError> {
        Ok(serde_json::to_value(&self.examples)?)
    }

    /// Flat JSON array of `{segment_id, input, output, metrics}` records.
    pub fn export_json(&self) -> Result<String, LevelGenError> {
        Ok(serde_json::to_string_pretty(&self.examples)?)
    }
}
