//! Pluggable prediction interface for externally trained level models.
//!
//! No concrete model lives here. The assembler works with the plugin absent,
//! and treats every predictor failure as a reason to generate procedurally.

use std::path::Path;

use futures::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};

use dashout_core::{
    GameObject, GenerationMethod, LevelSegment, ObjectKind, SeededRng, SegmentFeatures,
    SegmentMetadata,
};

use crate::config::{GenerationStyle, MIN_PLATFORM_WIDTH};
use crate::error::PredictorError;
use crate::strategy::{block_at, ground, spike_at};

/// What a predictor sees when asked for the next segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionContext {
    pub difficulty: f32,
    pub style: GenerationStyle,
    pub seed: u64,
    pub segment_index: usize,
    pub start_x: f32,
    pub length: f32,
    #[serde(default)]
    pub previous_features: Option<SegmentFeatures>,
}

/// A predictor's answer. Obstacle positions are relative to the segment start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub features: SegmentFeatures,
    #[serde(default)]
    pub obstacles: Option<Vec<GameObject>>,
    #[serde(default)]
    pub model_version: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorMetadata {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Length of the feature vector the model emits.
    #[serde(default)]
    pub feature_len: Option<usize>,
}

/// Contract for external level models.
pub trait LevelPredictor: Send + Sync {
    fn load(&mut self, path: &Path) -> Result<(), PredictorError>;

    fn version(&self) -> String;

    fn metadata(&self) -> PredictorMetadata;

    fn predict_sync(&self, context: &PredictionContext) -> Result<Prediction, PredictorError>;

    /// Async variant. Defaults to the synchronous path.
    fn predict<'a>(
        &'a self,
        context: &'a PredictionContext,
    ) -> BoxFuture<'a, Result<Prediction, PredictorError>> {
        Box::pin(future::ready(self.predict_sync(context)))
    }
}

/// Build a segment from a prediction, synthesizing objects from the features
/// when the model supplied none.
pub fn segment_from_prediction(
    prediction: &Prediction,
    context: &PredictionContext,
    rng: &mut SeededRng,
) -> LevelSegment {
    let (objects, method) = match &prediction.obstacles {
        Some(obstacles) if !obstacles.is_empty() => {
            let mut objects: Vec<GameObject> = obstacles
                .iter()
                .filter(|o| o.position.x >= 0.0 && o.right() <= context.length)
                .cloned()
                .map(|o| o.translated(context.start_x))
                .collect();
            if !objects.iter().any(|o| o.kind == ObjectKind::Platform) {
                objects.insert(0, ground(context.start_x, context.length));
            }
            (objects, GenerationMethod::Predictor)
        },
        _ => {
            tracing::debug!(
                segment = context.segment_index,
                "Prediction had no obstacles, synthesizing from features"
            );
            (
                synthesize_objects(&prediction.features, context, rng),
                GenerationMethod::FeatureSynthesis,
            )
        },
    };
    LevelSegment {
        id: format!("{method:?}-{}", context.segment_index).to_lowercase(),
        start_x: context.start_x,
        length: context.length,
        difficulty: unit_or(prediction.features.difficulty, context.difficulty),
        objects,
        metadata: Some(SegmentMetadata {
            method,
            features: Some(prediction.features.clone()),
            template_name: None,
        }),
    }
}

/// Obstacles per unit length at full density.
const SYNTH_DENSITY_UNIT: f32 = 50.0;
/// Minimum spacing between synthesized obstacles.
const SYNTH_MIN_SPACING: f32 = 60.0;

/// Lay out ground and obstacles that roughly match a feature descriptor.
pub fn synthesize_objects(
    features: &SegmentFeatures,
    context: &PredictionContext,
    rng: &mut SeededRng,
) -> Vec<GameObject> {
    let start = context.start_x;
    let len = context.length;
    let mut objects = synthesize_ground(features, start, len);

    let wanted = (unit_or(features.density, 0.0) * len / SYNTH_DENSITY_UNIT).round() as usize;
    let max_fit = (len / SYNTH_MIN_SPACING).floor() as usize;
    let count = wanted.min(max_fit);
    if count == 0 {
        return objects;
    }

    let [spikes, blocks, _] = features.obstacle_types.map(|share| unit_or(share, 0.0));
    let spike_share = if spikes + blocks > 0.0 {
        spikes / (spikes + blocks)
    } else {
        0.5
    };
    let height = 30.0 + unit_or(features.difficulty, context.difficulty) * 50.0;

    for center in obstacle_centers(features, start, len, count) {
        if rng.chance(spike_share) {
            objects.push(spike_at(center));
        } else {
            objects.push(block_at(center, height));
        }
    }
    objects
}

fn synthesize_ground(features: &SegmentFeatures, start: f32, len: f32) -> Vec<GameObject> {
    let ratio = unit_or(features.platform_ratio, 1.0);
    // Pieces narrower than the platform minimum would be filtered out anyway.
    let max_pieces = ((ratio * len / MIN_PLATFORM_WIDTH).floor() as usize).max(1);
    let pieces = (features.gap_frequency as usize)
        .saturating_add(1)
        .min(max_pieces);
    if pieces == 1 || ratio >= 1.0 {
        return vec![ground(start, len)];
    }
    let gap = (1.0 - ratio) * len / (pieces - 1) as f32;
    let piece = ratio * len / pieces as f32;
    (0..pieces)
        .map(|i| ground(start + i as f32 * (piece + gap), piece))
        .collect()
}

/// `value` clamped to `[0, 1]`, or `fallback` when it is not finite.
fn unit_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback.clamp(0.0, 1.0)
    }
}

/// Bin centers from the rhythm pattern if it has any hits, otherwise even spacing.
fn obstacle_centers(features: &SegmentFeatures, start: f32, len: f32, count: usize) -> Vec<f32> {
    let bins = features.rhythm_pattern.len();
    let hits: Vec<usize> = features
        .rhythm_pattern
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b != 0)
        .map(|(i, _)| i)
        .collect();
    if hits.is_empty() {
        let step = len / (count + 1) as f32;
        return (1..=count).map(|i| start + i as f32 * step).collect();
    }
    let bin_len = len / bins as f32;
    hits.iter()
        .take(count)
        .map(|&i| start + (i as f32 + 0.5) * bin_len)
        .collect()
}
