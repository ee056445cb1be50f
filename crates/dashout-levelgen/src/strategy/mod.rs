//! The three procedural strategies, dispatched through [`generate`].
//!
//! Every strategy returns segments that tile `[0, config.length)` left to
//! right with no gaps or overlap.

pub mod noise;
pub mod template;
pub mod wave;

use dashout_core::{
    GameObject, GenerationMethod, LevelSegment, ObjectKind, SeededRng, SegmentFeatures,
    SegmentMetadata,
};

use crate::config::{GROUND_HEIGHT, GROUND_Y, GenerationConfig, Strategy};
use crate::features::FeatureExtractor;

pub use template::{SegmentTemplate, TemplateObject, TemplateRegistry};

/// Spike footprint.
pub const SPIKE_SIZE: f32 = 30.0;
/// Block width; height varies with difficulty.
pub const BLOCK_WIDTH: f32 = 40.0;

/// Run one strategy over the configured span.
pub fn generate(
    strategy: Strategy,
    config: &GenerationConfig,
    templates: &TemplateRegistry,
    rng: &mut SeededRng,
) -> Vec<LevelSegment> {
    let segments = match strategy {
        Strategy::Template => template::generate(config, templates, rng),
        Strategy::Noise => noise::generate(config, rng),
        Strategy::Wave => wave::generate(config, rng),
    };
    tracing::debug!(
        strategy = strategy.name(),
        segments = segments.len(),
        length = config.length,
        "Generated segments"
    );
    segments
}

/// Full-width ground platform.
pub(crate) fn ground(x: f32, width: f32) -> GameObject {
    GameObject::new(ObjectKind::Platform, x, GROUND_Y, width, GROUND_HEIGHT)
}

/// Spike resting on the ground, centered on `center_x`.
pub(crate) fn spike_at(center_x: f32) -> GameObject {
    GameObject::new(
        ObjectKind::spike(),
        center_x - SPIKE_SIZE / 2.0,
        GROUND_Y - SPIKE_SIZE,
        SPIKE_SIZE,
        SPIKE_SIZE,
    )
}

/// Block resting on the ground, centered on `center_x`.
pub(crate) fn block_at(center_x: f32, height: f32) -> GameObject {
    GameObject::new(
        ObjectKind::block(),
        center_x - BLOCK_WIDTH / 2.0,
        GROUND_Y - height,
        BLOCK_WIDTH,
        height,
    )
}

pub(crate) fn method_of(strategy: Strategy) -> GenerationMethod {
    match strategy {
        Strategy::Template => GenerationMethod::Template,
        Strategy::Noise => GenerationMethod::Noise,
        Strategy::Wave => GenerationMethod::Wave,
    }
}

/// Build a segment whose difficulty is inferred from its own objects.
pub(crate) fn inferred_segment(
    method: GenerationMethod,
    index: usize,
    start_x: f32,
    length: f32,
    objects: Vec<GameObject>,
) -> LevelSegment {
    let mut segment = LevelSegment {
        id: format!("{method:?}-{index}").to_lowercase(),
        start_x,
        length,
        difficulty: 0.0,
        objects,
        metadata: Some(SegmentMetadata {
            method,
            features: None,
            template_name: None,
        }),
    };
    segment.difficulty = FeatureExtractor::default().estimate_difficulty(&segment);
    segment
}

/// Split `[0, length)` into chunks of `chunk` with a remainder chunk at the end.
pub(crate) fn chunk_spans(length: f32, chunk: f32) -> Vec<(f32, f32)> {
    let count = (length / chunk).ceil().max(1.0) as usize;
    (0..count)
        .map(|i| {
            let start = i as f32 * chunk;
            (start, chunk.min(length - start))
        })
        .filter(|(_, len)| *len > 0.0)
        .collect()
}

/// Authored features helper for template definitions.
pub(crate) fn authored(
    difficulty: f32,
    density: f32,
    vertical_complexity: f32,
    gap_frequency: u32,
    platform_ratio: f32,
    obstacle_types: [f32; 3],
    rhythm_pattern: [u8; 8],
) -> SegmentFeatures {
    SegmentFeatures {
        difficulty,
        density,
        vertical_complexity,
        gap_frequency,
        platform_ratio,
        obstacle_types,
        rhythm_pattern: rhythm_pattern.to_vec(),
    }
}
