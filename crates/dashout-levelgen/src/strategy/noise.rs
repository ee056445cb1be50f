//! Continuous pseudo-random placement over a smooth scalar field. The
//! "modern" style.

use std::f32::consts::TAU;

use dashout_core::{GenerationMethod, LevelSegment, SeededRng};

use super::{BLOCK_WIDTH, block_at, chunk_spans, ground, inferred_segment, spike_at};
use crate::config::GenerationConfig;

pub const CHUNK_LENGTH: f32 = 500.0;
/// Field values below this become spikes.
const SPIKE_BAND: f32 = 0.35;
/// Field values below this (and above the spike band) become blocks.
const BLOCK_BAND: f32 = 0.7;

/// Smooth field in `[0, 1]` over world position and chunk index.
pub fn field(x: f32, chunk_index: usize, phase: f32) -> f32 {
    let i = chunk_index as f32;
    let v = (x * 0.013 + i * 1.7 + phase).sin() * (x * 0.007 - i * 0.9 + phase).cos();
    0.5 + 0.5 * v
}

pub fn obstacle_slots(difficulty: f32) -> usize {
    2 + (difficulty * 6.0).floor() as usize
}

pub fn block_height(difficulty: f32) -> f32 {
    30.0 + difficulty * 50.0
}

pub fn generate(config: &GenerationConfig, rng: &mut SeededRng) -> Vec<LevelSegment> {
    let phase = rng.range(0.0, TAU);
    let slots = obstacle_slots(config.difficulty);

    chunk_spans(config.length, CHUNK_LENGTH)
        .into_iter()
        .enumerate()
        .map(|(i, (start, len))| {
            let mut objects = vec![ground(start, len)];
            let step = len / (slots + 1) as f32;
            for s in 0..slots {
                let x = start + (s + 1) as f32 * step;
                if x - BLOCK_WIDTH / 2.0 < start || x + BLOCK_WIDTH / 2.0 > start + len {
                    continue;
                }
                let v = field(x, i, phase);
                if v < SPIKE_BAND {
                    objects.push(spike_at(x));
                } else if v < BLOCK_BAND {
                    objects.push(block_at(x, block_height(config.difficulty)));
                }
            }
            inferred_segment(GenerationMethod::Noise, i, start, len, objects)
        })
        .collect()
}
