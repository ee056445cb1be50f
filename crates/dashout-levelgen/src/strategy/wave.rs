//! Rhythmic placement along a sine wave. The "extreme" style.

use std::f32::consts::TAU;

use dashout_core::{GenerationMethod, LevelSegment, SeededRng};

use super::{BLOCK_WIDTH, block_at, chunk_spans, ground, inferred_segment, spike_at};
use crate::config::GenerationConfig;

pub const SEGMENT_LENGTH: f32 = 600.0;
/// Distance between candidate obstacle positions.
pub const SPACING: f32 = 90.0;

pub fn frequency(difficulty: f32) -> f32 {
    0.004 + difficulty * 0.012
}

pub fn amplitude(difficulty: f32) -> f32 {
    0.25 + difficulty * 0.55
}

pub fn generate(config: &GenerationConfig, rng: &mut SeededRng) -> Vec<LevelSegment> {
    let freq = frequency(config.difficulty);
    let threshold = 1.0 - amplitude(config.difficulty);
    let phase = rng.range(0.0, TAU);
    let height = 30.0 + config.difficulty * 40.0;

    chunk_spans(config.length, SEGMENT_LENGTH)
        .into_iter()
        .enumerate()
        .map(|(i, (start, len))| {
            let end = start + len;
            let mut objects = vec![ground(start, len)];
            let mut x = start + SPACING / 2.0;
            while x + BLOCK_WIDTH / 2.0 <= end {
                let s = (x * freq + phase).sin();
                if s.abs() > threshold {
                    if s > 0.0 {
                        objects.push(spike_at(x));
                    } else {
                        objects.push(block_at(x, height));
                    }
                }
                x += SPACING;
            }
            inferred_segment(GenerationMethod::Wave, i, start, len, objects)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationStyle;
    use dashout_core::ObjectKind;

    #[test]
    fn obstacles_sit_on_the_spacing_grid() {
        let cfg = GenerationConfig::new(0.8, 3000.0, 17, GenerationStyle::Extreme);
        for seg in generate(&cfg, &mut SeededRng::new(17)) {
            for obj in seg.objects.iter().filter(|o| o.kind.is_obstacle()) {
                let center = obj.position.x + obj.size.x / 2.0 - seg.start_x;
                let slot = (center - SPACING / 2.0) / SPACING;
                assert!((slot - slot.round()).abs() < 1e-3, "off-grid center {center}");
            }
        }
    }

    #[test]
    fn harder_waves_place_more_obstacles() {
        let count = |d: f32| -> usize {
            let cfg = GenerationConfig::new(d, 6000.0, 4, GenerationStyle::Extreme);
            generate(&cfg, &mut SeededRng::new(4))
                .iter()
                .flat_map(|s| s.objects.iter())
                .filter(|o| o.kind.is_obstacle())
                .count()
        };
        assert!(count(1.0) > count(0.0));
    }

    #[test]
    fn sign_selects_kind() {
        let cfg = GenerationConfig::new(1.0, 6000.0, 21, GenerationStyle::Extreme);
        let segments = generate(&cfg, &mut SeededRng::new(21));
        let kinds: Vec<ObjectKind> = segments
            .iter()
            .flat_map(|s| s.objects.iter())
            .filter(|o| o.kind.is_obstacle())
            .map(|o| o.kind)
            .collect();
        assert!(kinds.iter().any(|k| matches!(k, ObjectKind::Spike { .. })));
        assert!(kinds.iter().any(|k| matches!(k, ObjectKind::Block { .. })));
    }
}
