//! Reduce segments to fixed-length numeric descriptors.
//!
//! Two sources coexist: features authored alongside a template, and features
//! inferred from the raw objects. They are not expected to agree.

use dashout_core::{LevelSegment, ObjectKind, ObstacleClass, SegmentFeatures};

use crate::config::RHYTHM_BINS;

/// One obstacle per this many units of length saturates density.
const DENSITY_UNIT: f32 = 50.0;
/// Vertical spread of object tops that saturates vertical complexity.
const VERTICAL_RANGE: f32 = 200.0;
/// Platforms closer than this are treated as continuous.
const GAP_EPSILON: f32 = 1.0;

const DENSITY_WEIGHT: f32 = 0.5;
const OPENNESS_WEIGHT: f32 = 0.2;
const SPIKE_SHARE_WEIGHT: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    pub rhythm_bins: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            rhythm_bins: RHYTHM_BINS,
        }
    }
}

impl FeatureExtractor {
    pub fn new(rhythm_bins: usize) -> Self {
        Self {
            rhythm_bins: rhythm_bins.max(1),
        }
    }

    /// Infer features from the segment's objects alone.
    pub fn extract(&self, segment: &LevelSegment) -> SegmentFeatures {
        SegmentFeatures {
            difficulty: self.estimate_difficulty(segment),
            density: density(segment),
            vertical_complexity: vertical_complexity(segment),
            gap_frequency: gap_count(segment),
            platform_ratio: platform_ratio(segment),
            obstacle_types: obstacle_types(segment),
            rhythm_pattern: self.rhythm_pattern(segment),
        }
    }

    /// Authored features when the segment carries them, inferred otherwise.
    pub fn features(&self, segment: &LevelSegment) -> SegmentFeatures {
        segment
            .metadata
            .as_ref()
            .and_then(|m| m.features.clone())
            .unwrap_or_else(|| self.extract(segment))
    }

    pub fn vector(&self, segment: &LevelSegment) -> Vec<f32> {
        self.features(segment).to_vector()
    }

    /// Weighted blend of obstacle density, missing platform coverage, and the
    /// share of spikes among obstacles.
    pub fn estimate_difficulty(&self, segment: &LevelSegment) -> f32 {
        let (spikes, blocks) = segment
            .objects
            .iter()
            .fold((0u32, 0u32), |(s, b), o| match o.kind {
                ObjectKind::Spike { .. } => (s + 1, b),
                ObjectKind::Block { .. } => (s, b + 1),
                _ => (s, b),
            });
        let spike_share = if spikes + blocks == 0 {
            0.0
        } else {
            spikes as f32 / (spikes + blocks) as f32
        };
        let score = DENSITY_WEIGHT * density(segment)
            + OPENNESS_WEIGHT * (1.0 - platform_ratio(segment))
            + SPIKE_SHARE_WEIGHT * spike_share;
        score.clamp(0.0, 1.0)
    }

    fn rhythm_pattern(&self, segment: &LevelSegment) -> Vec<u8> {
        let mut bins = vec![0u8; self.rhythm_bins];
        if segment.length <= 0.0 {
            return bins;
        }
        let bin_len = segment.length / self.rhythm_bins as f32;
        for obj in segment.objects.iter().filter(|o| o.kind.is_obstacle()) {
            let center = obj.position.x + obj.size.x / 2.0 - segment.start_x;
            let idx = (center / bin_len).floor();
            if idx >= 0.0 {
                let idx = (idx as usize).min(self.rhythm_bins - 1);
                bins[idx] = 1;
            }
        }
        bins
    }
}

fn density(segment: &LevelSegment) -> f32 {
    if segment.length <= 0.0 {
        return 0.0;
    }
    let obstacles = segment.objects.iter().filter(|o| o.kind.is_obstacle()).count();
    (obstacles as f32 / (segment.length / DENSITY_UNIT)).clamp(0.0, 1.0)
}

fn vertical_complexity(segment: &LevelSegment) -> f32 {
    let tops = segment
        .objects
        .iter()
        .filter(|o| o.kind.obstacle_class().is_some())
        .map(|o| o.position.y);
    let (min, max) = tops.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), y| {
        (lo.min(y), hi.max(y))
    });
    if !min.is_finite() {
        return 0.0;
    }
    ((max - min) / VERTICAL_RANGE).clamp(0.0, 1.0)
}

/// Platform spans clipped to the segment, sorted and merged.
fn platform_spans(segment: &LevelSegment) -> Vec<(f32, f32)> {
    let mut spans: Vec<(f32, f32)> = segment
        .objects
        .iter()
        .filter(|o| o.kind == ObjectKind::Platform)
        .map(|o| {
            (
                o.position.x.max(segment.start_x),
                o.right().min(segment.end_x()),
            )
        })
        .filter(|(a, b)| b > a)
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged: Vec<(f32, f32)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 + GAP_EPSILON => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

fn gap_count(segment: &LevelSegment) -> u32 {
    platform_spans(segment).len().saturating_sub(1) as u32
}

fn platform_ratio(segment: &LevelSegment) -> f32 {
    if segment.length <= 0.0 {
        return 0.0;
    }
    let covered: f32 = platform_spans(segment).iter().map(|(a, b)| b - a).sum();
    (covered / segment.length).clamp(0.0, 1.0)
}

fn obstacle_types(segment: &LevelSegment) -> [f32; 3] {
    let mut counts = [0u32; 3];
    for class in segment.objects.iter().filter_map(|o| o.kind.obstacle_class()) {
        let idx = match class {
            ObstacleClass::Spike => 0,
            ObstacleClass::Block => 1,
            ObstacleClass::Platform => 2,
        };
        counts[idx] += 1;
    }
    let total: u32 = counts.iter().sum();
    if total == 0 {
        return [0.0; 3];
    }
    counts.map(|c| c as f32 / total as f32)
}
