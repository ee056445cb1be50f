use dashout_core::{LevelSegment, ObjectKind};

use crate::config::GenerationConstraints;

impl GenerationConstraints {
    /// Drop obstacles taller than the limit and platforms narrower than the
    /// minimum. Returns the number of objects removed.
    pub fn filter(&self, segment: &mut LevelSegment) -> usize {
        let before = segment.objects.len();
        segment.objects.retain(|o| match o.kind {
            ObjectKind::Spike { .. } | ObjectKind::Block { .. } => {
                o.size.y <= self.max_obstacle_height
            },
            ObjectKind::Platform => o.size.x >= self.min_platform_width,
            ObjectKind::Portal | ObjectKind::Collectible { .. } => true,
        });
        before - segment.objects.len()
    }

    /// Keep the segment's reported difficulty within the allowed deviation of
    /// the requested difficulty.
    pub fn validate_difficulty(&self, segment: &mut LevelSegment, requested: f32) {
        let deviation = self.max_difficulty_deviation.max(0.0);
        let requested = requested.clamp(0.0, 1.0);
        let lo = (requested - deviation).max(0.0);
        let hi = (requested + deviation).min(1.0);
        segment.difficulty = segment.difficulty.clamp(lo, hi);
    }
}
