//! Keeps only the part of the level near the camera in the live object list.

use std::collections::HashSet;

use dashout_core::{GameObject, Level, ObjectId, ObjectKind};

use crate::config::StreamingConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub loaded: usize,
    pub unloaded: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StreamingWindow {
    config: StreamingConfig,
    resident: HashSet<ObjectId>,
}

impl StreamingWindow {
    pub fn new(config: StreamingConfig) -> Self {
        Self {
            config,
            resident: HashSet::new(),
        }
    }

    /// Unload objects far behind the camera (platforms excepted), then load
    /// level objects within `[camera_offset, camera_offset + view_width +
    /// preload_distance)` that are not already resident.
    pub fn update(
        &mut self,
        level: &Level,
        objects: &mut Vec<GameObject>,
        camera_offset: f32,
        view_width: f32,
    ) -> StreamStats {
        let cutoff = camera_offset - self.config.unload_distance;
        let before = objects.len();
        let resident = &mut self.resident;
        objects.retain(|o| {
            let keep = o.kind == ObjectKind::Platform || o.right() >= cutoff;
            if !keep {
                resident.remove(&o.id);
            }
            keep
        });
        let unloaded = before - objects.len();

        let max_x = camera_offset + view_width + self.config.preload_distance;
        let mut loaded = 0;
        for segment in &level.segments {
            if segment.end_x() <= camera_offset || segment.start_x >= max_x {
                continue;
            }
            for obj in segment.objects_in_range(camera_offset, max_x) {
                if self.resident.insert(obj.id) {
                    objects.push(obj.clone());
                    loaded += 1;
                }
            }
        }

        if loaded > 0 || unloaded > 0 {
            tracing::trace!(loaded, unloaded, resident = objects.len(), "Streamed level objects");
        }
        StreamStats { loaded, unloaded }
    }

    pub fn is_resident(&self, id: ObjectId) -> bool {
        self.resident.contains(&id)
    }

    pub fn reset(&mut self) {
        self.resident.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashout_core::test_helpers::{flat_level, make_spike};

    fn spikes_every_200(length: f32) -> Level {
        let extras = (0..(length / 200.0) as u64)
            .map(|i| make_spike(i + 2, i as f32 * 200.0 + 100.0))
            .collect();
        flat_level(length, extras)
    }

    #[test]
    fn loads_only_the_window() {
        let level = spikes_every_200(5000.0);
        let mut window = StreamingWindow::default();
        let mut objects = Vec::new();
        let stats = window.update(&level, &mut objects, 0.0, 800.0);
        // Ground plus spikes at 100, 300, ..., 1100.
        assert_eq!(stats.loaded, 7);
        assert!(objects.iter().all(|o| o.position.x < 1200.0));
    }

    #[test]
    fn never_duplicates_resident_objects() {
        let level = spikes_every_200(5000.0);
        let mut window = StreamingWindow::default();
        let mut objects = Vec::new();
        window.update(&level, &mut objects, 0.0, 800.0);
        let stats = window.update(&level, &mut objects, 10.0, 800.0);
        assert_eq!(stats.loaded, 0);
        let mut ids: Vec<ObjectId> = objects.iter().map(|o| o.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), objects.len());
    }

    #[test]
    fn unloads_behind_camera_but_keeps_platforms() {
        let level = spikes_every_200(5000.0);
        let mut window = StreamingWindow::default();
        let mut objects = Vec::new();
        window.update(&level, &mut objects, 0.0, 800.0);
        let stats = window.update(&level, &mut objects, 1000.0, 800.0);
        // Spikes ending before 700 go: 100, 300, 500.
        assert_eq!(stats.unloaded, 3);
        assert!(objects.iter().any(|o| o.kind == ObjectKind::Platform));
        assert!(!window.is_resident(2));
        assert!(window.is_resident(1));
    }
}
