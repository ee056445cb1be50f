//! Curated obstacle patterns selected by difficulty. The "classic" style.

use serde::{Deserialize, Serialize};

use dashout_core::{
    GameObject, GenerationMethod, LevelSegment, ObjectKind, SeededRng, SegmentFeatures,
    SegmentMetadata,
};

use super::authored;
use crate::config::{GROUND_HEIGHT, GROUND_Y, GenerationConfig};

/// Maximum jitter applied to the configured difficulty per pick.
const TARGET_JITTER: f32 = 0.1;
/// Templates within this distance of the target are candidates.
const DIFFICULTY_WINDOW: f32 = 0.1;
/// Stop once less than this much length remains.
const MIN_SEGMENT_LENGTH: f32 = 1.0;

/// One object in a template. `x` is relative to the segment start, `y` is
/// absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateObject {
    pub kind: ObjectKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TemplateObject {
    fn ground(x: f32, width: f32) -> Self {
        Self {
            kind: ObjectKind::Platform,
            x,
            y: GROUND_Y,
            width,
            height: GROUND_HEIGHT,
        }
    }

    fn ledge(x: f32, y: f32, width: f32) -> Self {
        Self {
            kind: ObjectKind::Platform,
            x,
            y,
            width,
            height: 20.0,
        }
    }

    fn spike(x: f32) -> Self {
        Self {
            kind: ObjectKind::spike(),
            x,
            y: GROUND_Y - 30.0,
            width: 30.0,
            height: 30.0,
        }
    }

    fn block(x: f32, height: f32) -> Self {
        Self {
            kind: ObjectKind::block(),
            x,
            y: GROUND_Y - height,
            width: 40.0,
            height,
        }
    }

    fn coin(x: f32, y: f32) -> Self {
        Self {
            kind: ObjectKind::Collectible { value: 10 },
            x,
            y,
            width: 20.0,
            height: 20.0,
        }
    }
}

/// A hand-authored segment pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentTemplate {
    pub name: String,
    pub difficulty: f32,
    pub length: f32,
    pub features: SegmentFeatures,
    pub objects: Vec<TemplateObject>,
}

impl SegmentTemplate {
    /// Materialize at `start_x`, truncated to `span`. Objects that would cross
    /// the cut are dropped; platforms are clipped instead.
    pub fn instantiate(&self, index: usize, start_x: f32, span: f32) -> LevelSegment {
        let span = span.min(self.length);
        let truncated = span < self.length;
        let objects = self
            .objects
            .iter()
            .filter_map(|t| {
                if t.x >= span {
                    return None;
                }
                let width = match t.kind {
                    ObjectKind::Platform => t.width.min(span - t.x),
                    _ if t.x + t.width > span => return None,
                    _ => t.width,
                };
                Some(GameObject::new(t.kind, start_x + t.x, t.y, width, t.height))
            })
            .collect();
        LevelSegment {
            id: format!("template-{index}"),
            start_x,
            length: span,
            difficulty: self.difficulty,
            objects,
            metadata: Some(SegmentMetadata {
                method: GenerationMethod::Template,
                // Authored features only describe the full pattern.
                features: (!truncated).then(|| self.features.clone()),
                template_name: Some(self.name.clone()),
            }),
        }
    }
}

/// Ordered collection of templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateRegistry {
    templates: Vec<SegmentTemplate>,
}

impl TemplateRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The eight built-in patterns, easiest first.
    pub fn builtin() -> Self {
        use TemplateObject as T;
        let templates = vec![
            SegmentTemplate {
                name: "first_steps".to_string(),
                difficulty: 0.1,
                length: 200.0,
                features: authored(0.1, 0.5, 0.15, 0, 1.0, [0.67, 0.0, 0.33], [0, 0, 1, 0, 0, 1, 0, 0]),
                objects: vec![T::ground(0.0, 200.0), T::spike(60.0), T::spike(130.0)],
            },
            SegmentTemplate {
                name: "lone_block".to_string(),
                difficulty: 0.2,
                length: 250.0,
                features: authored(0.2, 0.2, 0.2, 0, 1.0, [0.0, 0.5, 0.5], [0, 0, 0, 1, 0, 0, 0, 0]),
                objects: vec![T::ground(0.0, 250.0), T::block(110.0, 40.0), T::coin(120.0, 450.0)],
            },
            SegmentTemplate {
                name: "spike_pair".to_string(),
                difficulty: 0.3,
                length: 300.0,
                features: authored(0.3, 0.5, 0.2, 0, 1.0, [0.5, 0.25, 0.25], [0, 0, 1, 1, 0, 0, 1, 0]),
                objects: vec![
                    T::ground(0.0, 300.0),
                    T::spike(90.0),
                    T::spike(120.0),
                    T::block(230.0, 40.0),
                ],
            },
            SegmentTemplate {
                name: "step_up".to_string(),
                difficulty: 0.4,
                length: 350.0,
                features: authored(0.4, 0.3, 0.45, 0, 1.0, [0.25, 0.25, 0.5], [0, 0, 1, 0, 1, 0, 0, 0]),
                objects: vec![
                    T::ground(0.0, 350.0),
                    T::block(80.0, 40.0),
                    T::ledge(160.0, 470.0, 120.0),
                    T::spike(190.0),
                    T::coin(210.0, 420.0),
                ],
            },
            SegmentTemplate {
                name: "gap_run".to_string(),
                difficulty: 0.5,
                length: 400.0,
                features: authored(0.5, 0.25, 0.15, 1, 0.85, [0.5, 0.0, 0.5], [0, 0, 0, 0, 0, 0, 1, 0]),
                objects: vec![
                    T::ground(0.0, 160.0),
                    T::ground(220.0, 180.0),
                    T::spike(300.0),
                    T::coin(180.0, 440.0),
                ],
            },
            SegmentTemplate {
                name: "block_stairs".to_string(),
                difficulty: 0.6,
                length: 400.0,
                features: authored(0.6, 0.4, 0.35, 0, 1.0, [0.25, 0.5, 0.25], [0, 0, 1, 0, 1, 0, 1, 0]),
                objects: vec![
                    T::ground(0.0, 400.0),
                    T::block(100.0, 40.0),
                    T::block(190.0, 70.0),
                    T::spike(300.0),
                ],
            },
            SegmentTemplate {
                name: "spike_gauntlet".to_string(),
                difficulty: 0.8,
                length: 450.0,
                features: authored(0.8, 0.55, 0.45, 0, 1.0, [0.71, 0.0, 0.29], [1, 1, 0, 1, 1, 0, 1, 0]),
                objects: vec![
                    T::ground(0.0, 450.0),
                    T::spike(60.0),
                    T::spike(90.0),
                    T::ledge(150.0, 460.0, 100.0),
                    T::spike(200.0),
                    T::spike(230.0),
                    T::spike(340.0),
                    T::coin(190.0, 410.0),
                ],
            },
            SegmentTemplate {
                name: "chaos".to_string(),
                difficulty: 0.95,
                length: 500.0,
                features: authored(0.95, 0.7, 0.4, 0, 1.0, [0.71, 0.14, 0.14], [1, 1, 0, 1, 1, 1, 1, 0]),
                objects: vec![
                    T::ground(0.0, 500.0),
                    T::spike(50.0),
                    T::spike(80.0),
                    T::spike(190.0),
                    T::block(260.0, 80.0),
                    T::spike(370.0),
                    T::spike(400.0),
                ],
            },
        ];
        Self { templates }
    }

    pub fn register(&mut self, template: SegmentTemplate) {
        self.templates.push(template);
    }

    pub fn get(&self, name: &str) -> Option<&SegmentTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn templates(&self) -> &[SegmentTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Templates whose difficulty lies within `window` of `target`, or the whole
    /// pool when none qualify.
    pub fn candidates(&self, target: f32, window: f32) -> Vec<&SegmentTemplate> {
        let near: Vec<&SegmentTemplate> = self
            .templates
            .iter()
            .filter(|t| (t.difficulty - target).abs() <= window)
            .collect();
        if near.is_empty() {
            self.templates.iter().collect()
        } else {
            near
        }
    }
}

pub fn generate(
    config: &GenerationConfig,
    registry: &TemplateRegistry,
    rng: &mut SeededRng,
) -> Vec<LevelSegment> {
    let mut segments = Vec::new();
    if registry.is_empty() {
        tracing::warn!("Template registry is empty, no segments generated");
        return segments;
    }

    let mut cursor = 0.0;
    while config.length - cursor >= MIN_SEGMENT_LENGTH {
        let remaining = config.length - cursor;
        let target =
            (config.difficulty + rng.range(-TARGET_JITTER, TARGET_JITTER)).clamp(0.0, 1.0);
        let candidates = registry.candidates(target, DIFFICULTY_WINDOW);
        let fitting: Vec<&SegmentTemplate> = candidates
            .iter()
            .copied()
            .filter(|t| t.length <= remaining)
            .collect();
        let pool = if fitting.is_empty() {
            &candidates
        } else {
            &fitting
        };
        let Some(template) = rng.choice(pool) else {
            break;
        };
        let segment = template.instantiate(segments.len(), cursor, remaining);
        cursor += segment.length;
        segments.push(segment);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationStyle;

    #[test]
    fn builtin_registry_is_sorted_and_named() {
        let reg = TemplateRegistry::builtin();
        assert_eq!(reg.len(), 8);
        let diffs: Vec<f32> = reg.templates().iter().map(|t| t.difficulty).collect();
        assert!(diffs.windows(2).all(|w| w[0] < w[1]));
        assert!(reg.get("first_steps").is_some());
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn easiest_template_is_ground_plus_two_spikes() {
        let reg = TemplateRegistry::builtin();
        let seg = reg.get("first_steps").unwrap().instantiate(0, 0.0, 200.0);
        let platforms = seg
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Platform)
            .count();
        let spikes = seg
            .objects
            .iter()
            .filter(|o| matches!(o.kind, ObjectKind::Spike { .. }))
            .count();
        assert_eq!((platforms, spikes, seg.objects.len()), (1, 2, 3));
    }

    #[test]
    fn candidates_fall_back_to_full_pool() {
        let mut reg = TemplateRegistry::empty();
        let base = TemplateRegistry::builtin();
        reg.register(base.get("chaos").unwrap().clone());
        reg.register(base.get("spike_gauntlet").unwrap().clone());
        assert_eq!(reg.candidates(0.0, 0.1).len(), 2);
        assert_eq!(reg.candidates(0.9, 0.1).len(), 2);
        assert_eq!(reg.candidates(0.95, 0.05).len(), 1);
    }

    #[test]
    fn truncation_drops_crossing_obstacles_and_clips_platforms() {
        let reg = TemplateRegistry::builtin();
        let seg = reg.get("first_steps").unwrap().instantiate(3, 1000.0, 150.0);
        assert_eq!(seg.length, 150.0);
        assert_eq!(seg.start_x, 1000.0);
        // Spike at 130..160 crosses the cut at 150.
        assert_eq!(seg.objects.len(), 2);
        assert_eq!(seg.objects[0].size.x, 150.0);
        let meta = seg.metadata.unwrap();
        assert!(meta.features.is_none());
        assert_eq!(meta.template_name.as_deref(), Some("first_steps"));
    }

    #[test]
    fn easy_single_template_run() {
        let reg = TemplateRegistry::builtin();
        let cfg = GenerationConfig::new(0.1, 200.0, 42, GenerationStyle::Classic);
        let segments = generate(&cfg, &reg, &mut SeededRng::new(42));
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert!(seg.difficulty <= 0.25);
        assert_eq!(
            seg.metadata.as_ref().and_then(|m| m.template_name.as_deref()),
            Some("first_steps")
        );
    }

    #[test]
    fn easy_runs_only_pick_easy_templates() {
        let reg = TemplateRegistry::builtin();
        for seed in 0..50 {
            let cfg = GenerationConfig::new(0.1, 3000.0, seed, GenerationStyle::Classic);
            for seg in generate(&cfg, &reg, &mut SeededRng::new(seed)) {
                assert!(
                    seg.difficulty <= 0.25,
                    "seed {seed} picked difficulty {}",
                    seg.difficulty
                );
            }
        }
    }
}
