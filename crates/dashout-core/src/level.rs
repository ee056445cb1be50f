use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::object::{GameObject, ObjectId};

/// Normalized descriptor of a segment, used as a learning signal.
///
/// Every field is in `[0, 1]` except `gap_frequency` (a count) and
/// `rhythm_pattern` (a 0/1 sequence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentFeatures {
    pub difficulty: f32,
    pub density: f32,
    pub vertical_complexity: f32,
    pub gap_frequency: u32,
    pub platform_ratio: f32,
    /// Shares of spike, block, and platform objects.
    pub obstacle_types: [f32; 3],
    pub rhythm_pattern: Vec<u8>,
}

impl SegmentFeatures {
    /// Flatten to `[difficulty, density, vertical_complexity, gap_frequency,
    /// platform_ratio, ...obstacle_types, ...rhythm_pattern]`.
    pub fn to_vector(&self) -> Vec<f32> {
        let mut v = Vec::with_capacity(8 + self.rhythm_pattern.len());
        v.push(self.difficulty);
        v.push(self.density);
        v.push(self.vertical_complexity);
        v.push(self.gap_frequency as f32);
        v.push(self.platform_ratio);
        v.extend_from_slice(&self.obstacle_types);
        v.extend(self.rhythm_pattern.iter().map(|&b| f32::from(b)));
        v
    }
}

/// Which path produced a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    Template,
    Noise,
    Wave,
    Predictor,
    FeatureSynthesis,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    pub method: GenerationMethod,
    #[serde(default)]
    pub features: Option<SegmentFeatures>,
    #[serde(default)]
    pub template_name: Option<String>,
}

/// A fixed-length slice of a level. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSegment {
    pub id: String,
    /// Absolute horizontal offset of the segment's left edge.
    pub start_x: f32,
    pub length: f32,
    pub difficulty: f32,
    pub objects: Vec<GameObject>,
    #[serde(default)]
    pub metadata: Option<SegmentMetadata>,
}

impl LevelSegment {
    pub fn end_x(&self) -> f32 {
        self.start_x + self.length
    }

    /// Shift the segment and every object in it by `dx`.
    pub fn translate(&mut self, dx: f32) {
        self.start_x += dx;
        for obj in &mut self.objects {
            obj.position.x += dx;
        }
    }

    /// Objects whose horizontal extent intersects `[min_x, max_x)`.
    pub fn objects_in_range(&self, min_x: f32, max_x: f32) -> impl Iterator<Item = &GameObject> {
        self.objects
            .iter()
            .filter(move |o| o.position.x < max_x && o.right() > min_x)
    }

    pub fn method(&self) -> Option<GenerationMethod> {
        self.metadata.as_ref().map(|m| m.method)
    }
}

/// Provenance of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    Manual,
    Procedural,
    Ml,
}

/// An ordered run of segments. Never mutated after assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: Uuid,
    pub name: String,
    pub segments: Vec<LevelSegment>,
    pub total_length: f32,
    pub difficulty: f32,
    pub source: LevelSource,
    #[serde(default)]
    pub model_version: Option<String>,
}

impl Level {
    /// Hand-built level; `total_length` is derived from the segments and
    /// object ids are reassigned from 1 in segment order.
    pub fn manual(
        name: impl Into<String>,
        difficulty: f32,
        mut segments: Vec<LevelSegment>,
    ) -> Self {
        renumber_objects(&mut segments);
        let total_length = segments.iter().map(|s| s.length).sum();
        Self {
            id: Uuid::nil(),
            name: name.into(),
            segments,
            total_length,
            difficulty,
            source: LevelSource::Manual,
            model_version: None,
        }
    }

    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.segments.iter().flat_map(|s| s.objects.iter())
    }

    pub fn object_count(&self) -> usize {
        self.segments.iter().map(|s| s.objects.len()).sum()
    }
}

/// Give every object a unique id, counting from 1 in segment order. Id 0 is
/// the player's and is never handed out.
pub fn renumber_objects(segments: &mut [LevelSegment]) {
    let mut next_id: ObjectId = 1;
    for obj in segments.iter_mut().flat_map(|s| s.objects.iter_mut()) {
        obj.id = next_id;
        next_id += 1;
    }
}
