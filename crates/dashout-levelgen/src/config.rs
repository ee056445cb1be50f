use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LevelGenError;

/// Top edge of the ground platforms every strategy lays down.
pub const GROUND_Y: f32 = 550.0;
/// Thickness of ground platforms.
pub const GROUND_HEIGHT: f32 = 50.0;
/// Tallest obstacle the constraint pass keeps.
pub const MAX_OBSTACLE_HEIGHT: f32 = 140.0;
/// Narrowest platform the constraint pass keeps.
pub const MIN_PLATFORM_WIDTH: f32 = 40.0;
/// How far a segment's reported difficulty may drift from the request.
pub const MAX_DIFFICULTY_DEVIATION: f32 = 0.2;
/// Chunk length used when interleaving predictor and procedural segments.
pub const HYBRID_CHUNK_LENGTH: f32 = 500.0;
/// Bins in the rhythm pattern of extracted features.
pub const RHYTHM_BINS: usize = 8;
/// Upper bound accepted for `rhythm_bins`.
pub const MAX_RHYTHM_BINS: usize = 256;

/// Player-facing generation style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStyle {
    #[default]
    Classic,
    Modern,
    Extreme,
}

impl GenerationStyle {
    pub fn strategy(self) -> Strategy {
        match self {
            Self::Classic => Strategy::Template,
            Self::Modern => Strategy::Noise,
            Self::Extreme => Strategy::Wave,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Modern => "Modern",
            Self::Extreme => "Extreme",
        }
    }
}

impl FromStr for GenerationStyle {
    type Err = LevelGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(Self::Classic),
            "modern" => Ok(Self::Modern),
            "extreme" => Ok(Self::Extreme),
            _ => Err(LevelGenError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for GenerationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Procedural generation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Template,
    Noise,
    Wave,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Self::Template, Self::Noise, Self::Wave];

    /// Resolve a strategy by its own name or by the style that maps to it.
    pub fn from_name(name: &str) -> Result<Self, LevelGenError> {
        match name.to_ascii_lowercase().as_str() {
            "template" | "classic" => Ok(Self::Template),
            "noise" | "modern" => Ok(Self::Noise),
            "wave" | "extreme" => Ok(Self::Wave),
            _ => Err(LevelGenError::UnknownStrategy(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Noise => "noise",
            Self::Wave => "wave",
        }
    }
}

impl FromStr for Strategy {
    type Err = LevelGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// The four externally supplied generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub difficulty: f32,
    pub length: f32,
    pub seed: u64,
    #[serde(default)]
    pub style: GenerationStyle,
}

impl GenerationConfig {
    pub fn new(difficulty: f32, length: f32, seed: u64, style: GenerationStyle) -> Self {
        Self {
            difficulty,
            length,
            seed,
            style,
        }
    }

    pub fn validate(&self) -> Result<(), LevelGenError> {
        if !self.difficulty.is_finite() || !(0.0..=1.0).contains(&self.difficulty) {
            return Err(LevelGenError::InvalidConfig(format!(
                "difficulty must be within [0, 1], got {}",
                self.difficulty
            )));
        }
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(LevelGenError::InvalidConfig(format!(
                "length must be positive, got {}",
                self.length
            )));
        }
        Ok(())
    }

    /// Same parameters over a different span.
    pub(crate) fn with_length(&self, length: f32) -> Self {
        Self {
            length,
            ..self.clone()
        }
    }
}

/// Post-generation limits applied to every strategy's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConstraints {
    pub max_obstacle_height: f32,
    pub min_platform_width: f32,
    pub max_difficulty_deviation: f32,
}

impl Default for GenerationConstraints {
    fn default() -> Self {
        Self {
            max_obstacle_height: MAX_OBSTACLE_HEIGHT,
            min_platform_width: MIN_PLATFORM_WIDTH,
            max_difficulty_deviation: MAX_DIFFICULTY_DEVIATION,
        }
    }
}

/// Tunables for the assembler, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelGenConfig {
    pub constraints: GenerationConstraints,
    pub hybrid_chunk_length: f32,
    pub rhythm_bins: usize,
    pub record_training_examples: bool,
}

impl Default for LevelGenConfig {
    fn default() -> Self {
        Self {
            constraints: GenerationConstraints::default(),
            hybrid_chunk_length: HYBRID_CHUNK_LENGTH,
            rhythm_bins: RHYTHM_BINS,
            record_training_examples: false,
        }
    }
}

impl LevelGenConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, LevelGenError> {
        let cfg: Self = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), LevelGenError> {
        let c = &self.constraints;
        for (name, value) in [
            ("constraints.max_obstacle_height", c.max_obstacle_height),
            ("constraints.min_platform_width", c.min_platform_width),
            ("constraints.max_difficulty_deviation", c.max_difficulty_deviation),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LevelGenError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if !(self.hybrid_chunk_length.is_finite() && self.hybrid_chunk_length > 0.0) {
            return Err(LevelGenError::InvalidConfig(format!(
                "hybrid_chunk_length must be positive, got {}",
                self.hybrid_chunk_length
            )));
        }
        if !(1..=MAX_RHYTHM_BINS).contains(&self.rhythm_bins) {
            return Err(LevelGenError::InvalidConfig(format!(
                "rhythm_bins must be within [1, {MAX_RHYTHM_BINS}], got {}",
                self.rhythm_bins
            )));
        }
        Ok(())
    }

    /// Load config from `DASHOUT_LEVELGEN_CONFIG` or `config/levelgen.toml`,
    /// falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("DASHOUT_LEVELGEN_CONFIG")
            .unwrap_or_else(|_| "config/levelgen.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::warn!("Failed to parse {path}: {e}, using defaults");
                    Self::default()
                },
            },
            Err(_) => Self::default(),
        }
    }
}

/// Human-readable difficulty bucket, 0.2 wide each.
pub fn difficulty_bucket(difficulty: f32) -> &'static str {
    match difficulty {
        d if d < 0.2 => "Easy",
        d if d < 0.4 => "Normal",
        d if d < 0.6 => "Hard",
        d if d < 0.8 => "Expert",
        _ => "Extreme",
    }
}
