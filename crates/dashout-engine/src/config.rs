use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use dashout_core::Vector2;

use crate::physics::PhysicsConfig;

/// Viewport width in world units.
pub const VIEWPORT_WIDTH: f32 = 800.0;
/// Viewport height in world units.
pub const VIEWPORT_HEIGHT: f32 = 600.0;
/// Screen-space fraction the player may advance before the camera follows.
pub const CAMERA_LEAD: f32 = 0.3;
/// Distance past the right edge of the viewport at which objects are loaded.
pub const PRELOAD_DISTANCE: f32 = 400.0;
/// Distance behind the camera at which non-platform objects are unloaded.
pub const UNLOAD_DISTANCE: f32 = 300.0;
/// World units run per point of score.
pub const DISTANCE_PER_POINT: f32 = 10.0;
/// Largest delta a single frame may integrate.
pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read engine config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid engine config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
    pub camera_lead: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            camera_lead: CAMERA_LEAD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub preload_distance: f32,
    pub unload_distance: f32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            preload_distance: PRELOAD_DISTANCE,
            unload_distance: UNLOAD_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub distance_per_point: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            distance_per_point: DISTANCE_PER_POINT,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub viewport: ViewportConfig,
    pub streaming: StreamingConfig,
    pub scoring: ScoringConfig,
    pub max_frame_dt: f32,
    pub player_start: Vector2,
    pub player_size: Vector2,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            viewport: ViewportConfig::default(),
            streaming: StreamingConfig::default(),
            scoring: ScoringConfig::default(),
            max_frame_dt: MAX_FRAME_DT,
            player_start: Vector2::new(100.0, 510.0),
            player_size: Vector2::new(40.0, 40.0),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the simulation cannot run with: non-finite numbers,
    /// negative limits, and zero-sized frames, viewports, or score units.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        for (name, value) in [
            ("physics.gravity", p.gravity),
            ("physics.jump_velocity", p.jump_velocity),
            ("physics.run_speed", p.run_speed),
            ("physics.ground_line", p.ground_line),
            ("player_start.x", self.player_start.x),
            ("player_start.y", self.player_start.y),
        ] {
            if !value.is_finite() {
                return Err(invalid(name, value, "must be finite"));
            }
        }
        for (name, value) in [
            ("physics.max_velocity.x", p.max_velocity.x),
            ("physics.max_velocity.y", p.max_velocity.y),
            ("physics.ground_tolerance", p.ground_tolerance),
            ("physics.landing_tolerance", p.landing_tolerance),
            ("physics.landing_velocity_slack", p.landing_velocity_slack),
            ("streaming.preload_distance", self.streaming.preload_distance),
            ("streaming.unload_distance", self.streaming.unload_distance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(name, value, "must be finite and non-negative"));
            }
        }
        for (name, value) in [
            ("max_frame_dt", self.max_frame_dt),
            ("viewport.width", self.viewport.width),
            ("viewport.height", self.viewport.height),
            ("scoring.distance_per_point", self.scoring.distance_per_point),
            ("player_size.x", self.player_size.x),
            ("player_size.y", self.player_size.y),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(name, value, "must be finite and positive"));
            }
        }
        if !(0.0..=1.0).contains(&self.viewport.camera_lead) {
            return Err(invalid(
                "viewport.camera_lead",
                self.viewport.camera_lead,
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("DASHOUT_ENGINE_CONFIG")
            .unwrap_or_else(|_| "config/engine.toml".to_string());
        match Self::from_file(&path) {
            Ok(cfg) => cfg,
            Err(e @ (ConfigError::Parse(_) | ConfigError::Invalid(_))) => {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                EngineConfig::default()
            },
            Err(ConfigError::Io(_)) => EngineConfig::default(),
        }
    }
}

fn invalid(name: &str, value: f32, rule: &str) -> ConfigError {
    ConfigError::Invalid(format!("{name} {rule}, got {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.viewport.width, 800.0);
        assert_eq!(cfg.streaming.preload_distance, 400.0);
        assert_eq!(cfg.scoring.distance_per_point, 10.0);
        assert!((cfg.max_frame_dt - 1.0 / 30.0).abs() < 1e-6);
        assert_eq!(cfg.player_start.y + cfg.player_size.y, cfg.physics.ground_line);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = EngineConfig::from_toml_str(
            "max_frame_dt = 0.05\n[physics]\ngravity = 1500.0\n[viewport]\ncamera_lead = 0.5\n",
        )
        .unwrap();
        assert_eq!(cfg.physics.gravity, 1500.0);
        assert_eq!(cfg.physics.jump_velocity, PhysicsConfig::default().jump_velocity);
        assert_eq!(cfg.viewport.camera_lead, 0.5);
        assert_eq!(cfg.viewport.width, VIEWPORT_WIDTH);
        assert_eq!(cfg.max_frame_dt, 0.05);
    }

    #[test]
    fn vector_fields_parse_as_tables() {
        let cfg = EngineConfig::from_toml_str("player_start = { x = 50.0, y = 500.0 }\n").unwrap();
        assert_eq!(cfg.player_start, Vector2::new(50.0, 500.0));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = EngineConfig::from_toml_str("physics = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let mut cfg =
            EngineConfig::from_toml_str(include_str!("../../../config/engine.toml")).unwrap();
        assert!((cfg.max_frame_dt - MAX_FRAME_DT).abs() < 1e-6);
        cfg.max_frame_dt = MAX_FRAME_DT;
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for toml in [
            "max_frame_dt = -0.1",
            "max_frame_dt = nan",
            "[physics]\nmax_velocity = { x = -1.0, y = 1200.0 }",
            "[physics]\ngravity = inf",
            "[viewport]\nwidth = 0.0",
            "[viewport]\ncamera_lead = 1.5",
            "[scoring]\ndistance_per_point = 0.0",
            "[streaming]\nunload_distance = -5.0",
        ] {
            let err = EngineConfig::from_toml_str(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{toml} gave {err}");
        }
    }

    #[test]
    fn invalid_error_names_the_field() {
        let err = EngineConfig::from_toml_str("max_frame_dt = -0.1").unwrap_err();
        assert!(err.to_string().contains("max_frame_dt"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::from_file("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
