//! Frame-stepped simulation for Dashout: collision, physics, streaming, and
//! the [`GameLoop`] state machine that ties them together.

pub mod camera;
pub mod collision;
pub mod config;
pub mod game_loop;
pub mod input;
pub mod physics;
pub mod state;
pub mod streaming;

pub use config::{ConfigError, EngineConfig, ScoringConfig, StreamingConfig, ViewportConfig};
pub use game_loop::{GameLoop, RenderConsumer, RunSummary, SAFETY_FLOOR_ID, ScoreObserver};
pub use input::{InputFlags, InputQueue};
pub use physics::{CollisionOutcome, Physics, PhysicsConfig};
pub use state::{GamePhase, GameState};
pub use streaming::{StreamStats, StreamingWindow};
