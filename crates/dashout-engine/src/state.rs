use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dashout_core::{DeathCause, GameObject, Level, Player};

use crate::config::EngineConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Idle,
    Running,
    Paused,
    GameOver,
}

/// The single mutable root of a session. Only the game loop writes it;
/// everyone else reads a [`GameState::snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub player: Player,
    /// Shared with the loop. Levels are never mutated after assembly.
    pub current_level: Arc<Level>,
    pub camera_offset: f32,
    /// Objects currently streamed in from the level.
    pub game_objects: Vec<GameObject>,
    pub phase: GamePhase,
    pub score: u64,
    /// Points from collectibles, folded into `score`.
    pub bonus: u64,
    pub elapsed_time: f32,
    pub death_cause: Option<DeathCause>,
}

impl GameState {
    pub fn new(level: Arc<Level>, config: &EngineConfig) -> Self {
        let mut player = Player::spawn(config.player_start, config.player_size);
        player.is_on_ground = player.bottom() >= config.physics.ground_line;
        Self {
            player,
            current_level: level,
            camera_offset: 0.0,
            game_objects: Vec::new(),
            phase: GamePhase::Idle,
            score: 0,
            bonus: 0,
            elapsed_time: 0.0,
            death_cause: None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Deep copy for renderers and UI. Mutating the copy never reaches the
    /// live state.
    pub fn snapshot(&self) -> GameState {
        self.clone()
    }
}
