use serde::{Deserialize, Serialize};

use crate::object::ObjectId;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Spike,
    Block,
    /// Scrolled off the left edge of the viewport.
    LeftBehind,
    /// Left the world above the top edge.
    OutOfTop,
}

/// Events emitted by a game tick (score changes, pickups, phase transitions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    Paused,
    Resumed,
    Restarted,
    ScoreChanged { score: u64 },
    Collected { object_id: ObjectId, value: u32 },
    GameOver { cause: DeathCause },
}
