use serde::{Deserialize, Serialize};

/// One frame of player intent, as produced by an input adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFlags {
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub restart: bool,
    #[serde(default)]
    pub pause: bool,
}

impl InputFlags {
    pub fn jump() -> Self {
        Self {
            jump: true,
            ..Self::default()
        }
    }

    pub fn restart() -> Self {
        Self {
            restart: true,
            ..Self::default()
        }
    }

    pub fn pause() -> Self {
        Self {
            pause: true,
            ..Self::default()
        }
    }
}

/// Input pending for the next tick.
///
/// `jump` is level-triggered: the latest frame wins and it stays set until a
/// frame clears it. `restart` and `pause` are latched across frames and read
/// exactly once.
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    jump: bool,
    restart: bool,
    pause: bool,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flags: InputFlags) {
        self.jump = flags.jump;
        if flags.restart {
            self.restart = true;
        }
        if flags.pause {
            self.pause = true;
        }
    }

    pub fn set_jump(&mut self, held: bool) {
        self.jump = held;
    }

    pub fn jump_held(&self) -> bool {
        self.jump
    }

    pub fn take_restart(&mut self) -> bool {
        std::mem::take(&mut self.restart)
    }

    pub fn take_pause(&mut self) -> bool {
        std::mem::take(&mut self.pause)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
