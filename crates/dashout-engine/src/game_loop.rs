//! Frame-driven session state machine: Idle, Running, Paused, GameOver.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dashout_core::{DeathCause, GameEvent, GameObject, Level, ObjectId, ObjectKind};

use crate::camera;
use crate::collision::find_collisions;
use crate::config::{EngineConfig, MAX_FRAME_DT};
use crate::input::{InputFlags, InputQueue};
use crate::physics::{CollisionOutcome, Physics};
use crate::state::{GamePhase, GameState};
use crate::streaming::StreamingWindow;

/// Object id of the permanent safety floor. Never collides with level ids.
pub const SAFETY_FLOOR_ID: ObjectId = ObjectId::MAX;

/// Receives a fresh snapshot each time the host renders.
pub trait RenderConsumer {
    fn render(&mut self, snapshot: GameState);
}

/// Called with the new score whenever it changes.
pub type ScoreObserver = Box<dyn FnMut(u64)>;

/// Outcome of a run, as reported to whatever settles it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub time_alive_ms: u64,
    pub distance: f32,
    pub score: u64,
    pub alive: bool,
}

pub struct GameLoop {
    config: EngineConfig,
    physics: Physics,
    level: Arc<Level>,
    state: GameState,
    input: InputQueue,
    streaming: StreamingWindow,
    safety_floor: GameObject,
    last_frame: Option<f64>,
    pending_events: Vec<GameEvent>,
    score_observer: Option<ScoreObserver>,
}

impl GameLoop {
    pub fn new(level: impl Into<Arc<Level>>, config: EngineConfig) -> Self {
        let level = level.into();
        let physics = Physics::new(config.physics.clone());
        let streaming = StreamingWindow::new(config.streaming.clone());
        let safety_floor = safety_floor(&level, &config);
        let state = GameState::new(Arc::clone(&level), &config);
        let mut game = Self {
            config,
            physics,
            level,
            state,
            input: InputQueue::new(),
            streaming,
            safety_floor,
            last_frame: None,
            pending_events: Vec::new(),
            score_observer: None,
        };
        game.stream();
        game
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn level(&self) -> &Arc<Level> {
        &self.level
    }

    /// Leave Idle. No effect in any other phase.
    pub fn start(&mut self) {
        if self.state.phase == GamePhase::Idle {
            self.state.phase = GamePhase::Running;
            self.pending_events.push(GameEvent::Started);
            tracing::debug!(level = %self.level.id, "Run started");
        }
    }

    pub fn queue_input(&mut self, flags: InputFlags) {
        self.input.push(flags);
    }

    /// Decode a msgpack [`InputFlags`] frame and queue it. Undecodable frames
    /// are dropped.
    pub fn apply_input(&mut self, data: &[u8]) {
        match rmp_serde::from_slice::<InputFlags>(data) {
            Ok(flags) => self.input.push(flags),
            Err(e) => tracing::debug!("Dropping malformed input frame: {e}"),
        }
    }

    pub fn set_score_observer(&mut self, observer: impl FnMut(u64) + 'static) {
        self.score_observer = Some(Box::new(observer));
    }

    pub fn clear_score_observer(&mut self) {
        self.score_observer = None;
    }

    /// Drive one frame from a monotonic clock in seconds. The first frame
    /// integrates nothing; later frames integrate the elapsed time, capped at
    /// `max_frame_dt`.
    pub fn tick(&mut self, now_secs: f64) -> Vec<GameEvent> {
        let dt = match self.last_frame {
            Some(last) if now_secs.is_finite() => (now_secs - last).max(0.0) as f32,
            _ => 0.0,
        };
        if now_secs.is_finite() {
            self.last_frame = Some(now_secs);
        }
        self.step(dt)
    }

    /// Advance the session by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        let cap = match self.config.max_frame_dt {
            cap if cap.is_finite() && cap > 0.0 => cap,
            _ => MAX_FRAME_DT,
        };
        let dt = if dt.is_finite() { dt.clamp(0.0, cap) } else { 0.0 };

        if self.state.phase == GamePhase::GameOver {
            self.input.take_pause();
            if self.input.take_restart() {
                self.reset();
                events.push(GameEvent::Restarted);
            }
            return events;
        }

        self.physics.clamp_to_floor(&mut self.state.player);

        if self.input.take_restart() {
            self.reset();
            events.push(GameEvent::Restarted);
            return events;
        }
        if self.input.take_pause() {
            match self.state.phase {
                GamePhase::Running => {
                    self.state.phase = GamePhase::Paused;
                    events.push(GameEvent::Paused);
                },
                GamePhase::Paused => {
                    self.state.phase = GamePhase::Running;
                    events.push(GameEvent::Resumed);
                },
                GamePhase::Idle | GamePhase::GameOver => {},
            }
        }
        if self.input.jump_held() {
            if self.state.phase == GamePhase::Idle {
                self.state.phase = GamePhase::Running;
                events.push(GameEvent::Started);
            }
            if self.state.phase == GamePhase::Running {
                self.physics.jump(&mut self.state.player);
            }
        }

        if self.state.phase != GamePhase::Running {
            return events;
        }

        self.state.elapsed_time += dt;

        let solids: Vec<&GameObject> = self
            .state
            .game_objects
            .iter()
            .filter(|o| o.active && o.kind.is_solid())
            .chain(std::iter::once(&self.safety_floor))
            .collect();
        self.physics.update(&mut self.state.player, &solids, dt);

        self.state.player.velocity.x = self.config.physics.run_speed;

        self.state.camera_offset = camera::follow(
            self.state.camera_offset,
            self.state.player.position.x,
            &self.config.viewport,
        );

        self.stream();

        if let Some(cause) = self.resolve_collisions(&mut events) {
            self.end_run(cause, &mut events);
        }

        self.physics.clamp_to_floor(&mut self.state.player);

        if self.state.phase == GamePhase::Running
            && let Some(cause) = self.out_of_bounds()
        {
            self.end_run(cause, &mut events);
        }

        self.update_score(&mut events);
        events
    }

    /// Rebuild the session on the same level and keep running.
    pub fn restart(&mut self) {
        self.reset();
        self.pending_events.push(GameEvent::Restarted);
    }

    pub fn snapshot(&self) -> GameState {
        self.state.snapshot()
    }

    pub fn render(&self, consumer: &mut dyn RenderConsumer) {
        consumer.render(self.snapshot());
    }

    /// Distance run since spawn.
    pub fn distance(&self) -> f32 {
        (self.state.player.position.x - self.config.player_start.x).max(0.0)
    }

    pub fn run_summary(&self) -> RunSummary {
        RunSummary {
            time_alive_ms: (f64::from(self.state.elapsed_time) * 1000.0).round() as u64,
            distance: self.distance(),
            score: self.state.score,
            alive: !self.state.is_game_over(),
        }
    }

    fn reset(&mut self) {
        let had_score = self.state.score != 0;
        self.state = GameState::new(Arc::clone(&self.level), &self.config);
        self.state.phase = GamePhase::Running;
        self.input.clear();
        self.streaming.reset();
        self.stream();
        if had_score && let Some(observer) = self.score_observer.as_mut() {
            observer(0);
        }
        tracing::debug!(level = %self.level.id, "Run restarted");
    }

    fn stream(&mut self) {
        self.streaming.update(
            &self.level,
            &mut self.state.game_objects,
            self.state.camera_offset,
            self.config.viewport.width,
        );
    }

    /// Apply every contact this step. Stops at the first fatal one.
    fn resolve_collisions(&mut self, events: &mut Vec<GameEvent>) -> Option<DeathCause> {
        let hits: Vec<ObjectId> = find_collisions(&self.state.player, &self.state.game_objects)
            .into_iter()
            .map(|o| o.id)
            .collect();
        for id in hits {
            let Some(obj) = self.state.game_objects.iter_mut().find(|o| o.id == id) else {
                continue;
            };
            match self.physics.handle_player_collision(&mut self.state.player, obj) {
                CollisionOutcome::Fatal(cause) => return Some(cause),
                CollisionOutcome::Collected(value) => {
                    obj.active = false;
                    self.state.bonus += u64::from(value);
                    events.push(GameEvent::Collected {
                        object_id: id,
                        value,
                    });
                },
                CollisionOutcome::Landed | CollisionOutcome::Ignored => {},
            }
        }
        None
    }

    /// Only the left edge of the view and the top of the world are fatal.
    fn out_of_bounds(&self) -> Option<DeathCause> {
        let p = &self.state.player;
        if p.position.x + p.size.x < self.state.camera_offset {
            Some(DeathCause::LeftBehind)
        } else if p.bottom() < 0.0 {
            Some(DeathCause::OutOfTop)
        } else {
            None
        }
    }

    fn end_run(&mut self, cause: DeathCause, events: &mut Vec<GameEvent>) {
        self.state.phase = GamePhase::GameOver;
        self.state.death_cause = Some(cause);
        self.state.player.health = 0.0;
        self.state.player.velocity.x = 0.0;
        events.push(GameEvent::GameOver { cause });
        tracing::debug!(
            ?cause,
            distance = self.distance(),
            elapsed = self.state.elapsed_time,
            "Run over"
        );
    }

    fn update_score(&mut self, events: &mut Vec<GameEvent>) {
        let per_point = self.config.scoring.distance_per_point.max(f32::EPSILON);
        let score = (self.distance() / per_point).floor() as u64 + self.state.bonus;
        if score == self.state.score {
            return;
        }
        self.state.score = score;
        self.state.player.score = score;
        events.push(GameEvent::ScoreChanged { score });
        if let Some(observer) = self.score_observer.as_mut() {
            observer(score);
        }
    }
}

/// Full-span floor under the whole level, never streamed out.
fn safety_floor(level: &Level, config: &EngineConfig) -> GameObject {
    let width = level.total_length + config.viewport.width * 2.0;
    let mut floor = GameObject::new(
        ObjectKind::Platform,
        -config.viewport.width,
        config.physics.ground_line,
        width,
        config.viewport.height,
    );
    floor.id = SAFETY_FLOOR_ID;
    floor
}
