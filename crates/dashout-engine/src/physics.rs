use serde::{Deserialize, Serialize};

use dashout_core::{Bounded, DeathCause, GameObject, ObjectKind, Player, Vector2};

use crate::collision::{GROUND_TOLERANCE, supporting_platform};

/// Gravity acceleration (units/s^2, +y is down).
pub const GRAVITY: f32 = 2000.0;
/// Horizontal speed cap.
pub const MAX_VELOCITY_X: f32 = 600.0;
/// Vertical speed cap in either direction.
pub const MAX_VELOCITY_Y: f32 = 1200.0;
/// Jump impulse (negative is up).
pub const JUMP_VELOCITY: f32 = -720.0;
/// Auto-run speed.
pub const RUN_SPEED: f32 = 300.0;
/// Absolute floor. A player's bottom edge never ends a step below this.
pub const GROUND_LINE: f32 = 550.0;
/// Band around a block's top in which contact counts as a landing.
pub const LANDING_TOLERANCE: f32 = 20.0;
/// Upward speed still treated as "just landed" on a block.
pub const LANDING_VELOCITY_SLACK: f32 = 60.0;

/// Integrator tuning, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub max_velocity: Vector2,
    pub jump_velocity: f32,
    pub run_speed: f32,
    pub ground_line: f32,
    pub ground_tolerance: f32,
    pub landing_tolerance: f32,
    pub landing_velocity_slack: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            max_velocity: Vector2::new(MAX_VELOCITY_X, MAX_VELOCITY_Y),
            jump_velocity: JUMP_VELOCITY,
            run_speed: RUN_SPEED,
            ground_line: GROUND_LINE,
            ground_tolerance: GROUND_TOLERANCE,
            landing_tolerance: LANDING_TOLERANCE,
            landing_velocity_slack: LANDING_VELOCITY_SLACK,
        }
    }
}

/// What touching an object did to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionOutcome {
    Fatal(DeathCause),
    /// Block contact inside the landing band; the integrator snaps next step.
    Landed,
    Collected(u32),
    Ignored,
}

impl CollisionOutcome {
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Per-step player integrator.
#[derive(Debug, Clone, Default)]
pub struct Physics {
    config: PhysicsConfig,
}

impl Physics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Advance `player` by `dt` against the solid objects in `platforms`.
    pub fn update(&self, player: &mut Player, platforms: &[&GameObject], dt: f32) {
        self.clamp_to_floor(player);
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        sanitize(player);

        let prev_top = player.position.y;
        let prev_bottom = player.bottom();
        self.integrate(player, dt);

        if player.velocity.y < 0.0 {
            guard_ceiling(player, platforms, prev_top);
        } else {
            self.resolve_landing(player, platforms, prev_bottom);
            self.update_ground_state(player, platforms);
        }

        self.clamp_to_floor(player);
    }

    fn integrate(&self, player: &mut Player, dt: f32) {
        let max = self.config.max_velocity;
        player.velocity.y = clamp_speed(player.velocity.y + self.config.gravity * dt, max.y);
        player.velocity.x = clamp_speed(player.velocity.x, max.x);
        player.position += player.velocity * dt;
    }

    /// Snap onto the highest platform the player fell into this step.
    fn resolve_landing(&self, player: &mut Player, platforms: &[&GameObject], prev_bottom: f32) {
        let mut sorted: Vec<&GameObject> = platforms.iter().copied().filter(|p| p.active).collect();
        sorted.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));

        let b = player.bounds();
        let tolerance = self.config.ground_tolerance;
        let landed = sorted.into_iter().find(|p| {
            let pb = p.bounds();
            b.overlaps_x(&pb) && b.bottom() > pb.top() && prev_bottom <= pb.top() + tolerance
        });
        if let Some(platform) = landed {
            land_on(player, platform.position.y);
        }
    }

    fn update_ground_state(&self, player: &mut Player, platforms: &[&GameObject]) {
        let was_on_ground = player.is_on_ground;
        match supporting_platform(&*player, platforms, self.config.ground_tolerance) {
            Some(platform) => land_on(player, platform.position.y),
            None => {
                player.is_on_ground = false;
                if was_on_ground {
                    player.is_jumping = false;
                }
            },
        }
    }

    /// Force the player back above the ground line. Returns whether it moved.
    pub fn clamp_to_floor(&self, player: &mut Player) -> bool {
        if player.bottom() > self.config.ground_line || !player.position.y.is_finite() {
            land_on(player, self.config.ground_line);
            true
        } else {
            false
        }
    }

    /// Start a jump if grounded. Returns whether it took effect.
    pub fn jump(&self, player: &mut Player) -> bool {
        if !player.is_on_ground || player.is_jumping {
            return false;
        }
        player.velocity.y = self.config.jump_velocity;
        player.is_jumping = true;
        player.is_on_ground = false;
        true
    }

    /// Apply contact with `object`. Fatal outcomes zero the player's health.
    pub fn handle_player_collision(
        &self,
        player: &mut Player,
        object: &GameObject,
    ) -> CollisionOutcome {
        let outcome = match object.kind {
            ObjectKind::Spike { .. } => CollisionOutcome::Fatal(DeathCause::Spike),
            ObjectKind::Block { .. } => {
                let settling = player.velocity.y >= -self.config.landing_velocity_slack;
                let near_top = (player.bottom() - object.position.y).abs()
                    <= self.config.landing_tolerance;
                if settling && near_top {
                    CollisionOutcome::Landed
                } else {
                    CollisionOutcome::Fatal(DeathCause::Block)
                }
            },
            ObjectKind::Collectible { value } => CollisionOutcome::Collected(value),
            ObjectKind::Platform | ObjectKind::Portal => CollisionOutcome::Ignored,
        };
        if outcome.is_fatal() {
            player.health = 0.0;
        }
        outcome
    }
}

/// Stop a rising player from passing up through a platform's underside.
fn guard_ceiling(player: &mut Player, platforms: &[&GameObject], prev_top: f32) {
    let b = player.bounds();
    let hit = platforms.iter().copied().filter(|p| p.active).find(|p| {
        let pb = p.bounds();
        b.overlaps(&pb) && prev_top >= pb.bottom() && b.top() < pb.bottom()
    });
    if let Some(platform) = hit {
        player.position.y = platform.bounds().bottom();
        player.velocity.y = 0.0;
    }
}

/// Clamp to `[-limit, limit]`. A negative or NaN limit leaves `v` untouched.
fn clamp_speed(v: f32, limit: f32) -> f32 {
    if limit >= 0.0 { v.clamp(-limit, limit) } else { v }
}

fn land_on(player: &mut Player, surface_y: f32) {
    player.position.y = surface_y - player.size.y;
    player.velocity.y = 0.0;
    player.is_on_ground = true;
    player.is_jumping = false;
}

fn sanitize(player: &mut Player) {
    if !player.velocity.is_finite() {
        player.velocity = Vector2::ZERO;
    }
    if !player.position.x.is_finite() {
        player.position.x = 0.0;
    }
}
