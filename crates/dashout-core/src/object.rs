use serde::{Deserialize, Serialize};

use crate::math::{Aabb, Vector2};

/// Identifier for anything in the simulated world.
pub type ObjectId = u64;

/// The player's fixed identifier. Level objects are numbered from 1.
pub const PLAYER_ID: ObjectId = 0;

/// Default damage dealt by a lethal obstacle (health is 1.0 when alive).
pub const DEFAULT_OBSTACLE_DAMAGE: f32 = 1.0;

/// Behavior tag for every non-player object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Spike { damage: f32 },
    Block { damage: f32 },
    Platform,
    /// Reserved extension point; contact is a no-op.
    Portal,
    Collectible { value: u32 },
}

/// Coarse grouping used by feature encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleClass {
    Spike,
    Block,
    Platform,
}

impl ObjectKind {
    pub const fn spike() -> Self {
        Self::Spike {
            damage: DEFAULT_OBSTACLE_DAMAGE,
        }
    }

    pub const fn block() -> Self {
        Self::Block {
            damage: DEFAULT_OBSTACLE_DAMAGE,
        }
    }

    pub fn is_obstacle(&self) -> bool {
        matches!(self, Self::Spike { .. } | Self::Block { .. })
    }

    /// Objects the physics integrator can stand on.
    pub fn is_solid(&self) -> bool {
        matches!(self, Self::Platform | Self::Block { .. })
    }

    pub fn obstacle_class(&self) -> Option<ObstacleClass> {
        match self {
            Self::Spike { .. } => Some(ObstacleClass::Spike),
            Self::Block { .. } => Some(ObstacleClass::Block),
            Self::Platform => Some(ObstacleClass::Platform),
            Self::Portal | Self::Collectible { .. } => None,
        }
    }
}

/// Anything with a hitbox. Collision routines are written against this.
pub trait Bounded {
    fn object_id(&self) -> ObjectId;
    fn bounds(&self) -> Aabb;
}

/// A level object: obstacle, platform, portal, or collectible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    pub id: ObjectId,
    pub position: Vector2,
    pub velocity: Vector2,
    pub size: Vector2,
    pub kind: ObjectKind,
    pub active: bool,
}

impl GameObject {
    pub fn new(kind: ObjectKind, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: 0,
            position: Vector2::new(x, y),
            velocity: Vector2::ZERO,
            size: Vector2::new(width, height),
            kind,
            active: true,
        }
    }

    pub fn translated(mut self, dx: f32) -> Self {
        self.position.x += dx;
        self
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }
}

impl Bounded for GameObject {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_parts(self.position, self.size)
    }
}

/// The single controllable actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: ObjectId,
    pub position: Vector2,
    pub velocity: Vector2,
    pub size: Vector2,
    pub is_jumping: bool,
    pub is_on_ground: bool,
    /// 1.0 alive, 0.0 dead. Shipped tuning never sits in between.
    pub health: f32,
    pub score: u64,
    pub active: bool,
}

impl Player {
    pub fn spawn(position: Vector2, size: Vector2) -> Self {
        Self {
            id: PLAYER_ID,
            position,
            velocity: Vector2::ZERO,
            size,
            is_jumping: false,
            is_on_ground: false,
            health: 1.0,
            score: 0,
            active: true,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

impl Bounded for Player {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn bounds(&self) -> Aabb {
        Aabb::from_parts(self.position, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solids_are_platforms_and_blocks() {
        assert!(ObjectKind::Platform.is_solid());
        assert!(ObjectKind::block().is_solid());
        assert!(!ObjectKind::spike().is_solid());
        assert!(!ObjectKind::Portal.is_solid());
    }

    #[test]
    fn portals_and_collectibles_have_no_obstacle_class() {
        assert_eq!(ObjectKind::Portal.obstacle_class(), None);
        assert_eq!(ObjectKind::Collectible { value: 5 }.obstacle_class(), None);
        assert_eq!(
            ObjectKind::spike().obstacle_class(),
            Some(ObstacleClass::Spike)
        );
    }

    #[test]
    fn spawned_player_is_alive() {
        let p = Player::spawn(Vector2::new(10.0, 20.0), Vector2::new(40.0, 40.0));
        assert!(p.is_alive());
        assert_eq!(p.id, PLAYER_ID);
        assert_eq!(p.bottom(), 60.0);
    }
}
