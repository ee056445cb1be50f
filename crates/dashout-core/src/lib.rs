pub mod events;
pub mod level;
pub mod math;
pub mod object;
pub mod rng;

pub use events::{DeathCause, GameEvent};
pub use level::{
    GenerationMethod, Level, LevelSegment, LevelSource, SegmentFeatures, SegmentMetadata,
    renumber_objects,
};
pub use math::{Aabb, Vector2};
pub use object::{Bounded, GameObject, ObjectId, ObjectKind, ObstacleClass, PLAYER_ID, Player};
pub use rng::SeededRng;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::level::{Level, LevelSegment};
    use crate::math::Vector2;
    use crate::object::{GameObject, ObjectId, ObjectKind, Player};

    /// Platform top used by the fixtures.
    pub const FLOOR_TOP: f32 = 550.0;

    /// A 40x40 player standing on `FLOOR_TOP` at `x`.
    pub fn make_player(x: f32) -> Player {
        let mut p = Player::spawn(
            Vector2::new(x, FLOOR_TOP - 40.0),
            Vector2::new(40.0, 40.0),
        );
        p.is_on_ground = true;
        p
    }

    pub fn make_platform(id: ObjectId, x: f32, y: f32, width: f32) -> GameObject {
        let mut o = GameObject::new(ObjectKind::Platform, x, y, width, 20.0);
        o.id = id;
        o
    }

    /// A spike resting on `FLOOR_TOP`.
    pub fn make_spike(id: ObjectId, x: f32) -> GameObject {
        let mut o = GameObject::new(ObjectKind::spike(), x, FLOOR_TOP - 30.0, 30.0, 30.0);
        o.id = id;
        o
    }

    /// A block resting on `FLOOR_TOP`.
    pub fn make_block(id: ObjectId, x: f32, height: f32) -> GameObject {
        let mut o = GameObject::new(ObjectKind::block(), x, FLOOR_TOP - height, 40.0, height);
        o.id = id;
        o
    }

    pub fn make_coin(id: ObjectId, x: f32, y: f32, value: u32) -> GameObject {
        let mut o = GameObject::new(ObjectKind::Collectible { value }, x, y, 20.0, 20.0);
        o.id = id;
        o
    }

    /// A single-segment level with a ground platform plus `extras`.
    pub fn flat_level(length: f32, extras: Vec<GameObject>) -> Level {
        let mut ground = GameObject::new(ObjectKind::Platform, 0.0, FLOOR_TOP, length, 50.0);
        ground.id = 1;
        let mut objects = vec![ground];
        objects.extend(extras);
        Level::manual(
            "flat",
            0.0,
            vec![LevelSegment {
                id: "flat-0".to_string(),
                start_x: 0.0,
                length,
                difficulty: 0.0,
                objects,
                metadata: None,
            }],
        )
    }
}
