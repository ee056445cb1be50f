//! Overlap tests between the player and level objects.

use dashout_core::{Aabb, Bounded, GameObject, ObjectKind, Vector2};

/// Block hitboxes grow by this much on the left, right, and bottom edges.
/// The top edge is left alone so landings go through the integrator.
pub const BLOCK_PADDING: f32 = 4.0;
/// Fraction of a spike's width trimmed from each side.
pub const SPIKE_SIDE_INSET_RATIO: f32 = 0.3;
/// Fraction of a spike's height trimmed from the tip.
pub const SPIKE_TOP_INSET_RATIO: f32 = 0.4;
/// Trimmed from a spike's base.
pub const SPIKE_BASE_INSET: f32 = 2.0;
/// How far a platform top may sit from an object's bottom and still count as
/// ground.
pub const GROUND_TOLERANCE: f32 = 15.0;

/// Strict overlap of two hitboxes. Touching edges do not collide.
pub fn check_aabb_collision<A, B>(a: &A, b: &B) -> bool
where
    A: Bounded + ?Sized,
    B: Bounded + ?Sized,
{
    a.bounds().overlaps(&b.bounds())
}

/// Effective hitbox of an object. `None` when the insets collapse it.
pub fn hitbox(object: &GameObject) -> Option<Aabb> {
    let b = object.bounds();
    let shaped = match object.kind {
        ObjectKind::Spike { .. } => {
            let side = b.width * SPIKE_SIDE_INSET_RATIO;
            b.inset(side, b.height * SPIKE_TOP_INSET_RATIO, side, SPIKE_BASE_INSET)
        },
        ObjectKind::Block { .. } => b.inset(-BLOCK_PADDING, 0.0, -BLOCK_PADDING, -BLOCK_PADDING),
        ObjectKind::Platform | ObjectKind::Portal | ObjectKind::Collectible { .. } => b,
    };
    (!shaped.is_empty()).then_some(shaped)
}

/// Obstacle-aware overlap: spikes use their inset silhouette, blocks their
/// padded box, everything else the plain bounds.
pub fn check_obstacle_collision<P: Bounded + ?Sized>(player: &P, obstacle: &GameObject) -> bool {
    hitbox(obstacle).is_some_and(|h| player.bounds().overlaps(&h))
}

/// Active candidates other than `object` itself that overlap it.
pub fn find_collisions<'a, T: Bounded + ?Sized>(
    object: &T,
    candidates: &'a [GameObject],
) -> Vec<&'a GameObject> {
    let id = object.object_id();
    candidates
        .iter()
        .filter(|c| c.active && c.id != id)
        .filter(|c| {
            if c.kind.is_obstacle() {
                check_obstacle_collision(object, c)
            } else {
                check_aabb_collision(object, *c)
            }
        })
        .collect()
}

/// Whether any active platform top lies within `tolerance` of the object's
/// bottom while overlapping it horizontally.
pub fn is_on_ground<T: Bounded + ?Sized>(
    object: &T,
    platforms: &[&GameObject],
    tolerance: f32,
) -> bool {
    supporting_platform(object, platforms, tolerance).is_some()
}

/// The platform closest to the object's bottom within `tolerance`.
pub fn supporting_platform<'a, T: Bounded + ?Sized>(
    object: &T,
    platforms: &[&'a GameObject],
    tolerance: f32,
) -> Option<&'a GameObject> {
    let b = object.bounds();
    platforms
        .iter()
        .copied()
        .filter(|p| p.active)
        .filter(|p| {
            let pb = p.bounds();
            b.overlaps_x(&pb) && (pb.top() - b.bottom()).abs() <= tolerance
        })
        .min_by(|x, y| {
            let dx = (x.bounds().top() - b.bottom()).abs();
            let dy = (y.bounds().top() - b.bottom()).abs();
            dx.total_cmp(&dy)
        })
}

/// Overlap on each axis, or zero when the boxes are disjoint.
pub fn penetration_depth<A, B>(a: &A, b: &B) -> Vector2
where
    A: Bounded + ?Sized,
    B: Bounded + ?Sized,
{
    let (a, b) = (a.bounds(), b.bounds());
    let x = a.right().min(b.right()) - a.left().max(b.left());
    let y = a.bottom().min(b.bottom()) - a.top().max(b.top());
    if x <= 0.0 || y <= 0.0 {
        Vector2::ZERO
    } else {
        Vector2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashout_core::test_helpers::{
        FLOOR_TOP, make_block, make_coin, make_platform, make_player, make_spike,
    };

    #[test]
    fn touching_player_and_platform_do_not_collide() {
        let player = make_player(100.0);
        let floor = make_platform(1, 0.0, FLOOR_TOP, 1000.0);
        assert!(!check_aabb_collision(&player, &floor));
    }

    #[test]
    fn spike_inset_spares_near_misses() {
        let spike = make_spike(1, 200.0);
        // Player's right edge 5 units into the spike's visual box.
        let mut player = make_player(165.0);
        assert!(check_aabb_collision(&player, &spike));
        assert!(!check_obstacle_collision(&player, &spike));
        // Deep overlap is fatal.
        player.position.x = 200.0;
        assert!(check_obstacle_collision(&player, &spike));
    }

    #[test]
    fn spike_tip_is_forgiving() {
        let spike = make_spike(1, 200.0);
        let mut player = make_player(200.0);
        // Bottom 8 units into the 30-tall spike, above the 12-unit tip inset.
        player.position.y = spike.position.y + 8.0 - player.size.y;
        assert!(!check_obstacle_collision(&player, &spike));
    }

    #[test]
    fn collapsed_spike_never_collides() {
        let mut spike = make_spike(1, 200.0);
        spike.size = Vector2::new(30.0, 2.0);
        assert!(hitbox(&spike).is_none());
        let mut player = make_player(200.0);
        player.position.y = spike.position.y - 10.0;
        assert!(!check_obstacle_collision(&player, &spike));
    }

    #[test]
    fn block_top_is_unpadded() {
        let block = make_block(1, 300.0, 60.0);
        let mut player = make_player(300.0);
        player.position.y = block.position.y - player.size.y;
        assert!(!check_obstacle_collision(&player, &block));
    }

    #[test]
    fn block_sides_are_padded() {
        let block = make_block(1, 300.0, 60.0);
        // Player stops 2 units short of the block's visual left edge.
        let player = make_player(258.0);
        assert!(!check_aabb_collision(&player, &block));
        assert!(check_obstacle_collision(&player, &block));
    }

    #[test]
    fn find_collisions_skips_self_and_inactive() {
        let player = make_player(100.0);
        let mut coin = make_coin(2, 110.0, 520.0, 5);
        let spike = make_spike(3, 105.0);
        let mut same_id = make_coin(0, 100.0, 520.0, 1);
        same_id.id = player.id;
        let objects = vec![coin.clone(), spike.clone(), same_id];
        let hits: Vec<u64> = find_collisions(&player, &objects).iter().map(|o| o.id).collect();
        assert_eq!(hits, vec![2, 3]);

        coin.active = false;
        let objects = vec![coin, spike];
        assert_eq!(find_collisions(&player, &objects).len(), 1);
    }

    #[test]
    fn ground_query_respects_tolerance_and_overlap() {
        let floor = make_platform(1, 0.0, FLOOR_TOP, 500.0);
        let mut player = make_player(100.0);
        assert!(is_on_ground(&player, &[&floor], GROUND_TOLERANCE));
        player.position.y -= GROUND_TOLERANCE + 1.0;
        assert!(!is_on_ground(&player, &[&floor], GROUND_TOLERANCE));
        let away = make_player(600.0);
        assert!(!is_on_ground(&away, &[&floor], GROUND_TOLERANCE));
    }

    #[test]
    fn supporting_platform_prefers_closest_top() {
        let floor = make_platform(1, 0.0, FLOOR_TOP, 500.0);
        let ledge = make_platform(2, 0.0, FLOOR_TOP - 10.0, 500.0);
        let mut player = make_player(100.0);
        player.position.y -= 8.0;
        let found = supporting_platform(&player, &[&floor, &ledge], GROUND_TOLERANCE).unwrap();
        assert_eq!(found.id, 2);
    }

    #[test]
    fn penetration_is_per_axis() {
        let floor = make_platform(1, 0.0, FLOOR_TOP, 500.0);
        let mut player = make_player(100.0);
        assert_eq!(penetration_depth(&player, &floor), Vector2::ZERO);
        player.position.y += 5.0;
        assert_eq!(penetration_depth(&player, &floor), Vector2::new(40.0, 5.0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn spike_hits_imply_plain_hits(
                px in 0.0f32..400.0,
                py in 400.0f32..560.0,
            ) {
                let spike = make_spike(1, 200.0);
                let mut player = make_player(px);
                player.position.y = py;
                if check_obstacle_collision(&player, &spike) {
                    prop_assert!(check_aabb_collision(&player, &spike));
                }
            }

            #[test]
            fn edge_contact_never_hits_spike(side in 0usize..4) {
                let spike = make_spike(1, 200.0);
                let b = spike.bounds();
                let mut player = make_player(0.0);
                let (w, h) = (player.size.x, player.size.y);
                player.position = match side {
                    0 => Vector2::new(b.left() - w, b.top()),
                    1 => Vector2::new(b.right(), b.top()),
                    2 => Vector2::new(b.left(), b.top() - h),
                    _ => Vector2::new(b.left(), b.bottom()),
                };
                prop_assert!(!check_obstacle_collision(&player, &spike));
            }
        }
    }
}
