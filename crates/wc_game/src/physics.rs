//! Platformer physics over the level's merged wall grid.
//!
//! One `update` per frame: gravity unless the player is on a ladder, then
//! move-and-slide against the walls. Vertical blocking zeroes vertical speed;
//! horizontal speed is left alone because input recomputes it every frame.

use crate::collision::{Aabb, CollisionGrid, CollisionMoveResult};
use crate::entity::Player;
use crate::level::LevelScene;

/// Probe depth for the "standing on something" check used by animation.
pub const GROUND_PROBE: f32 = 5.0;

#[derive(Debug, Clone)]
pub struct PhysicsAdapter {
    walls: CollisionGrid,
    ladders: CollisionGrid,
    gravity: f32,
}

impl PhysicsAdapter {
    pub fn new(walls: CollisionGrid, ladders: CollisionGrid, gravity: f32) -> Self {
        Self {
            walls,
            ladders,
            gravity,
        }
    }

    /// Builds the collision set from every wall layer the level config names.
    pub fn for_scene(scene: &LevelScene, gravity: f32) -> Self {
        let walls = scene.wall_grid();
        let ladders = scene.ladder_grid();
        log::debug!(
            "Level {} physics: {} wall cells from {:?}, {} ladder cells",
            scene.level,
            walls.len(),
            scene.config.wall_layers,
            ladders.len()
        );
        Self::new(walls, ladders, gravity)
    }

    pub fn update(&self, player: &mut Player) -> CollisionMoveResult {
        if !self.is_on_ladder(player.bounds) {
            player.velocity.y -= self.gravity;
        }

        let mut result =
            self.walls
                .move_and_collide_detailed(player.bounds, player.velocity.x, player.velocity.y);

        // The world has a hard left edge at x = 0.
        if result.aabb.left() < 0.0 {
            result.aabb.center_x = result.aabb.half_w;
            result.blocked_left = true;
        }

        if result.blocked_vertically() {
            player.velocity.y = 0.0;
        }
        player.bounds = result.aabb;
        log::trace!(
            "physics: pos=({:.1}, {:.1}) vel=({:.1}, {:.1})",
            player.bounds.center_x,
            player.bounds.center_y,
            player.velocity.x,
            player.velocity.y
        );
        result
    }

    /// True when a wall lies within `tolerance` below the box.
    pub fn can_jump(&self, bounds: Aabb, tolerance: f32) -> bool {
        self.walls.overlaps(bounds.offset(0.0, -tolerance))
    }

    pub fn is_on_ladder(&self, bounds: Aabb) -> bool {
        self.ladders.overlaps(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{GridCell, GridOrigin, GridSpec};
    use glam::Vec2;

    fn spec() -> GridSpec {
        GridSpec {
            cell_size: 128.0,
            origin: GridOrigin::default(),
            width: 40,
            height: 6,
        }
    }

    fn floor() -> CollisionGrid {
        CollisionGrid::from_cells(spec(), (0..40).map(|x| GridCell { x, y: 0 }))
    }

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Vec2::new(x, y), Vec2::new(24.0, 32.0), "p")
    }

    #[test]
    fn gravity_accumulates_until_landing() {
        let physics = PhysicsAdapter::new(floor(), CollisionGrid::new(spec()), 1.4);
        let mut player = player_at(250.0, 300.0);
        for _ in 0..200 {
            physics.update(&mut player);
        }
        assert!((player.bounds.bottom() - 128.0).abs() < 0.01);
        assert_eq!(player.velocity.y, 0.0);
        assert!(physics.can_jump(player.bounds, 10.0));
    }

    #[test]
    fn airborne_player_cannot_jump() {
        let physics = PhysicsAdapter::new(floor(), CollisionGrid::new(spec()), 1.4);
        let player = player_at(250.0, 128.0 + 32.0 + 20.0);
        assert!(!physics.can_jump(player.bounds, 10.0));
        assert!(physics.can_jump(player.bounds, 25.0));
    }

    #[test]
    fn ladder_suspends_gravity() {
        let ladders = CollisionGrid::from_cells(spec(), [GridCell { x: 2, y: 1 }, GridCell { x: 2, y: 2 }]);
        let physics = PhysicsAdapter::new(floor(), ladders, 1.4);
        let mut player = player_at(320.0, 200.0);
        assert!(physics.is_on_ladder(player.bounds));
        physics.update(&mut player);
        assert_eq!(player.velocity.y, 0.0);
        assert_eq!(player.bounds.center_y, 200.0);
    }

    #[test]
    fn walking_into_wall_keeps_horizontal_intent() {
        let walls = CollisionGrid::from_cells(
            spec(),
            (0..40).map(|x| GridCell { x, y: 0 }).chain([GridCell { x: 3, y: 1 }]),
        );
        let physics = PhysicsAdapter::new(walls, CollisionGrid::new(spec()), 1.4);
        let mut player = player_at(384.0 - 24.0 - 1.0, 160.0);
        player.velocity.x = 7.0;
        let result = physics.update(&mut player);
        assert!(result.blocked_right);
        assert!((player.bounds.right() - 384.0).abs() < 0.01);
        assert_eq!(player.velocity.x, 7.0);
    }

    #[test]
    fn left_world_edge_stops_player() {
        let physics = PhysicsAdapter::new(floor(), CollisionGrid::new(spec()), 1.4);
        let mut player = player_at(26.0, 160.0);
        player.velocity.x = -7.0;
        physics.update(&mut player);
        assert_eq!(player.bounds.left(), 0.0);
    }
}
