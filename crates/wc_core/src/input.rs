//! Directional key state and velocity recomputation.
//!
//! Key events arrive from the windowing layer between frames and are applied
//! immediately. Every key change (and every simulation frame, after physics has
//! refreshed the ground/ladder contact) calls `recompute_velocity`, which maps
//! the four direction flags onto the player's velocity:
//!
//! - **Ladder:** up moves up, down moves down, both or neither hold still.
//! - **Ground:** up triggers a jump once per press. The `jump_needs_reset` latch
//!   stays set until the up direction is released, so holding the key across
//!   frames never re-triggers.
//! - **Horizontal:** left/right are independent of up/down; both or neither stop.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    W,
    A,
    S,
    D,
    Space,
    Escape,
    F3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Arrow keys and WASD both steer the player.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Key::Up | Key::W => Some(Direction::Up),
            Key::Down | Key::S => Some(Direction::Down),
            Key::Left | Key::A => Some(Direction::Left),
            Key::Right | Key::D => Some(Direction::Right),
            Key::Space | Key::Escape | Key::F3 => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementTuning {
    /// Horizontal and ladder speed in pixels per frame.
    pub speed: f32,
    pub jump_speed: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            speed: 7.0,
            jump_speed: 30.0,
        }
    }
}

/// What physics reported about the player's surroundings this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroundContact {
    pub on_ladder: bool,
    pub can_jump: bool,
}

/// Result of a recomputation. `dy` is `None` when vertical velocity must be left
/// to gravity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityIntent {
    pub dx: f32,
    pub dy: Option<f32>,
    pub jumped: bool,
}

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub jump_needs_reset: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the key was already held (OS key repeat).
    pub fn key_down(&mut self, key: Key) -> bool {
        if !self.held.insert(key) {
            return false;
        }
        self.refresh_directions();
        true
    }

    pub fn key_up(&mut self, key: Key) -> bool {
        if !self.held.remove(&key) {
            return false;
        }
        self.refresh_directions();
        if !self.up {
            self.jump_needs_reset = false;
        }
        true
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn recompute_velocity(
        &mut self,
        contact: GroundContact,
        tuning: MovementTuning,
    ) -> VelocityIntent {
        let mut dy = None;
        let mut jumped = false;

        if contact.on_ladder {
            dy = Some(match (self.up, self.down) {
                (true, false) => tuning.speed,
                (false, true) => -tuning.speed,
                _ => 0.0,
            });
        } else if self.up && !self.down && contact.can_jump && !self.jump_needs_reset {
            dy = Some(tuning.jump_speed);
            self.jump_needs_reset = true;
            jumped = true;
        }

        let dx = match (self.left, self.right) {
            (false, true) => tuning.speed,
            (true, false) => -tuning.speed,
            _ => 0.0,
        };

        VelocityIntent { dx, dy, jumped }
    }

    fn refresh_directions(&mut self) {
        let mut up = false;
        let mut down = false;
        let mut left = false;
        let mut right = false;
        for key in &self.held {
            match key.direction() {
                Some(Direction::Up) => up = true,
                Some(Direction::Down) => down = true,
                Some(Direction::Left) => left = true,
                Some(Direction::Right) => right = true,
                None => {}
            }
        }
        self.up = up;
        self.down = down;
        self.left = left;
        self.right = right;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUNDED: GroundContact = GroundContact {
        on_ladder: false,
        can_jump: true,
    };
    const AIRBORNE: GroundContact = GroundContact {
        on_ladder: false,
        can_jump: false,
    };
    const LADDER: GroundContact = GroundContact {
        on_ladder: true,
        can_jump: false,
    };

    #[test]
    fn wasd_aliases_map_to_directions() {
        let mut input = InputState::new();
        input.key_down(Key::W);
        input.key_down(Key::D);
        assert!(input.up);
        assert!(input.right);
        assert!(!input.left);
        input.key_up(Key::W);
        assert!(!input.up);
    }

    #[test]
    fn repeated_key_down_is_ignored() {
        let mut input = InputState::new();
        assert!(input.key_down(Key::Left));
        assert!(!input.key_down(Key::Left));
        assert!(input.is_held(Key::Left));
    }

    #[test]
    fn key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        assert!(!input.key_up(Key::Right));
        assert!(!input.right);
    }

    #[test]
    fn horizontal_velocity_follows_single_direction() {
        let mut input = InputState::new();
        let tuning = MovementTuning::default();

        input.key_down(Key::Right);
        assert_eq!(input.recompute_velocity(GROUNDED, tuning).dx, 7.0);

        input.key_down(Key::Left);
        assert_eq!(input.recompute_velocity(GROUNDED, tuning).dx, 0.0);

        input.key_up(Key::Right);
        assert_eq!(input.recompute_velocity(GROUNDED, tuning).dx, -7.0);

        input.key_up(Key::Left);
        assert_eq!(input.recompute_velocity(GROUNDED, tuning).dx, 0.0);
    }

    #[test]
    fn ladder_up_and_down_together_is_neutral() {
        let mut input = InputState::new();
        let tuning = MovementTuning::default();
        input.key_down(Key::Up);
        input.key_down(Key::Down);
        input.key_down(Key::Right);

        let intent = input.recompute_velocity(LADDER, tuning);
        assert_eq!(intent.dy, Some(0.0));
        assert_eq!(intent.dx, 7.0);
        assert!(!intent.jumped);
    }

    #[test]
    fn ladder_climbs_in_pressed_direction() {
        let mut input = InputState::new();
        let tuning = MovementTuning::default();

        assert_eq!(input.recompute_velocity(LADDER, tuning).dy, Some(0.0));
        input.key_down(Key::Up);
        assert_eq!(input.recompute_velocity(LADDER, tuning).dy, Some(7.0));
        input.key_up(Key::Up);
        input.key_down(Key::S);
        assert_eq!(input.recompute_velocity(LADDER, tuning).dy, Some(-7.0));
    }

    #[test]
    fn held_jump_triggers_once_until_released() {
        let mut input = InputState::new();
        let tuning = MovementTuning::default();
        input.key_down(Key::Up);

        let first = input.recompute_velocity(GROUNDED, tuning);
        assert_eq!(first.dy, Some(30.0));
        assert!(first.jumped);

        for _ in 0..10 {
            let again = input.recompute_velocity(GROUNDED, tuning);
            assert_eq!(again.dy, None);
            assert!(!again.jumped);
        }

        input.key_up(Key::Up);
        assert!(!input.jump_needs_reset);
        input.key_down(Key::Up);
        assert!(input.recompute_velocity(GROUNDED, tuning).jumped);
    }

    #[test]
    fn jump_requires_ground_contact() {
        let mut input = InputState::new();
        let tuning = MovementTuning::default();
        input.key_down(Key::Up);
        let intent = input.recompute_velocity(AIRBORNE, tuning);
        assert_eq!(intent.dy, None);
        assert!(!input.jump_needs_reset);
    }

    #[test]
    fn up_with_down_does_not_jump() {
        let mut input = InputState::new();
        input.key_down(Key::Up);
        input.key_down(Key::Down);
        let intent = input.recompute_velocity(GROUNDED, MovementTuning::default());
        assert!(!intent.jumped);
        assert_eq!(intent.dy, None);
    }

    #[test]
    fn releasing_one_of_two_up_keys_keeps_latch() {
        let mut input = InputState::new();
        input.key_down(Key::Up);
        input.key_down(Key::W);
        input.recompute_velocity(GROUNDED, MovementTuning::default());
        input.key_up(Key::Up);
        assert!(input.up);
        assert!(input.jump_needs_reset);
    }
}
