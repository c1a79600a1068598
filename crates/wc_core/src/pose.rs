//! Player pose selection.
//!
//! A small deterministic state machine evaluated once per frame from the
//! player's velocity and ladder contact. Rules in priority order:
//!
//!  1. Facing flips only on a non-zero horizontal velocity (sticky facing).
//!  2. The climbing flag follows `on_ladder` but lags it by one evaluation when
//!     the player steps off a ladder.
//!  3. Climbing with `|dy| > 1` advances the frame counter; climbing poses
//!     show `counter / 4`, so each of the two climb frames lasts four ticks.
//!  4. Off a ladder: rising is `Jump`, falling is `Fall`, standing is `Idle`.
//!  5. Otherwise the counter advances and the pose is one of eight walk frames.

/// Frame counter wraps at this value.
pub const FRAME_COUNTER_WRAP: u8 = 8;
pub const WALK_FRAMES: u8 = 8;
pub const CLIMB_FRAMES: u8 = 2;
const TICKS_PER_CLIMB_FRAME: u8 = FRAME_COUNTER_WRAP / CLIMB_FRAMES;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pose {
    Idle(Facing),
    Walk { facing: Facing, frame: u8 },
    Jump(Facing),
    Fall(Facing),
    Climb { frame: u8 },
}

impl Default for Pose {
    fn default() -> Self {
        Pose::Idle(Facing::Right)
    }
}

impl Pose {
    /// Texture name suffix plus whether the texture is mirrored horizontally.
    pub fn texture_key(self) -> (String, bool) {
        match self {
            Pose::Idle(facing) => ("idle".to_string(), facing == Facing::Left),
            Pose::Walk { facing, frame } => (format!("walk{frame}"), facing == Facing::Left),
            Pose::Jump(facing) => ("jump".to_string(), facing == Facing::Left),
            Pose::Fall(facing) => ("fall".to_string(), facing == Facing::Left),
            Pose::Climb { frame } => (format!("climb{frame}"), false),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pose::Idle(_) => "idle",
            Pose::Walk { .. } => "walk",
            Pose::Jump(_) => "jump",
            Pose::Fall(_) => "fall",
            Pose::Climb { .. } => "climb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseInput {
    pub dx: f32,
    pub dy: f32,
    pub on_ladder: bool,
}

/// Persistent selector state carried by the player between frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationSelector {
    pub facing: Facing,
    pub frame_counter: u8,
    pub climbing: bool,
    pub pose: Pose,
}

impl AnimationSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, input: PoseInput) -> Pose {
        *self = select_pose(*self, input);
        self.pose
    }
}

/// Pure transition function of the selector.
pub fn select_pose(state: AnimationSelector, input: PoseInput) -> AnimationSelector {
    let mut facing = state.facing;
    if input.dx < 0.0 && facing == Facing::Right {
        facing = Facing::Left;
    } else if input.dx > 0.0 && facing == Facing::Left {
        facing = Facing::Right;
    }

    let climbing_now = input.on_ladder || state.climbing;
    let climbing_next = input.on_ladder;
    let mut frame_counter = state.frame_counter % FRAME_COUNTER_WRAP;

    let pose = if climbing_now {
        if input.dy.abs() > 1.0 {
            frame_counter = advance(frame_counter);
        }
        Pose::Climb {
            frame: frame_counter / TICKS_PER_CLIMB_FRAME,
        }
    } else if input.dy > 0.0 {
        Pose::Jump(facing)
    } else if input.dy < 0.0 {
        Pose::Fall(facing)
    } else if input.dx == 0.0 {
        Pose::Idle(facing)
    } else {
        frame_counter = advance(frame_counter);
        Pose::Walk {
            facing,
            frame: frame_counter,
        }
    };

    AnimationSelector {
        facing,
        frame_counter,
        climbing: climbing_next,
        pose,
    }
}

fn advance(counter: u8) -> u8 {
    (counter + 1) % FRAME_COUNTER_WRAP
}
