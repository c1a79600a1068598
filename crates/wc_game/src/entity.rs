//! Everything that is drawn in the world: the player, coins and level tiles.
//!
//! The set of kinds is closed. Rendering and per-frame animation go through
//! `SpriteEntity` so the mesh builder does not care which kind it is drawing.

use std::collections::HashMap;

use glam::Vec2;
use wc_core::clip::{ClipState, FrameClip};
use wc_core::pose::{AnimationSelector, Pose, PoseInput};

use crate::collision::Aabb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Coin,
    Platform,
    Decoration,
}

/// What the renderer needs to draw one quad.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    /// Texture path; `None` draws a solid quad in `color`.
    pub texture: Option<String>,
    pub color: [f32; 4],
    pub flip_x: bool,
}

pub trait SpriteEntity {
    fn kind(&self) -> EntityKind;
    /// World-space centre.
    fn position(&self) -> Vec2;
    fn size(&self) -> Vec2;
    fn animate(&mut self, dt_us: u64, clips: &HashMap<String, FrameClip>);
    fn appearance(&self) -> Appearance;

    /// Part of the level's wall set.
    fn collidable(&self) -> bool {
        self.kind() == EntityKind::Platform
    }

    fn bounds(&self) -> Aabb {
        let centre = self.position();
        let half = self.size() * 0.5;
        Aabb {
            center_x: centre.x,
            center_y: centre.y,
            half_w: half.x,
            half_h: half.y,
        }
    }
}

/// A named clip plus its playback state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipPlayback {
    pub clip: String,
    pub state: ClipState,
}

impl ClipPlayback {
    pub fn new(clip: impl Into<String>) -> Self {
        Self {
            clip: clip.into(),
            state: ClipState::new(),
        }
    }

    fn tick(&mut self, dt_us: u64, clips: &HashMap<String, FrameClip>) -> Option<String> {
        let clip = clips.get(&self.clip)?;
        self.state.tick(dt_us, clip).map(str::to_string)
    }
}

/// A static level sprite (platform block, background panel, decoration).
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub kind: EntityKind,
    pub left: f32,
    pub bottom: f32,
    pub width: f32,
    pub height: f32,
    pub texture: Option<String>,
    pub color: [f32; 4],
    pub playback: Option<ClipPlayback>,
}

impl SpriteEntity for Tile {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.left + self.width * 0.5, self.bottom + self.height * 0.5)
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    fn animate(&mut self, dt_us: u64, clips: &HashMap<String, FrameClip>) {
        if let Some(playback) = self.playback.as_mut() {
            if let Some(texture) = playback.tick(dt_us, clips) {
                self.texture = Some(texture);
            }
        }
    }

    fn appearance(&self) -> Appearance {
        Appearance {
            texture: self.texture.clone(),
            color: self.color,
            flip_x: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coin {
    pub tile: Tile,
}

impl Coin {
    pub fn new(mut tile: Tile) -> Self {
        tile.kind = EntityKind::Coin;
        Self { tile }
    }
}

impl SpriteEntity for Coin {
    fn kind(&self) -> EntityKind {
        EntityKind::Coin
    }

    fn position(&self) -> Vec2 {
        self.tile.position()
    }

    fn size(&self) -> Vec2 {
        self.tile.size()
    }

    fn animate(&mut self, dt_us: u64, clips: &HashMap<String, FrameClip>) {
        self.tile.animate(dt_us, clips);
    }

    fn appearance(&self) -> Appearance {
        self.tile.appearance()
    }
}

/// Player body plus the per-frame flags physics and animation share.
#[derive(Debug, Clone)]
pub struct Player {
    pub bounds: Aabb,
    pub velocity: Vec2,
    pub selector: AnimationSelector,
    pub on_ladder: bool,
    pub can_jump: bool,
    texture_prefix: String,
}

impl Player {
    pub fn new(centre: Vec2, half_extents: Vec2, texture_prefix: impl Into<String>) -> Self {
        Self {
            bounds: Aabb {
                center_x: centre.x,
                center_y: centre.y,
                half_w: half_extents.x,
                half_h: half_extents.y,
            },
            velocity: Vec2::ZERO,
            selector: AnimationSelector::new(),
            on_ladder: false,
            can_jump: false,
            texture_prefix: texture_prefix.into(),
        }
    }

    /// Moves the player without touching animation state; velocity is zeroed.
    pub fn reposition(&mut self, centre: Vec2) {
        self.bounds.center_x = centre.x;
        self.bounds.center_y = centre.y;
        self.velocity = Vec2::ZERO;
    }

    pub fn pose(&self) -> Pose {
        self.selector.pose
    }

    pub fn texture_path(&self) -> String {
        let (key, _) = self.selector.pose.texture_key();
        format!("{}_{key}.png", self.texture_prefix)
    }
}

impl SpriteEntity for Player {
    fn kind(&self) -> EntityKind {
        EntityKind::Player
    }

    fn position(&self) -> Vec2 {
        Vec2::new(self.bounds.center_x, self.bounds.center_y)
    }

    fn size(&self) -> Vec2 {
        Vec2::new(self.bounds.half_w * 2.0, self.bounds.half_h * 2.0)
    }

    fn animate(&mut self, _dt_us: u64, _clips: &HashMap<String, FrameClip>) {
        self.selector.update(PoseInput {
            dx: self.velocity.x,
            dy: self.velocity.y,
            on_ladder: self.on_ladder,
        });
    }

    fn appearance(&self) -> Appearance {
        let (_, flip_x) = self.selector.pose.texture_key();
        Appearance {
            texture: Some(self.texture_path()),
            color: [1.0, 1.0, 1.0, 1.0],
            flip_x,
        }
    }

    fn bounds(&self) -> Aabb {
        self.bounds
    }
}
