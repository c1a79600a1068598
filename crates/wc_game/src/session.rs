//! One play-through: the level being played, the player, and the per-frame
//! pipeline that ties input, physics, animation, parallax, coins and camera
//! together.
//!
//! Frame order (`update`):
//!
//!   1. Level controller checks the boundary; past it the world freezes.
//!   2. Physics integrates the player against the merged wall grid.
//!   3. Ground and ladder contact are refreshed and velocity recomputed.
//!   4. Background layers scroll by the camera delta.
//!   5. Player pose and tile clips advance.
//!   6. Touched coins are collected.
//!   7. The camera moves toward the player.
//!
//! Key events are applied immediately between frames.

use std::rc::Rc;

use glam::Vec2;
use wc_core::input::{GroundContact, InputState, Key};
use wc_overlay::{Anchor, TextItem};
use wc_render::Camera2D;

use crate::collision::CollisionMoveResult;
use crate::config::GameConfig;
use crate::controller::{LevelController, LevelStep};
use crate::entity::{Player, SpriteEntity};
use crate::events::{FrameEvent, SoundCue};
use crate::level::{LevelScene, LevelSource};
use crate::parallax::ParallaxScroller;
use crate::physics::{PhysicsAdapter, GROUND_PROBE};

pub const HUD_FONT: &str = "American Typewriter";

pub struct GameSession {
    config: GameConfig,
    source: Rc<dyn LevelSource>,
    input: InputState,
    controller: LevelController,
    scene: LevelScene,
    physics: PhysicsAdapter,
    parallax: ParallaxScroller,
    player: Player,
    camera: Camera2D,
    events: Vec<FrameEvent>,
    last_move: Option<CollisionMoveResult>,
    load_error: Option<String>,
    finished: bool,
}

impl GameSession {
    /// Loads level 1 and places the player at the start point. Score starts at 0.
    pub fn start(config: &GameConfig, source: Rc<dyn LevelSource>) -> Result<Self, String> {
        let scene = source.load(1)?;
        let player = Player::new(
            Vec2::from(config.player_start),
            Vec2::from(config.player_half_extents),
            config.player_texture_prefix.clone(),
        );
        let mut controller = LevelController::new(
            config.max_level,
            config.coin_points,
            config.victory_pause_secs,
        );
        controller.finish_transition(1, scene.config.end_of_map);

        let camera = Camera2D::new(config.window.width, config.window.height);
        let physics = PhysicsAdapter::for_scene(&scene, config.gravity);
        let parallax = ParallaxScroller::for_scene(&scene, 0.0);

        let mut session = Self {
            config: config.clone(),
            source,
            input: InputState::new(),
            controller,
            scene,
            physics,
            parallax,
            player,
            camera,
            events: vec![FrameEvent::StartMusic, FrameEvent::LevelLoaded { level: 1 }],
            last_move: None,
            load_error: None,
            finished: false,
        };
        session.reset_view();
        Ok(session)
    }

    pub fn key_down(&mut self, key: Key) {
        if !self.input.key_down(key) {
            return;
        }
        if key == Key::Space && self.controller.request_advance() {
            log::debug!("Advance requested on level {}", self.controller.level());
        }
        self.recompute_velocity();
    }

    pub fn key_up(&mut self, key: Key) {
        if !self.input.key_up(key) {
            return;
        }
        self.recompute_velocity();
    }

    /// Advances one frame of `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let step = self
            .controller
            .update(self.player.bounds.right(), dt, &mut self.events);
        match step {
            LevelStep::Continue => self.advance_frame(dt),
            LevelStep::Hold => {}
            LevelStep::LoadLevel(level) => self.transition_to(level),
            LevelStep::ShowEndScreen => {
                self.finished = true;
                self.events.push(FrameEvent::ShowEndScreen {
                    score: self.controller.score(),
                });
            }
        }
    }

    pub fn drain_events(&mut self) -> Vec<FrameEvent> {
        std::mem::take(&mut self.events)
    }

    /// The end-of-game screen has been requested.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Set when a level failed to load mid-game; the session cannot continue.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn scene(&self) -> &LevelScene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn controller(&self) -> &LevelController {
        &self.controller
    }

    pub fn parallax(&self) -> &ParallaxScroller {
        &self.parallax
    }

    /// Wall contacts from the most recent physics step.
    pub fn last_move(&self) -> Option<&CollisionMoveResult> {
        self.last_move.as_ref()
    }

    #[cfg(test)]
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Score and level-over prompts in view coordinates (origin bottom-left).
    pub fn hud_text(&self) -> Vec<TextItem> {
        let color = self.scene.config.hud_color;
        let width = self.config.window.width as f32;
        let height = self.config.window.height as f32;
        let mut items = vec![TextItem::new(format!("Score: {}", self.controller.score()), 10.0, 10.0)
            .color(color)
            .size(18.0)
            .font(HUD_FONT)];

        if self.controller.is_level_over() {
            if self.controller.is_last_level() {
                items.push(
                    TextItem::new(
                        format!("Well done! Your score was: {}", self.controller.score()),
                        width / 2.0,
                        3.0 * height / 4.0,
                    )
                    .color(color)
                    .size(30.0)
                    .font(HUD_FONT)
                    .anchor(Anchor::BottomCenter),
                );
            }
            items.push(
                TextItem::new("Press <space> to continue", width / 2.0, height / 2.0)
                    .color(color)
                    .size(30.0)
                    .font(HUD_FONT)
                    .anchor(Anchor::BottomCenter),
            );
        }
        items
    }

    /// Level text moved into view coordinates for the current camera.
    pub fn world_text_in_view(&self) -> Vec<TextItem> {
        let corner = self.camera.bottom_left();
        self.scene
            .world_text()
            .into_iter()
            .map(|mut item| {
                item.x -= corner.x;
                item.y -= corner.y;
                item
            })
            .collect()
    }

    fn advance_frame(&mut self, dt: f32) {
        self.last_move = Some(self.physics.update(&mut self.player));

        let bounds = self.player.bounds;
        let grounded = self.physics.can_jump(bounds, GROUND_PROBE);
        self.player.can_jump = grounded;
        self.player.on_ladder = self.physics.is_on_ladder(bounds) && !grounded;
        self.recompute_velocity();

        self.parallax
            .scroll(self.camera.bottom_left().x, &mut self.scene);

        let dt_us = (dt as f64 * 1_000_000.0).round() as u64;
        self.player.animate(dt_us, &self.scene.clips);
        self.scene.animate(dt_us);

        let hits = self.scene.collect_coins(&self.player.bounds());
        if hits > 0 {
            self.controller.collect_coins(hits, &mut self.events);
            log::debug!("Collected {hits} coin(s), score {}", self.controller.score());
        }

        let goal = self.camera.follow_corner(self.player.position());
        self.camera.move_to(goal, self.config.camera_follow_speed);
        self.camera.update();
    }

    fn recompute_velocity(&mut self) {
        if !self.controller.accepts_movement() {
            return;
        }
        let bounds = self.player.bounds;
        let contact = GroundContact {
            on_ladder: self.physics.is_on_ladder(bounds),
            can_jump: self.physics.can_jump(bounds, self.config.jump_tolerance),
        };
        let intent = self.input.recompute_velocity(contact, self.config.movement());
        self.player.velocity.x = intent.dx;
        if let Some(dy) = intent.dy {
            self.player.velocity.y = dy;
        }
        if intent.jumped {
            self.events.push(FrameEvent::Sound(SoundCue::Jump));
        }
    }

    fn transition_to(&mut self, level: u32) {
        match self.source.load(level) {
            Ok(scene) => {
                let end_of_map = scene.config.end_of_map;
                self.physics = PhysicsAdapter::for_scene(&scene, self.config.gravity);
                self.scene = scene;
                self.player.reposition(Vec2::from(self.config.reentry_point));
                self.last_move = None;
                self.controller.finish_transition(level, end_of_map);
                self.reset_view();
                self.events.push(FrameEvent::LevelLoaded { level });
                log::info!("Entered level {level} with score {}", self.controller.score());
            }
            Err(err) => {
                log::error!("Level {level} failed to load: {err}");
                self.load_error = Some(err);
            }
        }
    }

    /// Snaps the camera onto the player and restarts parallax from there.
    fn reset_view(&mut self) {
        let corner = self.camera.follow_corner(self.player.position());
        self.camera.snap_bottom_left(corner);
        self.parallax = ParallaxScroller::for_scene(&self.scene, corner.x);
    }
}
