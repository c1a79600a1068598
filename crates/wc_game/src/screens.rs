//! Top-level screens and the fades between them.
//!
//! Start -> Game -> Victory -> Credits -> Start. The three non-game screens fade
//! in from black when shown; space starts a fade to black and the next screen is
//! created once it is fully opaque. Starting from the Start screen always
//! builds a fresh session with score 0. A level that fails to load mid-game
//! ends the session and returns to the Start screen.

use std::rc::Rc;

use glam::Vec2;
use wc_core::input::Key;
use wc_overlay::{Anchor, TextItem};

use crate::config::GameConfig;
use crate::events::FrameEvent;
use crate::level::LevelSource;
use crate::session::{GameSession, HUD_FONT};

const BLACK: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Start,
    Game,
    Victory,
    Credits,
}

/// Fade-in alpha counts down from 255; fade-out counts up from 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    fade_in: Option<f32>,
    fade_out: Option<f32>,
    rate: f32,
}

impl Fade {
    pub fn new(rate: f32) -> Self {
        Self {
            fade_in: Some(255.0),
            fade_out: None,
            rate,
        }
    }

    /// Starts the fade to black unless one is already running.
    pub fn start_fade_out(&mut self) -> bool {
        if self.fade_out.is_some() {
            return false;
        }
        self.fade_out = Some(0.0);
        true
    }

    /// One frame of fading. Returns true once the fade-out has passed opaque.
    pub fn update(&mut self) -> bool {
        let mut done = false;
        if let Some(alpha) = self.fade_out.as_mut() {
            *alpha += self.rate;
            done = *alpha > 255.0;
        }
        if let Some(alpha) = self.fade_in {
            let next = alpha - self.rate;
            self.fade_in = (next > 0.0).then_some(next);
        }
        done
    }

    /// Alpha of the black overlay, if any.
    pub fn overlay_alpha(&self) -> Option<u8> {
        let strongest = match (self.fade_in, self.fade_out) {
            (Some(a), Some(b)) => a.max(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => return None,
        };
        Some(strongest.clamp(0.0, 255.0) as u8)
    }
}

/// A picture placed on a static screen, centred at `center` (view units).
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenImage {
    pub texture: String,
    pub center: Vec2,
    pub size: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenLayout {
    pub background: [u8; 3],
    pub images: Vec<ScreenImage>,
    pub text: Vec<TextItem>,
}

fn image(texture: &str, center: (f32, f32), size: (f32, f32)) -> ScreenImage {
    ScreenImage {
        texture: texture.to_string(),
        center: Vec2::new(center.0, center.1),
        size: Vec2::new(size.0, size.1),
    }
}

fn label(text: &str, x: f32, y: f32, size: f32) -> TextItem {
    TextItem::new(text, x, y)
        .color(BLACK)
        .size(size)
        .font(HUD_FONT)
        .anchor(Anchor::TopCenter)
}

pub fn start_layout(w: f32, h: f32) -> ScreenLayout {
    ScreenLayout {
        background: [255, 255, 255],
        images: vec![
            image("assets/textures/screens/bottle_background.png", (w / 2.0, 10.0 * h / 18.0), (1000.0, 650.0)),
            image("assets/textures/screens/door.png", (550.0, 210.0), (50.0, 50.0)),
            image("assets/textures/screens/erlenmeyer_flask.png", (550.0, 270.0), (50.0, 50.0)),
        ],
        text: vec![
            label(
                "Welcome to WhyChem, a world where you can explore chemistry!",
                w / 2.0,
                39.0 * h / 72.0,
                30.0,
            )
            .wrap(w * 13.0 / 16.0),
            label("Collect", w * 5.0 / 16.0, h * 25.0 / 64.0, 20.0),
            label("Advance Using", w * 5.0 / 16.0, h * 39.0 / 128.0, 20.0),
            label("Press <space>\nto continue", w / 2.0, h / 8.0, 30.0),
        ],
    }
}

pub fn victory_layout(w: f32, h: f32) -> ScreenLayout {
    ScreenLayout {
        background: [255, 255, 255],
        images: vec![image(
            "assets/textures/screens/end_screen.png",
            (w / 2.0, 11.0 * h / 18.0),
            (1000.0, 650.0),
        )],
        text: vec![
            label("With chemistry\nyou can...", w * 49.0 / 64.0, h * 12.0 / 16.0, 30.0),
            label("travel to new places", w * 11.0 / 16.0, h * 8.0 / 16.0, 24.0)
                .wrap(w / 4.0)
                .rotated(4.0),
            label("learn new things", w * 20.0 / 32.0, h * 7.0 / 32.0, 24.0)
                .wrap(w / 4.0)
                .rotated(-20.0),
            label("create a better world around you", w * 47.0 / 64.0, h * 6.0 / 16.0, 24.0)
                .wrap(w * 3.0 / 8.0)
                .rotated(20.0),
            label("Press <space> to continue", w / 2.0, h / 18.0, 24.0),
        ],
    }
}

pub fn credits_layout(w: f32, h: f32) -> ScreenLayout {
    ScreenLayout {
        background: [255, 255, 255],
        images: vec![
            image("assets/textures/screens/rust_logo.png", (w * 13.0 / 16.0, h * 8.0 / 10.0), (200.0, 200.0)),
            image("assets/textures/screens/wgpu_logo.png", (w * 5.0 / 16.0, h * 8.0 / 10.0), (600.0, 200.0)),
        ],
        text: vec![label(
            "Thanks for playing!\n\nThis game was written in the Rust programming language, \
             and drawn with wgpu and egui.\n\nPress <space> to restart game",
            w / 2.0,
            h * 5.0 / 8.0,
            30.0,
        )
        .wrap(w * 3.0 / 4.0)],
    }
}

pub enum Screen {
    Start(Fade),
    Game(Box<GameSession>),
    Victory(Fade),
    Credits(Fade),
}

pub struct ScreenFlow {
    screen: Screen,
    config: GameConfig,
    levels: Rc<dyn LevelSource>,
}

impl ScreenFlow {
    pub fn new(config: &GameConfig, levels: Rc<dyn LevelSource>) -> Self {
        Self {
            screen: Screen::Start(Fade::new(config.fade_rate)),
            config: config.clone(),
            levels,
        }
    }

    pub fn kind(&self) -> ScreenKind {
        match self.screen {
            Screen::Start(_) => ScreenKind::Start,
            Screen::Game(_) => ScreenKind::Game,
            Screen::Victory(_) => ScreenKind::Victory,
            Screen::Credits(_) => ScreenKind::Credits,
        }
    }

    pub fn session(&self) -> Option<&GameSession> {
        match &self.screen {
            Screen::Game(session) => Some(&**session),
            _ => None,
        }
    }

    pub fn layout(&self) -> Option<ScreenLayout> {
        let w = self.config.window.width as f32;
        let h = self.config.window.height as f32;
        match self.screen {
            Screen::Start(_) => Some(start_layout(w, h)),
            Screen::Victory(_) => Some(victory_layout(w, h)),
            Screen::Credits(_) => Some(credits_layout(w, h)),
            Screen::Game(_) => None,
        }
    }

    pub fn fade_alpha(&self) -> Option<u8> {
        match &self.screen {
            Screen::Start(fade) | Screen::Victory(fade) | Screen::Credits(fade) => fade.overlay_alpha(),
            Screen::Game(_) => None,
        }
    }

    pub fn key_down(&mut self, key: Key) {
        match &mut self.screen {
            Screen::Game(session) => session.key_down(key),
            Screen::Start(fade) | Screen::Victory(fade) | Screen::Credits(fade) => {
                if key == Key::Space {
                    fade.start_fade_out();
                }
            }
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if let Screen::Game(session) = &mut self.screen {
            session.key_up(key);
        }
    }

    /// Advances the current screen one frame and returns what the game queued.
    pub fn update(&mut self, dt: f32) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        let next = match &mut self.screen {
            Screen::Start(fade) => fade.update().then_some(ScreenKind::Game),
            Screen::Victory(fade) => fade.update().then_some(ScreenKind::Credits),
            Screen::Credits(fade) => fade.update().then_some(ScreenKind::Start),
            Screen::Game(session) => {
                session.update(dt);
                events = session.drain_events();
                if let Some(err) = session.load_error() {
                    log::error!("Abandoning game: {err}");
                    events.push(FrameEvent::StopMusic);
                    Some(ScreenKind::Start)
                } else {
                    session.is_finished().then_some(ScreenKind::Victory)
                }
            }
        };
        if let Some(kind) = next {
            self.show(kind);
            if let Screen::Game(session) = &mut self.screen {
                events.extend(session.drain_events());
            }
        }
        events
    }

    fn show(&mut self, kind: ScreenKind) {
        let rate = self.config.fade_rate;
        self.screen = match kind {
            ScreenKind::Start => Screen::Start(Fade::new(rate)),
            ScreenKind::Victory => Screen::Victory(Fade::new(rate)),
            ScreenKind::Credits => Screen::Credits(Fade::new(rate)),
            ScreenKind::Game => match GameSession::start(&self.config, Rc::clone(&self.levels)) {
                Ok(session) => Screen::Game(Box::new(session)),
                Err(err) => {
                    log::error!("Could not start a new game: {err}");
                    Screen::Start(Fade::new(rate))
                }
            },
        };
        log::info!("Screen: {:?}", self.kind());
    }
}
