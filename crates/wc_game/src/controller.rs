//! Level progression: boundary detection, the advance latch, coin scoring and
//! the final victory pause.
//!
//! ```text
//! Playing --right edge >= end_of_map--> LevelCompleteWaiting   (level < max)
//!                                   \-> VictoryPause --timer--> GameComplete
//! LevelCompleteWaiting --advance--> Transitioning --finish_transition--> Playing
//! GameComplete --advance--> ShowEndScreen
//! ```
//!
//! `level_over` latches on entering `LevelCompleteWaiting`/`GameComplete` and is
//! only cleared by `finish_transition`, so lingering past the boundary never
//! re-triggers the transition or its sounds.

use crate::events::{FrameEvent, SoundCue};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelState {
    Playing,
    LevelCompleteWaiting,
    Transitioning,
    VictoryPause { remaining: f32 },
    GameComplete,
}

impl LevelState {
    pub fn label(&self) -> &'static str {
        match self {
            LevelState::Playing => "playing",
            LevelState::LevelCompleteWaiting => "level complete",
            LevelState::Transitioning => "transitioning",
            LevelState::VictoryPause { .. } => "victory pause",
            LevelState::GameComplete => "game complete",
        }
    }
}

/// Per-level bookkeeping; replaced wholesale when a level loads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelContext {
    pub level: u32,
    pub end_of_map: f32,
    pub score: u32,
    pub level_over: bool,
    pub advance_requested: bool,
}

/// What the session should do with the rest of this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStep {
    /// Run physics, animation, coins and camera.
    Continue,
    /// Freeze the world this frame.
    Hold,
    LoadLevel(u32),
    ShowEndScreen,
}

#[derive(Debug, Clone)]
pub struct LevelController {
    state: LevelState,
    ctx: LevelContext,
    max_level: u32,
    coin_points: u32,
    victory_pause_secs: f32,
}

impl LevelController {
    pub fn new(max_level: u32, coin_points: u32, victory_pause_secs: f32) -> Self {
        Self {
            state: LevelState::Playing,
            ctx: LevelContext {
                level: 1,
                end_of_map: f32::INFINITY,
                score: 0,
                level_over: false,
                advance_requested: false,
            },
            max_level: max_level.max(1),
            coin_points,
            victory_pause_secs,
        }
    }

    pub fn state(&self) -> LevelState {
        self.state
    }

    pub fn level(&self) -> u32 {
        self.ctx.level
    }

    pub fn score(&self) -> u32 {
        self.ctx.score
    }

    pub fn is_level_over(&self) -> bool {
        self.ctx.level_over
    }

    pub fn is_last_level(&self) -> bool {
        self.ctx.level >= self.max_level
    }

    /// Input may only steer the player while the level is being played.
    pub fn accepts_movement(&self) -> bool {
        self.state == LevelState::Playing
    }

    /// Installs `level` and returns to `Playing`; the score carries over.
    pub fn finish_transition(&mut self, level: u32, end_of_map: f32) {
        self.ctx = LevelContext {
            level,
            end_of_map,
            score: self.ctx.score,
            level_over: false,
            advance_requested: false,
        };
        self.state = LevelState::Playing;
    }

    /// Space while the level is over. Returns whether the request was taken.
    pub fn request_advance(&mut self) -> bool {
        if !self.ctx.level_over {
            return false;
        }
        self.ctx.advance_requested = true;
        true
    }

    /// Scores `hits` freshly collected coins and queues one cue per coin.
    pub fn collect_coins(&mut self, hits: usize, events: &mut Vec<FrameEvent>) -> u32 {
        let gained = self.coin_points * hits as u32;
        self.ctx.score += gained;
        events.extend(std::iter::repeat(FrameEvent::Sound(SoundCue::Coin)).take(hits));
        gained
    }

    pub fn update(&mut self, player_right: f32, dt: f32, events: &mut Vec<FrameEvent>) -> LevelStep {
        match self.state {
            LevelState::Playing => {
                if player_right < self.ctx.end_of_map {
                    return LevelStep::Continue;
                }
                if self.is_last_level() {
                    log::info!("Final level {} cleared, score {}", self.ctx.level, self.ctx.score);
                    events.push(FrameEvent::Sound(SoundCue::Victory));
                    self.state = LevelState::VictoryPause {
                        remaining: self.victory_pause_secs,
                    };
                } else {
                    log::info!("Level {} complete, waiting for advance", self.ctx.level);
                    self.ctx.level_over = true;
                    self.state = LevelState::LevelCompleteWaiting;
                    events.push(FrameEvent::LevelComplete { level: self.ctx.level });
                }
                LevelStep::Hold
            }
            LevelState::LevelCompleteWaiting => {
                if self.ctx.advance_requested {
                    self.state = LevelState::Transitioning;
                    LevelStep::LoadLevel(self.ctx.level + 1)
                } else {
                    LevelStep::Hold
                }
            }
            // Only `finish_transition` leaves this state; a failed load is not retried.
            LevelState::Transitioning => LevelStep::Hold,
            LevelState::VictoryPause { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.state = LevelState::VictoryPause { remaining };
                } else {
                    self.state = LevelState::GameComplete;
                    self.ctx.level_over = true;
                    events.push(FrameEvent::StopMusic);
                    events.push(FrameEvent::GameComplete { score: self.ctx.score });
                }
                LevelStep::Hold
            }
            LevelState::GameComplete => {
                if self.ctx.advance_requested {
                    self.ctx.advance_requested = false;
                    LevelStep::ShowEndScreen
                } else {
                    LevelStep::Hold
                }
            }
        }
    }
}
