//! Side effects a frame produces for the outer loop (audio, screen changes).
//!
//! The session never talks to audio or windowing directly; it queues events
//! and the app drains them after each update.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Jump,
    Coin,
    Victory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    Sound(SoundCue),
    StartMusic,
    StopMusic,
    LevelComplete { level: u32 },
    LevelLoaded { level: u32 },
    /// The final boundary was reached and the victory pause has ended.
    GameComplete { score: u32 },
    /// Advance was requested after the game completed.
    ShowEndScreen { score: u32 },
}
