//! Timed frame clips for animated tiles (coins, decorations, background props).
//!
//! Durations are integer microseconds so a clip advanced by the fixed step lands
//! on the same frame on every run.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipFrame {
    pub texture: String,
    pub duration_us: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameClip {
    pub frames: Vec<ClipFrame>,
    pub looping: bool,
}

impl FrameClip {
    /// Builds a clip from `(texture, duration_ms)` pairs.
    pub fn from_millis<'a>(frames: impl IntoIterator<Item = (&'a str, u64)>, looping: bool) -> Self {
        Self {
            frames: frames
                .into_iter()
                .map(|(texture, ms)| ClipFrame {
                    texture: texture.to_string(),
                    duration_us: ms * 1000,
                })
                .collect(),
            looping,
        }
    }

    pub fn cycle_us(&self) -> u64 {
        self.frames.iter().map(|f| f.duration_us).sum()
    }

    pub fn validate(&self, name: &str) -> Result<(), String> {
        if self.frames.is_empty() {
            return Err(format!("clip '{name}' has no frames"));
        }
        for (i, frame) in self.frames.iter().enumerate() {
            if frame.texture.is_empty() {
                return Err(format!("clip '{name}' frame {i} has empty texture"));
            }
            if frame.duration_us == 0 {
                return Err(format!("clip '{name}' frame {i} has zero duration"));
            }
        }
        Ok(())
    }
}

/// Playback position inside one clip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipState {
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl ClipState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current<'a>(&self, clip: &'a FrameClip) -> Option<&'a str> {
        clip.frames
            .get(self.frame_index)
            .or_else(|| clip.frames.last())
            .map(|f| f.texture.as_str())
    }

    pub fn tick<'a>(&mut self, dt_us: u64, clip: &'a FrameClip) -> Option<&'a str> {
        if clip.frames.is_empty() || self.finished {
            return self.current(clip);
        }

        self.elapsed_us += dt_us;
        while self.elapsed_us >= clip.frames[self.frame_index].duration_us {
            self.elapsed_us -= clip.frames[self.frame_index].duration_us;
            self.frame_index += 1;
            if self.frame_index < clip.frames.len() {
                continue;
            }
            if clip.looping {
                self.frame_index = 0;
            } else {
                self.frame_index = clip.frames.len() - 1;
                self.elapsed_us = 0;
                self.finished = true;
                break;
            }
        }

        self.current(clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin_clip(looping: bool) -> FrameClip {
        FrameClip::from_millis([("coin_0.png", 100), ("coin_1.png", 50), ("coin_2.png", 100)], looping)
    }

    #[test]
    fn tick_moves_to_next_frame_after_duration() {
        let clip = coin_clip(true);
        let mut state = ClipState::new();
        assert_eq!(state.tick(0, &clip), Some("coin_0.png"));
        assert_eq!(state.tick(99_000, &clip), Some("coin_0.png"));
        assert_eq!(state.tick(1_000, &clip), Some("coin_1.png"));
        assert_eq!(state.tick(50_000, &clip), Some("coin_2.png"));
    }

    #[test]
    fn looping_clip_wraps() {
        let clip = coin_clip(true);
        let mut state = ClipState::new();
        assert_eq!(state.tick(clip.cycle_us() + 10_000, &clip), Some("coin_0.png"));
        assert!(!state.finished);
    }

    #[test]
    fn one_shot_clip_holds_last_frame() {
        let clip = coin_clip(false);
        let mut state = ClipState::new();
        assert_eq!(state.tick(1_000_000, &clip), Some("coin_2.png"));
        assert!(state.finished);
        assert_eq!(state.tick(16_667, &clip), Some("coin_2.png"));
    }

    #[test]
    fn fixed_step_playback_is_repeatable() {
        let clip = coin_clip(true);
        let mut a = ClipState::new();
        let mut b = ClipState::new();
        for _ in 0..500 {
            assert_eq!(a.tick(16_667, &clip), b.tick(16_667, &clip));
        }
        assert_eq!(a, b);
    }

    #[test]
    fn validate_rejects_zero_duration_and_empty_clips() {
        let empty = FrameClip {
            frames: Vec::new(),
            looping: true,
        };
        assert!(empty.validate("empty").unwrap_err().contains("no frames"));

        let zero = FrameClip::from_millis([("a.png", 0)], true);
        assert!(zero.validate("zero").unwrap_err().contains("zero duration"));

        assert!(coin_clip(true).validate("coin").is_ok());
    }
}
