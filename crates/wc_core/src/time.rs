//! Fixed-step frame clock.
//!
//! The game advances in whole frames of `fixed_dt` (1/60 s): velocities are in
//! pixels per frame, so every simulation step is exactly one frame. Real time
//! feeds an accumulator that is drained one step at a time; a long stall is
//! capped so the loop never tries to catch up on more than `max_catch_up`.

use std::time::Instant;

const FPS_WINDOW: usize = 60;

pub struct FrameClock {
    pub fixed_dt: f64,
    pub max_catch_up: f64,
    accumulator: f64,
    last_instant: Instant,
    pub real_dt: f64,
    pub steps_this_frame: u32,
    pub total_steps: u64,
    pub frame_count: u64,
    frame_times: [f64; FPS_WINDOW],
    frame_time_cursor: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_step(1.0 / 60.0)
    }

    pub fn with_step(fixed_dt: f64) -> Self {
        Self {
            fixed_dt,
            max_catch_up: 0.25,
            accumulator: 0.0,
            last_instant: Instant::now(),
            real_dt: 0.0,
            steps_this_frame: 0,
            total_steps: 0,
            frame_count: 0,
            frame_times: [fixed_dt; FPS_WINDOW],
            frame_time_cursor: 0,
            smoothed_fps: 1.0 / fixed_dt,
            smoothed_frame_time_ms: fixed_dt * 1000.0,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.feed(elapsed);
    }

    /// Adds `elapsed` seconds of real time. Split out of `begin_frame` so tests
    /// can drive the clock without sleeping.
    pub fn feed(&mut self, elapsed: f64) {
        self.real_dt = if elapsed > self.max_catch_up {
            log::warn!(
                "Frame took {:.1}ms, capping catch-up at {:.0}ms",
                elapsed * 1000.0,
                self.max_catch_up * 1000.0
            );
            self.max_catch_up
        } else {
            elapsed
        };

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        self.frame_times[self.frame_time_cursor] = self.real_dt;
        self.frame_time_cursor = (self.frame_time_cursor + 1) % FPS_WINDOW;
        let avg = self.frame_times.iter().sum::<f64>() / FPS_WINDOW as f64;
        self.smoothed_frame_time_ms = avg * 1000.0;
        self.smoothed_fps = if avg > 0.0 { 1.0 / avg } else { 0.0 };
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator < self.fixed_dt {
            return false;
        }
        self.accumulator -= self.fixed_dt;
        self.steps_this_frame += 1;
        self.total_steps += 1;
        true
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
