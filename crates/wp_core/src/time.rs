//! Frame pacing for a display-driven game loop.
//!
//! The game runs one update + render per frame at a fixed target rate. Unlike a
//! fixed-step accumulator, a frame is never split into multiple simulation steps:
//! ball motion is expressed in pixels per frame, so the pacer's only jobs are to
//! decide when the next frame is due and to keep smoothed diagnostics.

use std::time::{Duration, Instant};

const FPS_SAMPLE_COUNT: usize = 60;

pub struct TimeState {
    pub target_dt: f64,
    pub max_frame_dt: f64,
    pub total_time: f64,
    pub frame_count: u64,
    pub real_dt: f64,
    last_instant: Instant,
    next_deadline: Instant,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new(target_fps: f64) -> Self {
        let target_dt = 1.0 / target_fps.max(1.0);
        let now = Instant::now();
        Self {
            target_dt,
            max_frame_dt: 0.25,
            total_time: 0.0,
            frame_count: 0,
            real_dt: 0.0,
            last_instant: now,
            next_deadline: now,
            fps_samples: [target_dt; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 1.0 / target_dt,
            smoothed_frame_time_ms: target_dt * 1000.0,
        }
    }

    /// True once the next frame deadline has passed.
    pub fn frame_due(&self, now: Instant) -> bool {
        now >= self.next_deadline
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_deadline
    }

    pub fn begin_frame(&mut self) {
        self.begin_frame_at(Instant::now());
    }

    pub fn begin_frame_at(&mut self, now: Instant) {
        self.real_dt = now.saturating_duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;

        if self.real_dt > self.max_frame_dt {
            log::warn!(
                "Frame took {:.1}ms, clamping to {}ms",
                self.real_dt * 1000.0,
                self.max_frame_dt * 1000.0
            );
            self.real_dt = self.max_frame_dt;
        }

        self.total_time += self.real_dt;
        self.frame_count += 1;

        // Schedule from the previous deadline to avoid drift, but never schedule
        // into the past after a stall.
        let step = Duration::from_secs_f64(self.target_dt);
        self.next_deadline += step;
        if self.next_deadline < now {
            self.next_deadline = now + step;
        }

        self.fps_samples[self.fps_sample_index] = self.real_dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    /// Milliseconds of session time, used by wall-clock spawn policies.
    pub fn total_time_ms(&self) -> f64 {
        self.total_time * 1000.0
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new(30.0)
    }
}
