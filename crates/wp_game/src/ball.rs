//! Falling-ball simulation: spawn, advance, cull.
//!
//! All positions are canvas pixels, origin top-left, y growing downward. Motion
//! is per frame, not per second, so the simulation is exactly reproducible for a
//! given frame sequence and random source.

use glam::Vec2;

use crate::random::RandomSource;
use crate::rules::{BallRules, SpawnPolicy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    /// Diameter in pixels.
    pub size: f32,
    /// Pixels per frame.
    pub speed: f32,
    pub touched: bool,
}

impl Ball {
    pub fn new(x: f32, y: f32, size: f32, speed: f32) -> Self {
        Self {
            x,
            y,
            size,
            speed,
            touched: false,
        }
    }

    pub fn spawn(rules: &BallRules, canvas_width: f32, rng: &mut impl RandomSource) -> Self {
        let margin = rules.edge_margin;
        let x = if canvas_width > margin * 2.0 {
            rng.range(margin, canvas_width - margin)
        } else {
            canvas_width * 0.5
        };
        let y = rng.range(rules.spawn_y_range.0, rules.spawn_y_range.1);
        let size = rng.range(rules.size_range.0, rules.size_range.1);
        let speed = rng.range(rules.speed_range.0, rules.speed_range.1);
        Self::new(x, y, size, speed)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn radius(&self) -> f32 {
        self.size * 0.5
    }

    pub fn is_off_screen(&self, canvas_height: f32) -> bool {
        self.y >= canvas_height + self.size
    }

    /// Mark the ball touched. Returns true only on the first touch; the boost
    /// (if any) is applied exactly once with it.
    pub fn touch(&mut self, boost: Option<f32>) -> bool {
        if self.touched {
            return false;
        }
        self.touched = true;
        if let Some(factor) = boost {
            self.size *= factor;
            self.speed *= factor;
        }
        true
    }

    pub fn advance(&mut self, drift: f32, rng: &mut impl RandomSource) {
        self.y += self.speed;
        if drift > 0.0 {
            self.x += rng.range(-drift, drift);
        }
    }
}

/// Session clock as seen by the spawn policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimClock {
    /// 1-based count of simulated frames.
    pub frame: u64,
    /// Simulated milliseconds since the session started.
    pub now_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateStats {
    pub culled: usize,
    pub spawned: usize,
}

#[derive(Debug, Clone, Default)]
pub struct BallField {
    balls: Vec<Ball>,
    last_spawn_ms: f64,
}

impl BallField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start-of-session population.
    pub fn seed(
        &mut self,
        rules: &BallRules,
        canvas_width: f32,
        now_ms: f64,
        rng: &mut impl RandomSource,
    ) {
        self.balls.clear();
        let count = rules.initial_balls.min(rules.cap());
        for _ in 0..count {
            self.balls.push(Ball::spawn(rules, canvas_width, rng));
        }
        self.last_spawn_ms = now_ms;
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn balls_mut(&mut self) -> &mut [Ball] {
        &mut self.balls
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    #[cfg(test)]
    pub fn push(&mut self, ball: Ball) {
        self.balls.push(ball);
    }

    /// One simulation step: cull balls below the canvas, spawn per policy,
    /// then advance every surviving ball.
    pub fn update(
        &mut self,
        rules: &BallRules,
        canvas: Vec2,
        clock: SimClock,
        rng: &mut impl RandomSource,
    ) -> UpdateStats {
        let before = self.balls.len();
        self.balls.retain(|ball| !ball.is_off_screen(canvas.y));
        let culled = before - self.balls.len();

        let cap = rules.cap();
        let floor = rules.min_balls.min(cap);
        let mut spawned = 0;
        while self.balls.len() < floor {
            self.balls.push(Ball::spawn(rules, canvas.x, rng));
            spawned += 1;
        }

        let cadence_due = match rules.spawn {
            SpawnPolicy::FrameCadence { every_frames } => {
                every_frames > 0 && clock.frame % every_frames == 0
            }
            SpawnPolicy::WallClock { interval_ms } => {
                clock.now_ms - self.last_spawn_ms > interval_ms
            }
        };
        if cadence_due && spawned == 0 && self.balls.len() < cap {
            self.balls.push(Ball::spawn(rules, canvas.x, rng));
            spawned += 1;
        }
        if spawned > 0 {
            self.last_spawn_ms = clock.now_ms;
            log::debug!("Spawned {spawned} ball(s), {} live", self.balls.len());
        }
        if culled > 0 {
            log::debug!("Culled {culled} ball(s) below the canvas");
        }

        for ball in &mut self.balls {
            ball.advance(rules.drift, rng);
        }

        UpdateStats { culled, spawned }
    }
}
