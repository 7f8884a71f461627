//! Point-versus-ball hit testing and the score it feeds.

use glam::Vec2;

use crate::ball::Ball;

/// True when `point` lies strictly inside the footprint of an untouched ball.
pub fn is_hit(point: Vec2, ball: &Ball) -> bool {
    !ball.touched && point.distance(ball.center()) < ball.radius()
}

/// Touch every untouched ball containing `point`. There is no early exit: one
/// wrist inside several overlapping balls scores each of them. Returns the
/// number of new touches, which is the score delta.
pub fn check_collision(point: Vec2, balls: &mut [Ball], touch_boost: Option<f32>) -> u32 {
    let mut hits = 0;
    for ball in balls.iter_mut() {
        if is_hit(point, ball) && ball.touch(touch_boost) {
            hits += 1;
        }
    }
    hits
}

/// Session score. Only ever increases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    value: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, delta: u32) {
        self.value = self.value.saturating_add(delta);
    }

    pub fn value(&self) -> u32 {
        self.value
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score: {}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_at_center_touches_and_scores_one() {
        let mut balls = [Ball::new(100.0, 100.0, 30.0, 2.0)];
        let hits = check_collision(Vec2::new(100.0, 100.0), &mut balls, None);
        assert_eq!(hits, 1);
        assert!(balls[0].touched);
    }

    #[test]
    fn point_outside_radius_misses() {
        let mut balls = [Ball::new(100.0, 100.0, 30.0, 2.0)];
        let hits = check_collision(Vec2::new(120.0, 100.0), &mut balls, None);
        assert_eq!(hits, 0);
        assert!(!balls[0].touched);
    }

    #[test]
    fn point_exactly_on_rim_misses() {
        let ball = Ball::new(0.0, 0.0, 30.0, 1.0);
        assert!(!is_hit(Vec2::new(15.0, 0.0), &ball));
        assert!(is_hit(Vec2::new(14.9, 0.0), &ball));
    }

    #[test]
    fn touched_ball_never_scores_again() {
        let mut balls = [Ball::new(50.0, 50.0, 40.0, 1.0)];
        let mut score = Score::new();
        for _ in 0..5 {
            score.add(check_collision(Vec2::new(50.0, 50.0), &mut balls, None));
        }
        assert_eq!(score.value(), 1);
    }

    #[test]
    fn overlapping_balls_are_all_scored_by_one_point() {
        let mut balls = [
            Ball::new(100.0, 100.0, 40.0, 1.0),
            Ball::new(110.0, 100.0, 40.0, 1.0),
            Ball::new(300.0, 300.0, 40.0, 1.0),
        ];
        let hits = check_collision(Vec2::new(105.0, 100.0), &mut balls, None);
        assert_eq!(hits, 2);
        assert!(balls[0].touched && balls[1].touched);
        assert!(!balls[2].touched);
    }

    #[test]
    fn boosted_ball_uses_new_radius_but_cannot_rescore() {
        let mut balls = [Ball::new(0.0, 0.0, 30.0, 2.0)];
        assert_eq!(check_collision(Vec2::new(10.0, 0.0), &mut balls, Some(1.5)), 1);
        assert_eq!(balls[0].size, 45.0);
        // Inside the amplified radius (22.5) but already touched.
        assert!(!is_hit(Vec2::new(20.0, 0.0), &balls[0]));
        assert_eq!(check_collision(Vec2::new(20.0, 0.0), &mut balls, Some(1.5)), 0);
        assert_eq!(balls[0].size, 45.0);
    }

    #[test]
    fn score_display_and_monotonic_add() {
        let mut score = Score::new();
        score.add(2);
        score.add(0);
        assert_eq!(score.value(), 2);
        assert_eq!(score.to_string(), "Score: 2");
    }
}
