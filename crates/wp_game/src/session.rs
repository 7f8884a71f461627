//! The frame controller: one owned session state threaded through every frame.
//!
//! A frame reads the pose mailbox once, then draws in a fixed order so tracked
//! body parts are painted over the balls:
//! background, balls, skeleton + keypoints (or the loading panel), score, FPS.

use std::sync::Arc;

use glam::Vec2;
use wp_core::draw::{DrawSurface, Rgba, TextAlign};
use wp_core::mailbox::MailboxRead;
use wp_core::pose::{KeypointIndex, Pose, SkeletonConnection};
use wp_core::video::VideoFrame;

use crate::ball::{BallField, SimClock};
use crate::collision::{check_collision, Score};
use crate::random::RandomSource;
use crate::rules::{BallRules, GameMode};

const BACKDROP_FADE: Rgba = Rgba::rgb(12, 14, 24).with_alpha(200);
const SKELETON_COLOR: Rgba = Rgba::RED;
const SKELETON_WIDTH: f32 = 2.0;
const KEYPOINT_COLOR: Rgba = Rgba::GREEN;
const KEYPOINT_DIAMETER: f32 = 10.0;
const UNTOUCHED_COLOR: Rgba = Rgba::DARK_BLUE;
const TOUCHED_COLOR: Rgba = Rgba::DARK_RED;
const SCORE_POS: Vec2 = Vec2::new(20.0, 20.0);
const SCORE_TEXT_SIZE: f32 = 32.0;
const SCORE_PANEL_MIN: Vec2 = Vec2::new(10.0, 12.0);
const SCORE_PANEL_SIZE: Vec2 = Vec2::new(190.0, 48.0);
/// Rough advance of one proportional glyph, as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.6;
const PANEL_COLOR: Rgba = Rgba::BLACK.with_alpha(140);
const LOADING_TEXT: &str = "Loading model...";
const LOADING_PANEL_SIZE: Vec2 = Vec2::new(280.0, 64.0);
const FPS_TEXT_SIZE: f32 = 16.0;
const FPS_MARGIN: f32 = 10.0;

/// Pose model readiness. The only transition is `NotReady -> Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelState {
    #[default]
    NotReady,
    Ready,
}

impl ModelState {
    pub fn is_ready(self) -> bool {
        self == ModelState::Ready
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelState::NotReady => "loading",
            ModelState::Ready => "ready",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub mode: GameMode,
    pub rules: BallRules,
    pub confidence_threshold: f32,
    pub show_fps: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            rules: GameMode::default().rules(),
            confidence_threshold: 0.1,
            show_fps: true,
        }
    }
}

/// Per-frame inputs that come from the application loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Canvas size in pixels.
    pub canvas: Vec2,
    /// Wall-clock time since the previous frame.
    pub dt_ms: f64,
    pub fps: f32,
}

impl FrameContext {
    pub fn new(width: f32, height: f32, dt_ms: f64, fps: f32) -> Self {
        Self {
            canvas: Vec2::new(width, height),
            dt_ms,
            fps,
        }
    }
}

/// What one frame did, for the debug overlay and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    pub loading: bool,
    pub fresh_poses: bool,
    pub pose_count: usize,
    pub collision_checks: u32,
    pub hits: u32,
    pub spawned: usize,
    pub culled: usize,
    pub advanced: bool,
}

pub struct GameSession<R: RandomSource = fastrand::Rng> {
    settings: SessionSettings,
    balls: BallField,
    score: Score,
    model: ModelState,
    poses: Arc<[Pose]>,
    pose_generation: u64,
    stale_frames: u32,
    connections: Vec<SkeletonConnection>,
    rng: R,
    frame_count: u64,
    elapsed_ms: f64,
    canvas_width: f32,
    paused: bool,
    step_requested: bool,
}

impl<R: RandomSource> GameSession<R> {
    pub fn new(
        settings: SessionSettings,
        connections: Vec<SkeletonConnection>,
        canvas_width: f32,
        rng: R,
    ) -> Self {
        let mut session = Self {
            settings,
            balls: BallField::new(),
            score: Score::new(),
            model: ModelState::NotReady,
            poses: Arc::from(Vec::new()),
            pose_generation: 0,
            stale_frames: 0,
            connections,
            rng,
            frame_count: 0,
            elapsed_ms: 0.0,
            canvas_width,
            paused: false,
            step_requested: false,
        };
        session.seed_balls();
        log::info!(
            "Session started: {} mode, {} balls",
            session.settings.mode,
            session.balls.len()
        );
        session
    }

    /// Fresh score, balls and clock. Model readiness and the last poses survive,
    /// since the pose source keeps running.
    pub fn restart(&mut self) {
        self.score = Score::new();
        self.frame_count = 0;
        self.elapsed_ms = 0.0;
        self.paused = false;
        self.step_requested = false;
        self.seed_balls();
        log::info!(
            "Session restarted: {} mode, {} balls",
            self.settings.mode,
            self.balls.len()
        );
    }

    /// Same-mode rule changes take effect from the next update and keep the
    /// live balls. A mode change starts a fresh session under the new mode.
    pub fn apply_settings(&mut self, settings: SessionSettings) {
        let previous = self.settings.mode;
        self.settings = settings;
        if previous != self.settings.mode {
            log::info!("Game mode changed: {} -> {}", previous, self.settings.mode);
            self.restart();
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            log::info!("Session {}", if paused { "paused" } else { "resumed" });
        }
        self.paused = paused;
        self.step_requested = false;
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    /// Advance exactly one frame while paused. Ignored when running.
    pub fn request_step(&mut self) {
        if self.paused {
            self.step_requested = true;
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn balls(&self) -> &BallField {
        &self.balls
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn model_state(&self) -> ModelState {
        self.model
    }

    /// Frames since the last fresh pose delivery.
    pub fn stale_frames(&self) -> u32 {
        self.stale_frames
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn run_frame(
        &mut self,
        ctx: &FrameContext,
        mailbox: &MailboxRead,
        video: Option<&VideoFrame>,
        surface: &mut impl DrawSurface,
    ) -> FrameReport {
        let mut report = FrameReport {
            fresh_poses: self.ingest(mailbox),
            pose_count: self.poses.len(),
            ..Default::default()
        };
        let advancing = !self.paused || std::mem::take(&mut self.step_requested);

        match video {
            Some(frame) => surface.draw_video(frame, Vec2::ZERO, ctx.canvas),
            None => surface.fade(BACKDROP_FADE),
        }

        if advancing {
            self.frame_count += 1;
            self.elapsed_ms += ctx.dt_ms;
            let clock = SimClock {
                frame: self.frame_count,
                now_ms: self.elapsed_ms,
            };
            let stats = self
                .balls
                .update(&self.settings.rules, ctx.canvas, clock, &mut self.rng);
            report.spawned = stats.spawned;
            report.culled = stats.culled;
            report.advanced = true;
        }
        for ball in self.balls.balls() {
            let color = if ball.touched {
                TOUCHED_COLOR
            } else {
                UNTOUCHED_COLOR
            };
            surface.fill_circle(ball.center(), ball.size, color);
        }

        if self.model.is_ready() {
            self.draw_poses(advancing, surface, &mut report);
        } else {
            report.loading = true;
            draw_loading(ctx.canvas, surface);
        }

        let score_text = self.score.to_string();
        surface.fill_rounded_rect(
            SCORE_PANEL_MIN,
            score_panel_size(&score_text),
            8.0,
            PANEL_COLOR,
        );
        surface.text(
            &score_text,
            SCORE_POS,
            SCORE_TEXT_SIZE,
            TextAlign::LeftTop,
            Rgba::WHITE,
        );
        if self.settings.show_fps {
            surface.text(
                &format!("FPS: {}", ctx.fps.round() as i32),
                Vec2::new(ctx.canvas.x - FPS_MARGIN, FPS_MARGIN),
                FPS_TEXT_SIZE,
                TextAlign::RightTop,
                Rgba::WHITE,
            );
        }

        report
    }

    fn seed_balls(&mut self) {
        self.balls
            .seed(&self.settings.rules, self.canvas_width, self.elapsed_ms, &mut self.rng);
    }

    /// Take the latest mailbox snapshot. Returns true when it is a new delivery.
    fn ingest(&mut self, mailbox: &MailboxRead) -> bool {
        if mailbox.ready && !self.model.is_ready() {
            self.model = ModelState::Ready;
            log::info!("Tracking started");
        }
        if mailbox.generation != self.pose_generation {
            self.pose_generation = mailbox.generation;
            self.poses = Arc::clone(&mailbox.poses);
            self.stale_frames = 0;
            true
        } else {
            self.stale_frames = self.stale_frames.saturating_add(1);
            false
        }
    }

    fn draw_poses(
        &mut self,
        advancing: bool,
        surface: &mut impl DrawSurface,
        report: &mut FrameReport,
    ) {
        let threshold = self.settings.confidence_threshold;
        let touch_boost = self.settings.rules.touch_boost;
        let poses = Arc::clone(&self.poses);

        for pose in poses.iter() {
            for connection in &self.connections {
                let Some((a, b)) = pose.endpoints(*connection) else {
                    continue;
                };
                if a.is_confident(threshold) && b.is_confident(threshold) {
                    surface.line(a.position(), b.position(), SKELETON_WIDTH, SKELETON_COLOR);
                }
            }

            for (index, keypoint) in pose.keypoints.iter().enumerate() {
                if !keypoint.is_confident(threshold) {
                    continue;
                }
                surface.fill_circle(keypoint.position(), KEYPOINT_DIAMETER, KEYPOINT_COLOR);
                if advancing && KeypointIndex::is_wrist(index) {
                    report.collision_checks += 1;
                    let hits =
                        check_collision(keypoint.position(), self.balls.balls_mut(), touch_boost);
                    if hits > 0 {
                        self.score.add(hits);
                        report.hits += hits;
                        log::debug!("Wrist {index} popped {hits} ball(s), {}", self.score);
                    }
                }
            }
        }
    }
}

/// The panel grows with the score so long scores stay inside it.
fn score_panel_size(text: &str) -> Vec2 {
    let padding = 2.0 * (SCORE_POS.x - SCORE_PANEL_MIN.x);
    let text_width = text.chars().count() as f32 * SCORE_TEXT_SIZE * GLYPH_WIDTH;
    Vec2::new(
        SCORE_PANEL_SIZE.x.max(text_width + padding),
        SCORE_PANEL_SIZE.y,
    )
}

fn draw_loading(canvas: Vec2, surface: &mut impl DrawSurface) {
    let center = canvas * 0.5;
    surface.fill_rounded_rect(
        center - LOADING_PANEL_SIZE * 0.5,
        LOADING_PANEL_SIZE,
        10.0,
        PANEL_COLOR,
    );
    surface.text(
        LOADING_TEXT,
        center,
        SCORE_TEXT_SIZE,
        TextAlign::CenterCenter,
        Rgba::WHITE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ball::Ball;
    use crate::random::ScriptedRandom;
    use wp_core::draw::{DrawCommand, DrawList};
    use wp_core::mailbox::PoseMailbox;
    use wp_core::pose::{default_skeleton, Keypoint};

    const W: f32 = 640.0;
    const H: f32 = 480.0;

    fn ctx() -> FrameContext {
        FrameContext::new(W, H, 33.0, 30.0)
    }

    /// No spawning or culling noise: floor 0, cadence never due in a short test.
    fn quiet_settings() -> SessionSettings {
        let mut rules = GameMode::Classic.rules();
        rules.min_balls = 0;
        rules.initial_balls = 0;
        rules.spawn = crate::rules::SpawnPolicy::FrameCadence {
            every_frames: 10_000,
        };
        SessionSettings {
            rules,
            show_fps: false,
            ..SessionSettings::default()
        }
    }

    fn session(settings: SessionSettings) -> GameSession<ScriptedRandom> {
        GameSession::new(settings, default_skeleton(), W, ScriptedRandom::midpoint())
    }

    fn wrist_pose(x: f32, y: f32) -> Pose {
        let mut pose = Pose::empty();
        pose.set_keypoint(KeypointIndex::LeftWrist, Keypoint::new(x, y, 0.9));
        pose
    }

    fn pose_with_wrists(left: Vec2, right: Vec2) -> Pose {
        let mut pose = Pose::empty();
        pose.set_keypoint(KeypointIndex::LeftWrist, Keypoint::new(left.x, left.y, 0.9));
        pose.set_keypoint(KeypointIndex::RightWrist, Keypoint::new(right.x, right.y, 0.9));
        pose
    }

    fn ready_mailbox(poses: Vec<Pose>) -> PoseMailbox {
        let mailbox = PoseMailbox::new();
        mailbox.publish(poses);
        mailbox
    }

    fn kind(cmd: &DrawCommand) -> &'static str {
        match cmd {
            DrawCommand::Fade { .. } => "fade",
            DrawCommand::Video { .. } => "video",
            DrawCommand::Line { .. } => "line",
            DrawCommand::Circle { .. } => "circle",
            DrawCommand::RoundedRect { .. } => "rect",
            DrawCommand::Text { .. } => "text",
        }
    }

    #[test]
    fn new_session_seeds_initial_balls() {
        let s = session(SessionSettings::default());
        assert_eq!(s.balls().len(), 5);
        assert_eq!(s.score().value(), 0);
        assert_eq!(s.model_state(), ModelState::NotReady);
    }

    #[test]
    fn not_ready_frame_draws_loading_and_checks_nothing() {
        let mut s = session(SessionSettings::default());
        let mut list = DrawList::new();
        let report = s.run_frame(&ctx(), &PoseMailbox::new().read(), None, &mut list);

        assert!(report.loading);
        assert_eq!(report.collision_checks, 0);
        assert!(list.texts().any(|t| t == "Loading model..."));
        assert!(!list
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Line { .. })));
    }

    #[test]
    fn frame_draws_in_fixed_order() {
        let mut s = session(quiet_settings());
        s.balls.push(Ball::new(300.0, 300.0, 40.0, 1.0));
        let mailbox = ready_mailbox(vec![wrist_pose(50.0, 50.0)]);
        let video = VideoFrame::solid(4, 4, [0, 0, 0, 255], 1);
        let mut list = DrawList::new();
        s.run_frame(&ctx(), &mailbox.read(), Some(&video), &mut list);

        let kinds: Vec<_> = list.commands().iter().map(kind).collect();
        assert_eq!(kinds, vec!["video", "circle", "circle", "rect", "text"]);
        // Ball first (dark blue), then the keypoint (green).
        match (&list.commands()[1], &list.commands()[2]) {
            (DrawCommand::Circle { color: a, .. }, DrawCommand::Circle { color: b, .. }) => {
                assert_eq!(*a, Rgba::DARK_BLUE);
                assert_eq!(*b, Rgba::GREEN);
            }
            other => panic!("unexpected commands {other:?}"),
        }
        assert_eq!(list.texts().last(), Some("Score: 0"));
    }

    #[test]
    fn missing_video_fades_background() {
        let mut s = session(quiet_settings());
        let mut list = DrawList::new();
        s.run_frame(&ctx(), &PoseMailbox::new().read(), None, &mut list);
        assert!(matches!(list.commands()[0], DrawCommand::Fade { .. }));
    }

    #[test]
    fn wrist_scores_each_ball_once() {
        let mut s = session(quiet_settings());
        // Lands at y = 100 after the frame's advance.
        s.balls.push(Ball::new(100.0, 99.0, 30.0, 1.0));
        let mailbox = ready_mailbox(vec![wrist_pose(100.0, 100.0)]);
        let mut list = DrawList::new();

        let first = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert_eq!(first.collision_checks, 1);
        assert_eq!(first.hits, 1);
        assert_eq!(s.score().value(), 1);
        assert!(s.balls().balls()[0].touched);

        list.clear();
        let second = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert_eq!(second.hits, 0);
        assert_eq!(s.score().value(), 1);
        assert!(list.texts().any(|t| t == "Score: 1"));
    }

    #[test]
    fn stale_poses_are_reused() {
        let mut s = session(quiet_settings());
        let mailbox = ready_mailbox(vec![wrist_pose(10.0, 10.0)]);
        let mut list = DrawList::new();

        let first = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert!(first.fresh_poses);
        let second = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert!(!second.fresh_poses);
        assert_eq!(second.pose_count, 1);
        assert_eq!(second.collision_checks, 1);
        assert_eq!(s.stale_frames(), 1);
    }

    #[test]
    fn model_state_never_reverts() {
        let mut s = session(quiet_settings());
        let mut list = DrawList::new();
        s.run_frame(&ctx(), &ready_mailbox(Vec::new()).read(), None, &mut list);
        assert_eq!(s.model_state(), ModelState::Ready);

        // A reader that still reports not-ready does not undo the transition.
        let report = s.run_frame(&ctx(), &PoseMailbox::new().read(), None, &mut list);
        assert!(!report.loading);
        assert_eq!(s.model_state(), ModelState::Ready);
    }

    #[test]
    fn low_confidence_keypoints_are_skipped() {
        let mut s = session(quiet_settings());
        s.balls.push(Ball::new(100.0, 99.0, 30.0, 1.0));
        let mut pose = Pose::empty();
        // Exactly at the threshold is not enough.
        pose.set_keypoint(KeypointIndex::LeftWrist, Keypoint::new(100.0, 100.0, 0.1));
        let mailbox = ready_mailbox(vec![pose]);
        let mut list = DrawList::new();

        let report = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert_eq!(report.collision_checks, 0);
        assert_eq!(s.score().value(), 0);
    }

    #[test]
    fn skeleton_needs_both_endpoints_and_skips_bad_indices() {
        let mut s = GameSession::new(
            quiet_settings(),
            vec![
                SkeletonConnection::new(0, 1),
                SkeletonConnection::new(0, 2),
                SkeletonConnection::new(0, 99),
            ],
            W,
            ScriptedRandom::midpoint(),
        );
        let mut pose = Pose::empty();
        pose.set_keypoint(KeypointIndex::Nose, Keypoint::new(10.0, 10.0, 0.9));
        pose.set_keypoint(KeypointIndex::LeftEye, Keypoint::new(20.0, 10.0, 0.9));
        pose.set_keypoint(KeypointIndex::RightEye, Keypoint::new(0.0, 10.0, 0.05));
        let mailbox = ready_mailbox(vec![pose]);
        let mut list = DrawList::new();
        s.run_frame(&ctx(), &mailbox.read(), None, &mut list);

        let lines: Vec<_> = list
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { a, b, width, color } => Some((*a, *b, *width, *color)),
                _ => None,
            })
            .collect();
        assert_eq!(
            lines,
            vec![(Vec2::new(10.0, 10.0), Vec2::new(20.0, 10.0), 2.0, Rgba::RED)]
        );
    }

    #[test]
    fn paused_frame_renders_without_simulating() {
        let mut s = session(quiet_settings());
        s.balls.push(Ball::new(100.0, 99.0, 30.0, 1.0));
        let mailbox = ready_mailbox(vec![wrist_pose(100.0, 100.0)]);
        let mut list = DrawList::new();
        s.set_paused(true);

        let report = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert!(!report.advanced);
        assert_eq!(report.collision_checks, 0);
        assert_eq!(s.balls().balls()[0].y, 99.0);
        assert_eq!(s.frame_count(), 0);
        assert!(list
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Circle { color, .. } if *color == Rgba::GREEN)));

        s.request_step();
        let stepped = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert!(stepped.advanced);
        assert_eq!(stepped.hits, 1);
        assert_eq!(s.frame_count(), 1);

        let after = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert!(!after.advanced);
    }

    #[test]
    fn restart_resets_score_and_balls_but_keeps_model() {
        let mut s = session(SessionSettings::default());
        s.balls.push(Ball::new(100.0, 99.0, 30.0, 1.0));
        let mailbox = ready_mailbox(vec![wrist_pose(100.0, 100.0)]);
        let mut list = DrawList::new();
        s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert!(s.score().value() >= 1);

        s.restart();
        assert_eq!(s.score().value(), 0);
        assert_eq!(s.balls().len(), 5);
        assert_eq!(s.frame_count(), 0);
        assert_eq!(s.model_state(), ModelState::Ready);
    }

    #[test]
    fn classic_session_spawns_on_frame_sixty() {
        let mut settings = SessionSettings::default();
        settings.rules.min_balls = 0;
        settings.rules.initial_balls = 0;
        let mut s = session(settings);
        let mailbox = PoseMailbox::new();
        let mut list = DrawList::new();

        let mut spawned_at = Vec::new();
        for _ in 0..120 {
            let report = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
            if report.spawned > 0 {
                spawned_at.push(s.frame_count());
            }
        }
        assert_eq!(spawned_at, vec![60, 120]);
    }

    #[test]
    fn enhanced_touch_boost_applies_through_the_frame() {
        let mut settings = quiet_settings();
        settings.mode = GameMode::Enhanced;
        settings.rules.touch_boost = Some(1.5);
        settings.rules.drift = 0.0;
        let mut s = session(settings);
        s.balls.push(Ball::new(100.0, 98.0, 30.0, 2.0));
        let mailbox = ready_mailbox(vec![wrist_pose(100.0, 100.0)]);
        let mut list = DrawList::new();
        s.run_frame(&ctx(), &mailbox.read(), None, &mut list);

        let ball = s.balls().balls()[0];
        assert!(ball.touched);
        assert_eq!(ball.size, 45.0);
        assert_eq!(ball.speed, 3.0);
    }

    #[test]
    fn fps_text_is_top_right_when_enabled() {
        let mut settings = quiet_settings();
        settings.show_fps = true;
        let mut s = session(settings);
        let mut list = DrawList::new();
        let ctx = FrameContext::new(W, H, 33.0, 29.6);
        s.run_frame(&ctx, &PoseMailbox::new().read(), None, &mut list);

        match list.commands().last() {
            Some(DrawCommand::Text { text, align, pos, .. }) => {
                assert_eq!(text, "FPS: 30");
                assert_eq!(*align, TextAlign::RightTop);
                assert_eq!(pos.x, W - 10.0);
            }
            other => panic!("expected fps text, got {other:?}"),
        }
    }

    #[test]
    fn both_wrists_check_collisions() {
        let mut s = session(quiet_settings());
        s.balls.push(Ball::new(100.0, 99.0, 30.0, 1.0));
        s.balls.push(Ball::new(400.0, 299.0, 30.0, 1.0));
        let pose = pose_with_wrists(Vec2::new(100.0, 100.0), Vec2::new(400.0, 300.0));
        let mailbox = ready_mailbox(vec![pose]);
        let mut list = DrawList::new();

        let report = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert_eq!(report.collision_checks, 2);
        assert_eq!(report.hits, 2);
        assert_eq!(s.score().value(), 2);
    }

    #[test]
    fn right_wrist_alone_scores() {
        let mut s = session(quiet_settings());
        s.balls.push(Ball::new(400.0, 299.0, 30.0, 1.0));
        let mut pose = Pose::empty();
        pose.set_keypoint(KeypointIndex::RightWrist, Keypoint::new(400.0, 300.0, 0.9));
        let mailbox = ready_mailbox(vec![pose]);
        let mut list = DrawList::new();

        let report = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert_eq!(report.collision_checks, 1);
        assert_eq!(s.score().value(), 1);
    }

    #[test]
    fn each_pose_gets_its_own_wrist_checks() {
        let mut s = session(quiet_settings());
        s.balls.push(Ball::new(100.0, 99.0, 30.0, 1.0));
        let first = pose_with_wrists(Vec2::new(100.0, 100.0), Vec2::new(200.0, 200.0));
        // Second body reaches the same ball; it was already popped by the first.
        let second = pose_with_wrists(Vec2::new(100.0, 100.0), Vec2::new(500.0, 400.0));
        let mailbox = ready_mailbox(vec![first, second]);
        let mut list = DrawList::new();

        let report = s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert_eq!(report.pose_count, 2);
        assert_eq!(report.collision_checks, 4);
        assert_eq!(report.hits, 1);
        assert_eq!(s.score().value(), 1);
    }

    #[test]
    fn mode_change_restarts_session_within_cap() {
        let mut classic = SessionSettings::default();
        classic.rules.initial_balls = 20;
        let mut s = session(classic);
        s.balls.push(Ball::new(100.0, 99.0, 30.0, 1.0));
        let mailbox = ready_mailbox(vec![wrist_pose(100.0, 100.0)]);
        let mut list = DrawList::new();
        s.run_frame(&ctx(), &mailbox.read(), None, &mut list);
        assert_eq!(s.balls().len(), 21);
        assert!(s.score().value() >= 1);

        let enhanced = SessionSettings {
            mode: GameMode::Enhanced,
            rules: GameMode::Enhanced.rules(),
            ..SessionSettings::default()
        };
        s.apply_settings(enhanced);
        assert_eq!(s.score().value(), 0);
        assert_eq!(s.frame_count(), 0);
        assert_eq!(s.balls().len(), 5);

        let quiet = PoseMailbox::new();
        for _ in 0..30 {
            s.run_frame(&ctx(), &quiet.read(), None, &mut list);
            assert!(s.balls().len() <= 15);
        }
    }

    #[test]
    fn same_mode_reload_keeps_live_balls() {
        let mut s = session(SessionSettings::default());
        let mut settings = SessionSettings::default();
        settings.show_fps = false;
        s.apply_settings(settings);
        assert_eq!(s.balls().len(), 5);
        assert!(!s.settings().show_fps);
    }

    #[test]
    fn score_panel_grows_with_long_scores() {
        assert_eq!(score_panel_size("Score: 0"), SCORE_PANEL_SIZE);

        let mut s = session(quiet_settings());
        s.score.add(12_345);
        let mut list = DrawList::new();
        s.run_frame(&ctx(), &PoseMailbox::new().read(), None, &mut list);

        let panel = list.commands().iter().find_map(|c| match c {
            DrawCommand::RoundedRect { min, size, .. } if *min == SCORE_PANEL_MIN => Some(*size),
            _ => None,
        });
        let size = panel.expect("score panel drawn");
        let text_width = "Score: 12345".len() as f32 * SCORE_TEXT_SIZE * GLYPH_WIDTH;
        assert!(size.x >= text_width + (SCORE_POS.x - SCORE_PANEL_MIN.x));
        assert!(size.x > SCORE_PANEL_SIZE.x);
    }
}
