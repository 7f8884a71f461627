//! Game configuration file: variant, canvas, rule overrides, pose source and
//! pose model options. Every field has a default, so an empty object is a valid
//! config and a missing file falls back to the defaults.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::pose_source::PoseModelOptions;
use crate::rules::{BallRules, GameMode, SpawnPolicy};
use crate::session::SessionSettings;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub version: String,
    pub mode: GameMode,
    pub canvas: CanvasSize,
    pub rules: RulesOverride,
    pub confidence_threshold: f32,
    pub show_fps: bool,
    pub seed: Option<u64>,
    pub pose_source: PoseSourceConfig,
    pub pose_model: PoseModelOptions,
    pub backdrop: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            mode: GameMode::default(),
            canvas: CanvasSize::default(),
            rules: RulesOverride::default(),
            confidence_threshold: 0.1,
            show_fps: true,
            seed: None,
            pose_source: PoseSourceConfig::default(),
            pose_model: PoseModelOptions::default(),
            backdrop: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PoseSourceConfig {
    Replay {
        path: String,
    },
    #[default]
    Pointer,
}

/// Per-field overrides on top of the selected mode's preset. Cadence overrides
/// only apply to the policy the mode uses, and the cap and touch boost only to a
/// mode that already has them.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RulesOverride {
    pub spawn_every_frames: Option<u64>,
    pub spawn_interval_ms: Option<f64>,
    pub min_balls: Option<usize>,
    pub max_balls: Option<usize>,
    pub initial_balls: Option<usize>,
    pub size_range: Option<(f32, f32)>,
    pub speed_range: Option<(f32, f32)>,
    pub touch_boost: Option<f32>,
}

impl RulesOverride {
    pub fn apply(&self, base: BallRules) -> BallRules {
        let mut rules = base;
        match &mut rules.spawn {
            SpawnPolicy::FrameCadence { every_frames } => {
                if let Some(v) = self.spawn_every_frames {
                    *every_frames = v;
                }
            }
            SpawnPolicy::WallClock { interval_ms } => {
                if let Some(v) = self.spawn_interval_ms {
                    *interval_ms = v;
                }
            }
        }
        if let Some(v) = self.min_balls {
            rules.min_balls = v;
        }
        if let (Some(v), Some(_)) = (self.max_balls, base.max_balls) {
            rules.max_balls = Some(v);
        }
        if let Some(v) = self.initial_balls {
            rules.initial_balls = v;
        }
        if let Some(v) = self.size_range {
            rules.size_range = v;
        }
        if let Some(v) = self.speed_range {
            rules.speed_range = v;
        }
        if let (Some(v), Some(_)) = (self.touch_boost, base.touch_boost) {
            rules.touch_boost = Some(v);
        }
        rules
    }
}

impl GameConfig {
    pub fn ball_rules(&self) -> BallRules {
        self.rules.apply(self.mode.rules())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            mode: self.mode,
            rules: self.ball_rules(),
            confidence_threshold: self.confidence_threshold,
            show_fps: self.show_fps,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Startup loader: a missing or invalid file is logged and replaced by defaults.
pub fn load_config_or_default(path: &Path) -> GameConfig {
    if !path.exists() {
        log::warn!("Config '{}' not found, using defaults.", path.display());
        return GameConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => {
            log::info!("Config loaded: {} ({} mode)", path.display(), config.mode);
            config
        }
        Err(err) => {
            log::error!("{err}. Using defaults.");
            GameConfig::default()
        }
    }
}

/// Upper bound for configured ball counts. Classic mode has no cap of its own.
const MAX_BALL_COUNT: usize = 100;

fn validate_config(config: &GameConfig) -> Result<(), String> {
    let fail = |msg: String| Err(format!("Config validation failed: {msg}"));

    if config.canvas.width <= 40 || config.canvas.height <= 40 {
        return fail(format!(
            "canvas must be larger than 40x40, got {}x{}",
            config.canvas.width, config.canvas.height
        ));
    }
    if !(0.0..=1.0).contains(&config.confidence_threshold) {
        return fail(format!(
            "confidence_threshold must be in [0, 1], got {}",
            config.confidence_threshold
        ));
    }

    let base = config.mode.rules();
    for (name, set, supported) in [
        ("max_balls", config.rules.max_balls.is_some(), base.max_balls.is_some()),
        ("touch_boost", config.rules.touch_boost.is_some(), base.touch_boost.is_some()),
    ] {
        if set && !supported {
            return fail(format!("{name} is not available in {} mode", config.mode));
        }
    }

    let rules = config.ball_rules();
    if let SpawnPolicy::FrameCadence { every_frames: 0 } = rules.spawn {
        return fail("spawn_every_frames must be > 0".to_string());
    }
    if let SpawnPolicy::WallClock { interval_ms } = rules.spawn {
        if interval_ms <= 0.0 {
            return fail("spawn_interval_ms must be > 0".to_string());
        }
    }
    for (name, (lo, hi)) in [("size_range", rules.size_range), ("speed_range", rules.speed_range)] {
        if !(lo > 0.0 && lo <= hi) {
            return fail(format!("{name} must satisfy 0 < min <= max, got ({lo}, {hi})"));
        }
    }
    for (name, count) in [
        ("min_balls", Some(rules.min_balls)),
        ("initial_balls", Some(rules.initial_balls)),
        ("max_balls", rules.max_balls),
    ] {
        if let Some(count) = count.filter(|&c| c > MAX_BALL_COUNT) {
            return fail(format!("{name} must be at most {MAX_BALL_COUNT}, got {count}"));
        }
    }
    if let Some(max) = rules.max_balls {
        if rules.min_balls > max {
            return fail(format!(
                "min_balls ({}) must not exceed max_balls ({max})",
                rules.min_balls
            ));
        }
    }
    if let Some(boost) = rules.touch_boost {
        if boost <= 0.0 {
            return fail(format!("touch_boost must be > 0, got {boost}"));
        }
    }
    if let PoseSourceConfig::Replay { path } = &config.pose_source {
        if path.trim().is_empty() {
            return fail("pose_source.path must not be empty".to_string());
        }
    }
    config
        .pose_model
        .validate()
        .map_err(|e| format!("Config validation failed: {e}"))
}

/// Polls a file's modification time between frames.
pub struct ConfigWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}
