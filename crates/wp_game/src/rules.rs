/// Which of the two game variants a session plays.
///
/// The variant is fixed per session: it selects one spawn policy and decides
/// whether touched balls get the one-time boost. The variants are never mixed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Fixed frame cadence, touched balls keep their size and speed.
    #[default]
    Classic,
    /// Wall-clock cadence with a ball cap, spawn jitter, drift and touch boost.
    Enhanced,
}

impl GameMode {
    pub const ALL: &'static [GameMode] = &[GameMode::Classic, GameMode::Enhanced];

    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "Classic",
            Self::Enhanced => "Enhanced",
        }
    }

    pub fn rules(self) -> BallRules {
        match self {
            Self::Classic => BallRules {
                spawn: SpawnPolicy::FrameCadence { every_frames: 60 },
                min_balls: 3,
                max_balls: None,
                initial_balls: 5,
                edge_margin: 20.0,
                size_range: (30.0, 50.0),
                speed_range: (1.0, 4.0),
                spawn_y_range: (-20.0, -20.0),
                drift: 0.0,
                touch_boost: None,
            },
            Self::Enhanced => BallRules {
                spawn: SpawnPolicy::WallClock { interval_ms: 2000.0 },
                min_balls: 3,
                max_balls: Some(15),
                initial_balls: 5,
                edge_margin: 20.0,
                size_range: (30.0, 50.0),
                speed_range: (1.0, 4.0),
                spawn_y_range: (-60.0, -20.0),
                drift: 0.5,
                touch_boost: Some(1.5),
            },
        }
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnPolicy {
    /// One ball whenever the session frame counter is a multiple of `every_frames`.
    FrameCadence { every_frames: u64 },
    /// One ball once more than `interval_ms` of session time passed since the
    /// last spawn.
    WallClock { interval_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallRules {
    pub spawn: SpawnPolicy,
    /// Live count is topped up to this floor on every update.
    pub min_balls: usize,
    pub max_balls: Option<usize>,
    pub initial_balls: usize,
    /// Spawn `x` stays this far from the left and right edges.
    pub edge_margin: f32,
    pub size_range: (f32, f32),
    pub speed_range: (f32, f32),
    pub spawn_y_range: (f32, f32),
    /// Maximum horizontal jitter per step; zero disables drift.
    pub drift: f32,
    /// Size and speed multiplier applied once on touch.
    pub touch_boost: Option<f32>,
}

impl BallRules {
    pub fn cap(&self) -> usize {
        self.max_balls.unwrap_or(usize::MAX)
    }
}

impl Default for BallRules {
    fn default() -> Self {
        GameMode::default().rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_classic() {
        assert_eq!(GameMode::default(), GameMode::Classic);
        assert_eq!(BallRules::default(), GameMode::Classic.rules());
    }

    #[test]
    fn classic_uses_frame_cadence_without_boost() {
        let rules = GameMode::Classic.rules();
        assert_eq!(rules.spawn, SpawnPolicy::FrameCadence { every_frames: 60 });
        assert!(rules.touch_boost.is_none());
        assert_eq!(rules.cap(), usize::MAX);
        assert_eq!(rules.spawn_y_range, (-20.0, -20.0));
    }

    #[test]
    fn enhanced_uses_wall_clock_with_cap_and_boost() {
        let rules = GameMode::Enhanced.rules();
        assert_eq!(rules.spawn, SpawnPolicy::WallClock { interval_ms: 2000.0 });
        assert_eq!(rules.cap(), 15);
        assert_eq!(rules.touch_boost, Some(1.5));
        assert!(rules.spawn_y_range.1 < 0.0);
    }

    #[test]
    fn display_matches_label() {
        for &mode in GameMode::ALL {
            assert_eq!(format!("{}", mode), mode.label());
        }
    }

    #[test]
    fn mode_deserializes_lowercase() {
        let mode: GameMode = serde_json::from_str("\"enhanced\"").expect("parse mode");
        assert_eq!(mode, GameMode::Enhanced);
    }
}
