//! Pose producers.
//!
//! A pose source runs independently of the frame loop and hands results to a
//! [`PoseSink`], which post-processes them per [`PoseModelOptions`] and writes
//! them into the shared mailbox. The frame loop never calls into a source except
//! to start it and, for the pointer source, to feed the cursor position.

use glam::Vec2;
use serde::Deserialize;
use wp_core::mailbox::PoseMailbox;
use wp_core::pose::{default_skeleton, Keypoint, KeypointIndex, Pose, SkeletonConnection};
use wp_core::video::VideoSource;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    #[default]
    Lightweight,
    Full,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMode {
    #[default]
    Single,
    Multi,
}

/// Options recognised by pose models. Architecture, scale and stride only tune
/// the model itself; the rest shape what gets delivered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoseModelOptions {
    pub architecture: Architecture,
    pub image_scale: f32,
    pub output_stride: u32,
    pub flip_horizontal: bool,
    pub min_confidence: f32,
    pub max_poses: usize,
    pub detection: DetectionMode,
}

impl Default for PoseModelOptions {
    fn default() -> Self {
        Self {
            architecture: Architecture::Lightweight,
            image_scale: 0.3,
            output_stride: 16,
            flip_horizontal: false,
            min_confidence: 0.1,
            max_poses: 5,
            detection: DetectionMode::Single,
        }
    }
}

impl PoseModelOptions {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.image_scale > 0.0 && self.image_scale <= 1.0) {
            return Err(format!(
                "pose_model.image_scale must be in (0, 1], got {}",
                self.image_scale
            ));
        }
        if ![8, 16, 32].contains(&self.output_stride) {
            return Err(format!(
                "pose_model.output_stride must be 8, 16 or 32, got {}",
                self.output_stride
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(format!(
                "pose_model.min_confidence must be in [0, 1], got {}",
                self.min_confidence
            ));
        }
        if self.max_poses == 0 {
            return Err("pose_model.max_poses must be >= 1".to_string());
        }
        Ok(())
    }

    pub fn pose_limit(&self) -> usize {
        match self.detection {
            DetectionMode::Single => 1,
            DetectionMode::Multi => self.max_poses,
        }
    }

    /// Mirror, drop low-confidence poses, then keep at most `pose_limit()`.
    pub fn apply(&self, poses: Vec<Pose>, frame_width: f32) -> Vec<Pose> {
        poses
            .into_iter()
            .filter(|pose| pose.mean_confidence() >= self.min_confidence)
            .take(self.pose_limit())
            .map(|mut pose| {
                if self.flip_horizontal {
                    pose.mirror_horizontally(frame_width);
                }
                pose
            })
            .collect()
    }
}

/// Write side of the pose mailbox, owned by a running source.
#[derive(Debug, Clone)]
pub struct PoseSink {
    mailbox: PoseMailbox,
    options: PoseModelOptions,
    frame_width: f32,
}

impl PoseSink {
    pub fn new(mailbox: PoseMailbox, options: PoseModelOptions) -> Self {
        Self {
            mailbox,
            options,
            frame_width: 0.0,
        }
    }

    /// Bind the sink to the frame size of the video the source reads from.
    pub fn for_video(mut self, video: &dyn VideoSource) -> Self {
        self.frame_width = video.size().0 as f32;
        self
    }

    pub fn model_loaded(&self) {
        self.mailbox.model_loaded();
    }

    pub fn deliver(&self, poses: Vec<Pose>) {
        self.mailbox
            .publish(self.options.apply(poses, self.frame_width));
    }

    pub fn options(&self) -> &PoseModelOptions {
        &self.options
    }
}

pub trait PoseSource {
    fn name(&self) -> &str;

    /// Begin producing poses. Results arrive in `sink` asynchronously.
    fn start(&mut self, video: &dyn VideoSource, sink: PoseSink) -> Result<(), String>;

    fn skeleton_connections(&self) -> Vec<SkeletonConnection> {
        default_skeleton()
    }

    /// Cursor position in canvas pixels, `None` when outside the canvas.
    /// Only interactive sources care.
    fn update_pointer(&mut self, _position: Option<Vec2>) {}
}

pub(crate) fn log_model_options(source: &str, options: &PoseModelOptions) {
    log::info!(
        "Pose source '{}': {:?} model, scale {}, stride {}, flip {}, {:?} detection (limit {})",
        source,
        options.architecture,
        options.image_scale,
        options.output_stride,
        options.flip_horizontal,
        options.detection,
        options.pose_limit()
    );
}

/// Synthetic player whose left wrist follows the mouse. The body stands at the
/// bottom centre of the frame; the right wrist is reported with zero confidence
/// so only the pointer can pop balls. The "model" is ready as soon as it starts.
#[derive(Default)]
pub struct PointerPoseSource {
    sink: Option<PoseSink>,
    frame_size: Vec2,
    last_position: Option<Vec2>,
}

impl PointerPoseSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pose_at(position: Vec2, frame_size: Vec2) -> Pose {
        let (w, h) = (frame_size.x, frame_size.y);
        let cx = w * 0.5;
        let at = |x: f32, y: f32| Keypoint::new(x, y, 1.0);
        let left_shoulder = Vec2::new(cx - 60.0, h * 0.55);
        let left_elbow = (left_shoulder + position) * 0.5;

        let mut pose = Pose::empty();
        let placements = [
            (KeypointIndex::Nose, at(cx, h * 0.36)),
            (KeypointIndex::LeftEye, at(cx - 10.0, h * 0.34)),
            (KeypointIndex::RightEye, at(cx + 10.0, h * 0.34)),
            (KeypointIndex::LeftEar, at(cx - 20.0, h * 0.35)),
            (KeypointIndex::RightEar, at(cx + 20.0, h * 0.35)),
            (KeypointIndex::LeftShoulder, at(left_shoulder.x, left_shoulder.y)),
            (KeypointIndex::RightShoulder, at(cx + 60.0, h * 0.55)),
            (KeypointIndex::LeftElbow, at(left_elbow.x, left_elbow.y)),
            (KeypointIndex::RightElbow, at(cx + 80.0, h * 0.7)),
            (KeypointIndex::LeftWrist, at(position.x, position.y)),
            (KeypointIndex::RightWrist, Keypoint::new(cx + 90.0, h * 0.82, 0.0)),
            (KeypointIndex::LeftHip, at(cx - 40.0, h * 0.85)),
            (KeypointIndex::RightHip, at(cx + 40.0, h * 0.85)),
            (KeypointIndex::LeftKnee, at(cx - 45.0, h * 0.95)),
            (KeypointIndex::RightKnee, at(cx + 45.0, h * 0.95)),
            (KeypointIndex::LeftAnkle, at(cx - 45.0, h * 1.05)),
            (KeypointIndex::RightAnkle, at(cx + 45.0, h * 1.05)),
        ];
        for (index, keypoint) in placements {
            pose.set_keypoint(index, keypoint);
        }
        pose
    }
}

impl PoseSource for PointerPoseSource {
    fn name(&self) -> &str {
        "pointer"
    }

    fn start(&mut self, video: &dyn VideoSource, sink: PoseSink) -> Result<(), String> {
        log_model_options(self.name(), sink.options());
        let (w, h) = video.size();
        self.frame_size = Vec2::new(w as f32, h as f32);
        let sink = sink.for_video(video);
        sink.model_loaded();
        self.sink = Some(sink);
        Ok(())
    }

    fn update_pointer(&mut self, position: Option<Vec2>) {
        let Some(sink) = &self.sink else {
            return;
        };
        if position == self.last_position {
            return;
        }
        self.last_position = position;
        let frame_size = self.frame_size;
        let poses = position
            .map(|p| Self::pose_at(p, frame_size))
            .into_iter()
            .collect();
        sink.deliver(poses);
    }
}
