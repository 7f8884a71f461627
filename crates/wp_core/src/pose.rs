//! Pose data model shared by pose sources and the game.
//!
//! Keypoints are in canvas pixels with a confidence in `[0, 1]`. A pose is the
//! fixed-order keypoint list of one tracked person; indices follow the 17-point
//! MoveNet/COCO schema (see [`KeypointIndex`]).

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    /// Keypoints that can pop balls.
    pub const WRISTS: [KeypointIndex; 2] = [KeypointIndex::LeftWrist, KeypointIndex::RightWrist];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_wrist(index: usize) -> bool {
        Self::WRISTS.iter().any(|w| w.index() == index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Strictly above the threshold; a keypoint exactly at the threshold is
    /// treated as insufficient evidence.
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// A full-length pose with every keypoint at the origin and zero confidence.
    pub fn empty() -> Self {
        Self {
            keypoints: vec![Keypoint::default(); KeypointIndex::COUNT],
        }
    }

    pub fn keypoint(&self, index: KeypointIndex) -> Option<&Keypoint> {
        self.keypoints.get(index.index())
    }

    pub fn set_keypoint(&mut self, index: KeypointIndex, keypoint: Keypoint) {
        if let Some(slot) = self.keypoints.get_mut(index.index()) {
            *slot = keypoint;
        }
    }

    pub fn mean_confidence(&self) -> f32 {
        if self.keypoints.is_empty() {
            return 0.0;
        }
        self.keypoints.iter().map(|k| k.confidence).sum::<f32>() / self.keypoints.len() as f32
    }

    /// Both endpoints of a skeleton edge, or `None` when either index is out of
    /// range for this pose.
    pub fn endpoints(&self, connection: SkeletonConnection) -> Option<(&Keypoint, &Keypoint)> {
        let a = self.keypoints.get(connection.a)?;
        let b = self.keypoints.get(connection.b)?;
        Some((a, b))
    }

    /// Mirror every keypoint about the vertical centre line of a frame.
    pub fn mirror_horizontally(&mut self, frame_width: f32) {
        for keypoint in &mut self.keypoints {
            keypoint.x = frame_width - keypoint.x;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkeletonConnection {
    pub a: usize,
    pub b: usize,
}

impl SkeletonConnection {
    pub const fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }
}

/// Edges of the 17-point body skeleton.
pub const DEFAULT_SKELETON: [SkeletonConnection; 16] = [
    SkeletonConnection::new(0, 1),
    SkeletonConnection::new(0, 2),
    SkeletonConnection::new(1, 3),
    SkeletonConnection::new(2, 4),
    SkeletonConnection::new(5, 6),
    SkeletonConnection::new(5, 7),
    SkeletonConnection::new(5, 11),
    SkeletonConnection::new(6, 8),
    SkeletonConnection::new(6, 12),
    SkeletonConnection::new(7, 9),
    SkeletonConnection::new(8, 10),
    SkeletonConnection::new(11, 12),
    SkeletonConnection::new(11, 13),
    SkeletonConnection::new(12, 14),
    SkeletonConnection::new(13, 15),
    SkeletonConnection::new(14, 16),
];

pub fn default_skeleton() -> Vec<SkeletonConnection> {
    DEFAULT_SKELETON.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrists_are_nine_and_ten() {
        assert_eq!(KeypointIndex::LeftWrist.index(), 9);
        assert_eq!(KeypointIndex::RightWrist.index(), 10);
        assert!(KeypointIndex::is_wrist(9));
        assert!(KeypointIndex::is_wrist(10));
        assert!(!KeypointIndex::is_wrist(0));
        assert!(!KeypointIndex::is_wrist(11));
    }

    #[test]
    fn confidence_threshold_is_strict() {
        let k = Keypoint::new(0.0, 0.0, 0.1);
        assert!(!k.is_confident(0.1));
        assert!(Keypoint::new(0.0, 0.0, 0.11).is_confident(0.1));
    }

    #[test]
    fn endpoints_skip_out_of_range_indices() {
        let pose = Pose::new(vec![Keypoint::default(); 5]);
        assert!(pose.endpoints(SkeletonConnection::new(0, 4)).is_some());
        assert!(pose.endpoints(SkeletonConnection::new(4, 5)).is_none());
        assert!(pose.endpoints(SkeletonConnection::new(16, 0)).is_none());
    }

    #[test]
    fn default_skeleton_fits_full_pose() {
        let pose = Pose::empty();
        for connection in DEFAULT_SKELETON {
            assert!(pose.endpoints(connection).is_some(), "{connection:?}");
        }
    }

    #[test]
    fn mirror_flips_about_frame_centre() {
        let mut pose = Pose::new(vec![Keypoint::new(100.0, 50.0, 1.0)]);
        pose.mirror_horizontally(640.0);
        assert_eq!(pose.keypoints[0].x, 540.0);
        assert_eq!(pose.keypoints[0].y, 50.0);
    }

    #[test]
    fn mean_confidence_of_empty_pose_is_zero() {
        assert_eq!(Pose::new(Vec::new()).mean_confidence(), 0.0);
        let pose = Pose::new(vec![Keypoint::new(0.0, 0.0, 0.2), Keypoint::new(0.0, 0.0, 0.6)]);
        assert!((pose.mean_confidence() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn set_keypoint_ignores_short_pose() {
        let mut pose = Pose::new(vec![Keypoint::default(); 3]);
        pose.set_keypoint(KeypointIndex::LeftWrist, Keypoint::new(1.0, 1.0, 1.0));
        assert_eq!(pose.keypoints.len(), 3);
        assert!(pose.keypoint(KeypointIndex::LeftWrist).is_none());
    }

    #[test]
    fn keypoint_confidence_defaults_when_missing_in_json() {
        let k: Keypoint = serde_json::from_str(r#"{"x": 3.0, "y": 4.0}"#).expect("parse keypoint");
        assert_eq!(k, Keypoint::new(3.0, 4.0, 0.0));
    }
}
