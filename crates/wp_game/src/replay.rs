//! Recorded pose sessions played back as if a model were producing them.
//!
//! A recording is JSON: a model load delay, a delivery interval and a list of
//! frames, each a list of poses with an optional repeat count. Playback runs on a
//! background thread and writes through the same [`PoseSink`] a live model
//! would, so the game sees identical asynchronous behaviour.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use wp_core::pose::{default_skeleton, Pose, SkeletonConnection};
use wp_core::video::VideoSource;

use crate::pose_source::{log_model_options, PoseSink, PoseSource};

const STOP_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Deserialize, Clone)]
pub struct PoseRecording {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub load_delay_ms: u64,
    #[serde(default)]
    pub looping: bool,
    /// Overrides the default body skeleton when present.
    #[serde(default)]
    pub skeleton: Option<Vec<SkeletonConnection>>,
    pub frames: Vec<RecordedFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecordedFrame {
    #[serde(default)]
    pub poses: Vec<Pose>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl PoseRecording {
    pub fn expanded_frames(&self) -> Vec<Vec<Pose>> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(frame.poses.clone());
            }
        }
        out
    }
}

pub fn load_recording_from_path(path: &Path) -> Result<PoseRecording, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let recording: PoseRecording = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse pose recording {}: {e}", path.display()))?;
    validate_recording(&recording)?;
    Ok(recording)
}

fn validate_recording(recording: &PoseRecording) -> Result<(), String> {
    if recording.interval_ms == 0 {
        return Err("Recording validation failed: interval_ms must be > 0".to_string());
    }
    if recording.frames.is_empty() {
        return Err("Recording validation failed: frames list is empty".to_string());
    }
    for (i, frame) in recording.frames.iter().enumerate() {
        for pose in &frame.poses {
            let bad = pose
                .keypoints
                .iter()
                .find(|k| !(0.0..=1.0).contains(&k.confidence));
            if let Some(keypoint) = bad {
                return Err(format!(
                    "Recording validation failed: frame {i} has confidence {} outside [0, 1]",
                    keypoint.confidence
                ));
            }
        }
    }
    Ok(())
}

const fn default_interval_ms() -> u64 {
    33
}

const fn default_repeat() -> u32 {
    1
}

pub struct ReplayPoseSource {
    label: String,
    recording: PoseRecording,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl ReplayPoseSource {
    pub fn new(label: impl Into<String>, recording: PoseRecording) -> Self {
        Self {
            label: label.into(),
            recording,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let recording = load_recording_from_path(path)?;
        Ok(Self::new(path.display().to_string(), recording))
    }
}

impl PoseSource for ReplayPoseSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn start(&mut self, video: &dyn VideoSource, sink: PoseSink) -> Result<(), String> {
        if self.worker.is_some() {
            return Err(format!("Pose source '{}' already started", self.label));
        }
        log_model_options(&self.label, sink.options());
        let sink = sink.for_video(video);
        let frames = self.recording.expanded_frames();
        let interval = Duration::from_millis(self.recording.interval_ms);
        let load_delay = Duration::from_millis(self.recording.load_delay_ms);
        let looping = self.recording.looping;
        let stop = Arc::clone(&self.stop);

        let worker = std::thread::Builder::new()
            .name("pose-replay".to_string())
            .spawn(move || {
                if !sleep_unless_stopped(&stop, load_delay) {
                    return;
                }
                sink.model_loaded();
                loop {
                    for poses in &frames {
                        if stop.load(Ordering::Relaxed) {
                            return;
                        }
                        sink.deliver(poses.clone());
                        if !sleep_unless_stopped(&stop, interval) {
                            return;
                        }
                    }
                    if !looping {
                        break;
                    }
                }
                // The player walked out of frame.
                sink.deliver(Vec::new());
                log::info!("Pose recording finished");
            })
            .map_err(|e| format!("Failed to spawn replay thread: {e}"))?;
        self.worker = Some(worker);
        Ok(())
    }

    fn skeleton_connections(&self) -> Vec<SkeletonConnection> {
        self.recording
            .skeleton
            .clone()
            .unwrap_or_else(default_skeleton)
    }
}

impl Drop for ReplayPoseSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Pose replay thread panicked");
            }
        }
    }
}

/// Sleep in short slices so a stop request is honoured promptly. Returns false
/// if stopped.
fn sleep_unless_stopped(stop: &AtomicBool, total: Duration) -> bool {
    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        let slice = remaining.min(STOP_POLL);
        std::thread::sleep(slice);
        remaining -= slice;
    }
    !stop.load(Ordering::Relaxed)
}
