//! Single-slot, latest-value-wins handoff between an asynchronous pose producer
//! and the frame loop.
//!
//! The producer overwrites the slot whenever an inference completes; the frame
//! loop peeks once per frame. Reads never consume, so a frame that arrives before
//! the next result reuses the previous poses. `generation` lets the reader tell a
//! fresh delivery from a stale one.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::pose::Pose;

#[derive(Debug)]
struct Slot {
    ready: bool,
    poses: Arc<[Pose]>,
    generation: u64,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            ready: false,
            poses: Arc::from(Vec::new()),
            generation: 0,
        }
    }
}

/// What the frame loop sees when it reads the mailbox.
#[derive(Debug, Clone)]
pub struct MailboxRead {
    pub ready: bool,
    pub poses: Arc<[Pose]>,
    pub generation: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PoseMailbox {
    slot: Arc<Mutex<Slot>>,
}

impl PoseMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that the pose model finished loading. Idempotent.
    pub fn model_loaded(&self) {
        let mut slot = self.lock();
        if !slot.ready {
            slot.ready = true;
            log::info!("Pose model ready");
        }
    }

    /// Replace the current poses. A delivery also implies the model is ready.
    pub fn publish(&self, poses: Vec<Pose>) {
        let mut slot = self.lock();
        slot.ready = true;
        slot.poses = poses.into();
        slot.generation += 1;
    }

    pub fn read(&self) -> MailboxRead {
        let slot = self.lock();
        MailboxRead {
            ready: slot.ready,
            poses: Arc::clone(&slot.poses),
            generation: slot.generation,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panicking producer cannot leave the slot half-written: every write
        // replaces whole fields, so recovering the guard is sound.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
