use bevy_math::Vec3;
use std::collections::BTreeSet;
use tracing::trace;

use crate::track::TrackSurface;

// ============================================================================
// Lap Tracker
// ============================================================================

/// Per-vehicle checkpoint and lap state.
///
/// Checkpoints may be cleared in any order; the finish line only counts once every checkpoint of
/// the current lap is cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LapTracker {
    cleared: BTreeSet<usize>,
    lap: u32,
}

/// What one movement step changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LapProgress {
    // Checkpoints newly cleared by this step
    pub cleared: Vec<usize>,
    // New lap number when the finish line counted
    pub lap_completed: Option<u32>,
}

impl LapTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn lap(&self) -> u32 {
        self.lap
    }

    #[must_use]
    pub const fn cleared(&self) -> &BTreeSet<usize> {
        &self.cleared
    }

    #[must_use]
    pub fn has_full_set(&self, checkpoint_count: usize) -> bool {
        (0..checkpoint_count).all(|id| self.cleared.contains(&id))
    }

    pub fn reset(&mut self) {
        self.cleared.clear();
        self.lap = 0;
    }

    // Remote vehicles mirror the lap their owner reported
    pub fn set_lap(&mut self, lap: u32) {
        self.lap = lap;
    }

    // Returns whether the checkpoint was new for this lap
    pub fn record_checkpoint(&mut self, id: usize) -> bool {
        self.cleared.insert(id)
    }

    // Returns the new lap number, or `None` when the set is incomplete
    pub fn record_finish(&mut self, checkpoint_count: usize) -> Option<u32> {
        if !self.has_full_set(checkpoint_count) {
            trace!(cleared = self.cleared.len(), checkpoint_count, "finish crossed early");
            return None;
        }
        self.lap += 1;
        self.cleared.clear();
        Some(self.lap)
    }

    /// Check the movement `old_pos -> new_pos` against every line. Checkpoints are processed
    /// before the finish line.
    pub fn update(&mut self, track: &TrackSurface, old_pos: Vec3, new_pos: Vec3) -> LapProgress {
        let mut progress = LapProgress::default();
        for checkpoint in track.checkpoints() {
            if !self.cleared.contains(&checkpoint.id)
                && checkpoint.crossed_by(old_pos, new_pos)
                && self.record_checkpoint(checkpoint.id)
            {
                progress.cleared.push(checkpoint.id);
            }
        }
        if track.finish_line().crossed_by(old_pos, new_pos) {
            progress.lap_completed = self.record_finish(track.checkpoints().len());
        }
        progress
    }
}
