//! Per-leaf stall detection

use herbfall_core::Vec2;

/// Counts consecutive ticks in which a leaf touching an obstacle barely
/// moved. Knows nothing about shapes; the field decides what counts as
/// contact and what to do once [`StuckTracker::observe`] reports a stall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StuckTracker {
    last: Vec2,
    still_frames: u32,
}

impl StuckTracker {
    pub fn new(position: Vec2) -> Self {
        Self {
            last: position,
            still_frames: 0,
        }
    }

    pub fn reset(&mut self, position: Vec2) {
        self.last = position;
        self.still_frames = 0;
    }

    pub fn still_frames(&self) -> u32 {
        self.still_frames
    }

    pub fn last_position(&self) -> Vec2 {
        self.last
    }

    /// Record the end-of-tick position.
    ///
    /// Returns true once more than `threshold` consecutive ticks moved less
    /// than `epsilon` while `in_contact`. Free flight, or any real movement,
    /// clears the count.
    pub fn observe(&mut self, position: Vec2, in_contact: bool, epsilon: f32, threshold: u32) -> bool {
        let moved = position.distance(self.last);
        self.last = position;
        if in_contact && moved < epsilon {
            self.still_frames = self.still_frames.saturating_add(1);
        } else {
            self.still_frames = 0;
        }
        self.still_frames > threshold
    }
}
