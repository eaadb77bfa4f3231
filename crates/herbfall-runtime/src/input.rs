//! Pointer input state
//!
//! Input handlers write the latest cursor/touch position through a
//! [`PointerInput`] handle; the simulation reads one [`PointerState`]
//! snapshot at the start of each tick. There is no event queue: a missed
//! update just means the previous position is reused.

use herbfall_core::Vec2;
use std::sync::{Arc, Mutex};

/// Last-known pointer position in viewport pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    /// False when no mouse or touch is over the surface
    pub active: bool,
}

impl Default for PointerState {
    fn default() -> Self {
        Self::inactive()
    }
}

impl PointerState {
    pub fn inactive() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            active: false,
        }
    }

    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y, active: true }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// The position if the pointer is present and finite
    pub fn active_position(&self) -> Option<Vec2> {
        let p = self.position();
        (self.active && p.is_finite()).then_some(p)
    }
}

/// Shared handle to the process-wide pointer state
#[derive(Clone, Default)]
pub struct PointerInput {
    state: Arc<Mutex<PointerState>>,
}

impl PointerInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a mouse move or touch move event
    pub fn process_move(&self, x: f32, y: f32) {
        self.store(PointerState::at(x, y));
    }

    /// Process the pointer leaving the surface or a touch ending
    pub fn process_leave(&self) {
        let mut current = self.snapshot();
        current.active = false;
        self.store(current);
    }

    /// Read the last-known state
    pub fn snapshot(&self) -> PointerState {
        match self.state.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn store(&self, value: PointerState) {
        match self.state.lock() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inactive() {
        let input = PointerInput::new();
        let s = input.snapshot();
        assert!(!s.active);
        assert!(s.active_position().is_none());
    }

    #[test]
    fn test_move_then_leave_keeps_last_position() {
        let input = PointerInput::new();
        input.process_move(500.0, 420.0);
        assert_eq!(input.snapshot().active_position(), Some(Vec2::new(500.0, 420.0)));

        input.process_leave();
        let s = input.snapshot();
        assert!(!s.active);
        assert_eq!(s.x, 500.0);
        assert_eq!(s.y, 420.0);
    }

    #[test]
    fn test_clones_share_state() {
        let input = PointerInput::new();
        let handler = input.clone();
        handler.process_move(1.0, 2.0);
        assert!(input.snapshot().active);
    }

    #[test]
    fn test_non_finite_position_is_ignored_by_reader() {
        let s = PointerState::at(f32::NAN, 3.0);
        assert!(s.active_position().is_none());
    }
}
