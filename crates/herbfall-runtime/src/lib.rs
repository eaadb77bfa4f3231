//! Herbfall Runtime - Frame loop infrastructure
//!
//! Provides the render-loop building blocks the host drives:
//! - `FrameClock`: per-frame delta with clamping after stalls
//! - `PointerInput` / `PointerState`: last-known pointer position shared with input handlers
//! - `FrameGuard`: teardown flag checked by already-scheduled frame callbacks
//! - `RuntimeSystem`: trait for systems ticked once per frame

mod clock;
mod guard;
mod input;
mod system;

pub use clock::{FrameClock, DEFAULT_MAX_DELTA};
pub use guard::FrameGuard;
pub use input::{PointerInput, PointerState};
pub use system::RuntimeSystem;
