//! Runtime system trait

use herbfall_core::{Result, Viewport};

/// A system that can be ticked by the host's render loop
///
/// The host calls `update` once per animation frame and `resize` between
/// frames whenever its layout changes.
pub trait RuntimeSystem {
    /// Called once before the first frame
    fn initialize(&mut self, viewport: Viewport) -> Result<()>;

    /// Called once per frame with the elapsed wall time in seconds
    fn update(&mut self, dt: f64) -> Result<()>;

    /// Called between frames when the host surface changes size
    fn resize(&mut self, viewport: Viewport) -> Result<()>;

    /// Called when the host view is torn down
    fn shutdown(&mut self) -> Result<()>;

    /// Human-readable name for this system
    fn name(&self) -> &str;
}
