//! Herbfall Particles - falling herb leaves over a page
//!
//! Provides a fixed-size field of leaves simulated on the CPU with:
//! - Gravity, quadratic drag, layered sway and pointer repulsion
//! - Collision against circle, rectangle and triangle obstacles
//! - Anti-stuck escape for leaves pinned against a shape
//! - Column-balanced spawning and recycling
//! - Instance packing for instanced draw calls

pub mod collision;
pub mod config;
pub mod curves;
pub mod field;
pub mod forces;
pub mod geometry;
pub mod obstacle;
pub mod particle;
pub mod rand;
pub mod stuck;

use herbfall_core::{Result, Viewport};
use herbfall_runtime::{FrameGuard, PointerInput, RuntimeSystem};

pub use config::{CollisionParams, FieldConfig, ForceParams, SideExit, MAX_PARTICLES};
pub use field::{FieldStats, ParticleField};
pub use obstacle::{parse_obstacles, Obstacle, ObstacleRegistry, ObstacleSource, Placement};
pub use particle::{HerbInstance, HerbTransform, Particle, Phase};

/// The herb field as a runtime system, ticked once per host frame.
///
/// Pointer events arrive through a cloned `PointerInput` handle; the system
/// snapshots it at the start of every update.
pub struct HerbfallSystem {
    pub field: ParticleField,
    pointer: PointerInput,
    guard: FrameGuard,
}

impl HerbfallSystem {
    pub fn new(config: FieldConfig) -> Self {
        Self {
            field: ParticleField::new(config),
            pointer: PointerInput::new(),
            guard: FrameGuard::new(),
        }
    }

    /// Handle for the host's pointer event listeners
    pub fn pointer(&self) -> PointerInput {
        self.pointer.clone()
    }

    /// Handle for frame callbacks that may outlive the system
    pub fn guard(&self) -> FrameGuard {
        self.guard.clone()
    }
}

impl Default for HerbfallSystem {
    fn default() -> Self {
        Self::new(FieldConfig::default())
    }
}

impl RuntimeSystem for HerbfallSystem {
    fn initialize(&mut self, viewport: Viewport) -> Result<()> {
        self.field.config().validate()?;
        let count = self.field.config().particle_count;
        self.field.initialize(count, viewport);
        log::info!(
            "herb field ready: {count} herb(s), {} obstacle(s)",
            self.field.obstacles().len()
        );
        Ok(())
    }

    fn update(&mut self, dt: f64) -> Result<()> {
        let pointer = self.pointer.snapshot();
        let field = &mut self.field;
        self.guard.run(|| {
            field.tick(dt as f32, &pointer);
            field.pack_instances();
        });
        Ok(())
    }

    fn resize(&mut self, viewport: Viewport) -> Result<()> {
        self.field.resize(viewport);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        self.guard.tear_down();
        self.field.teardown();
        log::debug!("herb field torn down after {} tick(s)", self.field.stats().ticks);
        Ok(())
    }

    fn name(&self) -> &str {
        "herbfall"
    }
}
