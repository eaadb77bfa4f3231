//! Particle types: simulation record, host transform, and GPU instance data

use crate::stuck::StuckTracker;
use bytemuck::{Pod, Zeroable};
use herbfall_core::{ParticleId, Vec2};
use serde::Serialize;

/// Lifecycle phase of a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for its spawn delay to elapse; not simulated, invisible
    Pending,
    /// Falling under normal physics
    Active,
}

/// One sine term of the sway model
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwayTerm {
    /// Peak lateral acceleration, px/s²
    pub amplitude: f32,
    /// Angular frequency, rad/s
    pub speed: f32,
    /// Phase offset, radians
    pub phase: f32,
}

/// Per-leaf sway parameters: a dominant term, a faster phase-shifted term,
/// and a slow low-amplitude "breathing" term
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwayParams {
    pub primary: SwayTerm,
    pub secondary: SwayTerm,
    pub breathing: SwayTerm,
}

impl SwayParams {
    /// Derive the three terms from one sampled amplitude/speed and two phases
    pub fn from_primary(amplitude: f32, speed: f32, phase: f32, secondary_phase: f32) -> Self {
        Self {
            primary: SwayTerm {
                amplitude,
                speed,
                phase,
            },
            secondary: SwayTerm {
                amplitude: amplitude * 0.35,
                speed: speed * 2.3,
                phase: secondary_phase,
            },
            breathing: SwayTerm {
                amplitude: amplitude * 0.15,
                speed: speed * 0.37,
                phase: phase * 0.5 + 1.1,
            },
        }
    }

    /// No lateral motion at all
    pub fn still() -> Self {
        Self::default()
    }
}

/// Simulation state of one leaf
#[derive(Debug, Clone)]
pub struct Particle {
    pub id: ParticleId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Degrees, kept in [0, 360)
    pub rotation: f32,
    /// Degrees per second
    pub angular_velocity: f32,
    pub mass: f32,
    pub drag: f32,
    pub scale: f32,
    /// Visual variant index, cosmetic only
    pub species: u32,
    pub opacity: f32,
    /// Seconds after field start before this leaf activates
    pub spawn_delay: f32,
    pub phase: Phase,
    pub column: usize,
    pub sway: SwayParams,
    pub restitution: f32,
    pub stuck: StuckTracker,
    /// Collision radius at scale 1.0
    pub base_radius: f32,
}

impl Particle {
    /// A resting, pending record; the field fills in the real values
    pub fn pending(id: ParticleId, base_radius: f32) -> Self {
        Self {
            id,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            mass: 1.0,
            drag: 0.0,
            scale: 1.0,
            species: 0,
            opacity: 0.0,
            spawn_delay: 0.0,
            phase: Phase::Pending,
            column: 0,
            sway: SwayParams::still(),
            restitution: 0.6,
            stuck: StuckTracker::new(Vec2::ZERO),
            base_radius,
        }
    }

    /// An active leaf at `position`, handy for targeted tests and tools
    pub fn active_at(id: ParticleId, position: Vec2, base_radius: f32) -> Self {
        let mut p = Self::pending(id, base_radius);
        p.position = position;
        p.phase = Phase::Active;
        p.stuck.reset(position);
        p
    }

    /// Collision radius after scaling
    pub fn effective_radius(&self) -> f32 {
        (self.base_radius * self.scale).max(0.0)
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Whether every derived quantity is a real number
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.rotation.is_finite()
            && self.angular_velocity.is_finite()
    }

    pub fn transform(&self) -> HerbTransform {
        HerbTransform {
            id: self.id.raw(),
            x: self.position.x,
            y: self.position.y,
            rotation_degrees: self.rotation,
            scale: self.scale,
            opacity: self.opacity.clamp(0.0, 1.0),
            species_id: self.species,
        }
    }
}

/// Per-frame output consumed by the host renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HerbTransform {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub rotation_degrees: f32,
    pub scale: f32,
    pub opacity: f32,
    pub species_id: u32,
}

/// GPU instance data for instanced sprite drawing.
/// 32 bytes, two rows of vec4.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct HerbInstance {
    /// xy = position, z = rotation in radians, w = scale
    pub pos_rot_scale: [f32; 4],
    /// x = opacity, y = species, zw unused
    pub opacity_species: [f32; 4],
}

impl HerbInstance {
    pub fn from_particle(p: &Particle) -> Self {
        Self {
            pos_rot_scale: [
                p.position.x,
                p.position.y,
                p.rotation.to_radians(),
                p.scale,
            ],
            opacity_species: [p.opacity.clamp(0.0, 1.0), p.species as f32, 0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_particle_is_inert() {
        let p = Particle::pending(ParticleId(3), 10.0);
        assert!(!p.is_active());
        assert_eq!(p.opacity, 0.0);
        assert!(p.mass > 0.0);
        assert!(p.is_finite());
    }

    #[test]
    fn effective_radius_scales() {
        let mut p = Particle::active_at(ParticleId(0), Vec2::new(1.0, 2.0), 10.0);
        p.scale = 1.5;
        assert!((p.effective_radius() - 15.0).abs() < 1e-6);
    }

    #[test]
    fn non_finite_state_is_detected() {
        let mut p = Particle::active_at(ParticleId(0), Vec2::ZERO, 10.0);
        p.velocity.y = f32::INFINITY;
        assert!(!p.is_finite());
    }

    #[test]
    fn transform_clamps_opacity() {
        let mut p = Particle::active_at(ParticleId(9), Vec2::new(5.0, 6.0), 10.0);
        p.opacity = 1.7;
        p.species = 2;
        let t = p.transform();
        assert_eq!(t.id, 9);
        assert_eq!(t.opacity, 1.0);
        assert_eq!(t.species_id, 2);
    }

    #[test]
    fn instance_layout() {
        assert_eq!(std::mem::size_of::<HerbInstance>(), 32);
        assert_eq!(std::mem::align_of::<HerbInstance>(), 4);
        let p = Particle::active_at(ParticleId(0), Vec2::new(1.0, 2.0), 10.0);
        let inst = HerbInstance::from_particle(&p);
        let bytes = bytemuck::bytes_of(&inst);
        assert_eq!(bytes.len(), 32);
    }

    #[test]
    fn sway_terms_derive_from_primary() {
        let s = SwayParams::from_primary(40.0, 1.0, 0.0, 1.7);
        assert!(s.secondary.speed > s.primary.speed);
        assert!(s.breathing.speed < s.primary.speed);
        assert!(s.breathing.amplitude < s.secondary.amplitude);
    }
}
