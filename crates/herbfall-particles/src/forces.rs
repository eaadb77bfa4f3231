//! Force model: gravity, quadratic drag, layered sway, pointer repulsion,
//! and torque coupling. Everything here is a pure function of its inputs.

use crate::config::ForceParams;
use crate::particle::{Particle, SwayParams, SwayTerm};
use herbfall_core::Vec2;
use herbfall_runtime::PointerState;

/// Bound on angular acceleration, deg/s²
const MAX_ANGULAR_ACCEL: f32 = 7200.0;

/// Accelerations acting on one leaf at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Forces {
    /// px/s²
    pub acceleration: Vec2,
    /// deg/s²
    pub angular: f32,
}

/// One sine term evaluated at `elapsed` seconds.
///
/// Computed in f64 so the phase argument stays precise over long sessions;
/// no state is carried between calls, so resuming after a pause is seamless.
pub fn sway_offset(elapsed: f64, phase: f32, amplitude: f32, speed: f32) -> f32 {
    let angle = speed as f64 * elapsed + phase as f64;
    amplitude * angle.sin() as f32
}

fn term(t: &SwayTerm, elapsed: f64) -> f32 {
    sway_offset(elapsed, t.phase, t.amplitude, t.speed)
}

/// Lateral sway acceleration: primary + secondary + breathing
pub fn sway_acceleration(sway: &SwayParams, elapsed: f64) -> f32 {
    term(&sway.primary, elapsed) + term(&sway.secondary, elapsed) + term(&sway.breathing, elapsed)
}

/// Repulsion from the pointer, before mass scaling.
///
/// Returns the outward acceleration and the angular "brush past" term. The
/// falloff `(1 - d/R)²` is smooth at the boundary so leaves don't jerk when
/// the pointer enters range.
pub fn pointer_repulsion(
    position: Vec2,
    velocity: Vec2,
    pointer: Option<Vec2>,
    params: &ForceParams,
) -> (Vec2, f32) {
    let Some(pointer) = pointer else {
        return (Vec2::ZERO, 0.0);
    };
    let radius = params.interaction_radius;
    if radius <= 0.0 {
        return (Vec2::ZERO, 0.0);
    }
    let offset = position - pointer;
    let distance = offset.length();
    if distance >= radius {
        return (Vec2::ZERO, 0.0);
    }

    let falloff = (1.0 - distance / radius).powi(2);
    // A leaf exactly under the pointer is flicked upward
    let outward = offset.normalize_or(Vec2::UP);
    let push = outward * (params.pointer_strength * falloff);

    let tangential = velocity.dot(outward.perp());
    let spin = tangential * params.pointer_spin * falloff;

    (push, spin)
}

/// Total accelerations on `particle` at `elapsed` seconds since field start
pub fn compute_forces(
    particle: &Particle,
    pointer: &PointerState,
    elapsed: f64,
    params: &ForceParams,
) -> Forces {
    let mass = particle.mass.max(f32::MIN_POSITIVE);
    let v = particle.velocity;

    let gravity = Vec2::DOWN * (params.gravity * mass);
    let drag = -v * (particle.drag * v.length() / mass);
    let sway = Vec2::new(sway_acceleration(&particle.sway, elapsed) / mass, 0.0);
    let (repulsion, spin) =
        pointer_repulsion(particle.position, v, pointer.active_position(), params);

    let mut acceleration = gravity + drag + sway + repulsion / mass;
    acceleration = acceleration.clamp_length(params.max_acceleration);
    if !acceleration.is_finite() {
        acceleration = Vec2::ZERO;
    }

    let angular = acceleration.x * params.torque_coupling + spin
        - particle.angular_velocity * params.angular_damping;
    let angular = if angular.is_finite() {
        angular.clamp(-MAX_ANGULAR_ACCEL, MAX_ANGULAR_ACCEL)
    } else {
        0.0
    };

    Forces {
        acceleration,
        angular,
    }
}

/// Speed at which gravity and drag balance, px/s
pub fn terminal_velocity(mass: f32, drag: f32, gravity: f32) -> f32 {
    if drag <= 0.0 {
        return f32::INFINITY;
    }
    mass * (gravity / drag).sqrt()
}
