//! Collision resolver: keeps leaves out of obstacles and off each other
//!
//! Runs on the post-integration (predicted) position. Every branch ends
//! with a finite position; degenerate shapes fall back to fixed push
//! directions rather than dividing by zero.

use crate::config::CollisionParams;
use crate::geometry::{
    clamp_to_box, closest_point_on_segment, edge_outward_normal, point_in_triangle,
    triangle_centroid, triangle_inradius,
};
use crate::obstacle::Obstacle;
use crate::particle::Particle;
use crate::rand::HerbRng;
use herbfall_core::Vec2;

/// Gap left between a resolved leaf and the surface it was pushed out of
const SKIN: f32 = 0.01;

/// Distance outside a circle/rectangle that still counts as touching
const ADJACENT_BAND: f32 = 1.0;

/// How a leaf relates to one obstacle after resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Clear,
    /// Within the adjacency band or triangle edge margin
    Adjacent,
    /// Overlapped and was pushed out
    Penetrating,
    /// Centre was deep inside a triangle and got the boosted escape
    Deep,
}

/// Summary of one `resolve` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contact {
    /// Number of obstacles overlapped and corrected
    pub penetrations: u32,
    /// Touching or adjacent to at least one obstacle
    pub touching: bool,
    pub deep: bool,
}

impl Contact {
    fn record(&mut self, kind: ContactKind) {
        match kind {
            ContactKind::Clear => {}
            ContactKind::Adjacent => self.touching = true,
            ContactKind::Penetrating => {
                self.touching = true;
                self.penetrations += 1;
            }
            ContactKind::Deep => {
                self.touching = true;
                self.deep = true;
                self.penetrations += 1;
            }
        }
    }
}

/// Resolve `particle` against every obstacle, in order.
///
/// `dt` scales the soft triangle-edge repulsion, which is an acceleration.
pub fn resolve(
    particle: &mut Particle,
    obstacles: &[Obstacle],
    params: &CollisionParams,
    dt: f32,
    rng: &mut HerbRng,
) -> Contact {
    let mut contact = Contact::default();
    for obstacle in obstacles {
        let kind = match *obstacle {
            Obstacle::Circle { center, radius } => resolve_circle(particle, center, radius, params, rng),
            Obstacle::Rectangle {
                origin,
                width,
                height,
            } => resolve_rectangle(particle, origin, width, height, params, rng),
            Obstacle::Triangle {
                apex,
                base_left,
                base_right,
            } => resolve_triangle(particle, [apex, base_left, base_right], params, dt, rng),
        };
        contact.record(kind);
    }
    contact
}

/// Reflect the inward normal velocity with the leaf's restitution and add
/// tangential jitter so repeated bounces never line up perfectly.
fn bounce(particle: &mut Particle, normal: Vec2, params: &CollisionParams, rng: &mut HerbRng) {
    let vn = particle.velocity.dot(normal);
    if vn < 0.0 {
        let e = particle.restitution.clamp(0.0, 1.0);
        particle.velocity -= normal * ((1.0 + e) * vn);
        if params.jitter > 0.0 {
            particle.velocity += normal.perp() * rng.signed(params.jitter);
        }
    }
}

pub fn resolve_circle(
    particle: &mut Particle,
    center: Vec2,
    radius: f32,
    params: &CollisionParams,
    rng: &mut HerbRng,
) -> ContactKind {
    let min_dist = radius.max(0.0) + particle.effective_radius();
    let offset = particle.position - center;
    let dist = offset.length();
    if dist >= min_dist {
        return if dist < min_dist + ADJACENT_BAND {
            ContactKind::Adjacent
        } else {
            ContactKind::Clear
        };
    }

    let normal = offset.normalize_or(Vec2::UP);
    particle.position = center + normal * (min_dist + SKIN);
    bounce(particle, normal, params, rng);
    ContactKind::Penetrating
}

pub fn resolve_rectangle(
    particle: &mut Particle,
    origin: Vec2,
    width: f32,
    height: f32,
    params: &CollisionParams,
    rng: &mut HerbRng,
) -> ContactKind {
    let r = particle.effective_radius();
    let max = origin + Vec2::new(width.max(0.0), height.max(0.0));
    let pos = particle.position;
    let closest = clamp_to_box(pos, origin, max);
    let offset = pos - closest;
    let dist = offset.length();

    let (contact_point, normal) = if dist > 1e-6 {
        if dist >= r {
            return if dist < r + ADJACENT_BAND {
                ContactKind::Adjacent
            } else {
                ContactKind::Clear
            };
        }
        (closest, offset / dist)
    } else {
        // Centre inside: leave through the nearest side, preferring the top
        let sides = [
            (pos.y - origin.y, Vec2::new(pos.x, origin.y), Vec2::UP),
            (pos.x - origin.x, Vec2::new(origin.x, pos.y), -Vec2::RIGHT),
            (max.x - pos.x, Vec2::new(max.x, pos.y), Vec2::RIGHT),
            (max.y - pos.y, Vec2::new(pos.x, max.y), Vec2::DOWN),
        ];
        let mut best = sides[0];
        for side in &sides[1..] {
            if side.0 < best.0 {
                best = *side;
            }
        }
        (best.1, best.2)
    };

    particle.position = contact_point + normal * (r + SKIN);
    bounce(particle, normal, params, rng);
    ContactKind::Penetrating
}

pub fn resolve_triangle(
    particle: &mut Particle,
    [apex, base_left, base_right]: [Vec2; 3],
    params: &CollisionParams,
    dt: f32,
    rng: &mut HerbRng,
) -> ContactKind {
    let r = particle.effective_radius();
    let pos = particle.position;
    let centroid = triangle_centroid(apex, base_left, base_right);
    let edges = [(apex, base_left), (base_left, base_right), (base_right, apex)];

    let mut nearest_dist = f32::INFINITY;
    let mut nearest_point = apex;
    let mut nearest_edge = edges[0];
    for &(a, b) in &edges {
        let q = closest_point_on_segment(pos, a, b);
        let d = pos.distance(q);
        if d < nearest_dist {
            nearest_dist = d;
            nearest_point = q;
            nearest_edge = (a, b);
        }
    }
    let edge_normal = edge_outward_normal(nearest_edge.0, nearest_edge.1, centroid);

    if point_in_triangle(pos, apex, base_left, base_right) {
        particle.position = nearest_point + edge_normal * (r + SKIN);
        bounce(particle, edge_normal, params, rng);

        let inradius = triangle_inradius(apex, base_left, base_right);
        if nearest_dist > params.deep_fraction * inradius {
            particle.velocity += edge_normal * (params.escape_speed * params.deep_boost);
            return ContactKind::Deep;
        }
        return ContactKind::Penetrating;
    }

    let margin = params.edge_margin;
    if nearest_dist >= r + margin {
        return ContactKind::Clear;
    }

    let normal = (pos - nearest_point).normalize_or(edge_normal);
    let penetrating = nearest_dist < r;
    if penetrating {
        particle.position = nearest_point + normal * (r + SKIN);
    }

    // 1 at the surface, 0 at the outer edge of the margin band
    let strength = if margin > 0.0 {
        1.0 - ((nearest_dist - r).max(0.0) / margin).min(1.0)
    } else {
        1.0
    };

    // Slide along the edge: drop the inward component instead of bouncing
    let vn = particle.velocity.dot(normal);
    if vn < 0.0 {
        let keep = if penetrating { 0.0 } else { 1.0 - strength };
        particle.velocity -= normal * (vn * (1.0 - keep));
    }
    particle.velocity += normal * (params.edge_repulsion * strength * dt.max(0.0));

    if penetrating {
        ContactKind::Penetrating
    } else {
        ContactKind::Adjacent
    }
}

/// Kick a stalled leaf loose.
///
/// The direction is away from the nearest obstacle centre with a random
/// component, and the resulting speed is at least `escape_speed`.
pub fn apply_escape(
    particle: &mut Particle,
    obstacles: &[Obstacle],
    params: &CollisionParams,
    rng: &mut HerbRng,
) {
    let pos = particle.position;
    let away = obstacles
        .iter()
        .min_by(|a, b| a.distance_to(pos).total_cmp(&b.distance_to(pos)))
        .map(|o| (pos - o.center()).normalize_or(Vec2::UP))
        .unwrap_or(Vec2::UP);
    let direction = (away + rng.unit_vector() * 0.5).normalize_or(away);
    let speed = params.escape_speed.max(1.0) * rng.range(1.0, 1.5);
    particle.velocity = direction * speed;
    particle.angular_velocity += rng.signed(180.0);
}

/// O(n²) soft separation between active leaves. Returns overlapping pairs.
pub fn separate_pairs(particles: &mut [Particle], params: &CollisionParams) -> u32 {
    let mut overlaps = 0;
    for i in 0..particles.len() {
        let (head, tail) = particles.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.is_active() {
            continue;
        }
        for b in tail.iter_mut().filter(|b| b.is_active()) {
            if separate_pair(a, b, params) {
                overlaps += 1;
            }
        }
    }
    overlaps
}

fn separate_pair(a: &mut Particle, b: &mut Particle, params: &CollisionParams) -> bool {
    let min_dist = a.effective_radius() + b.effective_radius();
    let offset = b.position - a.position;
    let dist = offset.length();
    if min_dist <= 0.0 || dist >= min_dist {
        return false;
    }

    let normal = offset.normalize_or(Vec2::RIGHT);
    let inv_a = 1.0 / a.mass.max(f32::MIN_POSITIVE);
    let inv_b = 1.0 / b.mass.max(f32::MIN_POSITIVE);
    let inv_sum = inv_a + inv_b;
    let softness = params.separation_softness.clamp(0.0, 1.0);

    let correction = (min_dist - dist) * softness / inv_sum;
    a.position -= normal * (correction * inv_a);
    b.position += normal * (correction * inv_b);

    let closing = (b.velocity - a.velocity).dot(normal);
    if closing < 0.0 {
        let e = 0.5 * (a.restitution + b.restitution) * softness;
        let impulse = -(1.0 + e) * closing / inv_sum * softness;
        a.velocity -= normal * (impulse * inv_a);
        b.velocity += normal * (impulse * inv_b);
    }
    true
}
