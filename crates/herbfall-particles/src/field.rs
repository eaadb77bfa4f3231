//! Particle field manager: owns the leaf arena, staggers spawns across
//! columns, steps physics once per frame, and recycles leaves that leave
//! the viewport.

use crate::collision::{self, Contact};
use crate::config::{CollisionParams, FieldConfig, ForceParams, SideExit, MAX_PARTICLES};
use crate::curves::opacity_envelope;
use crate::forces::compute_forces;
use crate::obstacle::{ObstacleRegistry, ObstacleSource};
use crate::particle::{HerbInstance, HerbTransform, Particle, Phase, SwayParams};
use crate::rand::HerbRng;
use herbfall_core::{ParticleId, Vec2, Viewport};
use herbfall_runtime::PointerState;
use serde::Serialize;

/// Bound on angular velocity, deg/s
const MAX_SPIN: f32 = 720.0;

/// Running counters, mostly for diagnostics and the CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FieldStats {
    pub ticks: u64,
    pub recycled: u64,
    pub escapes: u64,
    pub non_finite_recycles: u64,
    /// Leaves touching an obstacle during the last tick
    pub contacts: u32,
    /// Overlapping leaf pairs during the last tick
    pub overlaps: u32,
    pub active: usize,
    pub pending: usize,
}

/// The only entry point the host drives: `initialize`, then `tick` once
/// per frame, `resize`/`set_obstacles` between frames.
pub struct ParticleField {
    config: FieldConfig,
    force_params: ForceParams,
    collision_params: CollisionParams,
    particles: Vec<Particle>,
    obstacles: ObstacleRegistry,
    viewport: Viewport,
    /// Seconds since `initialize`, drives spawn delays and sway
    elapsed: f64,
    rng: HerbRng,
    column_counts: Vec<usize>,
    column_cursor: usize,
    /// Pre-allocated instance buffer for packing active leaves
    instance_buffer: Vec<HerbInstance>,
    stats: FieldStats,
    torn_down: bool,
}

impl ParticleField {
    pub fn new(config: FieldConfig) -> Self {
        let rng = HerbRng::new(config.seed);
        let force_params = config.force_params();
        let collision_params = config.collision_params();
        Self {
            config,
            force_params,
            collision_params,
            particles: Vec::new(),
            obstacles: ObstacleRegistry::new(),
            viewport: Viewport::default(),
            elapsed: 0.0,
            rng,
            column_counts: Vec::new(),
            column_cursor: 0,
            instance_buffer: Vec::new(),
            stats: FieldStats::default(),
            torn_down: false,
        }
    }

    /// Create `count` pending leaves spread evenly over the columns.
    ///
    /// Leaf `i` goes to column `i mod K` with random jitter inside the
    /// column, starts somewhere above the viewport, and activates after a
    /// staggered delay.
    pub fn initialize(&mut self, count: usize, viewport: Viewport) {
        let count = count.min(MAX_PARTICLES);
        self.viewport = viewport.sanitized();
        self.obstacles.relayout(self.viewport);

        let columns = self.config.column_count.clamp(1, MAX_PARTICLES);
        self.column_counts.clear();
        self.column_counts.resize(columns, 0);
        self.column_cursor = count % columns;

        self.particles.clear();
        self.particles.reserve(count);
        for i in 0..count {
            let mut p = Particle::pending(ParticleId::from_index(i), self.config.herb_radius);
            roll_species(&mut p, &self.config, &mut self.rng);

            let column = i % columns;
            self.column_counts[column] += 1;
            p.column = column;
            p.position = Vec2::new(
                self.column_x(column),
                self.spawn_y(p.effective_radius()),
            );
            p.velocity = Vec2::new(self.rng.signed(10.0), self.rng.range(0.0, 20.0));
            p.angular_velocity = self.rng.signed(30.0);
            p.rotation = self.rng.range(0.0, 360.0);
            p.spawn_delay = (i as f32 + self.rng.next_f32()) * self.config.spawn_stagger.max(0.0);
            p.stuck.reset(p.position);
            self.particles.push(p);
        }

        self.instance_buffer.clear();
        self.instance_buffer.reserve(count);
        self.elapsed = 0.0;
        self.stats = FieldStats {
            pending: count,
            ..Default::default()
        };
        self.torn_down = false;
        log::debug!(
            "initialized {count} herbs across {columns} columns in {}x{}",
            self.viewport.width,
            self.viewport.height
        );
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Order: spawn activation, forces, integration, obstacle collision on
    /// the predicted position, stall check, optional pairwise separation,
    /// then lifecycle (non-finite and exit recycling) and opacity.
    pub fn tick(&mut self, dt: f32, pointer: &PointerState) {
        if self.torn_down {
            return;
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_delta.max(0.0))
        } else {
            0.0
        };
        self.elapsed += dt as f64;
        self.stats.ticks += 1;
        self.stats.contacts = 0;

        let ctx = StepContext {
            obstacles: &self.obstacles,
            force_params: &self.force_params,
            collision_params: &self.collision_params,
            config: &self.config,
            pointer,
            elapsed: self.elapsed,
            dt,
        };

        for p in &mut self.particles {
            if p.phase == Phase::Pending {
                if self.elapsed < p.spawn_delay as f64 {
                    p.opacity = 0.0;
                    continue;
                }
                p.phase = Phase::Active;
                p.stuck.reset(p.position);
            }

            let outcome = step_particle(p, &ctx, &mut self.rng);
            if outcome.contact.touching {
                self.stats.contacts += 1;
            }
            if outcome.escaped {
                self.stats.escapes += 1;
            }
        }

        self.stats.overlaps = if self.config.pairwise_separation {
            collision::separate_pairs(&mut self.particles, &self.collision_params)
        } else {
            0
        };

        self.apply_lifecycle();
    }

    fn apply_lifecycle(&mut self) {
        let Viewport { width, height } = self.viewport;
        let margin = self.config.exit_margin.max(0.0);
        let side_exit = self.config.side_exit;
        let mut active = 0;
        let mut pending = 0;

        for i in 0..self.particles.len() {
            if !self.particles[i].is_active() {
                pending += 1;
                continue;
            }
            active += 1;

            if !self.particles[i].is_finite() {
                log::warn!(
                    "herb {} reached a non-finite state; recycling",
                    self.particles[i].id
                );
                self.stats.non_finite_recycles += 1;
                self.recycle(i);
            } else if self.particles[i].position.y > height + margin {
                self.recycle(i);
            } else {
                let x = self.particles[i].position.x;
                let beyond_side = x < -margin || x > width + margin;
                match side_exit {
                    SideExit::Open => {}
                    SideExit::Recycle if beyond_side => self.recycle(i),
                    SideExit::Wrap if beyond_side => {
                        let span = width + 2.0 * margin;
                        let p = &mut self.particles[i];
                        p.position.x = if x < -margin { x + span } else { x - span };
                        p.stuck.reset(p.position);
                    }
                    SideExit::Recycle | SideExit::Wrap => {}
                }
            }

            let p = &mut self.particles[i];
            p.opacity = opacity_envelope(
                p.position.y,
                height,
                self.config.fade_in_band,
                self.config.fade_out_band,
                self.config.max_opacity,
            );
        }

        self.stats.active = active;
        self.stats.pending = pending;
    }

    /// Reintroduce leaf `index` above the viewport with fresh parameters.
    ///
    /// The leaf moves to the least-populated column, so column populations
    /// never differ by more than one no matter how often leaves recycle.
    pub fn recycle(&mut self, index: usize) {
        if index >= self.particles.len() {
            return;
        }
        let old_column = self.particles[index].column;
        if let Some(count) = self.column_counts.get_mut(old_column) {
            *count = count.saturating_sub(1);
        }
        let column = self.take_column();
        let x = self.column_x(column);

        let p = &mut self.particles[index];
        roll_species(p, &self.config, &mut self.rng);
        let y = -(p.effective_radius()
            + self.rng.range(0.0, self.config.spawn_band.max(0.0) * self.viewport.height));
        p.column = column;
        p.position = Vec2::new(x, y);
        p.velocity = Vec2::new(self.rng.signed(10.0), self.rng.range(0.0, 20.0));
        p.angular_velocity = self.rng.signed(30.0);
        p.rotation = self.rng.range(0.0, 360.0);
        p.phase = Phase::Active;
        p.opacity = 0.0;
        p.stuck.reset(p.position);
        self.stats.recycled += 1;
    }

    /// Apply a new viewport between ticks.
    ///
    /// Horizontal positions scale with the width so every leaf stays in its
    /// column; relative obstacles are recomputed; opacity is re-derived from
    /// the new height. Leaves laid out against an empty viewport (a host
    /// that initializes before layout) are placed afresh in their columns.
    pub fn resize(&mut self, viewport: Viewport) {
        let new = viewport.sanitized();
        let old = self.viewport;
        self.viewport = new;
        self.obstacles.relayout(new);

        if old.is_empty() {
            if !new.is_empty() {
                self.respawn_in_columns();
            }
        } else if new.width != old.width {
            let sx = new.width / old.width;
            for p in &mut self.particles {
                p.position.x *= sx;
                p.stuck.reset(p.position);
            }
        }

        for p in &mut self.particles {
            p.opacity = if p.is_active() {
                opacity_envelope(
                    p.position.y,
                    new.height,
                    self.config.fade_in_band,
                    self.config.fade_out_band,
                    self.config.max_opacity,
                )
            } else {
                0.0
            };
        }
        log::debug!("resized field to {}x{}", new.width, new.height);
    }

    /// Replace the obstacle set wholesale
    pub fn set_obstacles(&mut self, sources: Vec<ObstacleSource>) {
        log::debug!("obstacle registry replaced ({} shapes)", sources.len());
        self.obstacles.replace(sources, self.viewport);
    }

    /// Resize and replace obstacles in one step, as a host layout pass does
    pub fn relayout(&mut self, viewport: Viewport, sources: Vec<ObstacleSource>) {
        self.obstacles.replace(sources, viewport.sanitized());
        self.resize(viewport);
    }

    /// Stop simulating; later ticks are no-ops
    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Per-leaf transforms for the host renderer
    pub fn transforms(&self) -> impl Iterator<Item = HerbTransform> + '_ {
        self.particles.iter().map(Particle::transform)
    }

    /// Pack active leaves into the instance buffer for GPU upload.
    /// Call this after `tick()`.
    pub fn pack_instances(&mut self) {
        self.instance_buffer.clear();
        self.instance_buffer.extend(
            self.particles
                .iter()
                .filter(|p| p.is_active())
                .map(HerbInstance::from_particle),
        );
    }

    /// Get the packed instance data
    pub fn instance_data(&self) -> &[HerbInstance] {
        &self.instance_buffer
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.index())
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id.index())
    }

    pub fn obstacles(&self) -> &ObstacleRegistry {
        &self.obstacles
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn stats(&self) -> FieldStats {
        self.stats
    }

    /// Number of leaves assigned to each column
    pub fn column_populations(&self) -> &[usize] {
        &self.column_counts
    }

    pub fn column_width(&self) -> f32 {
        self.viewport.width / self.column_counts.len().max(1) as f32
    }

    fn column_x(&mut self, column: usize) -> f32 {
        let jitter = self.rng.signed(self.config.column_jitter.clamp(0.0, 0.5));
        (column as f32 + 0.5 + jitter) * self.column_width()
    }

    fn spawn_y(&mut self, radius: f32) -> f32 {
        -(radius + self.rng.range(0.0, self.config.spawn_band.max(0.0) * self.viewport.height))
    }

    /// Re-place every leaf above the viewport in its assigned column
    fn respawn_in_columns(&mut self) {
        for i in 0..self.particles.len() {
            let column = self.particles[i].column;
            let radius = self.particles[i].effective_radius();
            let position = Vec2::new(self.column_x(column), self.spawn_y(radius));
            let p = &mut self.particles[i];
            p.position = position;
            p.stuck.reset(position);
        }
    }

    /// Least-populated column, scanning from a rotating cursor to break ties
    fn take_column(&mut self) -> usize {
        let columns = self.column_counts.len();
        if columns == 0 {
            return 0;
        }
        let start = self.column_cursor % columns;
        let mut best = start;
        for offset in 1..columns {
            let c = (start + offset) % columns;
            if self.column_counts[c] < self.column_counts[best] {
                best = c;
            }
        }
        self.column_counts[best] += 1;
        self.column_cursor = (best + 1) % columns;
        best
    }
}

/// Borrowed, read-only inputs shared by every leaf within one tick
struct StepContext<'a> {
    obstacles: &'a ObstacleRegistry,
    force_params: &'a ForceParams,
    collision_params: &'a CollisionParams,
    config: &'a FieldConfig,
    pointer: &'a PointerState,
    elapsed: f64,
    dt: f32,
}

struct StepOutcome {
    contact: Contact,
    escaped: bool,
}

/// Forces, integration, collision, and stall check for one active leaf
fn step_particle(p: &mut Particle, ctx: &StepContext<'_>, rng: &mut HerbRng) -> StepOutcome {
    let dt = ctx.dt;
    let forces = compute_forces(p, ctx.pointer, ctx.elapsed, ctx.force_params);
    let max_speed = ctx.config.max_speed;

    // Split the step when a leaf would travel further than its own radius,
    // so collision never skips over a thin obstacle edge
    let predicted = (p.velocity + forces.acceleration * dt).length() * dt;
    let radius = p.effective_radius().max(1.0);
    let substeps = ((predicted / radius).ceil() as u32).clamp(1, ctx.config.max_substeps.max(1));
    let h = dt / substeps as f32;

    let obstacles = ctx.obstacles.obstacles();
    let mut contact = Contact::default();
    for _ in 0..substeps {
        p.velocity = (p.velocity + forces.acceleration * h).clamp_length(max_speed);
        p.position += p.velocity * h;
        let c = collision::resolve(p, obstacles, ctx.collision_params, h, rng);
        contact.penetrations += c.penetrations;
        contact.touching |= c.touching;
        contact.deep |= c.deep;
    }
    p.velocity = p.velocity.clamp_length(max_speed);

    p.angular_velocity = (p.angular_velocity + forces.angular * dt).clamp(-MAX_SPIN, MAX_SPIN);
    p.rotation = (p.rotation + p.angular_velocity * dt).rem_euclid(360.0);
    // rem_euclid can round a tiny negative angle up to exactly 360
    if p.rotation >= 360.0 {
        p.rotation = 0.0;
    }

    let escaped = p.stuck.observe(
        p.position,
        contact.touching,
        ctx.config.stuck_epsilon,
        ctx.config.stuck_threshold,
    );
    if escaped {
        collision::apply_escape(p, obstacles, ctx.collision_params, rng);
        p.stuck.reset(p.position);
    }

    StepOutcome { contact, escaped }
}

/// Sample a fresh species and its physical parameters
fn roll_species(p: &mut Particle, config: &FieldConfig, rng: &mut HerbRng) {
    let species_count = config.species_count();
    let species = if species_count > 0 {
        rng.index(species_count)
    } else {
        0
    };
    p.species = species as u32;
    p.mass = config
        .mass_range_by_species
        .get(species)
        .map(|&r| rng.in_range(r))
        .unwrap_or(1.0)
        .max(0.01);
    p.drag = config
        .drag_range_by_species
        .get(species)
        .map(|&r| rng.in_range(r))
        .unwrap_or(0.005)
        .max(0.0);
    p.scale = rng.in_range(config.scale_range).max(0.01);
    p.restitution = rng.in_range(config.restitution_range).clamp(0.0, 1.0);
    p.base_radius = config.herb_radius;

    let amplitude = rng.in_range(config.sway_amplitude_range);
    let speed = rng.in_range(config.sway_speed_range);
    let phase = rng.phase();
    let secondary_phase = rng.phase();
    p.sway = SwayParams::from_primary(amplitude, speed, phase, secondary_phase);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::Obstacle;

    fn field(count: usize) -> ParticleField {
        let config = FieldConfig {
            particle_count: count,
            ..Default::default()
        };
        let mut field = ParticleField::new(config);
        field.initialize(count, Viewport::new(1200.0, 800.0));
        field
    }

    #[test]
    fn initialize_spreads_columns_and_staggers() {
        let field = field(12);
        assert_eq!(field.particles().len(), 12);
        assert_eq!(field.column_populations(), &[2, 2, 2, 2, 2, 2]);
        let cw = field.column_width();
        for p in field.particles() {
            assert_eq!(p.phase, Phase::Pending);
            assert!(p.position.y < 0.0);
            let lo = p.column as f32 * cw;
            assert!(p.position.x >= lo && p.position.x <= lo + cw);
        }
        let delays: Vec<f32> = field.particles().iter().map(|p| p.spawn_delay).collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn pending_activate_after_delay() {
        let mut field = field(4);
        let none = PointerState::inactive();
        field.tick(0.0, &none);
        assert!(field.stats().pending >= 3);
        for _ in 0..120 {
            field.tick(1.0 / 60.0, &none);
        }
        assert_eq!(field.stats().active, 4);
        assert_eq!(field.stats().pending, 0);
    }

    #[test]
    fn recycle_rebalances_columns() {
        let mut field = field(7);
        for i in 0..50 {
            field.recycle(i % 7);
            let pops = field.column_populations();
            let max = *pops.iter().max().unwrap();
            let min = *pops.iter().min().unwrap();
            assert!(max - min <= 1, "{pops:?}");
        }
        assert_eq!(field.stats().recycled, 50);
        assert!(field.particles().iter().all(|p| p.is_active()));
    }

    #[test]
    fn recycle_out_of_range_is_ignored() {
        let mut field = field(2);
        field.recycle(99);
        assert_eq!(field.stats().recycled, 0);
    }

    #[test]
    fn non_finite_particle_is_recycled_locally() {
        let mut field = field(3);
        let none = PointerState::inactive();
        for p in 0..3 {
            field.particle_mut(ParticleId(p)).unwrap().phase = Phase::Active;
        }
        field.particle_mut(ParticleId(1)).unwrap().velocity = Vec2::new(f32::NAN, 0.0);
        field.tick(1.0 / 60.0, &none);
        assert_eq!(field.stats().non_finite_recycles, 1);
        assert!(field.particles().iter().all(|p| p.is_finite()));
    }

    #[test]
    fn huge_delta_is_clamped() {
        let mut field = field(1);
        field.tick(10.0, &PointerState::inactive());
        assert!((field.elapsed() - 0.033).abs() < 1e-6);
        field.tick(f32::NAN, &PointerState::inactive());
        assert!((field.elapsed() - 0.033).abs() < 1e-6);
    }

    #[test]
    fn teardown_stops_ticks() {
        let mut field = field(2);
        field.teardown();
        field.tick(1.0 / 60.0, &PointerState::inactive());
        assert_eq!(field.stats().ticks, 0);
        assert!(field.is_torn_down());
    }

    #[test]
    fn resize_keeps_columns_and_opacity_in_range() {
        let mut field = field(6);
        let none = PointerState::inactive();
        for _ in 0..200 {
            field.tick(1.0 / 60.0, &none);
        }
        let before: Vec<(usize, f32)> = field
            .particles()
            .iter()
            .map(|p| (p.column, p.position.x / 1200.0))
            .collect();
        field.resize(Viewport::new(600.0, 400.0));
        for (p, (column, frac)) in field.particles().iter().zip(before) {
            assert_eq!(p.column, column);
            assert!((p.position.x / 600.0 - frac).abs() < 1e-4);
            assert!((0.0..=1.0).contains(&p.opacity));
        }
    }

    #[test]
    fn huge_column_count_is_clamped() {
        let mut field = ParticleField::new(FieldConfig {
            column_count: usize::MAX / 2,
            ..Default::default()
        });
        field.initialize(5, Viewport::new(1000.0, 800.0));
        assert_eq!(field.column_populations().len(), MAX_PARTICLES);
        assert_eq!(field.column_populations().iter().sum::<usize>(), 5);
        assert!(field.particles().iter().all(|p| p.position.is_finite()));
    }

    #[test]
    fn resize_from_empty_viewport_places_leaves_in_columns() {
        let mut field = ParticleField::new(FieldConfig::default());
        field.initialize(12, Viewport::new(0.0, 0.0));
        assert!(field.particles().iter().all(|p| p.position.x == 0.0));

        field.resize(Viewport::new(1200.0, 800.0));
        let cw = field.column_width();
        assert!((cw - 200.0).abs() < 1e-4);
        for p in field.particles() {
            let lo = p.column as f32 * cw;
            assert!(
                p.position.x > lo && p.position.x < lo + cw,
                "herb {} at x={} outside column {}",
                p.id,
                p.position.x,
                p.column
            );
            assert!(p.position.y < 0.0);
            assert_eq!(p.stuck.last_position(), p.position);
        }
        let distinct: std::collections::BTreeSet<usize> =
            field.particles().iter().map(|p| p.column).collect();
        assert_eq!(distinct.len(), 6);
    }

    #[test]
    fn set_obstacles_replaces_registry() {
        let mut field = field(1);
        field.set_obstacles(vec![Obstacle::circle(Vec2::new(1.0, 1.0), 5.0).into()]);
        assert_eq!(field.obstacles().len(), 1);
        field.set_obstacles(Vec::new());
        assert!(field.obstacles().is_empty());
    }

    #[test]
    fn pack_instances_counts_active_only() {
        let mut field = field(5);
        field.particle_mut(ParticleId(0)).unwrap().phase = Phase::Active;
        field.particle_mut(ParticleId(3)).unwrap().phase = Phase::Active;
        field.pack_instances();
        assert_eq!(field.instance_data().len(), 2);
        assert_eq!(field.transforms().count(), 5);
    }

    #[test]
    fn wrap_moves_leaf_to_other_side() {
        let config = FieldConfig {
            side_exit: SideExit::Wrap,
            gravity_constant: 0.0,
            sway_amplitude_range: (0.0, 0.0),
            ..Default::default()
        };
        let mut field = ParticleField::new(config);
        field.initialize(1, Viewport::new(1000.0, 800.0));
        {
            let p = field.particle_mut(ParticleId(0)).unwrap();
            p.phase = Phase::Active;
            p.position = Vec2::new(1100.0, 400.0);
            p.velocity = Vec2::ZERO;
        }
        field.tick(1.0 / 60.0, &PointerState::inactive());
        let p = field.particle(ParticleId(0)).unwrap();
        assert!(p.position.x < 100.0 && p.position.x > -100.0);
        assert_eq!(field.stats().recycled, 0);
    }
}
