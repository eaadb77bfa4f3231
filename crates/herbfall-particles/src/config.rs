//! Field configuration (parsed from TOML) and the per-concern parameter views

use herbfall_core::{HerbfallError, Result};

/// Hard cap on the particle pool
pub const MAX_PARTICLES: usize = 10_000;

/// What happens when a leaf drifts past the left or right edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideExit {
    /// Leaves may wander off the side; only the bottom edge recycles
    Open,
    /// Leaves beyond either side by the exit margin are recycled
    Recycle,
    /// Leaves beyond either side reappear on the opposite side
    Wrap,
}

impl SideExit {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(SideExit::Open),
            "recycle" => Some(SideExit::Recycle),
            "wrap" => Some(SideExit::Wrap),
            _ => None,
        }
    }
}

/// Configuration parsed from a `[field]` TOML table
#[derive(Debug, Clone)]
pub struct FieldConfig {
    pub particle_count: usize,
    pub column_count: usize,
    /// Pointer repulsion reach in pixels
    pub interaction_radius: f32,
    /// Downward acceleration per unit mass, px/s²
    pub gravity_constant: f32,
    pub restitution_range: (f32, f32),
    /// Quadratic drag coefficient range, one entry per species
    pub drag_range_by_species: Vec<(f32, f32)>,
    /// Mass range, one entry per species
    pub mass_range_by_species: Vec<(f32, f32)>,
    /// Primary sway acceleration amplitude, px/s²
    pub sway_amplitude_range: (f32, f32),
    /// Primary sway angular frequency, rad/s
    pub sway_speed_range: (f32, f32),
    /// Collision radius of a leaf at scale 1.0
    pub herb_radius: f32,
    pub scale_range: (f32, f32),
    pub pointer_strength: f32,
    /// Angular acceleration per px/s of tangential velocity near the pointer
    pub pointer_spin: f32,
    /// Angular acceleration per px/s² of lateral acceleration
    pub torque_coupling: f32,
    pub angular_damping: f32,
    pub max_acceleration: f32,
    pub max_speed: f32,
    pub max_delta: f32,
    pub max_substeps: u32,
    pub exit_margin: f32,
    pub side_exit: SideExit,
    pub fade_in_band: f32,
    pub fade_out_band: f32,
    pub max_opacity: f32,
    /// Seconds between consecutive initial spawns
    pub spawn_stagger: f32,
    /// Height above the viewport (fraction of viewport height) recycled leaves start within
    pub spawn_band: f32,
    /// Intra-column horizontal jitter as a fraction of column width
    pub column_jitter: f32,
    pub pairwise_separation: bool,
    pub separation_softness: f32,
    pub stuck_epsilon: f32,
    pub stuck_threshold: u32,
    pub escape_speed: f32,
    pub edge_margin: f32,
    pub edge_repulsion: f32,
    pub deep_fraction: f32,
    pub deep_boost: f32,
    pub collision_jitter: f32,
    pub seed: u32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 30,
            column_count: 6,
            interaction_radius: 150.0,
            gravity_constant: 90.0,
            restitution_range: (0.4, 0.8),
            drag_range_by_species: vec![(0.005, 0.007), (0.004, 0.006), (0.003, 0.005)],
            mass_range_by_species: vec![(0.8, 1.0), (1.0, 1.2), (1.2, 1.5)],
            sway_amplitude_range: (20.0, 60.0),
            sway_speed_range: (0.6, 1.8),
            herb_radius: 14.0,
            scale_range: (0.7, 1.2),
            pointer_strength: 2400.0,
            pointer_spin: 1.5,
            torque_coupling: 0.8,
            angular_damping: 1.5,
            max_acceleration: 5000.0,
            max_speed: 900.0,
            max_delta: 0.033,
            max_substeps: 4,
            exit_margin: 40.0,
            side_exit: SideExit::Recycle,
            fade_in_band: 0.08,
            fade_out_band: 0.12,
            max_opacity: 0.95,
            spawn_stagger: 0.25,
            spawn_band: 0.5,
            column_jitter: 0.35,
            pairwise_separation: false,
            separation_softness: 0.5,
            stuck_epsilon: 0.5,
            stuck_threshold: 30,
            escape_speed: 120.0,
            edge_margin: 12.0,
            edge_repulsion: 600.0,
            deep_fraction: 0.5,
            deep_boost: 2.5,
            collision_jitter: 8.0,
            seed: 0xDEAD_BEEF,
        }
    }
}

impl FieldConfig {
    /// Parse a FieldConfig from a TOML table. Missing or mistyped keys keep
    /// their defaults.
    pub fn from_toml(table: &toml::value::Table) -> Self {
        let mut config = Self::default();

        if let Some(v) = table.get("particle_count") {
            config.particle_count = toml_usize(v, config.particle_count).min(MAX_PARTICLES);
        }
        if let Some(v) = table.get("column_count") {
            config.column_count = toml_usize(v, config.column_count);
        }
        if let Some(v) = table.get("interaction_radius") {
            config.interaction_radius = toml_f32(v, config.interaction_radius);
        }
        if let Some(v) = table.get("gravity_constant") {
            config.gravity_constant = toml_f32(v, config.gravity_constant);
        }
        if let Some(v) = table.get("restitution_range") {
            config.restitution_range = toml_pair(v, config.restitution_range);
        }
        if let Some(v) = table.get("drag_range_by_species") {
            if let Some(pairs) = toml_pairs(v) {
                config.drag_range_by_species = pairs;
            }
        }
        if let Some(v) = table.get("mass_range_by_species") {
            if let Some(pairs) = toml_pairs(v) {
                config.mass_range_by_species = pairs;
            }
        }
        if let Some(v) = table.get("sway_amplitude_range") {
            config.sway_amplitude_range = toml_pair(v, config.sway_amplitude_range);
        }
        if let Some(v) = table.get("sway_speed_range") {
            config.sway_speed_range = toml_pair(v, config.sway_speed_range);
        }
        if let Some(v) = table.get("herb_radius") {
            config.herb_radius = toml_f32(v, config.herb_radius);
        }
        if let Some(v) = table.get("scale_range") {
            config.scale_range = toml_pair(v, config.scale_range);
        }
        if let Some(v) = table.get("pointer_strength") {
            config.pointer_strength = toml_f32(v, config.pointer_strength);
        }
        if let Some(v) = table.get("pointer_spin") {
            config.pointer_spin = toml_f32(v, config.pointer_spin);
        }
        if let Some(v) = table.get("torque_coupling") {
            config.torque_coupling = toml_f32(v, config.torque_coupling);
        }
        if let Some(v) = table.get("angular_damping") {
            config.angular_damping = toml_f32(v, config.angular_damping);
        }
        if let Some(v) = table.get("max_acceleration") {
            config.max_acceleration = toml_f32(v, config.max_acceleration);
        }
        if let Some(v) = table.get("max_speed") {
            config.max_speed = toml_f32(v, config.max_speed);
        }
        if let Some(v) = table.get("max_delta") {
            config.max_delta = toml_f32(v, config.max_delta);
        }
        if let Some(v) = table.get("max_substeps") {
            config.max_substeps = toml_usize(v, config.max_substeps as usize).clamp(1, 16) as u32;
        }
        if let Some(v) = table.get("exit_margin") {
            config.exit_margin = toml_f32(v, config.exit_margin);
        }
        if let Some(v) = table.get("side_exit") {
            if let Some(mode) = v.as_str().and_then(SideExit::parse) {
                config.side_exit = mode;
            }
        }
        if let Some(v) = table.get("fade_in_band") {
            config.fade_in_band = toml_f32(v, config.fade_in_band);
        }
        if let Some(v) = table.get("fade_out_band") {
            config.fade_out_band = toml_f32(v, config.fade_out_band);
        }
        if let Some(v) = table.get("max_opacity") {
            config.max_opacity = toml_f32(v, config.max_opacity);
        }
        if let Some(v) = table.get("spawn_stagger") {
            config.spawn_stagger = toml_f32(v, config.spawn_stagger);
        }
        if let Some(v) = table.get("spawn_band") {
            config.spawn_band = toml_f32(v, config.spawn_band);
        }
        if let Some(v) = table.get("column_jitter") {
            config.column_jitter = toml_f32(v, config.column_jitter);
        }
        if let Some(v) = table.get("pairwise_separation") {
            config.pairwise_separation = v.as_bool().unwrap_or(config.pairwise_separation);
        }
        if let Some(v) = table.get("separation_softness") {
            config.separation_softness = toml_f32(v, config.separation_softness);
        }
        if let Some(v) = table.get("stuck_epsilon") {
            config.stuck_epsilon = toml_f32(v, config.stuck_epsilon);
        }
        if let Some(v) = table.get("stuck_threshold") {
            config.stuck_threshold = toml_u32(v, config.stuck_threshold);
        }
        if let Some(v) = table.get("escape_speed") {
            config.escape_speed = toml_f32(v, config.escape_speed);
        }
        if let Some(v) = table.get("edge_margin") {
            config.edge_margin = toml_f32(v, config.edge_margin);
        }
        if let Some(v) = table.get("edge_repulsion") {
            config.edge_repulsion = toml_f32(v, config.edge_repulsion);
        }
        if let Some(v) = table.get("deep_fraction") {
            config.deep_fraction = toml_f32(v, config.deep_fraction);
        }
        if let Some(v) = table.get("deep_boost") {
            config.deep_boost = toml_f32(v, config.deep_boost);
        }
        if let Some(v) = table.get("collision_jitter") {
            config.collision_jitter = toml_f32(v, config.collision_jitter);
        }
        if let Some(v) = table.get("seed") {
            config.seed = toml_u32(v, config.seed);
        }

        config
    }

    /// Parse from a TOML document whose top level is the field table
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let table: toml::value::Table = toml::from_str(source)?;
        Ok(Self::from_toml(&table))
    }

    /// Number of species, i.e. the length of the per-species tables
    pub fn species_count(&self) -> usize {
        self.mass_range_by_species
            .len()
            .min(self.drag_range_by_species.len())
    }

    /// Check settings that would make the simulation meaningless or unstable
    pub fn validate(&self) -> Result<()> {
        if self.particle_count > MAX_PARTICLES {
            return Err(out_of_range(
                "particle_count",
                0.0,
                MAX_PARTICLES as f64,
                self.particle_count as f64,
            ));
        }
        if self.column_count == 0 {
            return Err(HerbfallError::ValidationError(
                "column_count must be at least 1".into(),
            ));
        }
        if self.column_count > MAX_PARTICLES {
            return Err(out_of_range(
                "column_count",
                1.0,
                MAX_PARTICLES as f64,
                self.column_count as f64,
            ));
        }
        if self.mass_range_by_species.is_empty() {
            return Err(HerbfallError::ValidationError(
                "mass_range_by_species must list at least one species".into(),
            ));
        }
        if self.mass_range_by_species.len() != self.drag_range_by_species.len() {
            return Err(HerbfallError::ValidationError(format!(
                "mass_range_by_species has {} species but drag_range_by_species has {}",
                self.mass_range_by_species.len(),
                self.drag_range_by_species.len()
            )));
        }
        for (i, &(lo, hi)) in self.mass_range_by_species.iter().enumerate() {
            check_range(&format!("mass_range_by_species[{i}]"), (lo, hi), f32::MIN_POSITIVE, f32::MAX)?;
        }
        for (i, &(lo, hi)) in self.drag_range_by_species.iter().enumerate() {
            check_range(&format!("drag_range_by_species[{i}]"), (lo, hi), 0.0, f32::MAX)?;
        }
        check_range("restitution_range", self.restitution_range, 0.0, 1.0)?;
        check_range("sway_amplitude_range", self.sway_amplitude_range, 0.0, f32::MAX)?;
        check_range("sway_speed_range", self.sway_speed_range, 0.0, f32::MAX)?;
        check_range("scale_range", self.scale_range, f32::MIN_POSITIVE, f32::MAX)?;
        check_value("herb_radius", self.herb_radius, 0.0, f32::MAX)?;
        check_value("interaction_radius", self.interaction_radius, 0.0, f32::MAX)?;
        check_value("max_delta", self.max_delta, f32::MIN_POSITIVE, 1.0)?;
        check_value("max_speed", self.max_speed, f32::MIN_POSITIVE, f32::MAX)?;
        check_value("max_acceleration", self.max_acceleration, f32::MIN_POSITIVE, f32::MAX)?;
        check_value("fade_in_band", self.fade_in_band, 0.0, 1.0)?;
        check_value("fade_out_band", self.fade_out_band, 0.0, 1.0)?;
        check_value("max_opacity", self.max_opacity, 0.0, 1.0)?;
        check_value("column_jitter", self.column_jitter, 0.0, 0.5)?;
        check_value("separation_softness", self.separation_softness, 0.0, 1.0)?;
        check_value("deep_fraction", self.deep_fraction, 0.0, 1.0)?;
        check_value("stuck_epsilon", self.stuck_epsilon, 0.0, f32::MAX)?;
        check_value("escape_speed", self.escape_speed, 0.0, f32::MAX)?;
        Ok(())
    }

    pub fn force_params(&self) -> ForceParams {
        ForceParams {
            gravity: self.gravity_constant,
            interaction_radius: self.interaction_radius,
            pointer_strength: self.pointer_strength,
            pointer_spin: self.pointer_spin,
            torque_coupling: self.torque_coupling,
            angular_damping: self.angular_damping,
            max_acceleration: self.max_acceleration,
        }
    }

    pub fn collision_params(&self) -> CollisionParams {
        CollisionParams {
            edge_margin: self.edge_margin.max(0.0),
            edge_repulsion: self.edge_repulsion,
            deep_fraction: self.deep_fraction,
            deep_boost: self.deep_boost,
            escape_speed: self.escape_speed,
            jitter: self.collision_jitter.max(0.0),
            separation_softness: self.separation_softness,
        }
    }
}

/// The force-model slice of the configuration
#[derive(Debug, Clone, Copy)]
pub struct ForceParams {
    pub gravity: f32,
    pub interaction_radius: f32,
    pub pointer_strength: f32,
    pub pointer_spin: f32,
    pub torque_coupling: f32,
    pub angular_damping: f32,
    pub max_acceleration: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        FieldConfig::default().force_params()
    }
}

/// The collision-resolver slice of the configuration
#[derive(Debug, Clone, Copy)]
pub struct CollisionParams {
    /// Distance outside a triangle edge where soft repulsion starts
    pub edge_margin: f32,
    /// Outward acceleration at the edge of the margin band, px/s²
    pub edge_repulsion: f32,
    /// Fraction of the inradius beyond which a leaf counts as deep inside
    pub deep_fraction: f32,
    /// Escape impulse multiplier for deep penetration
    pub deep_boost: f32,
    pub escape_speed: f32,
    /// Tangential velocity jitter added on bounce, px/s
    pub jitter: f32,
    pub separation_softness: f32,
}

impl Default for CollisionParams {
    fn default() -> Self {
        FieldConfig::default().collision_params()
    }
}

fn out_of_range(field: &str, min: f64, max: f64, value: f64) -> HerbfallError {
    HerbfallError::ValueOutOfRange {
        field: field.to_string(),
        min,
        max,
        value,
    }
}

fn check_value(field: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(out_of_range(field, min as f64, max as f64, value as f64));
    }
    Ok(())
}

fn check_range(field: &str, (lo, hi): (f32, f32), min: f32, max: f32) -> Result<()> {
    check_value(field, lo, min, max)?;
    check_value(field, hi, min, max)?;
    if lo > hi {
        return Err(HerbfallError::ValidationError(format!(
            "{field}: lower bound {lo} exceeds upper bound {hi}"
        )));
    }
    Ok(())
}

// ── TOML helpers (handle integer/float coercion) ──

pub(crate) fn toml_f32(v: &toml::Value, default: f32) -> f32 {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .unwrap_or(default)
}

fn toml_usize(v: &toml::Value, default: usize) -> usize {
    v.as_integer()
        .map(|i| i.max(0) as usize)
        .unwrap_or(default)
}

/// Integers outside the u32 range keep the default instead of wrapping
fn toml_u32(v: &toml::Value, default: u32) -> u32 {
    v.as_integer()
        .and_then(|i| u32::try_from(i).ok())
        .unwrap_or(default)
}

pub(crate) fn toml_pair(v: &toml::Value, default: (f32, f32)) -> (f32, f32) {
    if let Some(arr) = v.as_array() {
        if arr.len() >= 2 {
            return (toml_f32(&arr[0], default.0), toml_f32(&arr[1], default.1));
        }
    }
    default
}

fn toml_pairs(v: &toml::Value) -> Option<Vec<(f32, f32)>> {
    let arr = v.as_array()?;
    let pairs: Vec<(f32, f32)> = arr
        .iter()
        .filter_map(|item| {
            let inner = item.as_array()?;
            if inner.len() < 2 {
                return None;
            }
            Some((toml_f32(&inner[0], f32::NAN), toml_f32(&inner[1], f32::NAN)))
        })
        .collect();
    Some(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = FieldConfig::default();
        config.validate().unwrap();
        assert_eq!(config.species_count(), 3);
        assert!(config.particle_count >= config.column_count);
    }

    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
particle_count = 40
column_count = 8
interaction_radius = 200
gravity_constant = 120.5
restitution_range = [0.5, 0.7]
mass_range_by_species = [[1, 2], [2, 3]]
drag_range_by_species = [[0.004, 0.005], [0.003, 0.004]]
side_exit = "wrap"
pairwise_separation = true
"#;
        let config = FieldConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.particle_count, 40);
        assert_eq!(config.column_count, 8);
        assert!((config.interaction_radius - 200.0).abs() < 0.01);
        assert!((config.gravity_constant - 120.5).abs() < 0.01);
        assert_eq!(config.restitution_range, (0.5, 0.7));
        assert_eq!(config.species_count(), 2);
        assert_eq!(config.mass_range_by_species[1], (2.0, 3.0));
        assert_eq!(config.side_exit, SideExit::Wrap);
        assert!(config.pairwise_separation);
        config.validate().unwrap();
    }

    #[test]
    fn unknown_side_exit_keeps_default() {
        let config = FieldConfig::from_toml_str("side_exit = \"bounce\"").unwrap();
        assert_eq!(config.side_exit, SideExit::Recycle);
    }

    #[test]
    fn particle_count_is_capped() {
        let config = FieldConfig::from_toml_str("particle_count = 50000").unwrap();
        assert_eq!(config.particle_count, MAX_PARTICLES);
    }

    #[test]
    fn validate_rejects_bad_restitution() {
        let config = FieldConfig {
            restitution_range: (0.4, 1.5),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, HerbfallError::ValueOutOfRange { .. }));
    }

    #[test]
    fn validate_rejects_non_positive_mass() {
        let config = FieldConfig {
            mass_range_by_species: vec![(0.0, 1.0), (1.0, 1.2), (1.2, 1.5)],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_mismatched_species_tables() {
        let config = FieldConfig {
            drag_range_by_species: vec![(0.004, 0.006)],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, HerbfallError::ValidationError(_)));
    }

    #[test]
    fn validate_rejects_zero_columns() {
        let config = FieldConfig {
            column_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_absurd_column_count() {
        let config = FieldConfig::from_toml_str("column_count = 4611686018427387904").unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, HerbfallError::ValueOutOfRange { .. }));

        let config = FieldConfig {
            column_count: MAX_PARTICLES,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn out_of_range_integers_keep_defaults() {
        let config = FieldConfig::from_toml_str(
            "stuck_threshold = 4294967296\nseed = -1",
        )
        .unwrap();
        let defaults = FieldConfig::default();
        assert_eq!(config.stuck_threshold, defaults.stuck_threshold);
        assert_eq!(config.seed, defaults.seed);

        let config = FieldConfig::from_toml_str("stuck_threshold = 12\nseed = 4294967295").unwrap();
        assert_eq!(config.stuck_threshold, 12);
        assert_eq!(config.seed, u32::MAX);
    }

    #[test]
    fn malformed_species_entry_fails_validation() {
        let config =
            FieldConfig::from_toml_str("mass_range_by_species = [[1, \"heavy\"], [1, 2], [2, 3]]")
                .unwrap();
        assert!(config.validate().is_err());
    }
}
