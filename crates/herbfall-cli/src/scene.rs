//! Scene file loading
//!
//! A scene is a TOML document with an optional `[viewport]`, an optional
//! `[field]` table of `FieldConfig` keys, and any number of `[[obstacle]]`
//! tables.

use herbfall_core::{HerbfallError, Result, Viewport};
use herbfall_particles::{parse_obstacles, FieldConfig, ObstacleSource};
use std::path::Path;

/// A parsed scene, ready to drive a field
#[derive(Debug, Clone)]
pub struct Scene {
    pub viewport: Viewport,
    pub config: FieldConfig,
    pub obstacles: Vec<ObstacleSource>,
    /// Why each skipped `[[obstacle]]` entry was rejected
    pub skipped: Vec<String>,
}

impl Scene {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self> {
        let doc: toml::Value = toml::from_str(source)?;
        let table = doc
            .as_table()
            .ok_or_else(|| HerbfallError::SceneError("scene must be a TOML table".into()))?;

        let viewport = match table.get("viewport") {
            Some(v) => parse_viewport(v)?,
            None => Viewport::default(),
        };

        let config = match table.get("field") {
            Some(toml::Value::Table(field)) => FieldConfig::from_toml(field),
            Some(_) => {
                return Err(HerbfallError::SceneError("[field] must be a table".into()));
            }
            None => FieldConfig::default(),
        };

        let (obstacles, skipped) = match table.get("obstacle") {
            Some(toml::Value::Array(entries)) => parse_obstacles(entries),
            Some(_) => {
                return Err(HerbfallError::SceneError(
                    "obstacles must be written as [[obstacle]] tables".into(),
                ));
            }
            None => (Vec::new(), Vec::new()),
        };

        Ok(Self {
            viewport,
            config,
            obstacles,
            skipped,
        })
    }
}

fn parse_viewport(value: &toml::Value) -> Result<Viewport> {
    let table = value
        .as_table()
        .ok_or_else(|| HerbfallError::SceneError("[viewport] must be a table".into()))?;
    let dimension = |key: &str| -> Result<f32> {
        let v = table
            .get(key)
            .ok_or_else(|| HerbfallError::MissingRequiredField(format!("viewport.{key}")))?;
        let n = v
            .as_float()
            .or_else(|| v.as_integer().map(|i| i as f64))
            .ok_or_else(|| HerbfallError::ParseError(format!("viewport.{key} must be a number")))?;
        if !n.is_finite() || n < 0.0 {
            return Err(HerbfallError::ValueOutOfRange {
                field: format!("viewport.{key}"),
                min: 0.0,
                max: f64::from(f32::MAX),
                value: n,
            });
        }
        Ok(n as f32)
    };
    Ok(Viewport::new(dimension("width")?, dimension("height")?))
}

/// Starter scene written by `herbfall init`
pub const STARTER_SCENE: &str = r#"# Herbfall scene
# Coordinates are pixels, y grows downward.

[viewport]
width = 1280
height = 800

[field]
particle_count = 30
column_count = 6
interaction_radius = 150
gravity_constant = 90
side_exit = "recycle"
seed = 3735928559

# A round logo near the top of the page
[[obstacle]]
shape = "circle"
center = [640, 260]
radius = 110

# A call-to-action button, placed relative to the viewport
[[obstacle]]
shape = "rectangle"
relative = true
origin = [0.4, 0.62]
width = 0.2
height = 0.06

# A decorative mountain
[[obstacle]]
shape = "triangle"
apex = [1040, 380]
base_left = [920, 560]
base_right = [1160, 560]
"#;
