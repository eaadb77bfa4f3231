//! Protected screen regions and the registry the host replaces on layout change

use crate::config::{toml_f32, toml_pair};
use crate::geometry::{
    clamp_to_box, closest_point_on_segment, point_in_triangle, triangle_centroid,
};
use herbfall_core::{Vec2, Viewport};
use serde::{Deserialize, Serialize};

/// A static region leaves must not overlap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Obstacle {
    Circle {
        center: Vec2,
        radius: f32,
    },
    Rectangle {
        origin: Vec2,
        width: f32,
        height: f32,
    },
    Triangle {
        apex: Vec2,
        base_left: Vec2,
        base_right: Vec2,
    },
}

impl Obstacle {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Obstacle::Circle {
            center,
            radius: radius.max(0.0),
        }
    }

    pub fn rectangle(origin: Vec2, width: f32, height: f32) -> Self {
        Obstacle::Rectangle {
            origin,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn triangle(apex: Vec2, base_left: Vec2, base_right: Vec2) -> Self {
        Obstacle::Triangle {
            apex,
            base_left,
            base_right,
        }
    }

    /// Whether the point lies inside or on the boundary
    pub fn contains(&self, p: Vec2) -> bool {
        match *self {
            Obstacle::Circle { center, radius } => p.distance(center) <= radius,
            Obstacle::Rectangle {
                origin,
                width,
                height,
            } => {
                p.x >= origin.x
                    && p.x <= origin.x + width
                    && p.y >= origin.y
                    && p.y <= origin.y + height
            }
            Obstacle::Triangle {
                apex,
                base_left,
                base_right,
            } => point_in_triangle(p, apex, base_left, base_right),
        }
    }

    /// Distance from the point to the shape; 0 when inside
    pub fn distance_to(&self, p: Vec2) -> f32 {
        if self.contains(p) {
            return 0.0;
        }
        match *self {
            Obstacle::Circle { center, radius } => (p.distance(center) - radius).max(0.0),
            Obstacle::Rectangle {
                origin,
                width,
                height,
            } => {
                let max = Vec2::new(origin.x + width, origin.y + height);
                p.distance(clamp_to_box(p, origin, max))
            }
            Obstacle::Triangle {
                apex,
                base_left,
                base_right,
            } => [
                (apex, base_left),
                (base_left, base_right),
                (base_right, apex),
            ]
            .iter()
            .map(|&(a, b)| p.distance(closest_point_on_segment(p, a, b)))
            .fold(f32::INFINITY, f32::min),
        }
    }

    /// Geometric centre, used for diagnostics and relayout
    pub fn center(&self) -> Vec2 {
        match *self {
            Obstacle::Circle { center, .. } => center,
            Obstacle::Rectangle {
                origin,
                width,
                height,
            } => origin + Vec2::new(width * 0.5, height * 0.5),
            Obstacle::Triangle {
                apex,
                base_left,
                base_right,
            } => triangle_centroid(apex, base_left, base_right),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Obstacle::Circle { .. } => "circle",
            Obstacle::Rectangle { .. } => "rectangle",
            Obstacle::Triangle { .. } => "triangle",
        }
    }

    fn is_finite(&self) -> bool {
        match *self {
            Obstacle::Circle { center, radius } => center.is_finite() && radius.is_finite(),
            Obstacle::Rectangle {
                origin,
                width,
                height,
            } => origin.is_finite() && width.is_finite() && height.is_finite(),
            Obstacle::Triangle {
                apex,
                base_left,
                base_right,
            } => apex.is_finite() && base_left.is_finite() && base_right.is_finite(),
        }
    }

    /// Map viewport fractions to pixels
    fn to_pixels(self, viewport: Viewport) -> Self {
        let scale = |v: Vec2| Vec2::new(v.x * viewport.width, v.y * viewport.height);
        match self {
            Obstacle::Circle { center, radius } => Obstacle::circle(
                scale(center),
                radius * viewport.width.min(viewport.height),
            ),
            Obstacle::Rectangle {
                origin,
                width,
                height,
            } => Obstacle::rectangle(
                scale(origin),
                width * viewport.width,
                height * viewport.height,
            ),
            Obstacle::Triangle {
                apex,
                base_left,
                base_right,
            } => Obstacle::triangle(scale(apex), scale(base_left), scale(base_right)),
        }
    }

    /// Parse one `[[obstacle]]` table. The error string says why the entry
    /// was skipped.
    pub fn from_toml(table: &toml::value::Table) -> Result<ObstacleSource, String> {
        let shape = table
            .get("shape")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "missing `shape` tag".to_string())?;

        let point = |key: &str| -> Result<Vec2, String> {
            let v = table
                .get(key)
                .ok_or_else(|| format!("{shape}: missing `{key}`"))?;
            let (x, y) = toml_pair(v, (f32::NAN, f32::NAN));
            let p = Vec2::new(x, y);
            if p.is_finite() {
                Ok(p)
            } else {
                Err(format!("{shape}: `{key}` is not a numeric pair"))
            }
        };
        let scalar = |key: &str| -> Result<f32, String> {
            let v = table
                .get(key)
                .ok_or_else(|| format!("{shape}: missing `{key}`"))?;
            let value = toml_f32(v, f32::NAN);
            if value.is_finite() {
                Ok(value)
            } else {
                Err(format!("{shape}: `{key}` is not a number"))
            }
        };

        let obstacle = match shape {
            "circle" => Obstacle::circle(point("center")?, scalar("radius")?),
            "rectangle" | "rect" => {
                Obstacle::rectangle(point("origin")?, scalar("width")?, scalar("height")?)
            }
            "triangle" => {
                Obstacle::triangle(point("apex")?, point("base_left")?, point("base_right")?)
            }
            other => return Err(format!("unrecognized shape `{other}`")),
        };
        debug_assert!(obstacle.is_finite());

        let placement = if table
            .get("relative")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            Placement::ViewportRelative
        } else {
            Placement::Absolute
        };

        Ok(ObstacleSource { obstacle, placement })
    }
}

/// How an obstacle's coordinates are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Pixels
    Absolute,
    /// Fractions of the viewport, recomputed on every resize
    ViewportRelative,
}

/// An obstacle as the host supplied it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleSource {
    pub obstacle: Obstacle,
    pub placement: Placement,
}

impl From<Obstacle> for ObstacleSource {
    fn from(obstacle: Obstacle) -> Self {
        Self {
            obstacle,
            placement: Placement::Absolute,
        }
    }
}

/// Current set of protected regions in pixel space.
///
/// Read by every particle during a tick and replaced wholesale between ticks.
#[derive(Debug, Clone, Default)]
pub struct ObstacleRegistry {
    sources: Vec<ObstacleSource>,
    resolved: Vec<Obstacle>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of pixel-space obstacles
    pub fn from_obstacles(obstacles: Vec<Obstacle>) -> Self {
        let mut registry = Self::new();
        registry.replace(obstacles.into_iter().map(ObstacleSource::from).collect(), Viewport::default());
        registry
    }

    /// Swap in a new obstacle list, resolving relative placements against `viewport`
    pub fn replace(&mut self, sources: Vec<ObstacleSource>, viewport: Viewport) {
        self.sources = sources;
        self.relayout(viewport);
    }

    /// Recompute pixel geometry for a new viewport
    pub fn relayout(&mut self, viewport: Viewport) {
        self.resolved.clear();
        self.resolved.extend(self.sources.iter().map(|s| match s.placement {
            Placement::Absolute => s.obstacle,
            Placement::ViewportRelative => s.obstacle.to_pixels(viewport),
        }));
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.resolved
    }

    pub fn sources(&self) -> &[ObstacleSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Parse an `[[obstacle]]` array, skipping entries that are not usable.
/// Returns the accepted sources and one message per skipped entry.
pub fn parse_obstacles(values: &[toml::Value]) -> (Vec<ObstacleSource>, Vec<String>) {
    let mut accepted = Vec::with_capacity(values.len());
    let mut skipped = Vec::new();
    for (i, value) in values.iter().enumerate() {
        let Some(table) = value.as_table() else {
            skipped.push(format!("obstacle #{i}: not a table"));
            continue;
        };
        match Obstacle::from_toml(table) {
            Ok(source) => accepted.push(source),
            Err(reason) => {
                log::warn!("skipping obstacle #{i}: {reason}");
                skipped.push(format!("obstacle #{i}: {reason}"));
            }
        }
    }
    (accepted, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (Vec<ObstacleSource>, Vec<String>) {
        let table: toml::value::Table = toml::from_str(src).unwrap();
        let values = table
            .get("obstacle")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        parse_obstacles(&values)
    }

    #[test]
    fn parses_all_three_shapes() {
        let (accepted, skipped) = parse(
            r#"
[[obstacle]]
shape = "circle"
center = [400, 300]
radius = 100

[[obstacle]]
shape = "rectangle"
origin = [10.5, 20]
width = 200
height = 80

[[obstacle]]
shape = "triangle"
apex = [400, 100]
base_left = [300, 250]
base_right = [500, 250]
"#,
        );
        assert!(skipped.is_empty());
        assert_eq!(accepted.len(), 3);
        assert_eq!(accepted[0].obstacle.kind(), "circle");
        assert_eq!(
            accepted[1].obstacle,
            Obstacle::rectangle(Vec2::new(10.5, 20.0), 200.0, 80.0)
        );
        assert_eq!(accepted[2].obstacle.kind(), "triangle");
    }

    #[test]
    fn unknown_shape_and_missing_fields_are_skipped() {
        let (accepted, skipped) = parse(
            r#"
[[obstacle]]
shape = "hexagon"
center = [1, 2]

[[obstacle]]
shape = "circle"
radius = 10

[[obstacle]]
shape = "circle"
center = [5, 5]
radius = "big"

[[obstacle]]
shape = "circle"
center = [5, 5]
radius = 10
"#,
        );
        assert_eq!(accepted.len(), 1);
        assert_eq!(skipped.len(), 3);
        assert!(skipped[0].contains("hexagon"));
    }

    #[test]
    fn negative_sizes_clamp_to_zero() {
        let c = Obstacle::circle(Vec2::ZERO, -5.0);
        assert_eq!(c, Obstacle::Circle { center: Vec2::ZERO, radius: 0.0 });
        let r = Obstacle::rectangle(Vec2::ZERO, -1.0, 3.0);
        assert_eq!(r, Obstacle::Rectangle { origin: Vec2::ZERO, width: 0.0, height: 3.0 });
    }

    #[test]
    fn distance_and_containment() {
        let c = Obstacle::circle(Vec2::new(400.0, 300.0), 100.0);
        assert!(c.contains(Vec2::new(400.0, 250.0)));
        assert!((c.distance_to(Vec2::new(400.0, 150.0)) - 50.0).abs() < 1e-4);

        let r = Obstacle::rectangle(Vec2::new(0.0, 0.0), 100.0, 50.0);
        assert_eq!(r.distance_to(Vec2::new(50.0, 25.0)), 0.0);
        assert!((r.distance_to(Vec2::new(103.0, 54.0)) - 5.0).abs() < 1e-4);

        let t = Obstacle::triangle(
            Vec2::new(400.0, 100.0),
            Vec2::new(300.0, 250.0),
            Vec2::new(500.0, 250.0),
        );
        assert!(t.contains(Vec2::new(400.0, 200.0)));
        assert!((t.distance_to(Vec2::new(400.0, 260.0)) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn relative_obstacles_follow_viewport() {
        let mut registry = ObstacleRegistry::new();
        registry.replace(
            vec![ObstacleSource {
                obstacle: Obstacle::circle(Vec2::new(0.5, 0.25), 0.1),
                placement: Placement::ViewportRelative,
            }],
            Viewport::new(1000.0, 800.0),
        );
        assert_eq!(
            registry.obstacles()[0],
            Obstacle::circle(Vec2::new(500.0, 200.0), 80.0)
        );

        registry.relayout(Viewport::new(400.0, 600.0));
        assert_eq!(
            registry.obstacles()[0],
            Obstacle::circle(Vec2::new(200.0, 150.0), 40.0)
        );
    }

    #[test]
    fn absolute_obstacles_ignore_viewport() {
        let mut registry =
            ObstacleRegistry::from_obstacles(vec![Obstacle::circle(Vec2::new(1.0, 2.0), 3.0)]);
        registry.relayout(Viewport::new(10.0, 10.0));
        assert_eq!(registry.obstacles()[0], Obstacle::circle(Vec2::new(1.0, 2.0), 3.0));
    }
}
