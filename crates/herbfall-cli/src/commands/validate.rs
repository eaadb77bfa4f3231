//! Scene validation command

use crate::scene::Scene;
use anyhow::{Context, Result};
use herbfall_particles::Obstacle;

pub struct ValidateArgs {
    pub scene: String,
    pub format: String,
}

/// Findings for one scene file
struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
    obstacles: usize,
    particles: usize,
}

impl Report {
    fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn summary(&self) -> String {
        format!(
            "{} error(s), {} warning(s)",
            self.errors.len(),
            self.warnings.len()
        )
    }
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let scene = Scene::load(&args.scene)
        .with_context(|| format!("Failed to load scene '{}'", args.scene))?;
    let report = check(&scene);

    if args.format == "json" {
        print_report_json(&report)?;
    } else {
        print_report_text(&report);
    }

    if !report.is_valid() {
        std::process::exit(1);
    }
    Ok(())
}

fn check(scene: &Scene) -> Report {
    let mut errors = Vec::new();
    let mut warnings = scene.skipped.clone();

    if let Err(e) = scene.config.validate() {
        errors.push(e.to_string());
    }
    if scene.viewport.is_empty() {
        warnings.push("viewport has zero area; nothing will be visible".into());
    }

    for (i, obstacle) in scene.obstacles.iter().map(|s| &s.obstacle).enumerate() {
        let degenerate = match *obstacle {
            Obstacle::Circle { radius, .. } => radius <= 0.0,
            Obstacle::Rectangle { width, height, .. } => width <= 0.0 || height <= 0.0,
            Obstacle::Triangle {
                apex,
                base_left,
                base_right,
            } => herbfall_particles::geometry::triangle_area2(apex, base_left, base_right).abs()
                <= f32::EPSILON,
        };
        if degenerate {
            warnings.push(format!(
                "obstacle #{i}: {} has no area and will only deflect at its outline",
                obstacle.kind()
            ));
        }
    }

    Report {
        errors,
        warnings,
        obstacles: scene.obstacles.len(),
        particles: scene.config.particle_count,
    }
}

fn print_report_text(report: &Report) {
    if report.is_valid() && report.warnings.is_empty() {
        println!(
            "Scene OK: {} herb(s), {} obstacle(s).",
            report.particles, report.obstacles
        );
        return;
    }

    println!("{}", report.summary());
    println!();
    for error in &report.errors {
        println!("  [ERROR] {error}");
    }
    for warning in &report.warnings {
        println!("  [WARN ] {warning}");
    }
}

fn print_report_json(report: &Report) -> Result<()> {
    let output = serde_json::json!({
        "valid": report.is_valid(),
        "summary": report.summary(),
        "particles": report.particles,
        "obstacles": report.obstacles,
        "errors": report.errors,
        "warnings": report.warnings,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
