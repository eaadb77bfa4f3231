//! Headless simulation command

use crate::scene::Scene;
use anyhow::{Context, Result};
use herbfall_particles::HerbfallSystem;
use herbfall_runtime::{FrameClock, RuntimeSystem};

pub struct SimulateArgs {
    pub scene: String,
    pub ticks: u64,
    pub dt: f64,
    pub pointer: Option<[f32; 2]>,
    pub format: String,
    pub every: u64,
    pub particles: Option<usize>,
    pub seed: Option<u32>,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let scene = Scene::load(&args.scene)
        .with_context(|| format!("Failed to load scene '{}'", args.scene))?;
    for reason in &scene.skipped {
        log::warn!("{reason}");
    }

    let mut config = scene.config;
    if let Some(count) = args.particles {
        config.particle_count = count;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let max_delta = f64::from(config.max_delta);

    let mut system = HerbfallSystem::new(config);
    system.field.set_obstacles(scene.obstacles);
    system.initialize(scene.viewport)?;

    let pointer = system.pointer();
    if let Some([x, y]) = args.pointer {
        pointer.process_move(x, y);
    }

    let json = args.format == "json";
    let every = args.every.max(1);
    let mut clock = FrameClock::with_max_delta(max_delta);

    for tick in 1..=args.ticks {
        let dt = clock.advance(args.dt);
        system.update(dt)?;
        if json && tick % every == 0 {
            print_frame_json(&system, tick)?;
        }
    }
    pointer.process_leave();
    system.shutdown()?;

    if json {
        println!(
            "{}",
            serde_json::to_string(&serde_json::json!({ "stats": system.field.stats() }))?
        );
    } else {
        print_summary(&system, clock.total_time);
    }
    Ok(())
}

fn print_frame_json(system: &HerbfallSystem, tick: u64) -> Result<()> {
    let herbs: Vec<_> = system.field.transforms().collect();
    let frame = serde_json::json!({
        "tick": tick,
        "elapsed": system.field.elapsed(),
        "herbs": herbs,
    });
    println!("{}", serde_json::to_string(&frame)?);
    Ok(())
}

fn print_summary(system: &HerbfallSystem, simulated: f64) {
    let field = &system.field;
    let stats = field.stats();
    let viewport = field.viewport();

    println!("Simulated {} tick(s), {simulated:.2}s", stats.ticks);
    println!("  Viewport:   {}x{}", viewport.width, viewport.height);
    println!("  Obstacles:  {}", field.obstacles().len());
    println!("  Active:     {}", stats.active);
    println!("  Pending:    {}", stats.pending);
    println!("  Recycled:   {}", stats.recycled);
    println!("  Escapes:    {}", stats.escapes);
    if stats.non_finite_recycles > 0 {
        println!("  Non-finite: {}", stats.non_finite_recycles);
    }
    println!("  Contacts:   {} (last tick)", stats.contacts);

    let populations: Vec<String> = field
        .column_populations()
        .iter()
        .map(|n| n.to_string())
        .collect();
    println!("  Columns:    [{}]", populations.join(", "));

    let visible = field.particles().iter().filter(|p| p.opacity > 0.0).count();
    println!("  Visible:    {visible}");
}
