//! Starter scene command

use crate::scene::STARTER_SCENE;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn run(path: &str, force: bool) -> Result<()> {
    let scene_path = Path::new(path);

    if scene_path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path);
    }

    if let Some(parent) = scene_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create '{}'", parent.display()))?;
        }
    }
    fs::write(scene_path, STARTER_SCENE)
        .with_context(|| format!("Failed to write '{}'", path))?;

    println!("Created scene '{}'", path);
    println!();
    println!("Next steps:");
    println!("  herbfall validate {}", path);
    println!("  herbfall simulate {} --ticks 600", path);

    Ok(())
}
