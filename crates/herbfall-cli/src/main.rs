//! Herbfall CLI - headless driver for the falling-herb field

mod commands;
mod scene;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{init, simulate, validate};

#[derive(Parser)]
#[command(name = "herbfall")]
#[command(about = "Falling herb leaves that drift around page obstacles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter scene file
    Init {
        /// Path of the scene file to create
        path: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a scene's field settings and obstacles
    Validate {
        /// Path to scene file
        scene: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,
    },

    /// Run a scene headlessly and report what the herbs did
    Simulate {
        /// Path to scene file
        scene: String,

        /// Number of frames to simulate
        #[arg(long, default_value = "600")]
        ticks: u64,

        /// Frame delta in seconds (clamped by the field's max_delta)
        #[arg(long, default_value = "0.016666668")]
        dt: f64,

        /// Hold the pointer at this position (comma-separated x,y)
        #[arg(long, value_parser = parse_vec2)]
        pointer: Option<[f32; 2]>,

        /// Output format (text or json)
        #[arg(long, default_value = "text", value_parser = parse_format)]
        format: String,

        /// With json output, emit a frame of transforms every N ticks
        #[arg(long, default_value = "60")]
        every: u64,

        /// Override the scene's particle_count
        #[arg(long)]
        particles: Option<usize>,

        /// Override the scene's random seed
        #[arg(long)]
        seed: Option<u32>,
    },
}

fn parse_format(s: &str) -> Result<String, String> {
    match s {
        "text" | "json" => Ok(s.to_string()),
        _ => Err(format!("unknown format '{}'; valid values: text, json", s)),
    }
}

fn parse_vec2(s: &str) -> Result<[f32; 2], String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("expected 2 comma-separated values, got {}", parts.len()));
    }
    let x: f32 = parts[0].trim().parse().map_err(|e| format!("invalid x: {}", e))?;
    let y: f32 = parts[1].trim().parse().map_err(|e| format!("invalid y: {}", e))?;
    if !x.is_finite() || !y.is_finite() {
        return Err("pointer coordinates must be finite".to_string());
    }
    Ok([x, y])
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if cli.verbose > 0 {
        log::set_max_level(match cli.verbose {
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        });
    } else if cli.quiet {
        log::set_max_level(log::LevelFilter::Error);
    }

    match cli.command {
        Commands::Init { path, force } => init::run(&path, force),
        Commands::Validate { scene, format } => {
            validate::run(validate::ValidateArgs { scene, format })
        }
        Commands::Simulate {
            scene,
            ticks,
            dt,
            pointer,
            format,
            every,
            particles,
            seed,
        } => simulate::run(simulate::SimulateArgs {
            scene,
            ticks,
            dt,
            pointer,
            format,
            every,
            particles,
            seed,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec2_parsing() {
        assert_eq!(parse_vec2("500, 500").unwrap(), [500.0, 500.0]);
        assert!(parse_vec2("1,2,3").is_err());
        assert!(parse_vec2("x,2").is_err());
        assert!(parse_vec2("inf,2").is_err());
    }

    #[test]
    fn cli_parses_simulate() {
        let cli = Cli::try_parse_from([
            "herbfall",
            "-vv",
            "simulate",
            "scene.toml",
            "--ticks",
            "30",
            "--pointer",
            "10,20",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Simulate {
                ticks,
                pointer,
                format,
                ..
            } => {
                assert_eq!(ticks, 30);
                assert_eq!(pointer, Some([10.0, 20.0]));
                assert_eq!(format, "json");
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["herbfall", "validate", "s.toml", "--format", "yaml"]).is_err());
    }
}
