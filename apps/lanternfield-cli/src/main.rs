use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lanternfield_common::SceneConfig;
use lanternfield_motion::Population;
use lanternfield_render::{DebugTextRenderer, FrameView, Renderer, lantern_mesh};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lanternfield-cli", about = "Headless tool for the lantern scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scene configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Population seed, overrides the config file
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions, mesh size and population size
    Info,
    /// Evaluate lantern positions and colors at a point in time
    Sample {
        /// Animation time in seconds
        #[arg(short, long, default_value = "0")]
        time: f32,
        /// Number of lanterns to list
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the lantern mesh statistics
    Mesh,
    /// Print the effective configuration as YAML
    Config,
}

#[derive(Serialize)]
struct SampledLantern {
    index: usize,
    position: [f32; 3],
    speed: f32,
    flicker: f32,
}

fn sample_json(population: &Population, time: f32, count: usize) -> serde_json::Result<String> {
    let lanterns = population
        .instances()
        .iter()
        .take(count)
        .enumerate()
        .map(|(index, inst)| SampledLantern {
            index,
            position: inst.displaced(time).to_array(),
            speed: inst.speed,
            flicker: inst.flicker(),
        })
        .collect::<Vec<_>>();
    serde_json::to_string_pretty(&lanterns)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SceneConfig::load_or_default(cli.config.as_deref())
        .context("load scene config")?
        .with_overrides(cli.seed, None)
        .context("apply command-line overrides")?;
    tracing::debug!(config = ?cli.config, "configuration ready");

    match cli.command {
        Commands::Info => {
            let mesh = lantern_mesh();
            let population = Population::from_config(&config.population);
            println!("lanternfield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("motion: {}", lanternfield_motion::crate_info());
            println!("render: {}", lanternfield_render::crate_info());
            println!(
                "mesh: {} vertices, {} indices, {} triangles",
                mesh.vertex_count(),
                mesh.indices.len(),
                mesh.triangle_count()
            );
            println!(
                "population: {} lanterns, seed={}",
                population.len(),
                population.seed()
            );
        }
        Commands::Sample { time, count, json } => {
            tracing::debug!(time, count, json, "sampling lanterns");
            let population = Population::from_config(&config.population);
            if json {
                println!("{}", sample_json(&population, time, count)?);
            } else {
                let view = FrameView {
                    elapsed: time,
                    eye: config.camera.position,
                    target: config.camera.target,
                    fov_degrees: config.camera.fov_degrees,
                };
                let renderer =
                    DebugTextRenderer::new(config.palette, config.render.flame_threshold)
                        .with_limit(count);
                print!("{}", renderer.render(&population, &view));
            }
        }
        Commands::Mesh => {
            let mesh = lantern_mesh();
            tracing::debug!(
                threshold = config.render.flame_threshold,
                "inspecting lantern mesh"
            );
            println!("vertices: {}", mesh.vertex_count());
            println!("triangles: {}", mesh.triangle_count());
            println!("indices: {}", mesh.indices.len());
            if let Some((min, max)) = mesh.y_range() {
                println!("local y: [{min:.3}, {max:.3}]");
            }
            let flame = mesh
                .positions
                .iter()
                .filter(|p| p.y < config.render.flame_threshold)
                .count();
            println!(
                "flame-tinted vertices (y < {}): {flame}",
                config.render.flame_threshold
            );
            // Fails only if the mesh outgrows 16-bit indices.
            mesh.indices_u16()?;
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
