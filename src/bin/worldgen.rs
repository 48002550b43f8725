//! World Generator
//! Generates an overworld from a seed and prints its map and terrain stats

use clade_overworld::core::config::GameConfig;
use clade_overworld::level::Environment;
use clade_overworld::overworld::{render_ascii, WorldGenerator};
use clap::Parser;
use std::collections::BTreeMap;

/// Worldgen - preview the overworld for a seed
#[derive(Parser, Debug)]
#[command(name = "worldgen")]
#[command(about = "Generate an overworld and print it")]
struct Args {
    /// Random seed for reproducible maps
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Map width in world units
    #[arg(long, default_value_t = 24.0)]
    width: f64,

    /// Map height in world units
    #[arg(long, default_value_t = 14.0)]
    height: f64,

    /// Optional TOML config for the noise parameters
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Dump the map as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clade_overworld=warn".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => match GameConfig::load_from_toml(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => GameConfig::default(),
    };
    config.world.seed = args.seed;
    config.world.width = args.width;
    config.world.height = args.height;

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    let world = match WorldGenerator::new(config.world.clone()).generate_from_config() {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Generation failed: {}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        let tiles: Vec<_> = world.tiles().values().collect();
        match serde_json::to_string_pretty(&tiles) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to encode map: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!(
        "Seed {} | {}x{} | {} hexes | start {}\n",
        args.seed,
        args.width,
        args.height,
        world.tile_count(),
        world.start_key()
    );
    print!("{}", render_ascii(&world, true));
    println!();

    let mut heights: BTreeMap<i8, usize> = BTreeMap::new();
    let mut environments: BTreeMap<&'static str, usize> = BTreeMap::new();
    for tile in world.tiles().values() {
        *heights.entry(tile.info.height).or_default() += 1;
        let env = tile
            .info
            .environment
            .unwrap_or_else(|| Environment::for_height(tile.info.height));
        *environments.entry(env.name()).or_default() += 1;
    }

    println!("Height distribution:");
    for (height, count) in &heights {
        println!("  {:>2}: {:>4} {}", height, count, "#".repeat(count / 2));
    }
    println!("Environments:");
    for (name, count) in &environments {
        println!("  {}: {}", name, count);
    }
}
