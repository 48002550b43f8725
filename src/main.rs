//! Clade Overworld - Entry Point
//!
//! Headless driver for the overworld: loads or generates a game, then reads
//! commands from stdin and dispatches them through the session. Level
//! results are typed in by hand in place of the level simulation.

use clade_overworld::core::config::GameConfig;
use clade_overworld::core::error::Result;
use clade_overworld::core::types::SpeciesId;
use clade_overworld::hex::HexKey;
use clade_overworld::level::GameResult;
use clade_overworld::overworld::render_ascii;
use clade_overworld::session::{Clock, FileStore, Session, SystemClock};
use clade_overworld::state::{Action, AppState, PopulationAttempt};

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

type GameSession = Session<FileStore, SystemClock>;

/// Clade Overworld - settle the hex map one level at a time
#[derive(Parser, Debug)]
#[command(name = "clade-overworld")]
#[command(about = "Play the overworld from the terminal")]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the save file
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// World seed for a new game
    #[arg(long)]
    seed: Option<u64>,

    /// Discard any save and start over
    #[arg(long, default_value_t = false)]
    reset: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clade_overworld=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => GameConfig::load_from_toml(path)?,
        None => GameConfig::default(),
    };
    if let Some(dir) = args.save_dir {
        config.session.save_dir = dir;
    }
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }

    let rt = Runtime::new()?;
    let clock = SystemClock::new();
    let store = Arc::new(FileStore::new(&config.session.save_dir));
    let mut session = rt.block_on(Session::start(config, store, clock.clone()))?;
    if args.reset {
        rt.block_on(session.reset())?;
    }

    println!("\n=== CLADE OVERWORLD ===");
    print_help();

    loop {
        display_status(session.state());

        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let words: Vec<&str> = input.split_whitespace().collect();
        let Some((&command, rest)) = words.split_first() else {
            continue;
        };

        match command {
            "quit" | "q" => break,
            "help" | "h" => print_help(),
            "map" | "m" => print!("{}", render_ascii(&session.state().over_world, rest == ["all"])),
            "tile" | "t" => match parse_key(rest) {
                Some(key) => display_tile(session.state(), key),
                None => println!("Usage: tile <i> <j>"),
            },
            "lineage" | "l" => display_lineage(session.state()),
            "level" => match session.state().level_request() {
                Some(request) => println!("{}", serde_json::to_string_pretty(&request)?),
                None => println!("No level in progress."),
            },
            "attempt" | "a" => match parse_attempt(session.state(), rest) {
                Some(attempt) => {
                    session.dispatch(Action::StartPopulationAttempt(attempt))?;
                }
                None => println!("Usage: attempt <ti> <tj> [<si> <sj>]"),
            },
            "win" | "w" => match rest.first().and_then(|s| s.parse().ok()) {
                Some(mp) => {
                    session.dispatch(Action::GetGameResult(GameResult::won(mp)))?;
                }
                None => println!("Usage: win <mutation points per epoch>"),
            },
            "lose" => {
                session.dispatch(Action::GetGameResult(GameResult::lost()))?;
            }
            "done" | "d" => {
                session.dispatch(Action::GameResultDone)?;
            }
            "epoch" | "e" => {
                session.dispatch(Action::TransitionStart(Box::new(Action::NextEpoch)))?;
                run_transitions(&rt, &mut session, &clock)?;
            }
            "gene" | "g" => match (rest.first().and_then(|s| s.parse().ok()), rest.get(1)) {
                (Some(id), Some(gene)) => {
                    session.dispatch(Action::AcquireGene {
                        species: SpeciesId(id),
                        gene: gene.to_string(),
                    })?;
                }
                _ => println!("Usage: gene <species id> <gene>"),
            },
            "speciate" | "s" => match (rest.first().and_then(|s| s.parse().ok()), rest.get(1)) {
                (Some(id), Some(name)) => {
                    session.dispatch(Action::Speciate {
                        parent: SpeciesId(id),
                        name: name.to_string(),
                    })?;
                }
                _ => println!("Usage: speciate <parent id> <name>"),
            },
            "reset" => {
                rt.block_on(session.reset())?;
                println!("Started a new game.");
            }
            _ => println!("Unknown command. Type 'help' for the list."),
        }
    }

    rt.block_on(session.flush());
    println!("\nGoodbye! Reached epoch {}.", session.state().epoch);
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  map / m [all]              - Show the map (all: ignore fog)");
    println!("  tile / t <i> <j>           - Inspect a tile");
    println!("  lineage / l                - Show the species tree");
    println!("  attempt / a <ti> <tj> [<si> <sj>] - Migrate onto a tile");
    println!("  level                      - Show the pending level request");
    println!("  win / w <mp>, lose         - Report the level outcome");
    println!("  done / d                   - Return to the overworld");
    println!("  epoch / e                  - Advance to the next epoch");
    println!("  gene / g <species> <gene>  - Buy an offered gene");
    println!("  speciate / s <parent> <name> - Branch a new species");
    println!("  reset                      - Delete the save and start over");
    println!("  quit / q                   - Exit");
    println!();
}

/// Sleep through pending transitions and fire their timers
fn run_transitions(rt: &Runtime, session: &mut GameSession, clock: &SystemClock) -> Result<()> {
    while let Some(deadline) = session.next_timer() {
        let wait = deadline.saturating_sub(clock.now_ms());
        rt.block_on(tokio::time::sleep(Duration::from_millis(wait)));
        session.poll_timers()?;
    }
    Ok(())
}

fn parse_key(words: &[&str]) -> Option<HexKey> {
    let i = words.first()?.parse().ok()?;
    let j = words.get(1)?.parse().ok()?;
    Some(HexKey::new(i, j))
}

/// Target first, then an optional source; the source's occupant migrates,
/// otherwise the root species does
fn parse_attempt(state: &AppState, words: &[&str]) -> Option<PopulationAttempt> {
    let target = parse_key(words)?;
    let source = if words.len() >= 4 {
        Some(parse_key(&words[2..])?)
    } else {
        None
    };
    let species = source
        .and_then(|key| state.over_world.get(key))
        .and_then(|tile| tile.info.occupant())
        .unwrap_or_else(|| state.lineage.root_id());
    Some(PopulationAttempt::new(source, target, species))
}

fn display_status(state: &AppState) {
    let world = &state.over_world;
    println!();
    println!(
        "--- Epoch {} | Occupied: {} | Unused moves: {} ---",
        state.epoch,
        world.occupied_tiles().count(),
        world.unused_hexes().len()
    );
    if let Some(attempt) = &state.active_population_attempt {
        match attempt.source {
            Some(source) => println!("  Attempt: {} -> {} ({})", source, attempt.target, attempt.species),
            None => println!("  Attempt: first settlement at {} ({})", attempt.target, attempt.species),
        }
    }
    if let Some(result) = &state.active_game_result {
        println!("  Result: {:?} ({} MP/epoch)", result.status, result.mutation_points_per_epoch);
    }
    if state.is_transitioning() {
        println!("  (transition running)");
    }
}

fn display_tile(state: &AppState, key: HexKey) {
    let Some(tile) = state.over_world.get(key) else {
        println!("No tile at {}", key);
        return;
    };
    let info = &tile.info;
    println!("Tile {} (id {:?})", key, tile.id);
    println!("  Height: {}  Visible: {}  Habitable: {}", info.height, info.visible, info.is_habitable());
    if let Some(env) = info.environment {
        println!("  Environment: {}", env.name());
    }
    if let Some(climate) = info.climate {
        println!(
            "  Climate: temperature {:.2}, humidity {:.2}",
            climate.temperature, climate.humidity
        );
    }
    match info.flora {
        Some(flora) => println!(
            "  Flora: {} yielding {} MP/epoch, {} action point(s)",
            flora.species, flora.mutation_points_per_epoch, flora.action_points
        ),
        None => println!("  Flora: none"),
    }

    let targets: Vec<String> = state
        .over_world
        .possible_migration_targets(tile)
        .iter()
        .map(|t| t.key().to_string())
        .collect();
    let sources: Vec<String> = state
        .over_world
        .possible_migration_sources(tile)
        .iter()
        .map(|t| t.key().to_string())
        .collect();
    println!("  Can migrate to: [{}]", targets.join("] ["));
    println!("  Reachable from: [{}]", sources.join("] ["));
}

fn display_lineage(state: &AppState) {
    for id in state.lineage.pre_order() {
        let Some(species) = state.lineage.get(id) else {
            continue;
        };
        let depth = ancestors(state, id);
        println!(
            "{}{} {} - {}/{} MP, genes: {}",
            "  ".repeat(depth),
            species.id,
            species.name,
            species.free_mutation_points,
            species.total_mutation_points,
            species.genome.genes.join(", ")
        );
        for choice in &species.gene_choices {
            println!("{}    offer: {} ({} MP)", "  ".repeat(depth), choice.gene, choice.cost);
        }
    }
}

fn ancestors(state: &AppState, id: SpeciesId) -> usize {
    let mut depth = 0;
    let mut current = state.lineage.get(id).and_then(|s| s.parent);
    while let Some(parent) = current {
        depth += 1;
        current = state.lineage.get(parent).and_then(|s| s.parent);
    }
    depth
}
