#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Grove Maze experience.

mod headless;
mod level_code;
mod session;

use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use grove_maze_core::{Event, GameConfig, PondGeometry};
use grove_maze_rendering::{Color, Presentation, RenderingBackend, Scene};
use grove_maze_rendering_macroquad::MacroquadBackend;
use grove_maze_system_bootstrap::Bootstrap;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{level_code::LevelCode, session::Session};

/// Walk procedurally generated grove mazes from a border entrance to the exit.
#[derive(Debug, Parser)]
#[command(name = "grove-maze", version)]
struct CliArgs {
    /// Seed of the run; drawn at random when neither this nor the config sets one.
    #[arg(long)]
    seed: Option<u64>,
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the number of grid columns.
    #[arg(long)]
    columns: Option<u32>,
    /// Overrides the number of grid rows.
    #[arg(long)]
    rows: Option<u32>,
    /// Generates levels and prints them instead of opening a window.
    #[arg(long)]
    headless: bool,
    /// Number of consecutive levels generated in headless mode.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    levels: u32,
    /// Starts from the level encoded by a previously printed code.
    #[arg(long)]
    level_code: Option<String>,
    /// Prints the code of every generated level.
    #[arg(long)]
    print_code: bool,
    /// Sprite manifest loaded by the window.
    #[arg(long)]
    sprites: Option<PathBuf>,
    /// Draws primitives only.
    #[arg(long, conflicts_with = "sprites")]
    no_sprites: bool,
    /// Renders as fast as possible instead of waiting for the display refresh.
    #[arg(long)]
    no_vsync: bool,
    /// Enables debug logging unless `RUST_LOG` says otherwise.
    #[arg(long, short)]
    verbose: bool,
}

/// Entry point for the Grove Maze command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    let (config, code) = load_config(&args)?;
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(
        seed,
        columns = config.grid.columns,
        rows = config.grid.rows,
        "configuration loaded"
    );

    if args.headless {
        run_headless(&config, seed, code, args.levels, args.print_code)
    } else {
        run_interactive(&config, seed, code, &args)
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the configuration file, applies command-line overrides and validates the result.
fn load_config(args: &CliArgs) -> Result<(GameConfig, Option<LevelCode>)> {
    let mut config = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read configuration at {}", path.display()))?;
            parse_config(&contents)
                .with_context(|| format!("failed to parse configuration at {}", path.display()))?
        }
        None => GameConfig::default(),
    };

    if let Some(columns) = args.columns {
        config.grid.columns = columns;
    }
    if let Some(rows) = args.rows {
        config.grid.rows = rows;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    let code = args
        .level_code
        .as_deref()
        .map(LevelCode::decode)
        .transpose()
        .context("invalid --level-code")?;
    if let Some(code) = code {
        if (code.columns, code.rows) != (config.grid.columns, config.grid.rows) {
            info!(
                columns = code.columns,
                rows = code.rows,
                "grid resized to match the level code"
            );
        }
        config.grid.columns = code.columns;
        config.grid.rows = code.rows;
    }

    config.validate().context("invalid configuration")?;
    Ok((config, code))
}

fn parse_config(contents: &str) -> Result<GameConfig> {
    toml::from_str(contents).context("configuration is not valid TOML")
}

fn run_headless(
    config: &GameConfig,
    seed: u64,
    code: Option<LevelCode>,
    levels: u32,
    print_code: bool,
) -> Result<()> {
    let mut session = Session::new(config, seed, code)?;
    let _ = session.start();

    let mut failures = 0;
    for index in 0..levels {
        let world = session.world();
        let level = grove_maze_world::query::level(world).context("no level was installed")?;
        let number = grove_maze_world::query::level_number(world);

        println!("Level {number}");
        print!("{}", headless::render_ascii(level));
        println!("{}", headless::describe_report(level.report()));
        if print_code {
            println!("code: {}", LevelCode::of_level(level).encode()?);
        }

        let problems = headless::validate_level(level);
        for problem in &problems {
            error!(number, "{problem}");
        }
        if !problems.is_empty() {
            failures += 1;
        }
        println!();

        if index + 1 < levels {
            let _ = session.skip_level(config.player.transition());
        }
    }

    if failures > 0 {
        bail!("{failures} of {levels} levels failed validation");
    }
    Ok(())
}

fn run_interactive(
    config: &GameConfig,
    seed: u64,
    code: Option<LevelCode>,
    args: &CliArgs,
) -> Result<()> {
    let mut session = Session::new(config, seed, code)?;
    let bootstrap = Bootstrap;
    println!("{}", bootstrap.welcome_banner(session.world()));

    let geometry = PondGeometry::new(config.grid.cell_size, config.ponds.scaled_tile());
    let mut scene = Scene::new(config.grid.columns, config.grid.rows, config.grid.cell_size)?;
    let print_code = args.print_code;
    let events = session.start();
    sync_scene(&mut scene, &session, &bootstrap, &geometry, &events, print_code);

    let manifest = if args.no_sprites {
        None
    } else {
        Some(
            args.sprites
                .clone()
                .unwrap_or_else(|| PathBuf::from("assets/manifest.toml")),
        )
    };
    let backend = MacroquadBackend::new()
        .with_vsync(!args.no_vsync)
        .with_sprite_manifest(manifest)
        .with_player_frames(config.player.animation_frames);
    let presentation = Presentation::new("Grove Maze", Color::from_rgb_u8(24, 36, 20), scene);

    backend.run(presentation, move |dt, input, scene| {
        if input.toggle_debug_overlay {
            scene.debug_overlay = !scene.debug_overlay;
        }
        let events = session.advance(dt, input.intent);
        sync_scene(scene, &session, &bootstrap, &geometry, &events, print_code);
    })
}

/// Mirrors the world into the scene after a batch of events.
fn sync_scene(
    scene: &mut Scene,
    session: &Session,
    bootstrap: &Bootstrap,
    geometry: &PondGeometry,
    events: &[Event],
    print_code: bool,
) {
    let world = session.world();
    let installed = events
        .iter()
        .any(|event| matches!(event, Event::LevelInstalled { .. }));
    if installed {
        match bootstrap.level(world) {
            Some(level) => {
                scene.install_level(level, geometry);
                if print_code {
                    match LevelCode::of_level(level).encode() {
                        Ok(code) => info!(%code, "level code"),
                        Err(error) => warn!(%error, "failed to encode level code"),
                    }
                }
            }
            None => warn!("level installed event without a level"),
        }
    }

    scene.set_player(grove_maze_world::query::player(world));
    scene.hud.level_label = bootstrap.level_label(world);
    scene.hud.message = bootstrap.transition_message(world);
}
