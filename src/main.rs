/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use config::MazeConfig;
use sim::event::MazeEvent;
use sim::step::{self, MoveResult};
use sim::world::WorldState;
use ui::input::{Command, InputState};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Message lifetime, in ticks.
const MESSAGE_TICKS: u32 = 90;

fn main() {
    let config = MazeConfig::load();
    init_logging(&config);
    for w in &config.warnings {
        log::warn!("{w}");
    }

    let mut world = match WorldState::with_settings(&config.maze) {
        Ok(w) => w,
        Err(e) => {
            log::error!("cannot build maze: {e}");
            eprintln!("Cannot build maze: {e}");
            std::process::exit(2);
        }
    };
    log::info!(
        "maze ready: {} blocks per side, {} rows, seed {:?}",
        world.grid.width(), world.grid.height(), config.maze.seed,
    );

    let mut renderer = Renderer::new(config.display.full_view, config.display.show_paths);
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        log::error!("game loop failed: {e}");
        eprintln!("Error: {e}");
    }

    println!();
    println!("Rows advanced: {}  Moves: {}", world.rows_advanced, world.moves);
    println!("Branches grown: {}  pruned: {}", world.branches_spawned, world.branches_pruned);
}

/// `RUST_LOG` wins; otherwise warnings only. With `general.log_file` set,
/// output goes to that file so it does not tear the terminal view.
fn init_logging(config: &MazeConfig) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = &config.log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Cannot open log file {}: {e}", path.display()),
        }
    }
    builder.init();
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &MazeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick_rate = Duration::from_millis(config.display.tick_rate_ms.max(1));
    let mut kb = InputState::new(tick_rate * 6);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();

        match kb.command() {
            Some(Command::Quit) => break,
            Some(Command::Regenerate) => {
                world.regenerate()?;
                world.set_message("New maze", MESSAGE_TICKS);
            }
            Some(Command::ToggleView) => {
                let full = renderer.toggle_view();
                world.set_message(if full { "Full grid" } else { "Window view" }, MESSAGE_TICKS);
            }
            Some(Command::TogglePaths) => {
                let on = renderer.toggle_paths();
                world.set_message(if on { "Paths shown" } else { "Paths hidden" }, MESSAGE_TICKS);
            }
            None => {}
        }

        if let Some(dir) = kb.movement() {
            let result = step::attempt_move(world, dir);
            report_move(world, &result);
        }

        if last_tick.elapsed() >= tick_rate {
            world.tick_message();
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Message line for a rebase; everything else only goes to the log.
fn report_move(world: &mut WorldState, result: &MoveResult) {
    for event in &result.events {
        match event {
            MazeEvent::Rebased { rows_advanced } => {
                world.set_message(&format!("Row {rows_advanced}"), MESSAGE_TICKS);
            }
            MazeEvent::Blocked { dir } => log::trace!("blocked {dir:?}"),
            MazeEvent::BranchesSpawned { count } => log::trace!("{count} branches spawned"),
            MazeEvent::BranchesPruned { count } => log::trace!("{count} branches pruned"),
            MazeEvent::Moved { from, to } => log::trace!("moved {from:?} -> {to:?}"),
        }
    }
}
