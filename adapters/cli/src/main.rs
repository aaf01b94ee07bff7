#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for Flow Defence.
//!
//! `simulate` drives the battleground through the headless backend,
//! `field` prints the flow field of a level and `edit` changes cells of a
//! stored level.

mod field_map;
mod headless;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flow_defence_core::{CellCoord, CellType};
use flow_defence_rendering::{Color, Presentation, RenderingBackend};
use flow_defence_scenes::{App, Battleground, BattlegroundConfig, Editor, Scene};
use flow_defence_world::{query, FlowField, Grid, LevelError};
use tracing_subscriber::EnvFilter;

use headless::HeadlessBackend;

const WINDOW_TITLE: &str = "Flow Defence";

#[derive(Parser, Debug)]
#[command(name = "flow-defence", about = "Flow-field tower defence")]
struct Cli {
    /// Configuration file; defaults are used when it does not exist.
    #[arg(long, global = true, default_value = "flow-defence.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Runs the battleground without a window and reports what happened.
    Simulate(SimulateArgs),
    /// Prints the flow field of a level.
    Field(FieldArgs),
    /// Changes cells of a level and saves it.
    Edit(EditArgs),
}

#[derive(Args, Debug)]
struct SimulateArgs {
    /// Level to load instead of the configured one.
    #[arg(long)]
    level: Option<String>,

    /// Number of frames to simulate.
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Simulated milliseconds per frame.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,

    /// Walkers released by the wave.
    #[arg(long, default_value_t = 10)]
    wave_size: u32,

    /// Milliseconds between two walkers of the wave.
    #[arg(long, default_value_t = 1000)]
    wave_interval_ms: u64,

    /// Walker definition used by the wave.
    #[arg(long, default_value_t = 0)]
    walker: usize,

    /// Tower definition placed by `--tower`.
    #[arg(long, default_value_t = 0)]
    tower_definition: usize,

    /// Cell to place a tower on before the run, as `column,row`. May be repeated.
    #[arg(long = "tower", value_parser = parse_cell)]
    towers: Vec<CellCoord>,
}

#[derive(Args, Debug)]
struct FieldArgs {
    /// Level to print instead of the configured one.
    #[arg(long)]
    level: Option<String>,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Level to edit; a new grid is started when it does not exist.
    level: String,

    /// Cell to turn into a wall, as `column,row`. May be repeated.
    #[arg(long = "wall", value_parser = parse_cell)]
    walls: Vec<CellCoord>,

    /// Cell to turn into a hidden wall, as `column,row`. May be repeated.
    #[arg(long = "hide", value_parser = parse_cell)]
    hidden: Vec<CellCoord>,

    /// Cell to clear, as `column,row`. May be repeated.
    #[arg(long = "clear", value_parser = parse_cell)]
    cleared: Vec<CellCoord>,

    /// New start cell, as `column,row`.
    #[arg(long, value_parser = parse_cell)]
    start: Option<CellCoord>,

    /// New end cell, as `column,row`.
    #[arg(long, value_parser = parse_cell)]
    end: Option<CellCoord>,
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column `{column}`"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row `{row}`"))?;
    Ok(CellCoord::new(column, row))
}

/// Entry point for the Flow Defence command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = BattlegroundConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        CliCommand::Simulate(args) => simulate(config, args),
        CliCommand::Field(args) => print_field(config, args),
        CliCommand::Edit(args) => edit(&config, args),
    }
}

fn simulate(mut config: BattlegroundConfig, args: SimulateArgs) -> Result<()> {
    if args.level.is_some() {
        config.grid.level = args.level;
    }

    let mut battleground = Battleground::new(&config);
    battleground.select_tower_definition(args.tower_definition);
    for cell in args.towers {
        battleground.place_tower(cell);
    }
    battleground.start_wave(
        args.walker,
        args.wave_size,
        Duration::from_millis(args.wave_interval_ms),
    );

    let world_config = config.world_config();
    let presentation = Presentation::new(
        WINDOW_TITLE,
        Color::from_rgba_u8(16, 16, 16, 255),
        world_config.viewport,
    )
    .context("invalid viewport in configuration")?;

    let mut app = App::new(battleground, config.level_store(), world_config.transform);
    HeadlessBackend::new(args.frames, Duration::from_millis(args.dt_ms))
        .run(presentation, |dt, input, frame| app.update(dt, &input, frame))?;

    if let Some(Scene::Battleground(battleground)) = app.current() {
        let stats = battleground.stats();
        let world = battleground.world();
        tracing::info!(
            ticks = query::tick_index(world),
            spawned = stats.spawned,
            killed = stats.killed,
            reached_goal = stats.reached_goal,
            stranded = stats.stranded,
            alive = query::walker_count(world),
            bullets_fired = stats.bullets_fired,
            towers = query::tower_count(world),
            rejected_placements = stats.placements_rejected,
            "simulation finished"
        );
    }
    Ok(())
}

fn print_field(config: BattlegroundConfig, args: FieldArgs) -> Result<()> {
    let grid = match args.level.or_else(|| config.grid.level.clone()) {
        Some(name) => config
            .level_store()
            .load(&name)
            .with_context(|| format!("failed to load level '{name}'"))?,
        None => Grid::new(config.grid.width, config.grid.height),
    };

    let mut field = FlowField::new(config.movement.connectivity);
    field.build(&grid, grid.end());
    print!("{}", field_map::render(&grid, &field));

    let route = field.route(grid.start());
    if field.has_next(grid.start()) || grid.start() == grid.end() {
        println!("route: {} cells", route.len());
    } else {
        println!("route: none");
    }
    Ok(())
}

fn edit(config: &BattlegroundConfig, args: EditArgs) -> Result<()> {
    let mut editor = Editor::new(config.level_store(), config.world_config().transform);
    editor.set_name(args.level.as_str());
    match editor.load() {
        Ok(()) => {}
        Err(LevelError::NotFound { .. }) => {
            tracing::info!(level = %args.level, "starting a new level");
        }
        Err(error) => {
            return Err(error).with_context(|| format!("failed to load level '{}'", args.level));
        }
    }

    let edits = [
        (CellType::WALL, args.walls),
        (CellType::HIDDEN, args.hidden),
        (CellType::EMPTY, args.cleared),
    ];
    for (cell_type, cells) in edits {
        editor.select_type(cell_type);
        for cell in cells {
            if !editor.paint(cell) {
                tracing::warn!(?cell, "ignoring cell outside the grid");
            }
        }
    }
    if let Some(cell) = args.start {
        if !editor.set_start(cell) {
            tracing::warn!(?cell, "ignoring start outside the grid");
        }
    }
    if let Some(cell) = args.end {
        if !editor.set_end(cell) {
            tracing::warn!(?cell, "ignoring end outside the grid");
        }
    }

    editor
        .save()
        .with_context(|| format!("failed to save level '{}'", args.level))?;

    let grid = editor.grid();
    let mut field = FlowField::new(config.movement.connectivity);
    field.build(grid, grid.end());
    if !field.has_next(grid.start()) && grid.start() != grid.end() {
        tracing::warn!(level = %args.level, "start cell has no route to the end cell");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_parse_from_column_row_pairs() {
        assert_eq!(parse_cell("3,4"), Ok(CellCoord::new(3, 4)));
        assert_eq!(parse_cell(" 10 , 0 "), Ok(CellCoord::new(10, 0)));
        assert!(parse_cell("3").is_err());
        assert!(parse_cell("-1,2").is_err());
        assert!(parse_cell("a,b").is_err());
    }

    #[test]
    fn arguments_describe_a_scripted_run() {
        let cli = Cli::try_parse_from([
            "flow-defence",
            "simulate",
            "--frames",
            "10",
            "--tower",
            "3,4",
            "--tower",
            "5,1",
            "--tower-definition",
            "2",
        ])
        .expect("valid arguments");

        match cli.command {
            CliCommand::Simulate(args) => {
                assert_eq!(args.frames, 10);
                assert_eq!(args.towers, vec![CellCoord::new(3, 4), CellCoord::new(5, 1)]);
                assert_eq!(args.dt_ms, 16);
                assert_eq!(args.tower_definition, 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.config, PathBuf::from("flow-defence.toml"));
    }
}
