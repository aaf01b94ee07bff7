use std::time::Duration;

use flow_defence_core::{CellCoord, CellType, Command, Event, WalkerExit};
use flow_defence_system_movement::Movement;
use flow_defence_world::{self as world, query, Grid, World, WorldConfig};
use glam::Vec2;

fn world_with_walker(grid: Grid) -> World {
    let mut world = World::new(WorldConfig::default(), grid, Vec::new(), Vec::new());
    let mut events = Vec::new();
    world::apply(&mut world, Command::SpawnWalker { definition: 0 }, &mut events);
    world
}

fn step(world: &mut World, movement: &Movement, dt: Duration) -> (Vec<Command>, Vec<Event>) {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt }, &mut events);

    let mut commands = Vec::new();
    movement.handle(
        &events,
        &query::walker_view(world),
        query::flow_field(world),
        query::transform(world),
        &mut commands,
    );

    events.clear();
    for command in commands.iter().cloned() {
        world::apply(world, command, &mut events);
    }
    (commands, events)
}

fn position(world: &World) -> Vec2 {
    query::walker_view(world)
        .iter()
        .next()
        .map(|walker| walker.position)
        .expect("walker present")
}

#[test]
fn walkers_head_for_the_next_cell_centre() {
    let mut world = world_with_walker(Grid::new(5, 1));
    let movement = Movement::default();

    let (commands, _) = step(&mut world, &movement, Duration::from_millis(100));

    match commands.as_slice() {
        [Command::MoveWalker {
            position,
            cell,
            velocity,
            rotation,
            ..
        }] => {
            assert!((*position - Vec2::new(62.0, 62.0)).length() < 1e-3);
            assert_eq!(*cell, CellCoord::new(0, 0));
            assert!((*velocity - Vec2::new(100.0, 0.0)).length() < 1e-3);
            assert!(rotation.abs() < 1e-6);
        }
        other => panic!("unexpected commands {other:?}"),
    }
}

#[test]
fn large_steps_stop_on_the_cell_centre() {
    let mut world = world_with_walker(Grid::new(5, 1));
    let movement = Movement::default();

    let _ = step(&mut world, &movement, Duration::from_secs(1));

    assert!((position(&world) - Vec2::new(98.0, 62.0)).length() < 1e-3);
}

#[test]
fn arriving_walkers_are_reattributed_and_retarget() {
    let mut world = world_with_walker(Grid::new(5, 1));
    let movement = Movement::default();
    let _ = step(&mut world, &movement, Duration::from_secs(1));

    let (_, events) = step(&mut world, &movement, Duration::from_millis(100));

    assert!(matches!(
        events.as_slice(),
        [Event::WalkerAdvanced { from, to, .. }]
            if *from == CellCoord::new(0, 0) && *to == CellCoord::new(1, 0)
    ));
    assert!((position(&world) - Vec2::new(108.0, 62.0)).length() < 1e-3);
}

#[test]
fn walkers_reaching_the_end_cell_are_removed_as_finished() {
    let mut world = world_with_walker(Grid::new(2, 1));
    let movement = Movement::default();
    let mut removals = Vec::new();

    for _ in 0..5 {
        let (_, events) = step(&mut world, &movement, Duration::from_millis(500));
        removals.extend(events.into_iter().filter_map(|event| match event {
            Event::WalkerRemoved { cell, reason, .. } => Some((cell, reason)),
            _ => None,
        }));
    }

    assert_eq!(
        removals,
        vec![(CellCoord::new(1, 0), WalkerExit::ReachedGoal)]
    );
    assert_eq!(query::walker_count(&world), 0);
}

#[test]
fn walkers_without_a_route_are_stranded() {
    let mut grid = Grid::new(3, 1);
    grid.set_at(1, 0, CellType::WALL);
    let mut world = world_with_walker(grid);
    let movement = Movement::default();

    let (commands, events) = step(&mut world, &movement, Duration::from_millis(16));

    assert!(matches!(commands.as_slice(), [Command::RemoveWalker { .. }]));
    assert!(matches!(
        events.as_slice(),
        [Event::WalkerRemoved {
            reason: WalkerExit::Stranded,
            ..
        }]
    ));
}

#[test]
fn nothing_moves_without_elapsed_time() {
    let world = world_with_walker(Grid::new(5, 1));
    let movement = Movement::default();
    let mut commands = Vec::new();

    movement.handle(
        &[],
        &query::walker_view(&world),
        query::flow_field(&world),
        query::transform(&world),
        &mut commands,
    );

    assert!(commands.is_empty());
}
