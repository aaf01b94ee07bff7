use std::time::Duration;

use flow_defence_core::{Command, Event};
use flow_defence_system_spawning::Spawning;
use flow_defence_world::{self as world, query, Grid, World, WorldConfig};

fn tick(dt: Duration) -> [Event; 1] {
    [Event::TimeAdvanced { dt }]
}

fn spawned(commands: &[Command]) -> usize {
    commands
        .iter()
        .filter(|command| matches!(command, Command::SpawnWalker { .. }))
        .count()
}

#[test]
fn releases_one_walker_per_interval() {
    let mut spawning = Spawning::new();
    spawning.start_wave(2, 3, Duration::from_millis(500));
    let mut commands = Vec::new();

    spawning.handle(&tick(Duration::from_millis(400)), &mut commands);
    assert!(commands.is_empty(), "no spawn before full interval");

    spawning.handle(&tick(Duration::from_millis(100)), &mut commands);
    assert_eq!(commands, vec![Command::SpawnWalker { definition: 2 }]);
    assert_eq!(spawning.pending().map(|wave| wave.remaining()), Some(2));
}

#[test]
fn large_time_step_catches_up_on_missed_spawns() {
    let mut spawning = Spawning::new();
    spawning.start_wave(0, 10, Duration::from_millis(500));
    let mut commands = Vec::new();

    spawning.handle(&tick(Duration::from_secs(2)), &mut commands);

    assert_eq!(spawned(&commands), 4, "expected one spawn per elapsed interval");
    assert_eq!(spawning.pending().map(|wave| wave.remaining()), Some(6));
}

#[test]
fn wave_never_releases_more_than_its_count() {
    let mut spawning = Spawning::new();
    spawning.start_wave(0, 3, Duration::from_millis(100));
    let mut commands = Vec::new();

    spawning.handle(&tick(Duration::from_secs(5)), &mut commands);
    spawning.handle(&tick(Duration::from_secs(5)), &mut commands);

    assert_eq!(spawned(&commands), 3);
    assert!(spawning.pending().is_none());
}

#[test]
fn starting_a_wave_overwrites_the_previous_one() {
    let mut spawning = Spawning::new();
    spawning.start_wave(0, 10, Duration::from_millis(100));
    let mut commands = Vec::new();
    spawning.handle(&tick(Duration::from_millis(250)), &mut commands);
    assert_eq!(spawned(&commands), 2);

    spawning.start_wave(1, 1, Duration::from_millis(100));
    commands.clear();
    spawning.handle(&tick(Duration::from_millis(100)), &mut commands);

    assert_eq!(commands, vec![Command::SpawnWalker { definition: 1 }]);
    assert!(spawning.pending().is_none());
}

#[test]
fn events_without_time_do_not_spawn() {
    let mut spawning = Spawning::new();
    spawning.start_wave(0, 2, Duration::from_millis(10));
    let mut commands = Vec::new();

    spawning.handle(&[Event::TowerSelected { tower: None }], &mut commands);

    assert!(commands.is_empty());
}

#[test]
fn spawn_commands_place_walkers_on_the_start_cell() {
    let mut world = World::new(WorldConfig::default(), Grid::new(8, 6), Vec::new(), Vec::new());
    let mut spawning = Spawning::new();
    spawning.start_wave(0, 3, Duration::ZERO);

    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_millis(16),
        },
        &mut events,
    );
    let mut commands = Vec::new();
    spawning.handle(&events, &mut commands);
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    let view = query::walker_view(&world);
    assert_eq!(view.len(), 3);
    assert!(view
        .iter()
        .all(|walker| walker.cell == query::grid(&world).start()));
}
