use std::time::Duration;

use flow_defence_core::{
    CellCoord, CellType, Event, EventStream, EventType, PlacementError, ScreenTransform,
    TowerDefinition, TowerId, WalkerDefinition, WalkerExit,
};
use flow_defence_rendering::FrameInput;
use flow_defence_scenes::{Battleground, BattlegroundConfig};
use flow_defence_world::{query, Grid};

const STEP: Duration = Duration::from_millis(20);

fn battleground(
    grid: Grid,
    walkers: Vec<WalkerDefinition>,
    towers: Vec<TowerDefinition>,
) -> Battleground {
    Battleground::from_grid(&BattlegroundConfig::default(), grid, walkers, towers)
}

fn click(kind: EventType, cell: CellCoord) -> FrameInput {
    let mut events = EventStream::new();
    events.add(kind);
    FrameInput {
        pointer: Some(ScreenTransform::default().to_screen(cell)),
        events,
    }
}

fn run(battleground: &mut Battleground, ticks: usize) -> Vec<Event> {
    let mut log = Vec::new();
    for _ in 0..ticks {
        battleground.tick(STEP, &FrameInput::default());
        log.extend_from_slice(battleground.events());
    }
    log
}

fn armed_battleground() -> Battleground {
    let slow_walker = WalkerDefinition {
        speed: 1.0,
        energy: 10.0,
        ..WalkerDefinition::default()
    };
    let tower = TowerDefinition {
        energy: 10.0,
        fire_interval: Duration::from_millis(300),
        radius: 200.0,
        ..TowerDefinition::default()
    };
    let mut battleground = battleground(Grid::new(20, 14), vec![slow_walker], vec![tower]);

    battleground.place_tower(CellCoord::new(1, 1));
    assert!(battleground.events().iter().any(|event| matches!(
        event,
        Event::TowerPlaced { tower, .. } if *tower == TowerId::new(0)
    )));
    battleground.start_walker(0);
    battleground
}

fn walker_energy(battleground: &Battleground) -> Option<f32> {
    query::walker_view(battleground.world())
        .iter()
        .next()
        .map(|walker| walker.energy)
}

#[test]
fn tower_kills_a_walker_after_one_fire_interval() {
    let mut battleground = armed_battleground();

    battleground.tick(Duration::from_millis(280), &FrameInput::default());
    assert!(!battleground
        .events()
        .iter()
        .any(|event| matches!(event, Event::BulletFired { .. })));
    assert_eq!(walker_energy(&battleground), Some(10.0));

    battleground.tick(STEP, &FrameInput::default());
    assert!(battleground
        .events()
        .iter()
        .any(|event| matches!(event, Event::BulletFired { .. })));

    // The walker is about 65 px away, so the shot lands within 8 frames.
    let log = run(&mut battleground, 8);
    assert!(log.iter().any(|event| matches!(
        event,
        Event::WalkerHit { remaining_energy, .. } if *remaining_energy <= 0.0
    )));
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::WalkerKilled { .. })));

    let stats = battleground.stats();
    assert_eq!(stats.spawned, 1);
    assert_eq!(stats.killed, 1);
    assert_eq!(stats.bullets_fired, 1);
    assert_eq!(stats.towers_placed, 1);
    assert_eq!(query::walker_count(battleground.world()), 0);
}

#[test]
fn frame_as_long_as_the_fire_interval_still_lands_the_shot() {
    let mut battleground = armed_battleground();

    battleground.tick(Duration::from_millis(300), &FrameInput::default());

    assert!(battleground
        .events()
        .iter()
        .any(|event| matches!(event, Event::WalkerKilled { .. })));
    assert_eq!(query::walker_count(battleground.world()), 0);
    assert_eq!(query::bullet_count(battleground.world()), 0);
}

#[test]
fn wave_catches_up_on_long_frames() {
    let mut battleground = battleground(Grid::new(20, 14), Vec::new(), Vec::new());
    battleground.start_wave(0, 5, Duration::from_millis(100));

    battleground.tick(Duration::from_millis(250), &FrameInput::default());
    assert_eq!(battleground.stats().spawned, 2);
    assert_eq!(battleground.spawning().pending().map(|wave| wave.remaining()), Some(3));

    battleground.tick(Duration::from_millis(250), &FrameInput::default());
    assert_eq!(battleground.stats().spawned, 5);
    assert!(battleground.spawning().pending().is_none());
    assert_eq!(query::walker_count(battleground.world()), 5);
}

#[test]
fn walker_without_a_route_is_stranded() {
    let mut grid = Grid::new(5, 1);
    grid.set(CellCoord::new(2, 0), CellType::WALL);
    let mut battleground = battleground(grid, Vec::new(), Vec::new());

    battleground.start_walker(0);
    let log = run(&mut battleground, 1);

    assert!(log.iter().any(|event| matches!(
        event,
        Event::WalkerRemoved {
            reason: WalkerExit::Stranded,
            ..
        }
    )));
    assert_eq!(battleground.stats().stranded, 1);
    assert_eq!(query::walker_count(battleground.world()), 0);
}

#[test]
fn fast_walker_reaches_the_goal() {
    let fast = WalkerDefinition {
        speed: 1000.0,
        ..WalkerDefinition::default()
    };
    let mut battleground = battleground(Grid::new(3, 1), vec![fast], Vec::new());

    battleground.start_walker(0);
    let _ = run(&mut battleground, 20);

    let stats = battleground.stats();
    assert_eq!(stats.reached_goal, 1);
    assert_eq!(stats.stranded, 0);
    assert_eq!(query::walker_count(battleground.world()), 0);
}

#[test]
fn click_that_would_seal_the_route_is_rejected() {
    let mut battleground = battleground(Grid::new(3, 1), Vec::new(), Vec::new());
    let cell = CellCoord::new(1, 0);

    battleground.tick(STEP, &click(EventType::LEFT_BUTTON_CLICKED, cell));

    assert!(battleground.events().contains(&Event::TowerPlacementRejected {
        cell,
        reason: PlacementError::BlocksPath,
    }));
    assert_eq!(battleground.stats().placements_rejected, 1);
    assert_eq!(query::tower_count(battleground.world()), 0);
    assert_eq!(query::grid(battleground.world()).get(cell), Some(CellType::EMPTY));
    assert_eq!(query::path(battleground.world()).len(), 3);
}

#[test]
fn clicks_place_and_select_towers() {
    let mut battleground = battleground(Grid::new(20, 14), Vec::new(), Vec::new());
    let cell = CellCoord::new(4, 4);

    battleground.tick(STEP, &click(EventType::LEFT_BUTTON_CLICKED, cell));
    assert_eq!(query::tower_at(battleground.world(), cell), Some(TowerId::new(0)));

    battleground.tick(STEP, &click(EventType::RIGHT_BUTTON_CLICKED, cell));
    assert_eq!(query::selected_tower(battleground.world()), Some(TowerId::new(0)));
    assert!(battleground
        .gui()
        .lines
        .iter()
        .any(|line| line == "Selected tower: 0"));
}

#[test]
fn render_draws_tiles_arrows_and_the_walker_count() {
    let mut battleground = battleground(Grid::new(20, 14), Vec::new(), Vec::new());
    let mut draws = Vec::new();

    battleground.render(&mut draws);
    assert_eq!(draws.len(), 280 + 279 + 1);

    battleground.set_show_directions(false);
    battleground.set_show_path(true);
    draws.clear();
    battleground.render(&mut draws);
    let path_length = query::path(battleground.world()).len();
    assert_eq!(draws.len(), 280 + path_length + 1);
}

#[test]
fn placed_towers_use_the_selected_definition() {
    let towers = vec![
        TowerDefinition::default(),
        TowerDefinition {
            radius: 80.0,
            ..TowerDefinition::default()
        },
    ];
    let mut battleground = battleground(Grid::new(20, 14), Vec::new(), towers);

    battleground.select_tower_definition(1);
    battleground.place_tower(CellCoord::new(4, 4));

    let view = query::tower_view(battleground.world());
    let placed = view.iter().next().expect("tower placed");
    assert_eq!(placed.definition, 1);
    assert!((placed.radius - 80.0).abs() < f32::EPSILON);
}
