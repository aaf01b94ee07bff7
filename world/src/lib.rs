#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Flow Defence.
//!
//! The world owns the grid, its flow field, and every walker, tower and
//! bullet on the battleground. It only changes in response to [`Command`]s
//! passed to [`apply`] and reports what happened as [`Event`]s. Systems read
//! it through the functions in [`query`].

mod definitions;
mod grid;
mod level;
mod navigation;
mod towers;

use std::time::Duration;

use flow_defence_core::{
    wrap_angle, BulletExit, BulletId, CellCoord, CellType, Command, Connectivity, Event,
    PlacementError, ScreenTransform, TowerDefinition, TowerId, Viewport,
    WalkerDefinition, WalkerExit, WalkerId,
};
use flow_defence_store::EntityStore;
use glam::Vec2;

pub use definitions::{
    load_tower_definitions, load_walker_definitions, parse_tower_definitions,
    parse_walker_definitions, DefinitionError,
};
pub use grid::Grid;
pub use level::{decode_level, encode_level, LevelError, LevelStore, LEVEL_HEADER};
pub use navigation::FlowField;

use towers::TowerRegistry;

const DEFAULT_BULLET_SPEED: f32 = 400.0;
const DEFAULT_BULLET_RADIUS: f32 = 4.0;
const DEFAULT_WALKER_HIT_RADIUS: f32 = 12.0;
const DEFAULT_BULLET_TTL: Duration = Duration::from_secs(5);

/// Rules the world applies while executing commands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldConfig {
    /// Mapping between grid cells and screen positions.
    pub transform: ScreenTransform,
    /// Screen rectangle bullets must stay inside.
    pub viewport: Viewport,
    /// Neighbourhood used by the flow field.
    pub connectivity: Connectivity,
    /// Bullet travel speed in pixels per second.
    pub bullet_speed: f32,
    /// Bullet collision radius in pixels.
    pub bullet_radius: f32,
    /// Walker collision radius in pixels.
    pub walker_hit_radius: f32,
    /// Time after which a bullet that hit nothing is discarded.
    pub bullet_ttl: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            transform: ScreenTransform::default(),
            viewport: Viewport::default(),
            connectivity: Connectivity::default(),
            bullet_speed: DEFAULT_BULLET_SPEED,
            bullet_radius: DEFAULT_BULLET_RADIUS,
            walker_hit_radius: DEFAULT_WALKER_HIT_RADIUS,
            bullet_ttl: DEFAULT_BULLET_TTL,
        }
    }
}

#[derive(Clone, Debug)]
struct Walker {
    cell: CellCoord,
    position: Vec2,
    velocity: Vec2,
    rotation: f32,
    speed: f32,
    energy: f32,
    definition: usize,
}

#[derive(Clone, Debug)]
struct Bullet {
    position: Vec2,
    velocity: Vec2,
    radius: f32,
    energy: f32,
    age: Duration,
}

/// Represents the authoritative Flow Defence world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    grid: Grid,
    flow_field: FlowField,
    path: Vec<CellCoord>,
    walkers: EntityStore<WalkerId, Walker>,
    bullets: EntityStore<BulletId, Bullet>,
    towers: TowerRegistry,
    selected_tower: Option<TowerId>,
    walker_definitions: Vec<WalkerDefinition>,
    tower_definitions: Vec<TowerDefinition>,
    bullet_scratch: Vec<BulletId>,
    tick_index: u64,
}

impl World {
    /// Creates a world over `grid` and builds its initial flow field.
    ///
    /// Empty definition lists fall back to a single default definition so a
    /// world can always spawn walkers and place towers.
    #[must_use]
    pub fn new(
        config: WorldConfig,
        grid: Grid,
        walker_definitions: Vec<WalkerDefinition>,
        tower_definitions: Vec<TowerDefinition>,
    ) -> Self {
        let walker_definitions = if walker_definitions.is_empty() {
            vec![WalkerDefinition::default()]
        } else {
            walker_definitions
        };
        let tower_definitions = if tower_definitions.is_empty() {
            vec![TowerDefinition::default()]
        } else {
            tower_definitions
        };

        let mut world = Self {
            config,
            grid,
            flow_field: FlowField::new(config.connectivity),
            path: Vec::new(),
            walkers: EntityStore::new(),
            bullets: EntityStore::new(),
            towers: TowerRegistry::new(),
            selected_tower: None,
            walker_definitions,
            tower_definitions,
            bullet_scratch: Vec::new(),
            tick_index: 0,
        };
        let reachable = world.rebuild_navigation();
        tracing::debug!(
            width = world.grid.width(),
            height = world.grid.height(),
            reachable,
            path_length = world.path.len(),
            "world created"
        );
        world
    }

    fn rebuild_navigation(&mut self) -> usize {
        self.flow_field.build(&self.grid, self.grid.end());
        self.path = self.flow_field.route(self.grid.start());
        self.flow_field.reachable_count()
    }

    fn spawn_walker(&mut self, definition: usize, out_events: &mut Vec<Event>) {
        let Some(template) = self.walker_definitions.get(definition).copied() else {
            tracing::warn!(definition, "ignoring spawn of unknown walker definition");
            return;
        };

        let cell = self.grid.start();
        let walker = self.walkers.insert(Walker {
            cell,
            position: self.config.transform.to_screen(cell),
            velocity: Vec2::ZERO,
            rotation: 0.0,
            speed: template.speed,
            energy: template.energy,
            definition,
        });
        tracing::debug!(%walker, definition, "walker spawned");
        out_events.push(Event::WalkerSpawned {
            walker,
            definition,
            cell,
        });
    }

    fn move_walker(
        &mut self,
        id: WalkerId,
        position: Vec2,
        cell: CellCoord,
        velocity: Vec2,
        rotation: f32,
        out_events: &mut Vec<Event>,
    ) {
        let on_grid = self.grid.contains(cell);
        let Some(walker) = self.walkers.get_mut(id) else {
            return;
        };

        let from = walker.cell;
        walker.position = position;
        walker.velocity = velocity;
        walker.rotation = rotation;
        if on_grid {
            walker.cell = cell;
        }

        if walker.cell != from {
            out_events.push(Event::WalkerAdvanced {
                walker: id,
                from,
                to: walker.cell,
            });
        }
    }

    fn remove_walker(&mut self, id: WalkerId, out_events: &mut Vec<Event>) {
        let Some(walker) = self.walkers.remove(id) else {
            return;
        };

        let reason = if walker.cell == self.grid.end() {
            WalkerExit::ReachedGoal
        } else {
            WalkerExit::Stranded
        };
        tracing::debug!(walker = %id, cell = ?walker.cell, ?reason, "walker removed");
        out_events.push(Event::WalkerRemoved {
            walker: id,
            cell: walker.cell,
            reason,
        });
    }

    fn place_tower(&mut self, cell: CellCoord, definition: usize, out_events: &mut Vec<Event>) {
        let Some(template) = self.tower_definitions.get(definition).copied() else {
            reject_placement(cell, PlacementError::UnknownDefinition, out_events);
            return;
        };
        let Some(previous) = self.grid.get(cell) else {
            reject_placement(cell, PlacementError::OutOfBounds, out_events);
            return;
        };
        if !previous.is_walkable() {
            reject_placement(cell, PlacementError::Occupied, out_events);
            return;
        }

        let was_connected = self.flow_field.distance(self.grid.start()).is_some();
        self.grid.set(cell, CellType::WALL);
        let reachable = self.rebuild_navigation();
        if was_connected && self.flow_field.distance(self.grid.start()).is_none() {
            self.grid.set(cell, previous);
            let _ = self.rebuild_navigation();
            reject_placement(cell, PlacementError::BlocksPath, out_events);
            return;
        }

        let position = self.config.transform.to_screen(cell);
        let tower = self.towers.insert(cell, position, definition, &template);
        tracing::info!(
            tower = tower.get(),
            ?cell,
            reachable,
            path_length = self.path.len(),
            "tower placed"
        );
        out_events.push(Event::TowerPlaced { tower, cell });
        out_events.push(Event::FlowFieldRebuilt {
            reachable_cells: reachable,
        });
    }

    fn assign_target(
        &mut self,
        tower: TowerId,
        target: Option<WalkerId>,
        out_events: &mut Vec<Event>,
    ) {
        let target = target.filter(|walker| self.walkers.contains(*walker));
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        if state.target == target {
            return;
        }

        state.target = target;
        out_events.push(Event::TowerTargetChanged { tower, target });
    }

    fn charge_towers(&mut self, dt: Duration) {
        for tower in self.towers.iter_mut() {
            let holds_live_target = tower
                .target
                .is_some_and(|walker| self.walkers.contains(walker));
            if holds_live_target {
                tower.timer = tower.timer.saturating_add(dt);
            }
        }
    }

    fn fire_bullet(&mut self, tower: TowerId, out_events: &mut Vec<Event>) {
        let Some(state) = self.towers.get_mut(tower) else {
            return;
        };
        let Some(target) = state.target else {
            return;
        };
        let Some(walker) = self.walkers.get(target) else {
            return;
        };
        if state.timer < state.fire_interval {
            return;
        }

        let direction = (walker.position - state.position).normalize_or_zero();
        state.timer = Duration::ZERO;
        let bullet = self.bullets.insert(Bullet {
            position: state.position,
            velocity: direction * self.config.bullet_speed,
            radius: self.config.bullet_radius,
            energy: state.energy,
            age: Duration::ZERO,
        });
        tracing::trace!(%bullet, tower = tower.get(), walker = %target, "bullet fired");
        out_events.push(Event::BulletFired {
            bullet,
            tower,
            target,
        });
    }

    fn advance_bullets(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let seconds = dt.as_secs_f32();
        let mut ids = std::mem::take(&mut self.bullet_scratch);
        ids.clear();
        ids.extend_from_slice(self.bullets.ids());

        for id in ids.iter().copied() {
            let Some(bullet) = self.bullets.get_mut(id) else {
                continue;
            };
            let from = bullet.position;
            bullet.position += bullet.velocity * seconds;
            bullet.age = bullet.age.saturating_add(dt);
            let (position, radius, energy, age) =
                (bullet.position, bullet.radius, bullet.energy, bullet.age);

            let exit = if let Some(walker) = self.first_walker_along(from, position, radius) {
                self.hit_walker(walker, id, energy, out_events);
                Some(BulletExit::Hit)
            } else if !self.config.viewport.contains(position) {
                Some(BulletExit::OutOfBounds)
            } else if age >= self.config.bullet_ttl {
                Some(BulletExit::Expired)
            } else {
                None
            };

            if let Some(reason) = exit {
                let _ = self.bullets.remove(id);
                out_events.push(Event::BulletRemoved { bullet: id, reason });
            }
        }

        self.bullet_scratch = ids;
    }

    /// Walker touched by a bullet sweeping from `from` to `to`, picking the
    /// one met earliest along the segment.
    fn first_walker_along(&self, from: Vec2, to: Vec2, radius: f32) -> Option<WalkerId> {
        let reach = radius + self.config.walker_hit_radius;
        let segment = to - from;
        let length_sq = segment.length_squared();
        self.walkers
            .iter()
            .filter_map(|(id, walker)| {
                let along = if length_sq > 0.0 {
                    ((walker.position - from).dot(segment) / length_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let closest = from + segment * along;
                (walker.position.distance(closest) < reach).then_some((id, along))
            })
            .min_by(|left, right| left.1.total_cmp(&right.1))
            .map(|(id, _)| id)
    }

    fn hit_walker(
        &mut self,
        id: WalkerId,
        bullet: BulletId,
        energy: f32,
        out_events: &mut Vec<Event>,
    ) {
        let Some(walker) = self.walkers.get_mut(id) else {
            return;
        };
        walker.energy -= energy;
        let remaining_energy = walker.energy;
        out_events.push(Event::WalkerHit {
            walker: id,
            bullet,
            remaining_energy,
        });

        if remaining_energy <= 0.0 {
            let _ = self.walkers.remove(id);
            tracing::debug!(walker = %id, "walker killed");
            out_events.push(Event::WalkerKilled { walker: id });
        }
    }
}

fn reject_placement(cell: CellCoord, reason: PlacementError, out_events: &mut Vec<Event>) {
    tracing::debug!(?cell, ?reason, "tower placement rejected");
    out_events.push(Event::TowerPlacementRejected { cell, reason });
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnWalker { definition } => world.spawn_walker(definition, out_events),
        Command::MoveWalker {
            walker,
            position,
            cell,
            velocity,
            rotation,
        } => world.move_walker(walker, position, cell, velocity, rotation, out_events),
        Command::RemoveWalker { walker } => world.remove_walker(walker, out_events),
        Command::PlaceTower { cell, definition } => {
            world.place_tower(cell, definition, out_events);
        }
        Command::SelectTower { cell } => {
            world.selected_tower = cell.and_then(|cell| world.towers.at(cell));
            out_events.push(Event::TowerSelected {
                tower: world.selected_tower,
            });
        }
        Command::AssignTarget { tower, target } => {
            world.assign_target(tower, target, out_events);
        }
        Command::AimTower { tower, rotation } => {
            if let Some(state) = world.towers.get_mut(tower) {
                state.rotation = wrap_angle(rotation);
                state.idle.angle = state.rotation;
            }
        }
        Command::AnimateIdleTower { tower, idle } => {
            if let Some(state) = world.towers.get_mut(tower) {
                if state.target.is_none() {
                    state.idle = idle;
                    state.rotation = idle.angle;
                }
            }
        }
        Command::ChargeTowers { dt } => world.charge_towers(dt),
        Command::FireBullet { tower } => world.fire_bullet(tower, out_events),
        Command::AdvanceBullets { dt } => world.advance_bullets(dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use flow_defence_core::{
        BulletSnapshot, CellCoord, ScreenTransform, TowerCooldownSnapshot, TowerCooldownView,
        TowerDefinition, TowerId, TowerSnapshot, TowerView, Viewport, WalkerDefinition, WalkerId,
        WalkerSnapshot, WalkerView,
    };

    use super::{FlowField, Grid, World, WorldConfig};

    /// Provides read-only access to the world's grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Flow field routing every walkable cell toward the end cell.
    #[must_use]
    pub fn flow_field(world: &World) -> &FlowField {
        &world.flow_field
    }

    /// Cells from the start cell to the end cell along the flow field.
    ///
    /// Empty while the start cell cannot reach the end cell.
    #[must_use]
    pub fn path(world: &World) -> &[CellCoord] {
        &world.path
    }

    /// Rules the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Mapping between grid cells and screen positions.
    #[must_use]
    pub fn transform(world: &World) -> ScreenTransform {
        world.config.transform
    }

    /// Screen rectangle bullets must stay inside.
    #[must_use]
    pub fn viewport(world: &World) -> Viewport {
        world.config.viewport
    }

    /// Captures a read-only view of the live walkers in store order.
    #[must_use]
    pub fn walker_view(world: &World) -> WalkerView {
        let snapshots = world
            .walkers
            .iter()
            .map(|(id, walker)| WalkerSnapshot {
                id,
                cell: walker.cell,
                position: walker.position,
                velocity: walker.velocity,
                rotation: walker.rotation,
                speed: walker.speed,
                energy: walker.energy,
                definition: walker.definition,
            })
            .collect();
        WalkerView::from_snapshots(snapshots)
    }

    /// Number of live walkers.
    #[must_use]
    pub fn walker_count(world: &World) -> usize {
        world.walkers.len()
    }

    /// Reports whether `walker` is still live.
    #[must_use]
    pub fn contains_walker(world: &World, walker: WalkerId) -> bool {
        world.walkers.contains(walker)
    }

    /// Captures a read-only view of every tower.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots = world
            .towers
            .iter()
            .map(|tower| TowerSnapshot {
                id: tower.id,
                cell: tower.cell,
                position: tower.position,
                rotation: tower.rotation,
                radius: tower.radius,
                target: tower.target,
                idle: tower.idle,
                level: tower.level,
                definition: tower.definition,
            })
            .collect();
        TowerView::from_snapshots(snapshots)
    }

    /// Captures fire cooldowns; targets that are no longer live read as `None`.
    #[must_use]
    pub fn tower_cooldowns(world: &World) -> TowerCooldownView {
        let snapshots = world
            .towers
            .iter()
            .map(|tower| TowerCooldownSnapshot {
                tower: tower.id,
                target: tower
                    .target
                    .filter(|walker| world.walkers.contains(*walker)),
                timer: tower.timer,
                interval: tower.fire_interval,
            })
            .collect();
        TowerCooldownView::from_snapshots(snapshots)
    }

    /// Tower standing on `cell`, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        world.towers.at(cell)
    }

    /// Number of towers placed so far.
    #[must_use]
    pub fn tower_count(world: &World) -> usize {
        world.towers.len()
    }

    /// Tower chosen by the last selection request.
    #[must_use]
    pub fn selected_tower(world: &World) -> Option<TowerId> {
        world.selected_tower
    }

    /// Captures every bullet in flight.
    #[must_use]
    pub fn bullets(world: &World) -> Vec<BulletSnapshot> {
        world
            .bullets
            .iter()
            .map(|(id, bullet)| BulletSnapshot {
                id,
                position: bullet.position,
                velocity: bullet.velocity,
                radius: bullet.radius,
            })
            .collect()
    }

    /// Number of bullets in flight.
    #[must_use]
    pub fn bullet_count(world: &World) -> usize {
        world.bullets.len()
    }

    /// Walker definitions the world spawns from.
    #[must_use]
    pub fn walker_definitions(world: &World) -> &[WalkerDefinition] {
        &world.walker_definitions
    }

    /// Walker definition at `index`.
    #[must_use]
    pub fn walker_definition(world: &World, index: usize) -> Option<&WalkerDefinition> {
        world.walker_definitions.get(index)
    }

    /// Tower definitions the world places from.
    #[must_use]
    pub fn tower_definitions(world: &World) -> &[TowerDefinition] {
        &world.tower_definitions
    }

    /// Tower definition at `index`.
    #[must_use]
    pub fn tower_definition(world: &World, index: usize) -> Option<&TowerDefinition> {
        world.tower_definitions.get(index)
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_defence_core::IdleRotation;

    fn world_on(grid: Grid) -> World {
        World::new(WorldConfig::default(), grid, Vec::new(), Vec::new())
    }

    fn spawn(world: &mut World) -> WalkerId {
        let mut events = Vec::new();
        apply(world, Command::SpawnWalker { definition: 0 }, &mut events);
        match events.as_slice() {
            [Event::WalkerSpawned { walker, .. }] => *walker,
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn new_world_routes_start_to_end() {
        let world = world_on(Grid::new(20, 14));

        assert_eq!(query::path(&world).len(), 33);
        assert_eq!(query::path(&world).first(), Some(&CellCoord::new(0, 0)));
        assert_eq!(query::path(&world).last(), Some(&CellCoord::new(19, 13)));
        assert_eq!(query::flow_field(&world).reachable_count(), 20 * 14);
    }

    #[test]
    fn empty_definition_lists_fall_back_to_defaults() {
        let world = world_on(Grid::new(4, 4));

        assert_eq!(query::walker_definitions(&world).len(), 1);
        assert_eq!(query::tower_definitions(&world).len(), 1);
        assert_eq!(
            query::tower_definition(&world, 0),
            Some(&TowerDefinition::default())
        );
    }

    #[test]
    fn tick_advances_clock_and_reports_elapsed_time() {
        let mut world = world_on(Grid::new(4, 4));
        let mut events = Vec::new();
        let dt = Duration::from_millis(16);

        apply(&mut world, Command::Tick { dt }, &mut events);

        assert_eq!(events, vec![Event::TimeAdvanced { dt }]);
        assert_eq!(query::tick_index(&world), 1);
    }

    #[test]
    fn walkers_spawn_on_start_cell_with_template_stats() {
        let mut world = world_on(Grid::new(6, 6));
        let walker = spawn(&mut world);

        let view = query::walker_view(&world);
        let snapshot = view.get(walker).expect("spawned walker");
        assert_eq!(snapshot.cell, CellCoord::new(0, 0));
        assert_eq!(snapshot.position, ScreenTransform::default().origin());
        assert!((snapshot.energy - 10.0).abs() < f32::EPSILON);
        assert!((snapshot.speed - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_walker_definition_spawns_nothing() {
        let mut world = world_on(Grid::new(6, 6));
        let mut events = Vec::new();

        apply(&mut world, Command::SpawnWalker { definition: 3 }, &mut events);

        assert!(events.is_empty());
        assert_eq!(query::walker_count(&world), 0);
    }

    #[test]
    fn moving_into_new_cell_reports_advance() {
        let mut world = world_on(Grid::new(6, 6));
        let walker = spawn(&mut world);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveWalker {
                walker,
                position: Vec2::new(80.0, 62.0),
                cell: CellCoord::new(1, 0),
                velocity: Vec2::new(100.0, 0.0),
                rotation: 0.0,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::WalkerAdvanced {
                walker,
                from: CellCoord::new(0, 0),
                to: CellCoord::new(1, 0),
            }]
        );
        let view = query::walker_view(&world);
        assert_eq!(view.get(walker).map(|w| w.velocity), Some(Vec2::new(100.0, 0.0)));
    }

    #[test]
    fn removal_reason_depends_on_walker_cell() {
        let mut world = world_on(Grid::new(2, 1));
        let stranded = spawn(&mut world);
        let finisher = spawn(&mut world);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::MoveWalker {
                walker: finisher,
                position: Vec2::new(98.0, 62.0),
                cell: CellCoord::new(1, 0),
                velocity: Vec2::ZERO,
                rotation: 0.0,
            },
            &mut events,
        );
        events.clear();
        apply(&mut world, Command::RemoveWalker { walker: finisher }, &mut events);
        apply(&mut world, Command::RemoveWalker { walker: stranded }, &mut events);
        apply(&mut world, Command::RemoveWalker { walker: stranded }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::WalkerRemoved {
                    walker: finisher,
                    cell: CellCoord::new(1, 0),
                    reason: WalkerExit::ReachedGoal,
                },
                Event::WalkerRemoved {
                    walker: stranded,
                    cell: CellCoord::new(0, 0),
                    reason: WalkerExit::Stranded,
                },
            ]
        );
        assert_eq!(query::walker_count(&world), 0);
    }

    #[test]
    fn placing_tower_walls_cell_and_rebuilds_field() {
        let mut world = world_on(Grid::new(5, 5));
        let mut events = Vec::new();
        let cell = CellCoord::new(2, 2);

        apply(&mut world, Command::PlaceTower { cell, definition: 0 }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::TowerPlaced {
                    tower: TowerId::new(0),
                    cell,
                },
                Event::FlowFieldRebuilt {
                    reachable_cells: 24,
                },
            ]
        );
        assert_eq!(query::grid(&world).get(cell), Some(CellType::WALL));
        assert_eq!(query::tower_at(&world, cell), Some(TowerId::new(0)));
        assert!(!query::path(&world).contains(&cell));
    }

    #[test]
    fn placement_rejections_leave_world_untouched() {
        let mut grid = Grid::new(3, 3);
        grid.set_at(1, 1, CellType::WALL);
        let mut world = world_on(grid);
        let mut events = Vec::new();

        for (cell, definition) in [
            (CellCoord::new(7, 0), 0),
            (CellCoord::new(1, 1), 0),
            (CellCoord::new(0, 1), 9),
        ] {
            apply(&mut world, Command::PlaceTower { cell, definition }, &mut events);
        }

        let reasons: Vec<_> = events
            .iter()
            .map(|event| match event {
                Event::TowerPlacementRejected { reason, .. } => *reason,
                other => panic!("unexpected event {other:?}"),
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                PlacementError::OutOfBounds,
                PlacementError::Occupied,
                PlacementError::UnknownDefinition,
            ]
        );
        assert_eq!(query::tower_count(&world), 0);
    }

    #[test]
    fn placement_that_disconnects_start_is_reverted() {
        let mut grid = Grid::new(3, 3);
        grid.set_at(1, 0, CellType::WALL);
        grid.set_at(1, 1, CellType::WALL);
        let mut world = world_on(grid);
        let before = query::path(&world).to_vec();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::PlaceTower {
                cell: CellCoord::new(1, 2),
                definition: 0,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TowerPlacementRejected {
                cell: CellCoord::new(1, 2),
                reason: PlacementError::BlocksPath,
            }]
        );
        assert_eq!(query::grid(&world).get_at(1, 2), Some(CellType::EMPTY));
        assert_eq!(query::path(&world), before.as_slice());
    }

    #[test]
    fn selection_follows_tower_under_cell() {
        let mut world = world_on(Grid::new(5, 5));
        let mut events = Vec::new();
        let cell = CellCoord::new(3, 1);
        apply(&mut world, Command::PlaceTower { cell, definition: 0 }, &mut events);
        events.clear();

        apply(&mut world, Command::SelectTower { cell: Some(cell) }, &mut events);
        apply(&mut world, Command::SelectTower { cell: None }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::TowerSelected {
                    tower: Some(TowerId::new(0)),
                },
                Event::TowerSelected { tower: None },
            ]
        );
        assert_eq!(query::selected_tower(&world), None);
    }

    #[test]
    fn towers_charge_only_while_target_is_live() {
        let mut world = world_on(Grid::new(5, 5));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                cell: CellCoord::new(2, 0),
                definition: 0,
            },
            &mut events,
        );
        let tower = TowerId::new(0);
        let dt = Duration::from_millis(400);

        apply(&mut world, Command::ChargeTowers { dt }, &mut events);
        let walker = spawn(&mut world);
        apply(
            &mut world,
            Command::AssignTarget {
                tower,
                target: Some(walker),
            },
            &mut events,
        );
        apply(&mut world, Command::ChargeTowers { dt }, &mut events);
        apply(&mut world, Command::ChargeTowers { dt }, &mut events);

        let cooldowns = query::tower_cooldowns(&world).into_vec();
        assert_eq!(cooldowns[0].timer, Duration::from_millis(800));
        assert_eq!(cooldowns[0].target, Some(walker));
        assert!(!cooldowns[0].ready());

        apply(&mut world, Command::RemoveWalker { walker }, &mut events);
        apply(&mut world, Command::ChargeTowers { dt }, &mut events);
        let cooldowns = query::tower_cooldowns(&world).into_vec();
        assert_eq!(cooldowns[0].timer, Duration::from_millis(800));
        assert_eq!(cooldowns[0].target, None);
    }

    #[test]
    fn assigning_dead_walker_clears_target() {
        let mut world = world_on(Grid::new(5, 5));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                cell: CellCoord::new(2, 0),
                definition: 0,
            },
            &mut events,
        );
        let walker = spawn(&mut world);
        apply(&mut world, Command::RemoveWalker { walker }, &mut events);
        events.clear();

        apply(
            &mut world,
            Command::AssignTarget {
                tower: TowerId::new(0),
                target: Some(walker),
            },
            &mut events,
        );

        assert!(events.is_empty());
        assert_eq!(query::tower_view(&world).into_vec()[0].target, None);
    }

    #[test]
    fn idle_animation_is_ignored_while_targeting() {
        let mut world = world_on(Grid::new(5, 5));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                cell: CellCoord::new(2, 0),
                definition: 0,
            },
            &mut events,
        );
        let tower = TowerId::new(0);
        let idle = IdleRotation::rotating(1.0, 0.5, Duration::from_secs(1));

        apply(&mut world, Command::AnimateIdleTower { tower, idle }, &mut events);
        assert_eq!(query::tower_view(&world).into_vec()[0].idle, idle);

        let walker = spawn(&mut world);
        apply(
            &mut world,
            Command::AssignTarget {
                tower,
                target: Some(walker),
            },
            &mut events,
        );
        apply(&mut world, Command::AimTower { tower, rotation: -2.0 }, &mut events);
        apply(
            &mut world,
            Command::AnimateIdleTower {
                tower,
                idle: IdleRotation::paused(0.0, Duration::from_secs(2)),
            },
            &mut events,
        );

        let snapshot = query::tower_view(&world).into_vec().remove(0);
        assert!((snapshot.rotation + 2.0).abs() < f32::EPSILON);
        assert!((snapshot.idle.angle + 2.0).abs() < f32::EPSILON);
    }
}
