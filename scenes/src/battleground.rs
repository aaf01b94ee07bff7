//! Playable battleground: walkers follow the flow field while towers shoot them.

use std::time::Duration;

use flow_defence_core::{
    CellCoord, Command, Event, EventType, TowerDefinition, WalkerDefinition, WalkerExit,
};
use flow_defence_rendering::{Color, DrawCommand, FrameInput, GuiPanel};
use flow_defence_system_builder::{Builder, BuilderInput};
use flow_defence_system_movement::Movement;
use flow_defence_system_spawning::Spawning;
use flow_defence_system_tower_combat::TowerCombat;
use flow_defence_system_tower_targeting::TowerTargeting;
use flow_defence_world::{
    self as world, load_tower_definitions, load_walker_definitions, query, Grid, World,
};
use glam::Vec2;

use crate::{atlas, config::BattlegroundConfig};

const PATH_TINT: Color = Color::new(1.0, 1.0, 1.0, 0.35);
const WALKER_COUNT_ANCHOR: Vec2 = Vec2::new(980.0, 20.0);

/// Running totals of what happened on the battleground.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BattleStats {
    /// Walkers that entered the battleground.
    pub spawned: u32,
    /// Walkers destroyed by bullets.
    pub killed: u32,
    /// Walkers that arrived at the end cell.
    pub reached_goal: u32,
    /// Walkers removed because no route was left.
    pub stranded: u32,
    /// Bullets fired by all towers.
    pub bullets_fired: u32,
    /// Towers placed.
    pub towers_placed: u32,
    /// Placement requests the world refused.
    pub placements_rejected: u32,
}

impl BattleStats {
    fn record(&mut self, event: &Event) {
        let counter = match event {
            Event::WalkerSpawned { .. } => &mut self.spawned,
            Event::WalkerKilled { .. } => &mut self.killed,
            Event::WalkerRemoved {
                reason: WalkerExit::ReachedGoal,
                ..
            } => &mut self.reached_goal,
            Event::WalkerRemoved {
                reason: WalkerExit::Stranded,
                ..
            } => &mut self.stranded,
            Event::BulletFired { .. } => &mut self.bullets_fired,
            Event::TowerPlaced { .. } => &mut self.towers_placed,
            Event::TowerPlacementRejected { .. } => &mut self.placements_rejected,
            _ => return,
        };
        *counter = counter.saturating_add(1);
    }
}

/// Battleground scene driving the world with the gameplay systems.
#[derive(Debug)]
pub struct Battleground {
    world: World,
    spawning: Spawning,
    movement: Movement,
    targeting: TowerTargeting,
    combat: TowerCombat,
    builder: Builder,
    events: Vec<Event>,
    commands: Vec<Command>,
    stats: BattleStats,
    show_directions: bool,
    show_path: bool,
}

impl Battleground {
    /// Builds a battleground from configuration, loading the configured level
    /// and definition files.
    ///
    /// Files that cannot be read are reported and replaced with an open grid
    /// or the built-in definitions.
    #[must_use]
    pub fn new(config: &BattlegroundConfig) -> Self {
        let grid = match config.grid.level.as_deref() {
            Some(name) => match config.level_store().load(name) {
                Ok(grid) => grid,
                Err(error) => {
                    tracing::warn!(level = name, %error, "falling back to an open grid");
                    Grid::new(config.grid.width, config.grid.height)
                }
            },
            None => Grid::new(config.grid.width, config.grid.height),
        };

        let walkers = match config.assets.walkers.as_deref() {
            Some(path) => load_walker_definitions(path).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), %error, "using built-in walker definitions");
                Vec::new()
            }),
            None => Vec::new(),
        };
        let towers = match config.assets.towers.as_deref() {
            Some(path) => load_tower_definitions(path).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), %error, "using built-in tower definitions");
                Vec::new()
            }),
            None => Vec::new(),
        };

        Self::from_grid(config, grid, walkers, towers)
    }

    /// Builds a battleground over an explicit grid and definition lists.
    #[must_use]
    pub fn from_grid(
        config: &BattlegroundConfig,
        grid: Grid,
        walker_definitions: Vec<WalkerDefinition>,
        tower_definitions: Vec<TowerDefinition>,
    ) -> Self {
        Self {
            world: World::new(
                config.world_config(),
                grid,
                walker_definitions,
                tower_definitions,
            ),
            spawning: Spawning::new(),
            movement: Movement::new(config.movement_config()),
            targeting: TowerTargeting::new(config.targeting_config()),
            combat: TowerCombat::new(),
            builder: Builder::new(0),
            events: Vec::new(),
            commands: Vec::new(),
            stats: BattleStats::default(),
            show_directions: true,
            show_path: false,
        }
    }

    /// Read-only access to the simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Totals accumulated since the battleground was created.
    #[must_use]
    pub fn stats(&self) -> BattleStats {
        self.stats
    }

    /// Events raised by the most recent [`Battleground::tick`] or command.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Walker spawner.
    #[must_use]
    pub fn spawning(&self) -> &Spawning {
        &self.spawning
    }

    /// Toggles the flow-field arrow overlay.
    pub fn set_show_directions(&mut self, show: bool) {
        self.show_directions = show;
    }

    /// Toggles the highlight of the route from start to end.
    pub fn set_show_path(&mut self, show: bool) {
        self.show_path = show;
    }

    /// Spawns a single walker immediately.
    pub fn start_walker(&mut self, definition: usize) {
        self.events.clear();
        self.commands.push(Command::SpawnWalker { definition });
        self.flush();
    }

    /// Queues `count` walkers released every `interval`.
    pub fn start_wave(&mut self, definition: usize, count: u32, interval: Duration) {
        self.spawning.start_wave(definition, count, interval);
    }

    /// Requests a tower of the builder's definition on `cell`.
    pub fn place_tower(&mut self, cell: CellCoord) {
        self.events.clear();
        self.commands.push(Command::PlaceTower {
            cell,
            definition: self.builder.definition(),
        });
        self.flush();
    }

    /// Selects the tower definition placed by later clicks.
    pub fn select_tower_definition(&mut self, definition: usize) {
        self.builder.set_definition(definition);
    }

    /// Advances the battleground by one frame.
    ///
    /// Pointer clicks are resolved first, then the clock advances and the
    /// spawning, movement, targeting and combat systems run in that order,
    /// each seeing the world as left by the previous one.
    pub fn tick(&mut self, dt: Duration, input: &FrameInput) {
        self.events.clear();

        let cursor = input.pointer.and_then(|pointer| self.cell_at(pointer));
        self.builder.handle(
            BuilderInput::new(
                input.events.contains(EventType::LEFT_BUTTON_CLICKED),
                input.events.contains(EventType::RIGHT_BUTTON_CLICKED),
                cursor,
            ),
            &mut self.commands,
        );
        self.flush();

        let tick_start = self.events.len();
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);
        let tick_events = self.events[tick_start..].to_vec();

        self.spawning.handle(&tick_events, &mut self.commands);
        self.flush();

        let walkers = query::walker_view(&self.world);
        self.movement.handle(
            &tick_events,
            &walkers,
            query::flow_field(&self.world),
            query::transform(&self.world),
            &mut self.commands,
        );
        self.flush();

        let towers = query::tower_view(&self.world);
        let walkers = query::walker_view(&self.world);
        self.targeting
            .handle(&tick_events, &towers, &walkers, &mut self.commands);
        self.commands.push(Command::ChargeTowers { dt });
        self.flush();

        let cooldowns = query::tower_cooldowns(&self.world);
        self.combat.handle(&cooldowns, &mut self.commands);
        self.commands.push(Command::AdvanceBullets { dt });
        self.flush();
    }

    /// Called when the scene becomes the top of the stack.
    pub fn on_activation(&mut self) {
        tracing::debug!(
            walkers = query::walker_count(&self.world),
            towers = query::tower_count(&self.world),
            "battleground activated"
        );
    }

    /// Called when the scene stops being the top of the stack.
    pub fn on_deactivation(&mut self) {
        tracing::debug!(stats = ?self.stats, "battleground deactivated");
    }

    /// Appends the sprites of the current frame, back to front.
    pub fn render(&self, out: &mut Vec<DrawCommand>) {
        let grid = query::grid(&self.world);
        let field = query::flow_field(&self.world);
        let transform = query::transform(&self.world);

        for (cell, cell_type) in grid.iter() {
            if cell_type.is_hidden() {
                continue;
            }
            let position = transform.to_screen(cell);
            out.push(DrawCommand::sprite(position, atlas::tile(cell_type)));
            if self.show_directions {
                if let Some(direction) = field.direction(cell) {
                    out.push(DrawCommand::sprite(position, atlas::arrow(direction)));
                }
            }
        }

        if self.show_path {
            for cell in query::path(&self.world) {
                out.push(
                    DrawCommand::sprite(transform.to_screen(*cell), atlas::PATH_MARKER)
                        .tinted(PATH_TINT),
                );
            }
        }

        for tower in query::tower_view(&self.world).iter() {
            let sprite = query::tower_definition(&self.world, tower.definition)
                .map_or(atlas::TOWER, |definition| definition.sprite);
            out.push(DrawCommand::sprite(tower.position, sprite).rotated(tower.rotation));
        }

        for walker in query::walker_view(&self.world).iter() {
            let definition = query::walker_definition(&self.world, walker.definition)
                .copied()
                .unwrap_or_default();
            out.push(
                DrawCommand::sprite(walker.position, definition.sprite)
                    .rotated(walker.rotation)
                    .tinted(Color::from(definition.color)),
            );
        }

        for bullet in query::bullets(&self.world) {
            out.push(DrawCommand::sprite(bullet.position, atlas::BULLET));
        }

        atlas::push_number(
            query::walker_count(&self.world),
            WALKER_COUNT_ANCHOR,
            out,
        );
    }

    /// Describes the battleground state for the overlay panel.
    #[must_use]
    pub fn gui(&self) -> GuiPanel {
        let mut panel = GuiPanel::new("Battleground");
        panel.line(format!("Tick: {}", query::tick_index(&self.world)));
        panel.line(format!(
            "Walkers: {} (spawned {}, killed {}, escaped {}, stranded {})",
            query::walker_count(&self.world),
            self.stats.spawned,
            self.stats.killed,
            self.stats.reached_goal,
            self.stats.stranded,
        ));
        panel.line(format!(
            "Towers: {} (rejected {})",
            query::tower_count(&self.world),
            self.stats.placements_rejected,
        ));
        panel.line(format!(
            "Bullets: {} in flight, {} fired",
            query::bullet_count(&self.world),
            self.stats.bullets_fired,
        ));
        panel.line(format!("Path length: {}", query::path(&self.world).len()));
        if let Some(pending) = self.spawning.pending() {
            panel.line(format!("Pending walkers: {}", pending.remaining()));
        }
        match query::selected_tower(&self.world) {
            Some(tower) => panel.line(format!("Selected tower: {}", tower.get())),
            None => panel.line("Selected tower: none"),
        }
        panel
    }

    fn cell_at(&self, pointer: Vec2) -> Option<CellCoord> {
        query::transform(&self.world)
            .to_cell(pointer)
            .filter(|cell| query::grid(&self.world).contains(*cell))
    }

    fn flush(&mut self) {
        let start = self.events.len();
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }
        for event in &self.events[start..] {
            self.stats.record(event);
        }
    }
}
