#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement system that steers walkers along the flow field.

use std::time::Duration;

use flow_defence_core::{CellCoord, Command, Event, ScreenTransform, WalkerSnapshot, WalkerView};
use flow_defence_world::FlowField;
use glam::Vec2;

const DEFAULT_ARRIVE_THRESHOLD_SQ: f32 = 4.0;

/// Configuration parameters required to construct the movement system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    arrive_threshold_sq: f32,
}

impl Config {
    /// Creates a configuration using the squared pixel distance at which a
    /// walker counts as standing on the cell it is heading for.
    #[must_use]
    pub const fn new(arrive_threshold_sq: f32) -> Self {
        Self {
            arrive_threshold_sq,
        }
    }

    /// Squared arrival distance in pixels.
    #[must_use]
    pub const fn arrive_threshold_sq(&self) -> f32 {
        self.arrive_threshold_sq
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_ARRIVE_THRESHOLD_SQ)
    }
}

/// Pure system that reacts to elapsed time and emits walker movement commands.
///
/// Each walker heads for the centre of the cell the flow field names as the
/// next step from its attributed cell. Once it is within the arrival
/// threshold of that centre it is re-attributed to the cell under its
/// position and retargets from there. Steps never overshoot the centre being
/// approached. Walkers whose cell has no next step are removed.
#[derive(Debug, Default)]
pub struct Movement {
    config: Config,
}

impl Movement {
    /// Creates a new movement system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Consumes world events and immutable views to emit movement commands.
    pub fn handle(
        &self,
        events: &[Event],
        walkers: &WalkerView,
        flow_field: &FlowField,
        transform: ScreenTransform,
        out: &mut Vec<Command>,
    ) {
        let mut dt = Duration::ZERO;
        let mut advanced = false;
        for event in events {
            if let Event::TimeAdvanced { dt: step } = event {
                dt = dt.saturating_add(*step);
                advanced = true;
            }
        }
        if !advanced {
            return;
        }

        for walker in walkers.iter() {
            out.push(self.steer(walker, flow_field, transform, dt.as_secs_f32()));
        }
    }

    fn steer(
        &self,
        walker: &WalkerSnapshot,
        flow_field: &FlowField,
        transform: ScreenTransform,
        seconds: f32,
    ) -> Command {
        let Some(mut next) = flow_field.try_next(walker.cell) else {
            return Command::RemoveWalker { walker: walker.id };
        };

        let mut cell = walker.cell;
        let mut target = transform.to_screen(next);
        if walker.position.distance_squared(target) < self.config.arrive_threshold_sq {
            cell = snapped_cell(walker.position, next, flow_field, transform);
            match flow_field.try_next(cell) {
                Some(following) => {
                    next = following;
                    target = transform.to_screen(next);
                }
                None => {
                    return Command::MoveWalker {
                        walker: walker.id,
                        position: transform.to_screen(cell),
                        cell,
                        velocity: Vec2::ZERO,
                        rotation: walker.rotation,
                    };
                }
            }
        }

        let offset = target - walker.position;
        let distance = offset.length();
        let direction = offset.normalize_or_zero();
        let step = (walker.speed * seconds).min(distance);
        let rotation = if distance > 0.0 {
            offset.y.atan2(offset.x)
        } else {
            walker.rotation
        };

        Command::MoveWalker {
            walker: walker.id,
            position: walker.position + direction * step,
            cell,
            velocity: direction * walker.speed,
            rotation,
        }
    }
}

/// Cell under `position`, falling back to `next` when that cell is off the field.
fn snapped_cell(
    position: Vec2,
    next: CellCoord,
    flow_field: &FlowField,
    transform: ScreenTransform,
) -> CellCoord {
    transform
        .to_cell(position)
        .filter(|cell| flow_field.distance(*cell).is_some())
        .unwrap_or(next)
}
