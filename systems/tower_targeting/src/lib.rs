#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that keeps, drops and acquires tower targets and animates idle towers.

use std::{ops::Range, time::Duration};

use flow_defence_core::{
    Command, Event, IdlePhase, IdleRotation, TowerSnapshot, TowerView, WalkerSnapshot, WalkerView,
};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

const DEFAULT_SEED: u64 = 0x5eed_f10e_d3fe_0ce5;
const ROTATION_RATE: Range<f32> = 0.5..1.5;
const ROTATION_SECONDS: Range<f32> = 0.5..2.0;
const PAUSE_SECONDS: Range<f32> = 1.0..3.0;

/// Rule used to pick a target among the walkers inside a tower's radius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPriority {
    /// First walker in store order.
    #[default]
    FirstFound,
    /// Walker closest to the tower, ties broken by identity.
    Nearest,
}

/// Configuration parameters required to construct the targeting system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    priority: TargetPriority,
    seed: u64,
}

impl Config {
    /// Creates a configuration with the given priority and idle animation seed.
    #[must_use]
    pub const fn new(priority: TargetPriority, seed: u64) -> Self {
        Self { priority, seed }
    }

    /// Target selection rule.
    #[must_use]
    pub const fn priority(&self) -> TargetPriority {
        self.priority
    }

    /// Seed of the idle animation generator.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(TargetPriority::default(), DEFAULT_SEED)
    }
}

/// Tower targeting system.
///
/// A tower keeps its target while the walker is live and strictly inside
/// its radius, turning to face it. Otherwise the target is dropped and the
/// tower looks for a new one. Towers left without a target run an idle
/// animation alternating between randomized rotating and paused phases.
#[derive(Debug)]
pub struct TowerTargeting {
    priority: TargetPriority,
    rng: ChaCha8Rng,
}

impl Default for TowerTargeting {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl TowerTargeting {
    /// Creates a new targeting system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            priority: config.priority,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        }
    }

    /// Consumes world events and immutable views to emit targeting commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        towers: &TowerView,
        walkers: &WalkerView,
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

        for tower in towers.iter() {
            let held = tower
                .target
                .and_then(|id| walkers.get(id))
                .filter(|walker| in_range(tower, walker));
            if let Some(walker) = held {
                out.push(Command::AimTower {
                    tower: tower.id,
                    rotation: aim(tower.position, walker.position),
                });
                continue;
            }

            if tower.target.is_some() {
                out.push(Command::AssignTarget {
                    tower: tower.id,
                    target: None,
                });
            }

            if let Some(walker) = self.acquire(tower, walkers) {
                out.push(Command::AssignTarget {
                    tower: tower.id,
                    target: Some(walker.id),
                });
                out.push(Command::AimTower {
                    tower: tower.id,
                    rotation: aim(tower.position, walker.position),
                });
                continue;
            }

            out.push(Command::AnimateIdleTower {
                tower: tower.id,
                idle: self.next_idle(tower.idle, dt),
            });
        }
    }

    fn acquire<'a>(
        &self,
        tower: &TowerSnapshot,
        walkers: &'a WalkerView,
    ) -> Option<&'a WalkerSnapshot> {
        let mut candidates = walkers.iter().filter(|walker| in_range(tower, walker));
        match self.priority {
            TargetPriority::FirstFound => candidates.next(),
            TargetPriority::Nearest => candidates.min_by(|left, right| {
                let left_distance = tower.position.distance_squared(left.position);
                let right_distance = tower.position.distance_squared(right.position);
                left_distance
                    .total_cmp(&right_distance)
                    .then_with(|| left.id.cmp(&right.id))
            }),
        }
    }

    fn next_idle(&mut self, idle: IdleRotation, dt: Duration) -> IdleRotation {
        let advanced = idle.advance(dt);
        if !advanced.is_finished() {
            return advanced;
        }

        match advanced.phase {
            IdlePhase::Rotating => {
                let duration = self.duration(PAUSE_SECONDS);
                IdleRotation::paused(advanced.angle, duration)
            }
            IdlePhase::Paused => {
                let mut rate = self.rng.gen_range(ROTATION_RATE);
                if self.rng.gen_bool(0.5) {
                    rate = -rate;
                }
                let duration = self.duration(ROTATION_SECONDS);
                IdleRotation::rotating(advanced.angle, rate, duration)
            }
        }
    }

    fn duration(&mut self, seconds: Range<f32>) -> Duration {
        Duration::from_secs_f32(self.rng.gen_range(seconds))
    }
}

fn in_range(tower: &TowerSnapshot, walker: &WalkerSnapshot) -> bool {
    tower.position.distance_squared(walker.position) < tower.radius * tower.radius
}

fn aim(from: Vec2, to: Vec2) -> f32 {
    let offset = to - from;
    offset.y.atan2(offset.x)
}
