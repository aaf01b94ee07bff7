#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits firing commands for towers whose cooldown elapsed.

use flow_defence_core::{Command, TowerCooldownView};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat;

impl TowerCombat {
    /// Creates a new tower combat system.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Emits `Command::FireBullet` for every tower holding a live target
    /// whose accumulated cooldown reached its fire interval.
    pub fn handle(&self, tower_cooldowns: &TowerCooldownView, out: &mut Vec<Command>) {
        out.extend(
            tower_cooldowns
                .iter()
                .filter(|snapshot| snapshot.ready())
                .map(|snapshot| Command::FireBullet {
                    tower: snapshot.tower,
                }),
        );
    }
}
