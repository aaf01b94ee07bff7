#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave spawning system responsible for emitting walker spawn commands.

use std::time::Duration;

use flow_defence_core::{Command, Event};

/// Wave of walkers still waiting to enter the battleground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingWalkers {
    definition: usize,
    remaining: u32,
    interval: Duration,
    timer: Duration,
}

impl PendingWalkers {
    /// Creates a wave of `count` walkers released one per `interval`.
    #[must_use]
    pub const fn new(definition: usize, count: u32, interval: Duration) -> Self {
        Self {
            definition,
            remaining: count,
            interval,
            timer: Duration::ZERO,
        }
    }

    /// Walker definition the wave spawns.
    #[must_use]
    pub const fn definition(&self) -> usize {
        self.definition
    }

    /// Number of walkers not yet released.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Time between two releases.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Time accumulated toward the next release.
    #[must_use]
    pub const fn timer(&self) -> Duration {
        self.timer
    }
}

/// Pure system that releases the active wave as simulated time passes.
///
/// Only one wave is active at a time. Large time steps release every walker
/// whose interval has elapsed instead of one per tick, and a zero interval
/// releases the whole wave at once.
#[derive(Debug, Default)]
pub struct Spawning {
    pending: Option<PendingWalkers>,
}

impl Spawning {
    /// Creates a spawning system without an active wave.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new wave, replacing any wave that is still running.
    pub fn start_wave(&mut self, definition: usize, count: u32, interval: Duration) {
        if let Some(previous) = self.pending {
            tracing::debug!(
                remaining = previous.remaining,
                "replacing unfinished walker wave"
            );
        }
        tracing::info!(definition, count, ?interval, "walker wave started");
        self.pending = (count > 0).then(|| PendingWalkers::new(definition, count, interval));
    }

    /// Wave currently being released, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingWalkers> {
        self.pending.as_ref()
    }

    /// Consumes events to emit spawn commands for the active wave.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        let Some(wave) = self.pending.as_mut() else {
            return;
        };

        let mut accumulated = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                accumulated = accumulated.saturating_add(*dt);
            }
        }

        if accumulated.is_zero() {
            return;
        }

        wave.timer = wave.timer.saturating_add(accumulated);
        let released = resolve_spawn_attempts(wave);
        for _ in 0..released {
            out.push(Command::SpawnWalker {
                definition: wave.definition,
            });
        }

        if wave.remaining == 0 {
            tracing::debug!(definition = wave.definition, "walker wave finished");
            self.pending = None;
        }
    }
}

fn resolve_spawn_attempts(wave: &mut PendingWalkers) -> u32 {
    if wave.interval.is_zero() {
        return std::mem::take(&mut wave.remaining);
    }

    let mut attempts = 0;
    while wave.remaining > 0 && wave.timer >= wave.interval {
        wave.timer -= wave.interval;
        wave.remaining -= 1;
        attempts += 1;
    }
    attempts
}
