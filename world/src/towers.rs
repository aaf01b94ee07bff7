//! Authoritative tower state management utilities.

use std::time::Duration;

use flow_defence_core::{CellCoord, IdleRotation, TowerDefinition, TowerId, WalkerId};
use glam::Vec2;

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) cell: CellCoord,
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    pub(crate) radius: f32,
    pub(crate) energy: f32,
    pub(crate) fire_interval: Duration,
    pub(crate) timer: Duration,
    pub(crate) target: Option<WalkerId>,
    pub(crate) level: u32,
    pub(crate) idle: IdleRotation,
    pub(crate) definition: usize,
}

/// Towers in placement order; a tower's identifier is its index.
#[derive(Clone, Debug, Default)]
pub(crate) struct TowerRegistry {
    entries: Vec<TowerState>,
}

impl TowerRegistry {
    /// Creates an empty tower registry.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a tower built from `template` and returns its identifier.
    pub(crate) fn insert(
        &mut self,
        cell: CellCoord,
        position: Vec2,
        definition: usize,
        template: &TowerDefinition,
    ) -> TowerId {
        let id = TowerId::new(self.entries.len() as u32);
        self.entries.push(TowerState {
            id,
            cell,
            position,
            rotation: 0.0,
            radius: template.radius,
            energy: template.energy,
            fire_interval: template.fire_interval,
            timer: Duration::ZERO,
            target: None,
            level: 1,
            idle: IdleRotation::default(),
            definition,
        });
        id
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        self.entries.get(id.get() as usize)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(id.get() as usize)
    }

    /// Tower standing on `cell`, if any.
    pub(crate) fn at(&self, cell: CellCoord) -> Option<TowerId> {
        self.entries
            .iter()
            .find(|tower| tower.cell == cell)
            .map(|tower| tower.id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.iter_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
