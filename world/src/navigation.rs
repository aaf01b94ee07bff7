//! Flow field builder that routes walkers toward a single target cell.

use std::collections::VecDeque;

use flow_defence_core::{CellCoord, Connectivity, Direction, NO_DIRECTION};

use crate::Grid;

const UNREACHABLE: u32 = u32::MAX;

/// Per-cell direction toward a target, derived from a breadth-first distance transform.
///
/// The field does not hold on to the grid it was built from; callers pass the
/// grid to [`FlowField::build`] again whenever its obstacle layout changes.
/// Distances default to `u32::MAX` for unreachable cells and every such cell
/// stores [`NO_DIRECTION`].
#[derive(Clone, Debug, Default)]
pub struct FlowField {
    width: u32,
    height: u32,
    connectivity: Connectivity,
    target: Option<CellCoord>,
    distances: Vec<u32>,
    directions: Vec<u8>,
}

impl FlowField {
    /// Creates an empty field using the provided neighbourhood.
    #[must_use]
    pub fn new(connectivity: Connectivity) -> Self {
        Self {
            connectivity,
            ..Self::default()
        }
    }

    /// Neighbourhood used during propagation.
    #[must_use]
    pub const fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Target of the most recent build.
    #[must_use]
    pub const fn target(&self) -> Option<CellCoord> {
        self.target
    }

    /// Recomputes distances and directions toward `target` over `grid`.
    ///
    /// A target outside the grid or on an obstacle leaves every cell without
    /// a direction.
    pub fn build(&mut self, grid: &Grid, target: CellCoord) {
        let width = grid.width();
        let height = grid.height();
        let cell_count = (width as usize).saturating_mul(height as usize);

        self.width = width;
        self.height = height;
        self.target = Some(target);
        self.distances.clear();
        self.distances.resize(cell_count, UNREACHABLE);
        self.directions.clear();
        self.directions.resize(cell_count, NO_DIRECTION);

        if !grid.is_walkable(target) {
            return;
        }

        let mut queue = VecDeque::new();
        if let Some(index) = self.index(target) {
            self.distances[index] = 0;
            queue.push_back(target);
        }

        while let Some(cell) = queue.pop_front() {
            let Some(current_index) = self.index(cell) else {
                continue;
            };
            let current_distance = self.distances[current_index];
            if current_distance >= UNREACHABLE - 1 {
                continue;
            }

            for direction in Direction::ALL {
                let Some(neighbor) = self.passable_step(grid, cell, direction) else {
                    continue;
                };
                let Some(neighbor_index) = self.index(neighbor) else {
                    continue;
                };
                if self.distances[neighbor_index] != UNREACHABLE {
                    continue;
                }

                self.distances[neighbor_index] = current_distance + 1;
                queue.push_back(neighbor);
            }
        }

        let cells = (0..height)
            .flat_map(|row| (0..width).map(move |column| CellCoord::new(column, row)));
        for (index, cell) in cells.enumerate() {
            let distance = self.distances[index];
            if distance == 0 || distance == UNREACHABLE {
                continue;
            }

            let descent = Direction::ALL.into_iter().find(|direction| {
                self.passable_step(grid, cell, *direction)
                    .and_then(|neighbor| self.distance(neighbor))
                    .is_some_and(|neighbor_distance| neighbor_distance + 1 == distance)
            });
            if let Some(direction) = descent {
                self.directions[index] = direction.code();
            }
        }
    }

    /// Raw direction code of `cell`: `0..8` is a compass direction, [`NO_DIRECTION`] means none.
    #[must_use]
    pub fn code(&self, cell: CellCoord) -> u8 {
        self.index(cell)
            .map_or(NO_DIRECTION, |index| self.directions[index])
    }

    /// Direction stored for `cell`.
    #[must_use]
    pub fn direction(&self, cell: CellCoord) -> Option<Direction> {
        Direction::from_code(self.code(cell))
    }

    /// Reports whether `cell` has a next step toward the target.
    #[must_use]
    pub fn has_next(&self, cell: CellCoord) -> bool {
        self.direction(cell).is_some()
    }

    /// Neighbour of `cell` one step closer to the target, if any.
    #[must_use]
    pub fn try_next(&self, cell: CellCoord) -> Option<CellCoord> {
        self.direction(cell).and_then(|direction| cell.step(direction))
    }

    /// Neighbour of `cell` one step closer to the target.
    ///
    /// # Panics
    ///
    /// Panics when [`FlowField::has_next`] is false for `cell`.
    #[must_use]
    pub fn next(&self, cell: CellCoord) -> CellCoord {
        match self.try_next(cell) {
            Some(next) => next,
            None => panic!("flow field has no direction at {cell:?}"),
        }
    }

    /// Number of steps from `cell` to the target, if the target is reachable.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        self.index(cell)
            .map(|index| self.distances[index])
            .filter(|distance| *distance != UNREACHABLE)
    }

    /// Cells visited when following the field from `from`, ending with the target.
    ///
    /// Empty when `from` cannot reach the target.
    #[must_use]
    pub fn route(&self, from: CellCoord) -> Vec<CellCoord> {
        let Some(steps) = self.distance(from) else {
            return Vec::new();
        };

        let mut route = Vec::with_capacity(steps as usize + 1);
        let mut cell = from;
        route.push(cell);
        while let Some(next) = self.try_next(cell) {
            route.push(next);
            cell = next;
        }
        route
    }

    /// Number of cells that can reach the target, the target included.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances
            .iter()
            .filter(|distance| **distance != UNREACHABLE)
            .count()
    }

    /// Neighbour in `direction` if the step stays on walkable cells without cutting a corner.
    fn passable_step(
        &self,
        grid: &Grid,
        cell: CellCoord,
        direction: Direction,
    ) -> Option<CellCoord> {
        if !self.connectivity.allows(direction) {
            return None;
        }

        let neighbor = cell.step(direction)?;
        if !grid.is_walkable(neighbor) {
            return None;
        }

        if direction.is_diagonal() {
            let horizontal = CellCoord::new(neighbor.column(), cell.row());
            let vertical = CellCoord::new(cell.column(), neighbor.row());
            if !grid.is_walkable(horizontal) || !grid.is_walkable(vertical) {
                return None;
            }
        }

        Some(neighbor)
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() >= self.width || cell.row() >= self.height {
            return None;
        }
        Some(cell.row() as usize * self.width as usize + cell.column() as usize)
    }
}
