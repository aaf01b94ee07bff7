#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns pointer input into tower placement and selection commands.

use flow_defence_core::{CellCoord, Command};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Indicates whether the player asked for a tower on this frame.
    pub place_action: bool,
    /// Indicates whether the player asked to select a tower on this frame.
    pub select_action: bool,
    /// Cell under the pointer, if the pointer is over the grid area.
    pub cursor_cell: Option<CellCoord>,
}

impl BuilderInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(
        place_action: bool,
        select_action: bool,
        cursor_cell: Option<CellCoord>,
    ) -> Self {
        Self {
            place_action,
            select_action,
            cursor_cell,
        }
    }
}

/// Builder system that emits commands for the tower definition currently in hand.
///
/// Placement requests are forwarded without validation; the world decides
/// whether the cell can take a tower.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Builder {
    definition: usize,
}

impl Builder {
    /// Creates a builder placing towers of the given definition.
    #[must_use]
    pub const fn new(definition: usize) -> Self {
        Self { definition }
    }

    /// Tower definition placed by the builder.
    #[must_use]
    pub const fn definition(&self) -> usize {
        self.definition
    }

    /// Switches the tower definition placed by later requests.
    pub fn set_definition(&mut self, definition: usize) {
        self.definition = definition;
    }

    /// Consumes adapter-derived input to emit builder commands.
    pub fn handle(&self, input: BuilderInput, out: &mut Vec<Command>) {
        if input.place_action {
            if let Some(cell) = input.cursor_cell {
                out.push(Command::PlaceTower {
                    cell,
                    definition: self.definition,
                });
            }
        }

        if input.select_action {
            out.push(Command::SelectTower {
                cell: input.cursor_cell,
            });
        }
    }
}
