//! Text rendering of a grid and its flow field.

use flow_defence_core::{CellCoord, Direction};
use flow_defence_world::{FlowField, Grid};

fn arrow(direction: Direction) -> char {
    match direction {
        Direction::North => '↑',
        Direction::NorthEast => '↗',
        Direction::East => '→',
        Direction::SouthEast => '↘',
        Direction::South => '↓',
        Direction::SouthWest => '↙',
        Direction::West => '←',
        Direction::NorthWest => '↖',
    }
}

/// Renders one line per grid row.
///
/// `S` and `E` mark the start and end cells, `#` blocked cells, a blank
/// hidden cells and `.` open cells without a route; every other cell shows
/// the arrow of its flow-field direction.
pub(crate) fn render(grid: &Grid, field: &FlowField) -> String {
    let mut text = String::new();
    for row in 0..grid.height() {
        for column in 0..grid.width() {
            let cell = CellCoord::new(column, row);
            let symbol = match grid.get(cell) {
                _ if cell == grid.start() => 'S',
                _ if cell == grid.end() => 'E',
                Some(cell_type) if cell_type.is_hidden() => ' ',
                Some(cell_type) if !cell_type.is_walkable() => '#',
                _ => field.direction(cell).map_or('.', arrow),
            };
            text.push(symbol);
        }
        text.push('\n');
    }
    text
}
