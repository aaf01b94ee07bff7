//! Regions of the shared sprite sheet.

use flow_defence_core::{CellType, Direction, SpriteRect};
use flow_defence_rendering::DrawCommand;
use glam::Vec2;

const TILE: f32 = 46.0;

/// Sprite drawn for a tower.
pub(crate) const TOWER: SpriteRect = SpriteRect::new(0.0, 93.0, TILE, TILE);
/// Sprite drawn for a bullet.
pub(crate) const BULLET: SpriteRect = SpriteRect::new(300.0, 0.0, 8.0, 8.0);
/// Tile laid under the cells of the current route.
pub(crate) const PATH_MARKER: SpriteRect = SpriteRect::new(138.0, 0.0, TILE, TILE);

const DIGITS: [SpriteRect; 10] = [
    SpriteRect::new(0.0, 46.0, 17.0, 14.0),
    SpriteRect::new(17.0, 46.0, 9.0, 14.0),
    SpriteRect::new(26.0, 46.0, 16.0, 14.0),
    SpriteRect::new(42.0, 46.0, 16.0, 14.0),
    SpriteRect::new(58.0, 46.0, 17.0, 14.0),
    SpriteRect::new(75.0, 46.0, 17.0, 14.0),
    SpriteRect::new(92.0, 46.0, 17.0, 14.0),
    SpriteRect::new(109.0, 46.0, 17.0, 14.0),
    SpriteRect::new(126.0, 46.0, 17.0, 14.0),
    SpriteRect::new(143.0, 46.0, 16.0, 14.0),
];
const DIGIT_SPACING: f32 = 2.0;

/// Tile sprite for a cell code.
///
/// Hidden cells get a visible marker so they can be edited; the battleground
/// skips them before asking for a tile.
pub(crate) fn tile(cell_type: CellType) -> SpriteRect {
    let x = match cell_type.get() {
        1 => TILE,
        2 => 3.0 * TILE,
        3 => 4.0 * TILE,
        4 => 2.0 * TILE,
        _ => 0.0,
    };
    SpriteRect::new(x, 0.0, TILE, TILE)
}

/// Arrow sprite for a flow-field direction.
pub(crate) fn arrow(direction: Direction) -> SpriteRect {
    SpriteRect::new(f32::from(direction.code()) * TILE, 138.0, TILE, TILE)
}

/// Pushes the decimal digits of `value` centred on `center`.
pub(crate) fn push_number(value: usize, center: Vec2, out: &mut Vec<DrawCommand>) {
    let digits: Vec<SpriteRect> = value
        .to_string()
        .bytes()
        .map(|byte| DIGITS[usize::from(byte - b'0')])
        .collect();
    let total: f32 = digits.iter().map(|digit| digit.width).sum::<f32>()
        + DIGIT_SPACING * digits.len().saturating_sub(1) as f32;

    let mut left = center.x - total * 0.5;
    for digit in digits {
        let position = Vec2::new(left + digit.width * 0.5, center.y);
        out.push(DrawCommand::sprite(position, digit));
        left += digit.width + DIGIT_SPACING;
    }
}
