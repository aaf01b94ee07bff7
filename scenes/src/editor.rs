//! Level editor scene.

use flow_defence_core::{CellCoord, CellType, EventType, ScreenTransform};
use flow_defence_rendering::{DrawCommand, FrameInput, GuiPanel};
use flow_defence_world::{Grid, LevelError, LevelStore};
use glam::Vec2;

use crate::atlas;

const GRID_WIDTH: u32 = 20;
const GRID_HEIGHT: u32 = 14;
const DEFAULT_START: CellCoord = CellCoord::new(1, 1);
const DEFAULT_END: CellCoord = CellCoord::new(18, 12);
const DEFAULT_NAME: &str = "Testlevel";
const PREVIEW_POSITION: Vec2 = Vec2::new(640.0, 650.0);

/// Paints cell codes onto a grid and stores it as a named level.
#[derive(Debug)]
pub struct Editor {
    grid: Grid,
    levels: LevelStore,
    name: String,
    selected_type: CellType,
    cursor: Option<CellCoord>,
    transform: ScreenTransform,
}

impl Editor {
    /// Creates an editor over an empty 20x14 grid.
    #[must_use]
    pub fn new(levels: LevelStore, transform: ScreenTransform) -> Self {
        let mut grid = Grid::new(GRID_WIDTH, GRID_HEIGHT);
        grid.set_start(DEFAULT_START);
        grid.set_end(DEFAULT_END);
        Self {
            grid,
            levels,
            name: DEFAULT_NAME.to_owned(),
            selected_type: CellType::EMPTY,
            cursor: None,
            transform,
        }
    }

    /// Grid being edited.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Name the level is loaded from and saved as.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the level.
    pub fn set_name<T>(&mut self, name: T)
    where
        T: Into<String>,
    {
        self.name = name.into();
    }

    /// Cell code painted by [`Editor::paint`].
    #[must_use]
    pub fn selected_type(&self) -> CellType {
        self.selected_type
    }

    /// Selects the cell code painted next, capped at the highest editable code.
    pub fn select_type(&mut self, cell_type: CellType) {
        self.selected_type = CellType::new(cell_type.get().min(CellType::MAX_EDITABLE.get()));
    }

    /// Moves the selected cell code by `delta`, staying within the editable range.
    pub fn step_type(&mut self, delta: i32) {
        let max = i32::from(CellType::MAX_EDITABLE.get());
        let next = (i32::from(self.selected_type.get()) + delta).clamp(0, max);
        self.selected_type = CellType::new(u8::try_from(next).unwrap_or(0));
    }

    /// Cell under the pointer, if it lies on the grid.
    #[must_use]
    pub fn cursor(&self) -> Option<CellCoord> {
        self.cursor
    }

    /// Tracks the pointer position.
    pub fn set_cursor(&mut self, pointer: Option<Vec2>) {
        self.cursor = pointer
            .and_then(|pointer| self.transform.to_cell(pointer))
            .filter(|cell| self.grid.contains(*cell));
    }

    /// Writes the selected cell code to `cell`. Returns `false` when the cell is off the grid.
    pub fn paint(&mut self, cell: CellCoord) -> bool {
        if !self.grid.contains(cell) {
            return false;
        }
        self.grid.set(cell, self.selected_type);
        true
    }

    /// Flips `cell` between open floor and wall. Returns `false` when the cell is off the grid.
    pub fn toggle(&mut self, cell: CellCoord) -> bool {
        let Some(current) = self.grid.get(cell) else {
            return false;
        };
        let next = if current == CellType::EMPTY {
            CellType::WALL
        } else {
            CellType::EMPTY
        };
        self.grid.set(cell, next);
        true
    }

    /// Moves the start marker to `cell`. Returns `false` when the cell is off the grid.
    pub fn set_start(&mut self, cell: CellCoord) -> bool {
        if !self.grid.contains(cell) {
            return false;
        }
        self.grid.set_start(cell);
        true
    }

    /// Moves the end marker to `cell`. Returns `false` when the cell is off the grid.
    pub fn set_end(&mut self, cell: CellCoord) -> bool {
        if !self.grid.contains(cell) {
            return false;
        }
        self.grid.set_end(cell);
        true
    }

    /// Tracks the pointer, painting on primary clicks and toggling walls on secondary clicks.
    pub fn update(&mut self, input: &FrameInput) {
        self.set_cursor(input.pointer);
        let Some(cell) = self.cursor else {
            return;
        };
        if input.events.contains(EventType::LEFT_BUTTON_CLICKED) {
            let _ = self.paint(cell);
        }
        if input.events.contains(EventType::RIGHT_BUTTON_CLICKED) {
            let _ = self.toggle(cell);
        }
    }

    /// Replaces the grid with the level stored under the current name.
    pub fn load(&mut self) -> Result<(), LevelError> {
        self.grid = self.levels.load(&self.name)?;
        Ok(())
    }

    /// Stores the grid under the current name.
    pub fn save(&self) -> Result<(), LevelError> {
        self.levels.save(&self.name, &self.grid)
    }

    /// Called when the scene becomes the top of the stack.
    pub fn on_activation(&mut self) {
        tracing::debug!(level = %self.name, "editor activated");
    }

    /// Called when the scene stops being the top of the stack.
    pub fn on_deactivation(&mut self) {
        self.cursor = None;
    }

    /// Appends every cell, hidden ones included, and a preview of the selected code.
    pub fn render(&self, out: &mut Vec<DrawCommand>) {
        for (cell, cell_type) in self.grid.iter() {
            out.push(DrawCommand::sprite(
                self.transform.to_screen(cell),
                atlas::tile(cell_type),
            ));
        }
        out.push(DrawCommand::sprite(
            PREVIEW_POSITION,
            atlas::tile(self.selected_type),
        ));
    }

    /// Describes the editor state for the overlay panel.
    #[must_use]
    pub fn gui(&self) -> GuiPanel {
        let mut panel = GuiPanel::new("Grid");
        panel.line(format!("Name: {}", self.name));
        match self.cursor {
            Some(cell) => panel.line(format!("Pos: {}, {}", cell.column(), cell.row())),
            None => panel.line("Pos: -"),
        }
        panel.line(format!("Type: {}", self.selected_type.get()));
        panel.line(format!(
            "Start: {}, {}  End: {}, {}",
            self.grid.start().column(),
            self.grid.start().row(),
            self.grid.end().column(),
            self.grid.end().row(),
        ));
        panel
    }
}
