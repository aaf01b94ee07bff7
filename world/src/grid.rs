//! Fixed-size cell grid with designated start and end cells.

use flow_defence_core::{CellCoord, CellType};

/// Rectangular array of cell codes walked by the flow field.
///
/// Reads outside the grid return `None`. Writes outside the grid are a
/// programming error: they trip a debug assertion and are dropped in release
/// builds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<CellType>,
    start: CellCoord,
    end: CellCoord,
}

impl Grid {
    /// Creates an empty grid with start in the top-left and end in the bottom-right corner.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let count = (width as usize).saturating_mul(height as usize);
        Self {
            width,
            height,
            cells: vec![CellType::EMPTY; count],
            start: CellCoord::new(0, 0),
            end: CellCoord::new(width.saturating_sub(1), height.saturating_sub(1)),
        }
    }

    /// Builds a grid from row-major cell codes.
    ///
    /// Returns `None` when `cells` does not hold exactly `width * height`
    /// entries or a marker lies outside the grid.
    #[must_use]
    pub fn from_cells(
        width: u32,
        height: u32,
        cells: Vec<CellType>,
        start: CellCoord,
        end: CellCoord,
    ) -> Option<Self> {
        let grid = Self {
            width,
            height,
            cells,
            start,
            end,
        };
        let expected = (width as usize).checked_mul(height as usize)?;
        if grid.cells.len() != expected || !grid.contains(start) || !grid.contains(end) {
            return None;
        }
        Some(grid)
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether `cell` lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Code stored at `cell`.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<CellType> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Code stored at `(column, row)`.
    #[must_use]
    pub fn get_at(&self, column: u32, row: u32) -> Option<CellType> {
        self.get(CellCoord::new(column, row))
    }

    /// Stores `cell_type` at `cell`.
    pub fn set(&mut self, cell: CellCoord, cell_type: CellType) {
        debug_assert!(
            self.contains(cell),
            "cell {cell:?} lies outside the {}x{} grid",
            self.width,
            self.height
        );
        if let Some(index) = self.index(cell) {
            self.cells[index] = cell_type;
        }
    }

    /// Stores `cell_type` at `(column, row)`.
    pub fn set_at(&mut self, column: u32, row: u32, cell_type: CellType) {
        self.set(CellCoord::new(column, row), cell_type);
    }

    /// Reports whether walkers may enter `cell`; cells outside the grid are never walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.get(cell).is_some_and(|cell_type| cell_type.is_walkable())
    }

    /// Cell walkers spawn on.
    #[must_use]
    pub const fn start(&self) -> CellCoord {
        self.start
    }

    /// Moves the start marker.
    pub fn set_start(&mut self, cell: CellCoord) {
        debug_assert!(self.contains(cell), "start {cell:?} lies outside the grid");
        if self.contains(cell) {
            self.start = cell;
        }
    }

    /// Cell walkers try to reach.
    #[must_use]
    pub const fn end(&self) -> CellCoord {
        self.end
    }

    /// Moves the end marker.
    pub fn set_end(&mut self, cell: CellCoord) {
        debug_assert!(self.contains(cell), "end {cell:?} lies outside the grid");
        if self.contains(cell) {
            self.end = cell;
        }
    }

    /// Row-major cell codes.
    #[must_use]
    pub fn cells(&self) -> &[CellType] {
        &self.cells
    }

    /// Iterates over every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellType)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().map(move |(index, cell_type)| {
            let index = index as u32;
            (CellCoord::new(index % width, index / width), *cell_type)
        })
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some(cell.row() as usize * self.width as usize + cell.column() as usize)
    }
}
