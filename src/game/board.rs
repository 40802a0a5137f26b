#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Bomb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityState {
    Closed,
    Opened,
    Flagged,
}

/// Row-major grid pairing each cell's ground truth with what the player sees.
/// Both vectors always hold `rows * cols` entries.
#[derive(Clone, Debug)]
pub struct Board {
    pub rows: usize,
    pub cols: usize,
    cells: Vec<Cell>,
    states: Vec<VisibilityState>,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
            states: vec![VisibilityState::Closed; rows * cols],
        }
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn in_bounds(&self, row: isize, col: isize) -> bool {
        0 <= row && (row as usize) < self.rows && 0 <= col && (col as usize) < self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[self.idx(row, col)]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) {
        let idx = self.idx(row, col);
        self.cells[idx] = value;
    }

    pub fn state(&self, row: usize, col: usize) -> VisibilityState {
        self.states[self.idx(row, col)]
    }

    pub fn set_state(&mut self, row: usize, col: usize, value: VisibilityState) {
        let idx = self.idx(row, col);
        self.states[idx] = value;
    }

    pub fn clear_cells(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    /// In-bounds positions of the 8 cells surrounding (row, col).
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        (-1isize..=1)
            .flat_map(|dy| (-1isize..=1).map(move |dx| (dy, dx)))
            .filter(|&(dy, dx)| dy != 0 || dx != 0)
            .map(move |(dy, dx)| (row as isize + dy, col as isize + dx))
            .filter(|&(y, x)| self.in_bounds(y, x))
            .map(|(y, x)| (y as usize, x as usize))
    }

    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }
}
