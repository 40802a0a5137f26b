use std::io;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use tracing::{debug, warn};

use crate::config::{CELL_W, MIN_SIDE, clamp_percentage};
use crate::error::GameError;
use crate::game::{Board, Cell, VisibilityState};

/// Fits the requested size into a `width` x `height` terminal, keeping one
/// row free for prompts. Never goes below `MIN_SIDE` on either axis.
pub fn fit_dimensions(rows: usize, cols: usize, width: u16, height: u16) -> (usize, usize) {
    let max_rows = (height as usize).saturating_sub(1);
    let max_cols = width as usize / CELL_W;
    (
        rows.min(max_rows).max(MIN_SIDE),
        cols.min(max_cols).max(MIN_SIDE),
    )
}

pub struct Field {
    board: Board,
    generated: bool,
    cursor_row: usize,
    cursor_col: usize,
    bomb_percentage: u8,
    rng: StdRng,
}

impl Field {
    /// Builds a field of exactly `rows` x `cols`; bombs are placed on the first reveal.
    pub fn new(rows: usize, cols: usize, bomb_percentage: u8, seed: u64) -> Self {
        Self {
            board: Board::new(rows, cols),
            generated: false,
            cursor_row: 0,
            cursor_col: 0,
            bomb_percentage: clamp_percentage(bomb_percentage.into()),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Builds a field for a requested size, fitted to the terminal (width,
    /// height) before anything is allocated.
    pub fn fitted(
        rows: usize,
        cols: usize,
        bomb_percentage: u8,
        seed: u64,
        terminal_size: io::Result<(u16, u16)>,
    ) -> Result<Self, GameError> {
        let (width, height) = terminal_size.map_err(GameError::TerminalQuery)?;
        let (rows, cols) = fit_dimensions(rows, cols, width, height);
        Ok(Self::new(rows, cols, bomb_percentage, seed))
    }

    /// Starts a fresh game, fitted to the queried terminal (width, height).
    pub fn reset(
        &mut self,
        rows: usize,
        cols: usize,
        terminal_size: io::Result<(u16, u16)>,
    ) -> Result<(), GameError> {
        let (width, height) = terminal_size.map_err(GameError::TerminalQuery)?;
        let (rows, cols) = fit_dimensions(rows, cols, width, height);
        self.reset_to(rows, cols);
        Ok(())
    }

    pub fn reset_to(&mut self, rows: usize, cols: usize) {
        debug!(rows, cols, "reset field");
        self.board = Board::new(rows, cols);
        self.generated = false;
        self.cursor_row = 0;
        self.cursor_col = 0;
    }

    pub fn rows(&self) -> usize {
        self.board.rows
    }

    pub fn cols(&self) -> usize {
        self.board.cols
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn at_cursor(&self, row: usize, col: usize) -> bool {
        self.cursor_row == row && self.cursor_col == col
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.board.cell(row, col)
    }

    pub fn state(&self, row: usize, col: usize) -> VisibilityState {
        self.board.state(row, col)
    }

    pub fn bomb_total(&self) -> usize {
        self.count_where(|cell, _| cell == Cell::Bomb)
    }

    pub fn flag_count(&self) -> usize {
        self.count_where(|_, state| state == VisibilityState::Flagged)
    }

    fn count_where(&self, pred: impl Fn(Cell, VisibilityState) -> bool) -> usize {
        self.board
            .positions()
            .filter(|&(r, c)| pred(self.board.cell(r, c), self.board.state(r, c)))
            .count()
    }

    pub fn count_bombs(&self, row: usize, col: usize) -> usize {
        self.board
            .neighbors(row, col)
            .filter(|&(r, c)| self.board.cell(r, c) == Cell::Bomb)
            .count()
    }

    fn around_cursor(&self, row: usize, col: usize) -> bool {
        row.abs_diff(self.cursor_row) <= 1 && col.abs_diff(self.cursor_col) <= 1
    }

    pub fn bomb_target(&self) -> usize {
        let total = self.rows() * self.cols();
        (total * self.bomb_percentage as usize).div_ceil(100)
    }

    /// Places bombs the first time it is called; later calls do nothing.
    pub fn generate_if_needed(&mut self) {
        if self.generated {
            return;
        }
        self.board.clear_cells();

        let wanted = self.bomb_target();
        let eligible: Vec<(usize, usize)> = self
            .board
            .positions()
            .filter(|&(r, c)| !self.around_cursor(r, c))
            .collect();
        if wanted > eligible.len() {
            warn!(
                wanted,
                available = eligible.len(),
                "not enough free cells, placing fewer bombs"
            );
        }
        let count = wanted.min(eligible.len());
        for (row, col) in eligible.into_iter().choose_multiple(&mut self.rng, count) {
            self.board.set_cell(row, col, Cell::Bomb);
        }

        self.generated = true;
        debug!(bombs = count, cursor = ?self.cursor(), "generated field");
    }

    /// Opens (row, col), flooding outwards through cells without neighbouring
    /// bombs. Returns whether the cell itself was a bomb.
    pub fn open_at(&mut self, row: usize, col: usize) -> bool {
        self.generate_if_needed();

        let mut pending = vec![(row, col)];
        while let Some((r, c)) = pending.pop() {
            self.board.set_state(r, c, VisibilityState::Opened);
            if self.count_bombs(r, c) != 0 {
                continue;
            }
            let neighbors: Vec<_> = self.board.neighbors(r, c).collect();
            for (nr, nc) in neighbors {
                if self.board.state(nr, nc) == VisibilityState::Closed {
                    // Claimed now so it is pushed once.
                    self.board.set_state(nr, nc, VisibilityState::Opened);
                    pending.push((nr, nc));
                }
            }
        }

        self.board.cell(row, col) == Cell::Bomb
    }

    pub fn open_at_cursor(&mut self) -> bool {
        self.open_at(self.cursor_row, self.cursor_col)
    }

    pub fn open_bombs(&mut self) {
        for (r, c) in self.board.positions().collect::<Vec<_>>() {
            if self.board.cell(r, c) == Cell::Bomb {
                self.board.set_state(r, c, VisibilityState::Opened);
            }
        }
    }

    pub fn open_non_bombs(&mut self) {
        for (r, c) in self.board.positions().collect::<Vec<_>>() {
            let state = match self.board.cell(r, c) {
                Cell::Bomb => VisibilityState::Flagged,
                Cell::Empty => VisibilityState::Opened,
            };
            self.board.set_state(r, c, state);
        }
    }

    pub fn victory(&self) -> bool {
        self.board.positions().all(|(r, c)| {
            match (self.board.state(r, c), self.board.cell(r, c)) {
                (VisibilityState::Opened, cell) => cell == Cell::Empty,
                (VisibilityState::Flagged | VisibilityState::Closed, cell) => cell == Cell::Bomb,
            }
        })
    }

    pub fn flag_at_cursor(&mut self) {
        let (r, c) = self.cursor();
        match self.board.state(r, c) {
            VisibilityState::Closed => self.board.set_state(r, c, VisibilityState::Flagged),
            VisibilityState::Flagged => self.board.set_state(r, c, VisibilityState::Closed),
            VisibilityState::Opened => {}
        }
    }

    pub fn move_up(&mut self) {
        self.cursor_row = self.cursor_row.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor_row + 1 < self.rows() {
            self.cursor_row += 1;
        }
    }

    pub fn move_left(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor_col + 1 < self.cols() {
            self.cursor_col += 1;
        }
    }

    #[cfg(test)]
    pub(crate) fn place_bombs(&mut self, bombs: &[(usize, usize)]) {
        self.board.clear_cells();
        for &(r, c) in bombs {
            self.board.set_cell(r, c, Cell::Bomb);
        }
        self.generated = true;
    }

    #[cfg(test)]
    pub(crate) fn set_cursor(&mut self, row: usize, col: usize) {
        self.cursor_row = row;
        self.cursor_col = col;
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use proptest::prelude::*;

    use super::*;
    use crate::cli::Args;
    use crate::config::GameConfig;

    fn opened(field: &Field) -> usize {
        field.count_where(|_, s| s == VisibilityState::Opened)
    }

    #[test]
    fn test_fit_dimensions_clamps_to_terminal() {
        assert_eq!(fit_dimensions(10, 10, 80, 24), (10, 10));
        assert_eq!(fit_dimensions(50, 50, 80, 24), (23, 26));
        assert_eq!(fit_dimensions(3, 2, 80, 24), (7, 7));
        assert_eq!(fit_dimensions(30, 30, 10, 4), (7, 7));
    }

    #[test]
    fn test_reset_fits_terminal() {
        let mut field = Field::new(7, 7, 15, 1);
        field.reset(40, 40, Ok((60, 20))).unwrap();
        assert_eq!((field.rows(), field.cols()), (19, 20));
    }

    #[test]
    fn test_reset_propagates_query_failure() {
        let mut field = Field::new(9, 9, 15, 1);
        let err = field
            .reset(10, 10, Err(io::Error::other("not a tty")))
            .unwrap_err();
        assert!(matches!(err, GameError::TerminalQuery(_)));
        assert_eq!((field.rows(), field.cols()), (9, 9));
    }

    #[test]
    fn test_fitted_clamps_oversized_request_before_allocating() {
        let args = Args::parse_from(["mine", "-w", "4294967296", "-h", "4294967296"]);
        let config = GameConfig::from_args(args);
        let field = Field::fitted(
            config.height,
            config.width,
            config.bomb_percentage,
            config.seed,
            Ok((80, 24)),
        )
        .unwrap();
        assert_eq!((field.rows(), field.cols()), (23, 26));
    }

    #[test]
    fn test_fitted_raises_negative_request_to_minimum() {
        let args = Args::parse_from(["mine", "-w", "-3", "-h", "-3"]);
        let config = GameConfig::from_args(args);
        let field = Field::fitted(config.height, config.width, 15, 1, Ok((80, 24))).unwrap();
        assert_eq!((field.rows(), field.cols()), (7, 7));
    }

    #[test]
    fn test_fitted_propagates_query_failure() {
        let result = Field::fitted(10, 10, 15, 1, Err(io::Error::other("not a tty")));
        assert!(matches!(result, Err(GameError::TerminalQuery(_))));
    }

    #[test]
    fn test_new_field_is_ungenerated() {
        let field = Field::new(7, 7, 15, 1);
        assert!(!field.is_generated());
        assert_eq!(field.bomb_total(), 0);
        assert_eq!(field.cursor(), (0, 0));
        assert!(!field.victory());
    }

    #[test]
    fn test_single_bomb_on_smallest_board() {
        let mut field = Field::new(7, 7, 1, 3);
        field.generate_if_needed();
        assert_eq!(field.bomb_total(), 1);
    }

    #[test]
    fn test_percentage_above_limit_is_clamped() {
        let mut field = Field::new(10, 10, 100, 9);
        field.set_cursor(5, 5);
        field.generate_if_needed();
        assert_eq!(field.bomb_total(), 80);
    }

    #[test]
    fn test_generation_happens_once() {
        let mut field = Field::new(9, 9, 20, 5);
        field.open_at(4, 4);
        let layout: Vec<Cell> = field.board.positions().map(|(r, c)| field.cell(r, c)).collect();
        field.set_cursor(0, 0);
        field.open_at(0, 0);
        let again: Vec<Cell> = field.board.positions().map(|(r, c)| field.cell(r, c)).collect();
        assert_eq!(layout, again);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let mut a = Field::new(12, 12, 25, 77);
        let mut b = Field::new(12, 12, 25, 77);
        a.generate_if_needed();
        b.generate_if_needed();
        assert!(a.board.positions().all(|(r, c)| a.cell(r, c) == b.cell(r, c)));
    }

    #[test]
    fn test_capped_generation_when_exclusion_leaves_no_room() {
        let mut field = Field::new(3, 3, 80, 1);
        field.set_cursor(1, 1);
        field.generate_if_needed();
        assert_eq!(field.bomb_total(), 0);
    }

    #[test]
    fn test_single_bomb_cascade_opens_everything_else() {
        let mut field = Field::new(7, 7, 1, 0);
        field.place_bombs(&[(6, 6)]);
        assert!(!field.open_at(0, 0));
        assert_eq!(opened(&field), 48);
        assert_eq!(field.state(6, 6), VisibilityState::Closed);
        assert!(field.victory());
    }

    #[test]
    fn test_flood_stops_at_numbers() {
        let mut field = Field::new(7, 7, 1, 0);
        // Wall of bombs down column 3.
        let wall: Vec<_> = (0..7).map(|r| (r, 3)).collect();
        field.place_bombs(&wall);
        field.open_at(0, 0);
        for r in 0..7 {
            for c in 0..3 {
                assert_eq!(field.state(r, c), VisibilityState::Opened, "({r},{c})");
            }
            for c in 3..7 {
                assert_eq!(field.state(r, c), VisibilityState::Closed, "({r},{c})");
            }
        }
    }

    #[test]
    fn test_flood_skips_flagged_neighbors() {
        let mut field = Field::new(7, 7, 1, 0);
        field.place_bombs(&[(6, 6)]);
        field.set_cursor(0, 1);
        field.flag_at_cursor();
        field.open_at(3, 3);
        assert_eq!(field.state(0, 1), VisibilityState::Flagged);
        assert_eq!(field.state(0, 0), VisibilityState::Opened);
    }

    #[test]
    fn test_open_ignores_flag_on_target() {
        let mut field = Field::new(7, 7, 1, 0);
        field.place_bombs(&[(6, 6)]);
        field.set_cursor(2, 2);
        field.flag_at_cursor();
        field.open_at_cursor();
        assert_eq!(field.state(2, 2), VisibilityState::Opened);
    }

    #[test]
    fn test_open_bomb_then_open_bombs() {
        let mut field = Field::new(7, 7, 1, 0);
        field.place_bombs(&[(0, 0), (6, 6), (3, 6)]);
        field.set_cursor(1, 1);
        field.flag_at_cursor();
        assert!(field.open_at(6, 6));
        let before: Vec<_> = field
            .board
            .positions()
            .filter(|&(r, c)| field.cell(r, c) == Cell::Empty)
            .map(|(r, c)| field.state(r, c))
            .collect();

        field.open_bombs();

        assert_eq!(field.state(0, 0), VisibilityState::Opened);
        assert_eq!(field.state(3, 6), VisibilityState::Opened);
        let after: Vec<_> = field
            .board
            .positions()
            .filter(|&(r, c)| field.cell(r, c) == Cell::Empty)
            .map(|(r, c)| field.state(r, c))
            .collect();
        assert_eq!(before, after);
        assert_eq!(field.state(1, 1), VisibilityState::Flagged);
        assert!(!field.victory());
    }

    #[test]
    fn test_open_non_bombs_flags_bombs() {
        let mut field = Field::new(7, 7, 1, 0);
        field.place_bombs(&[(1, 1), (5, 2)]);
        field.open_non_bombs();
        assert_eq!(field.state(1, 1), VisibilityState::Flagged);
        assert_eq!(field.state(5, 2), VisibilityState::Flagged);
        assert_eq!(opened(&field), 47);
        assert_eq!(field.flag_count(), 2);
        assert!(field.victory());
    }

    #[test]
    fn test_victory_requires_every_safe_cell_open() {
        let mut field = Field::new(7, 7, 1, 0);
        field.place_bombs(&[(3, 3)]);
        field.open_at(0, 0);
        // Cells ringed by the bomb are numbered, so the cascade covers them too.
        assert!(field.victory());

        field.reset_to(7, 7);
        field.place_bombs(&[(3, 3)]);
        field.open_at(2, 2);
        assert!(!field.victory());
    }

    #[test]
    fn test_flag_toggles() {
        let mut field = Field::new(7, 7, 1, 0);
        field.place_bombs(&[(6, 6)]);
        field.flag_at_cursor();
        assert_eq!(field.state(0, 0), VisibilityState::Flagged);
        field.flag_at_cursor();
        assert_eq!(field.state(0, 0), VisibilityState::Closed);
        field.open_at_cursor();
        field.flag_at_cursor();
        assert_eq!(field.state(0, 0), VisibilityState::Opened);
    }

    #[test]
    fn test_cursor_stays_on_board() {
        let mut field = Field::new(7, 8, 1, 0);
        field.move_up();
        field.move_left();
        assert_eq!(field.cursor(), (0, 0));
        for _ in 0..20 {
            field.move_down();
            field.move_right();
        }
        assert_eq!(field.cursor(), (6, 7));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut field = Field::new(7, 7, 30, 4);
        field.set_cursor(3, 3);
        field.open_at_cursor();
        field.reset_to(8, 9);
        assert!(!field.is_generated());
        assert_eq!((field.rows(), field.cols()), (8, 9));
        assert_eq!(field.cursor(), (0, 0));
        assert_eq!(field.bomb_total(), 0);
        assert_eq!(opened(&field), 0);
    }

    proptest! {
        #[test]
        fn prop_bomb_count_matches_density(
            rows in 7usize..25,
            cols in 7usize..25,
            pct in 1u8..=80,
            seed in any::<u64>(),
            cr in 0usize..25,
            cc in 0usize..25,
        ) {
            let mut field = Field::new(rows, cols, pct, seed);
            field.set_cursor(cr % rows, cc % cols);
            field.generate_if_needed();
            prop_assert_eq!(field.bomb_total(), (rows * cols * pct as usize).div_ceil(100));
        }

        #[test]
        fn prop_first_click_is_safe(
            rows in 7usize..20,
            cols in 7usize..20,
            pct in 1u8..=80,
            seed in any::<u64>(),
            cr in 0usize..20,
            cc in 0usize..20,
        ) {
            let (cr, cc) = (cr % rows, cc % cols);
            let mut field = Field::new(rows, cols, pct, seed);
            field.set_cursor(cr, cc);
            prop_assert!(!field.open_at_cursor());
            for (r, c) in field.board.neighbors(cr, cc).chain(std::iter::once((cr, cc))) {
                prop_assert_eq!(field.cell(r, c), Cell::Empty);
            }
            // The first click has no neighbouring bombs, so it always cascades.
            prop_assert_eq!(field.count_bombs(cr, cc), 0);
        }

        #[test]
        fn prop_flood_opens_no_bombs_and_borders_zero_cells(
            pct in 1u8..=40,
            seed in any::<u64>(),
        ) {
            let mut field = Field::new(12, 12, pct, seed);
            field.set_cursor(6, 6);
            field.open_at_cursor();
            for (r, c) in field.board.positions() {
                if field.state(r, c) != VisibilityState::Opened {
                    continue;
                }
                prop_assert_eq!(field.cell(r, c), Cell::Empty);
                if field.count_bombs(r, c) == 0 {
                    for (nr, nc) in field.board.neighbors(r, c) {
                        prop_assert_eq!(field.state(nr, nc), VisibilityState::Opened);
                    }
                }
            }
        }

        #[test]
        fn prop_cursor_in_bounds(moves in proptest::collection::vec(0u8..4, 0..100)) {
            let mut field = Field::new(7, 9, 10, 0);
            for m in moves {
                match m {
                    0 => field.move_up(),
                    1 => field.move_down(),
                    2 => field.move_left(),
                    _ => field.move_right(),
                }
                let (r, c) = field.cursor();
                prop_assert!(r < field.rows() && c < field.cols());
            }
        }
    }
}
