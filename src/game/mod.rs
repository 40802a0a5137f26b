pub mod board;
pub mod field;

pub use board::{Board, Cell, VisibilityState};
pub use field::Field;
