use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::cli::Args;

// Shared game constants.
pub const MIN_SIDE: usize = 7;
pub const CELL_W: usize = 3; // bracket + glyph + bracket
pub const MIN_BOMB_PERCENTAGE: u8 = 1;
pub const MAX_BOMB_PERCENTAGE: u8 = 80;
pub const END_PAUSE: Duration = Duration::from_secs(1);
pub const LOG_ENV: &str = "MINE_LOG";

pub const RESTART_PROMPT: &str = "restart? [y/n]";
pub const QUIT_PROMPT: &str = "are you sure? [y/n]";

/// Settings fixed for the whole session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub bomb_percentage: u8,
    pub win_message: String,
    pub game_over_message: String,
    pub seed: u64,
}

impl GameConfig {
    pub fn from_args(args: Args) -> Self {
        // Negative seeds keep their bit pattern, so they stay distinct and non-zero.
        let seed = if args.seed == 0 { seed_from_time() } else { args.seed as u64 };
        Self {
            width: requested_side(args.width),
            height: requested_side(args.height),
            bomb_percentage: clamp_percentage(args.bomb_percentage),
            win_message: args.win_message,
            game_over_message: args.game_over_message,
            seed,
        }
    }
}

pub fn clamp_percentage(value: i64) -> u8 {
    value.clamp(MIN_BOMB_PERCENTAGE as i64, MAX_BOMB_PERCENTAGE as i64) as u8
}

/// Negative sizes become 0; the field later raises them to `MIN_SIDE`.
fn requested_side(value: i64) -> usize {
    usize::try_from(value.max(0)).unwrap_or(usize::MAX)
}

fn seed_from_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}
