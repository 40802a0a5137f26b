use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(name = "mine")]
#[command(version)]
#[command(about = "simple minesweeper for terminal")]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Show this message and exit
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Game field width
    #[arg(short, long, default_value_t = 10, allow_negative_numbers = true)]
    pub width: i64,

    /// Game field height
    #[arg(short = 'h', long, default_value_t = 10, allow_negative_numbers = true)]
    pub height: i64,

    /// Sets bomb percentage (clamped to 1..=80)
    #[arg(short, long, default_value_t = 15, allow_negative_numbers = true)]
    pub bomb_percentage: i64,

    /// Sets win message
    #[arg(short = 'p', long, default_value = " Y O U   W O N ")]
    pub win_message: String,

    /// Sets game over message
    #[arg(short, long, default_value = " G A M E   O V E R ")]
    pub game_over_message: String,

    /// Game seed, will use unix-nano if 0
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    pub seed: i64,
}
