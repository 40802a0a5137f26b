use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod app;
mod cli;
mod config;
mod error;
mod game;
mod io;
mod telemetry;
mod ui;

use cli::Args;
use config::GameConfig;

fn main() -> ExitCode {
    let config = GameConfig::from_args(Args::parse());
    let _telemetry = telemetry::init_tracing("info");

    if let Err(err) = app::run(&config) {
        error!(%err, "session failed");
        eprintln!("mine: {err}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
