use std::fs::File;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LOG_ENV;

/// Logs to the file named by `MINE_LOG`, if any. Stdout and stderr are the
/// game screen, so without it no subscriber is installed at all.
///
/// Hold the returned guard until exit; dropping it flushes pending lines.
pub fn init_tracing(default_level: &str) -> Option<WorkerGuard> {
    let path = std::env::var_os(LOG_ENV)?;
    let file = open_log(Path::new(&path))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .ok()?;
    Some(guard)
}

fn open_log(path: &Path) -> Option<File> {
    match File::options().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("mine: logging disabled, cannot open {}: {err}", path.display());
            None
        }
    }
}
