use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("cannot determine terminal size: {0}")]
    TerminalQuery(#[source] io::Error),
    #[error("can only draw in terminal")]
    NotATerminal,
    #[error("cannot switch terminal mode: {0}")]
    TerminalMode(#[source] io::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}
