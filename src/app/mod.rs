use std::io::{self, IsTerminal, Read, Stdout, stdout};
use std::thread;
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use tracing::{debug, info};

use crate::config::{END_PAUSE, GameConfig, QUIT_PROMPT, RESTART_PROMPT};
use crate::error::GameError;
use crate::game::Field;
use crate::io::{Action, KeyTable, read_action, read_confirmation};
use crate::ui::draw_field;

type Term = Terminal<CrosstermBackend<Stdout>>;
type SizeQuery = fn() -> io::Result<(u16, u16)>;

pub fn run(config: &GameConfig) -> Result<(), GameError> {
    let field = Field::fitted(
        config.height,
        config.width,
        config.bomb_percentage,
        config.seed,
        crossterm::terminal::size(),
    )?;

    if !io::stdin().is_terminal() {
        return Err(GameError::NotATerminal);
    }

    let keys = KeyTable::default();
    let mut tui = TerminalGuard::new()?;
    info!(
        rows = field.rows(),
        cols = field.cols(),
        seed = config.seed,
        "session started"
    );

    let result = Session {
        terminal: tui.terminal_mut(),
        input: io::stdin().lock(),
        field,
        config,
        keys: &keys,
        pause: END_PAUSE,
        term_size: crossterm::terminal::size,
    }
    .run_loop();

    tui.restore()?;
    info!("session ended");
    result
}

/// Raw mode, alternate screen and a hidden cursor for as long as it lives.
struct TerminalGuard {
    terminal: Term,
    restored: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, GameError> {
        enable_raw_mode().map_err(GameError::TerminalMode)?;
        let setup = || -> io::Result<Term> {
            let mut stdout = stdout();
            execute!(stdout, EnterAlternateScreen)?;
            let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
            terminal.hide_cursor()?;
            Ok(terminal)
        };
        match setup() {
            Ok(terminal) => Ok(Self {
                terminal,
                restored: false,
            }),
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen);
                Err(GameError::TerminalMode(err))
            }
        }
    }

    fn terminal_mut(&mut self) -> &mut Term {
        &mut self.terminal
    }

    fn restore(&mut self) -> Result<(), GameError> {
        self.restored = true;
        disable_raw_mode().map_err(GameError::TerminalMode)?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(GameError::TerminalMode)?;
        self.terminal.show_cursor().map_err(GameError::TerminalMode)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

struct Session<'a, B: Backend, R: Read> {
    terminal: &'a mut Terminal<B>,
    input: R,
    field: Field,
    config: &'a GameConfig,
    keys: &'a KeyTable,
    pause: Duration,
    term_size: SizeQuery,
}

impl<B: Backend, R: Read> Session<'_, B, R> {
    fn run_loop(&mut self) -> Result<(), GameError> {
        loop {
            if self.field.victory() {
                info!("player won");
                self.field.open_non_bombs();
                let config = self.config;
                if self.finish_game(&config.win_message)? == Flow::Exit {
                    return Ok(());
                }
            }
            self.render(None)?;

            let Some(action) = read_action(&mut self.input, self.keys)? else {
                continue;
            };
            if self.handle_action(action)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    fn handle_action(&mut self, action: Action) -> Result<Flow, GameError> {
        debug!(?action, cursor = ?self.field.cursor(), "action");
        match action {
            Action::Quit => {
                if self.confirm(QUIT_PROMPT)? {
                    return Ok(Flow::Exit);
                }
            }
            Action::Up => self.field.move_up(),
            Action::Down => self.field.move_down(),
            Action::Left => self.field.move_left(),
            Action::Right => self.field.move_right(),
            Action::Restart => {
                if self.confirm(RESTART_PROMPT)? {
                    self.restart()?;
                }
            }
            Action::Flag => self.field.flag_at_cursor(),
            Action::Open => {
                if self.field.open_at_cursor() {
                    info!(cursor = ?self.field.cursor(), "player hit a bomb");
                    self.field.open_bombs();
                    let config = self.config;
                    return self.finish_game(&config.game_over_message);
                }
            }
            Action::Yes | Action::No => {}
        }
        Ok(Flow::Continue)
    }

    fn render(&mut self, message: Option<&str>) -> Result<(), GameError> {
        let field = &self.field;
        self.terminal
            .draw(|frame| draw_field(frame, field, message))?;
        Ok(())
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool, GameError> {
        self.render(Some(prompt))?;
        Ok(read_confirmation(&mut self.input, self.keys)?)
    }

    /// Shows the final board and the message, then asks whether to play again.
    fn finish_game(&mut self, message: &str) -> Result<Flow, GameError> {
        self.render(None)?;
        thread::sleep(self.pause);
        self.render(Some(message))?;
        thread::sleep(self.pause);
        self.render(None)?;
        if self.confirm(RESTART_PROMPT)? {
            self.restart()?;
            Ok(Flow::Continue)
        } else {
            Ok(Flow::Exit)
        }
    }

    fn restart(&mut self) -> Result<(), GameError> {
        self.field
            .reset(self.config.height, self.config.width, (self.term_size)())
    }
}
