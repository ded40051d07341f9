//! Terminal journal entry point.
//!
//! # Responsibility
//! - Resolve configuration from file and flags, start logging, open storage.
//! - Own the terminal and drive the frame loop.

mod app;
mod input;
mod ui;

use anyhow::{Context, Result};
use app::{App, CELL_HEIGHT_PX, CELL_WIDTH_PX};
use clap::{Parser, ValueEnum};
use crossterm::cursor::Show;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::{info, warn};
use moments_core::background::Ambience;
use moments_core::config::{load_config, MomentsConfig};
use moments_core::controller::AppController;
use moments_core::db::{open_db, DB_FILE_NAME};
use moments_core::quotes::{Activation, ExitStyle, QuoteOverlay};
use moments_core::repo::kv_repo::SqliteKvStore;
use moments_core::repo::memo_repo::{KvMemoRepository, MemoRepository};
use moments_core::service::memo_store::MemoStore;
use moments_core::{core_version, default_log_level, init_logging};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QuotesArg {
    Toggled,
    Automatic,
}

impl From<QuotesArg> for Activation {
    fn from(value: QuotesArg) -> Self {
        match value {
            QuotesArg::Toggled => Activation::Toggled,
            QuotesArg::Automatic => Activation::Automatic,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QuoteExitArg {
    Dissipate,
    Fifo,
}

impl From<QuoteExitArg> for ExitStyle {
    fn from(value: QuoteExitArg) -> Self {
        match value {
            QuoteExitArg::Dissipate => ExitStyle::Dissipate,
            QuoteExitArg::Fifo => ExitStyle::Fifo,
        }
    }
}

/// A quiet terminal journal.
#[derive(Debug, Parser)]
#[command(name = "moments", version, about)]
struct Args {
    /// Config file (default: <config dir>/moments/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the journal database.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Directory for rolling log files.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// trace | debug | info | warn | error
    #[arg(long)]
    log_level: Option<String>,
    /// How the floating quote overlay is switched on.
    #[arg(long, value_enum)]
    quotes: Option<QuotesArg>,
    /// How floating quotes leave the screen.
    #[arg(long, value_enum)]
    quote_exit: Option<QuoteExitArg>,
}

impl Args {
    /// Flags win over file values.
    fn apply(&self, config: &mut MomentsConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.log_dir {
            config.log_dir = Some(dir.clone());
        }
        if let Some(level) = &self.log_level {
            config.log_level = Some(level.clone());
        }
        if let Some(activation) = self.quotes {
            config.quotes.activation = Some(activation.into());
        }
        if let Some(exit) = self.quote_exit {
            config.quotes.exit = Some(exit.into());
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);

    let log_level = config
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    init_logging(&log_level, &config.resolved_log_dir())
        .map_err(anyhow::Error::msg)
        .context("failed to start logging")?;
    let policy = config.quotes.policy()?;

    let db_path = config.resolved_data_dir().join(DB_FILE_NAME);
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open journal at {}", db_path.display()))?;
    let store = MemoStore::load_or_seed(KvMemoRepository::new(SqliteKvStore::new(conn)));
    info!(
        "event=cli_start module=cli status=ok version={} db={}",
        core_version(),
        db_path.display()
    );

    let (cols, rows) = crossterm::terminal::size().context("failed to read terminal size")?;
    let quotes = QuoteOverlay::new(policy, StdRng::from_entropy());
    let ambience = Ambience::new(
        f32::from(cols) * CELL_WIDTH_PX,
        f32::from(rows) * CELL_HEIGHT_PX,
        StdRng::from_entropy(),
    );
    let app = App::new(AppController::new(store, quotes, ambience));

    let result = run_tui(app);
    info!(
        "event=cli_exit module=cli status={}",
        if result.is_ok() { "ok" } else { "error" }
    );
    result
}

/// Owns raw mode and the alternate screen; dropping it restores the terminal
/// on every exit path, unwinding panics included.
struct TerminalGuard<W: Write> {
    out: W,
}

impl<W: Write> TerminalGuard<W> {
    fn enter(out: W) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut guard = Self { out };
        execute!(guard.out, EnterAlternateScreen, EnableMouseCapture)?;
        Ok(guard)
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            warn!("event=terminal_restore module=cli status=error step=raw_mode error={err}");
        }
        if let Err(err) = execute!(self.out, LeaveAlternateScreen, DisableMouseCapture, Show) {
            warn!("event=terminal_restore module=cli status=error step=screen error={err}");
        }
    }
}

fn run_tui<R: MemoRepository>(mut app: App<R>) -> Result<()> {
    let _guard = TerminalGuard::enter(io::stdout())?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    event_loop(&mut terminal, &mut app)
}

fn event_loop<R: MemoRepository>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<R>,
) -> Result<()> {
    while !app.should_quit() {
        let now = Instant::now();
        app.tick(now);
        terminal.draw(|f| {
            app.prepare(f.area());
            ui::draw(f, app, now);
        })?;

        let timeout = FRAME_INTERVAL.saturating_sub(now.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(input) = input::map_key(key, app.editor_mode()) {
                        app.handle_input(input, Instant::now());
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse, Instant::now()),
                Event::Resize(cols, rows) => app.resize(cols, rows),
                _ => {}
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::TerminalGuard;

    #[test]
    fn dropping_the_guard_leaves_the_alternate_screen() {
        let mut out: Vec<u8> = Vec::new();
        drop(TerminalGuard { out: &mut out });
        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b[?1049l"));
        assert!(written.contains("\x1b[?25h"));
    }
}
