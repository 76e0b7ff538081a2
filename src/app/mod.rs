//! Application state and event handling

pub mod command;
pub mod handler;
pub mod input;
pub mod navigation;
pub mod state;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::docs::ContentStore;
use crate::theme::Theme;
use crate::ui;
use handler::Handler;

/// The main application
pub struct App {
    /// Input handling and everything it changes
    handler: Handler,

    theme: Theme,

    /// Background fill of the content cache
    preload: Option<JoinHandle<usize>>,

    /// Terminal backend
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl App {
    /// Create a new application instance
    pub fn new(
        config: Config,
        store: Arc<ContentStore>,
        product: impl Into<String>,
    ) -> Result<Self> {
        let theme = config.active_theme();
        let handler = Handler::new(config, store, product);
        let terminal = Self::setup_terminal()?;

        Ok(Self { handler, theme, preload: None, terminal })
    }

    /// Set up the terminal for TUI rendering
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore the terminal to its original state
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Run the application main loop
    pub async fn run(&mut self) -> Result<()> {
        // Set up panic hook to restore terminal
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
            eprintln!("\nhandbook hit an unexpected error. Restart it to continue reading.");
        }));

        let delay = self.handler.config.preload_delay();
        self.preload = Some(self.handler.store().spawn_preload(delay));
        self.handler.open_first();

        loop {
            let now = Instant::now();
            let model = self.handler.config.model;
            let state = &mut self.handler.state;
            let theme = &self.theme;
            self.terminal.draw(|frame| {
                ui::draw(frame, state, theme, model, now);
            })?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handler.handle_key(key);
                    }
                }
            }

            self.handler.poll_background();
            self.handler.tick(Instant::now());

            if self.handler.should_quit() {
                break;
            }
        }

        if let Some(preload) = self.preload.take() {
            preload.abort();
        }
        self.restore_terminal()?;
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}
