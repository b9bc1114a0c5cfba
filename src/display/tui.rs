//! Terminal surface
//!
//! Draws the menu view full-screen with ratatui and turns key presses into
//! scheduler commands, so `watch` behaves like the tray menu in a terminal.

use super::widgets::{render_menu_view, AppTheme};
use super::{MenuView, TraySurface};
use crate::daemon::SchedulerHandle;
use crate::models::DisplayMode;
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use tracing::{debug, warn};

/// Terminal backend type alias
type TerminalBackend = CrosstermBackend<Stdout>;

/// What a key press asks the scheduler to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Select(DisplayMode),
    Refresh,
    Quit,
}

/// Map a key event to an action; releases and unbound keys map to nothing
pub fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Quit)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        KeyCode::Char('r') => Some(KeyAction::Refresh),
        KeyCode::Char('1') => Some(KeyAction::Select(DisplayMode::CurrentSession)),
        KeyCode::Char('2') => Some(KeyAction::Select(DisplayMode::WeeklyAll)),
        KeyCode::Char('3') => Some(KeyAction::Select(DisplayMode::WeeklyOpus)),
        _ => None,
    }
}

/// Full-screen surface; restores the terminal on close or drop
pub struct TerminalSurface {
    terminal: Terminal<TerminalBackend>,
    theme: AppTheme,
    last_view: Option<MenuView>,
    restored: bool,
}

impl TerminalSurface {
    pub fn new() -> Result<Self> {
        Ok(Self {
            terminal: setup_terminal()?,
            theme: AppTheme::default(),
            last_view: None,
            restored: false,
        })
    }

    fn draw(&mut self) -> Result<()> {
        let Some(view) = &self.last_view else {
            return Ok(());
        };
        let theme = &self.theme;
        self.terminal
            .draw(|frame| render_menu_view(frame, view, frame.area(), theme))
            .context("Failed to draw terminal")?;
        Ok(())
    }

    fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;
        if let Err(e) = cleanup_terminal(&mut self.terminal) {
            warn!(error = %e, "Failed to restore terminal");
        }
    }
}

impl TraySurface for TerminalSurface {
    fn render(&mut self, view: &MenuView) {
        self.last_view = Some(view.clone());
        if let Err(e) = self.draw() {
            warn!(error = %e, "Failed to render terminal view");
        }
    }

    fn close(&mut self) {
        self.restore();
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Forward key presses to the scheduler until quit or end of input
pub async fn forward_keys(handle: SchedulerHandle) {
    let mut events = EventStream::new();

    while let Some(event) = events.next().await {
        let key = match event {
            Ok(Event::Key(key)) => key,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Failed to read terminal event");
                break;
            }
        };

        match key_action(key) {
            Some(KeyAction::Select(mode)) => handle.select_mode(mode),
            Some(KeyAction::Refresh) => handle.refresh(),
            Some(KeyAction::Quit) => {
                debug!("Quit key pressed");
                break;
            }
            None => {}
        }
    }

    handle.quit();
}

/// Setup the terminal for TUI mode
fn setup_terminal() -> Result<Terminal<TerminalBackend>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Cleanup terminal and restore normal mode
fn cleanup_terminal(terminal: &mut Terminal<TerminalBackend>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to cleanup terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}
