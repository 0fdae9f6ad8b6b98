//! Terminal UI: tabbed views over the DM Assistant backend.

pub mod app;
pub mod events;
pub mod layout;
pub mod services;
pub mod theme;
pub mod views;
pub mod widgets;

use std::io;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::config::AppConfig;
use app::AppState;
use events::Focus;
use services::Services;

/// Set up the terminal, run the event loop, and restore the terminal
/// even when the loop fails.
pub async fn run(config: &AppConfig, initial_tab: Focus) -> Result<(), Box<dyn std::error::Error>> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let services = Services::init(config, event_tx)?;
    let mut app = AppState::new(event_rx, services, initial_tab);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(config.tui.tick_rate_ms.max(1));
    let result = app.run(&mut terminal, tick_rate).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    tracing::info!("terminal restored");
    Ok(())
}
